use crate::io::config_loader::TomlConfigLoader;
use crate::io::render_settings::RenderSettings;
use clap::Parser;
use log::info;

/// Command line: a config file plus a few overrides.
#[derive(Parser, Debug)]
#[command(name = "space-travel")]
#[command(about = "CPU rasterizer rendering a small animated solar system")]
pub struct SimpleCli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Number of frames to render, overrides the config
    #[arg(short, long, value_name = "N")]
    pub frames: Option<usize>,

    /// Output directory, overrides the config
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Write an example config to the working directory and load it
    #[arg(long)]
    pub use_example_config: bool,
}

impl SimpleCli {
    /// Parses the process arguments and resolves the final settings.
    pub fn process() -> Result<RenderSettings, String> {
        Self::parse().resolve()
    }

    pub fn resolve(&self) -> Result<RenderSettings, String> {
        let mut settings = if self.use_example_config {
            let example_path = "example_config.toml";
            TomlConfigLoader::create_example_config(example_path)?;
            info!("Wrote example config: {}", example_path);

            // Kept on disk as a template
            TomlConfigLoader::load_from_file(example_path)
                .map_err(|e| format!("Failed to load example config: {}", e))?
        } else if let Some(config_path) = &self.config {
            info!("Loading config file: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)?
        } else {
            info!("No config file given, using the default scene");
            RenderSettings::default()
        };

        if let Some(frames) = self.frames {
            settings.frames = frames;
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = output_dir.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}
