use crate::core::fragment::Fragment;
use crate::material_system::color::{Color, Rgba, mix};
use crate::material_system::noise::{fractal_noise, hash, value_noise};
use nalgebra::{Point3, Vector3};

/// Light floor for lit bodies so their night side is not pure black.
const AMBIENT: f32 = 0.15;

/// Shading function carried by each object kind.
pub type FragmentShader = fn(&Fragment) -> Rgba;

/// How the rasterizer turns an interpolated normal into a light intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingModel {
    /// `min(|n · light|, 1)`: both faces of a surface are lit.
    Absolute,
    /// `n · (0, 0, 1)` with no absolute value: faces turned away from the
    /// view axis come out non-positive and are dropped, which keeps only the
    /// inside of the enclosing sky sphere.
    ViewAxis,
}

impl LightingModel {
    pub fn intensity(self, normal: &Vector3<f32>, light: &Vector3<f32>) -> f32 {
        match self {
            LightingModel::Absolute => normal.dot(light).abs().min(1.0),
            LightingModel::ViewAxis => normal.dot(&Vector3::z()),
        }
    }
}

/// Closed set of renderable object kinds. Each one selects a lighting model
/// and a fragment shader; `Unlit` is the fallback for any identifier that
/// does not name a known kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectKind {
    Space,
    Sun,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Ship,
    #[default]
    Unlit,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 10] = [
        ObjectKind::Space,
        ObjectKind::Sun,
        ObjectKind::Earth,
        ObjectKind::Mars,
        ObjectKind::Jupiter,
        ObjectKind::Saturn,
        ObjectKind::Uranus,
        ObjectKind::Neptune,
        ObjectKind::Ship,
        ObjectKind::Unlit,
    ];

    /// Maps the numeric identifiers 0..=8 (space first, ship last) to kinds.
    /// Anything else is `Unlit`.
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => ObjectKind::Space,
            1 => ObjectKind::Sun,
            2 => ObjectKind::Earth,
            3 => ObjectKind::Mars,
            4 => ObjectKind::Jupiter,
            5 => ObjectKind::Saturn,
            6 => ObjectKind::Uranus,
            7 => ObjectKind::Neptune,
            8 => ObjectKind::Ship,
            _ => ObjectKind::Unlit,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.name() == lower)
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Space => "space",
            ObjectKind::Sun => "sun",
            ObjectKind::Earth => "earth",
            ObjectKind::Mars => "mars",
            ObjectKind::Jupiter => "jupiter",
            ObjectKind::Saturn => "saturn",
            ObjectKind::Uranus => "uranus",
            ObjectKind::Neptune => "neptune",
            ObjectKind::Ship => "ship",
            ObjectKind::Unlit => "unlit",
        }
    }

    pub fn lighting(self) -> LightingModel {
        match self {
            ObjectKind::Space => LightingModel::ViewAxis,
            _ => LightingModel::Absolute,
        }
    }

    pub fn shader(self) -> FragmentShader {
        match self {
            ObjectKind::Space => shade_space,
            ObjectKind::Sun => shade_sun,
            ObjectKind::Earth => shade_earth,
            ObjectKind::Mars => shade_mars,
            ObjectKind::Jupiter => shade_jupiter,
            ObjectKind::Saturn => shade_saturn,
            ObjectKind::Uranus => shade_uranus,
            ObjectKind::Neptune => shade_neptune,
            ObjectKind::Ship => shade_ship,
            ObjectKind::Unlit => shade_unlit,
        }
    }

    #[inline]
    pub fn shade(self, fragment: &Fragment) -> Rgba {
        (self.shader())(fragment)
    }
}

#[inline]
fn lit(color: Color, intensity: f32) -> Rgba {
    let light = AMBIENT + (1.0 - AMBIENT) * intensity.clamp(0.0, 1.0);
    Rgba::from_linear(&(color * light), false)
}

/// Latitude in [-1, 1] of a point on the unit mesh (sine of the angle).
#[inline]
fn latitude(p: &Point3<f32>) -> f32 {
    let r = p.coords.norm().max(1e-4);
    (p.y / r).clamp(-1.0, 1.0)
}

fn shade_unlit(fragment: &Fragment) -> Rgba {
    fragment.color
}

fn shade_space(fragment: &Fragment) -> Rgba {
    let p = fragment.original;

    let nebula = fractal_noise(&(p * 3.0), 4);
    let mut color = mix(
        &Color::new(0.005, 0.005, 0.02),
        &Color::new(0.12, 0.04, 0.18),
        (nebula - 0.5) * 2.5,
    );

    let cell = (p * 90.0).map(f32::floor);
    let star = hash(cell.x + cell.y * 57.0 + cell.z * 113.0);
    if star > 0.985 {
        let brightness = (star - 0.985) / 0.015;
        color = mix(&color, &Color::new(1.0, 1.0, 0.95), 0.4 + brightness * 0.6);
    }

    Rgba::from_linear(&(color * (0.5 + 0.5 * fragment.intensity.min(1.0))), false)
}

/// Self-lit: ignores the light intensity.
fn shade_sun(fragment: &Fragment) -> Rgba {
    let p = fragment.original;
    let turbulence = fractal_noise(&(p * 4.0), 5);
    let granules = value_noise(&(p * 18.0));

    let mut color = mix(
        &Color::new(0.95, 0.3, 0.02),
        &Color::new(1.0, 0.85, 0.3),
        turbulence * 1.4 - 0.2,
    );
    color += Color::new(0.15, 0.1, 0.0) * granules;

    Rgba::from_linear(&color, false)
}

fn shade_earth(fragment: &Fragment) -> Rgba {
    let p = fragment.original;
    let elevation = fractal_noise(&(p * 2.5), 5);

    let mut color = if elevation < 0.5 {
        mix(
            &Color::new(0.02, 0.08, 0.35),
            &Color::new(0.05, 0.3, 0.6),
            elevation * 2.0,
        )
    } else if elevation < 0.53 {
        Color::new(0.76, 0.7, 0.5)
    } else {
        mix(
            &Color::new(0.1, 0.45, 0.12),
            &Color::new(0.35, 0.3, 0.15),
            (elevation - 0.53) * 4.0,
        )
    };

    if latitude(&p).abs() > 0.88 {
        color = Color::new(0.92, 0.95, 1.0);
    }

    let clouds = fractal_noise(&(p * 6.0 + Vector3::new(11.0, 3.0, 7.0)), 4);
    if clouds > 0.58 {
        color = mix(&color, &Color::new(1.0, 1.0, 1.0), (clouds - 0.58) * 4.0);
    }

    lit(color, fragment.intensity)
}

fn shade_mars(fragment: &Fragment) -> Rgba {
    let p = fragment.original;
    let terrain = fractal_noise(&(p * 3.0), 4);

    let mut color = mix(
        &Color::new(0.5, 0.2, 0.1),
        &Color::new(0.8, 0.45, 0.25),
        terrain,
    );

    let craters = value_noise(&(p * 9.0));
    if craters > 0.78 {
        color = mix(&color, &Color::new(0.25, 0.12, 0.08), (craters - 0.78) * 5.0);
    }

    if latitude(&p).abs() > 0.93 {
        color = Color::new(0.95, 0.92, 0.9);
    }

    lit(color, fragment.intensity)
}

fn shade_jupiter(fragment: &Fragment) -> Rgba {
    let p = fragment.original;
    let lat = latitude(&p);
    let swirl = fractal_noise(&(p * 3.0), 3);
    let bands = (lat * 18.0 + swirl * 2.0).sin() * 0.5 + 0.5;

    let mut color = mix(
        &Color::new(0.92, 0.85, 0.7),
        &Color::new(0.6, 0.38, 0.22),
        bands,
    );

    // Great storm on the southern hemisphere
    let spot_center = Point3::new(0.6, -0.35, 0.72);
    let spot = (p - spot_center).norm();
    if spot < 0.22 {
        let blend = (1.0 - spot / 0.22).powi(2);
        color = mix(&color, &Color::new(0.8, 0.25, 0.15), blend);
    }

    lit(color, fragment.intensity)
}

/// Banded body with the ring system painted across its equator.
fn shade_saturn(fragment: &Fragment) -> Rgba {
    let p = fragment.original;
    let lat = latitude(&p);

    let bands = (lat * 10.0 + fractal_noise(&(p * 2.0), 3)).sin() * 0.5 + 0.5;
    let mut color = mix(
        &Color::new(0.85, 0.75, 0.5),
        &Color::new(0.7, 0.6, 0.4),
        bands,
    );

    let ring_half_width = 0.12;
    if lat.abs() < ring_half_width {
        let across = lat.abs() / ring_half_width;
        let ringlets = (across * 40.0).sin() * 0.5 + 0.5;
        // Cassini division
        let gap = (across - 0.6).abs() < 0.06;
        color = if gap {
            Color::new(0.1, 0.08, 0.05)
        } else {
            mix(
                &Color::new(0.95, 0.9, 0.75),
                &Color::new(0.7, 0.62, 0.45),
                ringlets,
            )
        };
    } else if lat.abs() < ring_half_width + 0.03 {
        // Ring shadow
        color *= 0.45;
    }

    lit(color, fragment.intensity)
}

fn shade_uranus(fragment: &Fragment) -> Rgba {
    let p = fragment.original;
    let haze = fractal_noise(&(p * 2.0), 3);
    let color = mix(
        &Color::new(0.55, 0.8, 0.85),
        &Color::new(0.7, 0.9, 0.92),
        haze,
    );
    lit(color, fragment.intensity)
}

fn shade_neptune(fragment: &Fragment) -> Rgba {
    let p = fragment.original;
    let lat = latitude(&p);
    let bands = (lat * 8.0 + fractal_noise(&(p * 4.0), 3) * 1.5).sin() * 0.5 + 0.5;

    let mut color = mix(
        &Color::new(0.1, 0.2, 0.65),
        &Color::new(0.2, 0.4, 0.85),
        bands,
    );

    let spot = (p - Point3::new(-0.5, -0.25, 0.82)).norm();
    if spot < 0.15 {
        color = mix(&color, &Color::new(0.03, 0.06, 0.25), 1.0 - spot / 0.15);
    }

    lit(color, fragment.intensity)
}

fn shade_ship(fragment: &Fragment) -> Rgba {
    let p = fragment.original;

    // Hull plating seams
    let seams = (p * 4.0).map(|c| (c - c.round()).abs());
    let on_seam = seams.x < 0.03 || seams.y < 0.03 || seams.z < 0.03;

    let mut color = if on_seam {
        Color::new(0.25, 0.25, 0.28)
    } else {
        Color::new(0.62, 0.64, 0.68)
    };
    color = mix(&color, &Color::new(0.5, 0.45, 0.4), value_noise(&(p * 6.0)) * 0.3);

    // Specular glint on surfaces facing the light
    let glint = fragment.intensity.clamp(0.0, 1.0).powi(16) * 0.35;
    color += Color::new(glint, glint, glint);

    // Panels seen edge-on along the view axis read darker
    let facing = fragment
        .normal
        .try_normalize(1e-6)
        .map_or(1.0, |n| n.z.abs());
    color *= 0.7 + 0.3 * facing;

    lit(color, fragment.intensity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment_at(original: Point3<f32>, intensity: f32) -> Fragment {
        Fragment {
            x: 10,
            y: 10,
            color: Rgba::new(12, 34, 56, 200),
            depth: 0.5,
            original,
            normal: Vector3::z(),
            intensity,
        }
    }

    #[test]
    fn test_id_mapping_and_fallback() {
        assert_eq!(ObjectKind::from_id(0), ObjectKind::Space);
        assert_eq!(ObjectKind::from_id(5), ObjectKind::Saturn);
        assert_eq!(ObjectKind::from_id(8), ObjectKind::Ship);
        assert_eq!(ObjectKind::from_id(9), ObjectKind::Unlit);
        assert_eq!(ObjectKind::from_id(-1), ObjectKind::Unlit);
    }

    #[test]
    fn test_unmatched_kind_returns_provisional_colour() {
        let fragment = fragment_at(Point3::new(0.1, 0.2, 0.3), 0.8);
        assert_eq!(ObjectKind::from_id(42).shade(&fragment), fragment.color);
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ObjectKind::ALL {
            assert_eq!(ObjectKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ObjectKind::from_name(" Saturn "), Some(ObjectKind::Saturn));
        assert_eq!(ObjectKind::from_name("pluto"), None);
    }

    #[test]
    fn test_absolute_lighting_is_two_sided_and_capped() {
        let light = Vector3::new(0.0, 0.0, 200.0);
        let model = LightingModel::Absolute;
        assert_eq!(model.intensity(&Vector3::z(), &light), 1.0);
        assert_eq!(model.intensity(&-Vector3::z(), &light), 1.0);
        let grazing = model.intensity(&Vector3::new(1.0, 0.0, 0.001), &light);
        assert!((grazing - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_view_axis_lighting_is_one_sided() {
        let model = ObjectKind::Space.lighting();
        let light = Vector3::new(5.0, 5.0, 5.0);
        assert_eq!(model, LightingModel::ViewAxis);
        assert!(model.intensity(&Vector3::new(0.0, 0.0, -1.0), &light) < 0.0);
        assert!((model.intensity(&Vector3::new(0.0, 0.6, 0.8), &light) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_ship_panels_darken_edge_on() {
        let p = Point3::new(0.1, 0.2, 0.3);
        let facing = ObjectKind::Ship.shade(&fragment_at(p, 0.7));
        let edge_on = ObjectKind::Ship.shade(&Fragment {
            normal: Vector3::x(),
            ..fragment_at(p, 0.7)
        });
        let brightness = |c: Rgba| c.r as u32 + c.g as u32 + c.b as u32;
        assert!(brightness(edge_on) < brightness(facing));
    }

    #[test]
    fn test_all_shaders_produce_opaque_colours() {
        let samples = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.7, 0.0, 0.7),
            Point3::new(-0.3, -0.9, 0.3),
            Point3::new(0.6, -0.35, 0.72),
        ];
        for kind in ObjectKind::ALL {
            if kind == ObjectKind::Unlit {
                continue;
            }
            for p in samples {
                let color = kind.shade(&fragment_at(p, 0.7));
                assert_eq!(color.a, 255, "{:?} produced translucent colour", kind);
            }
        }
    }

    #[test]
    fn test_lit_bodies_darken_with_intensity() {
        let p = Point3::new(0.3, 0.2, 0.93);
        let brightness = |c: Rgba| c.r as u32 + c.g as u32 + c.b as u32;
        for kind in [ObjectKind::Earth, ObjectKind::Mars, ObjectKind::Uranus] {
            let bright = brightness(kind.shade(&fragment_at(p, 1.0)));
            let dim = brightness(kind.shade(&fragment_at(p, 0.05)));
            assert!(bright > dim, "{:?} did not darken", kind);
        }
    }

    #[test]
    fn test_sun_ignores_intensity() {
        let p = Point3::new(0.3, 0.2, 0.93);
        assert_eq!(
            ObjectKind::Sun.shade(&fragment_at(p, 1.0)),
            ObjectKind::Sun.shade(&fragment_at(p, 0.01))
        );
    }
}
