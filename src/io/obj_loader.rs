use crate::geometry::vertex::Vertex;
use log::{debug, info, warn};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        // Positions and normals keep separate index streams
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
    }
}

/// Loads an OBJ file and expands it into a flat triangle list: every three
/// consecutive vertices form one face. Materials are ignored.
pub fn load_obj_mesh<P: AsRef<Path>>(obj_path: P) -> Result<Vec<Vertex>, String> {
    let obj_path = obj_path.as_ref();
    info!("Loading OBJ file: {:?}", obj_path);

    let file = File::open(obj_path)
        .map_err(|e| format!("Failed to open OBJ {}: {}", obj_path.display(), e))?;
    let vertices = load_obj_from_reader(&mut BufReader::new(file))
        .map_err(|e| format!("{}: {}", obj_path.display(), e))?;

    info!("{}: {} triangles", obj_path.display(), vertices.len() / 3);
    Ok(vertices)
}

/// Same as `load_obj_mesh` for OBJ text from any reader. `mtllib`
/// references are not followed.
pub fn load_obj_from_reader<R: BufRead>(reader: &mut R) -> Result<Vec<Vertex>, String> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| format!("Failed to parse OBJ data: {}", e))?;

    debug!("Parsed {} model(s)", models.len());
    expand_models(&models)
}

fn expand_models(models: &[tobj::Model]) -> Result<Vec<Vertex>, String> {
    let mut vertices = Vec::new();

    for model in models {
        let mesh = &model.mesh;
        if mesh.indices.is_empty() {
            debug!("Skipping model '{}' without faces", model.name);
            continue;
        }

        let positions: Vec<Point3<f32>> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0], p[1], p[2]))
            .collect();
        let normals: Vec<Vector3<f32>> = mesh
            .normals
            .chunks_exact(3)
            .map(|n| Vector3::new(n[0], n[1], n[2]))
            .collect();

        let use_normals = !normals.is_empty() && mesh.normal_indices.len() == mesh.indices.len();
        if !use_normals {
            warn!(
                "Model '{}' has no usable normals, using flat face normals",
                model.name
            );
        }

        vertices.reserve(mesh.indices.len());
        for (face, corners) in mesh.indices.chunks_exact(3).enumerate() {
            let mut face_positions = [Point3::origin(); 3];
            for (slot, &index) in face_positions.iter_mut().zip(corners) {
                *slot = *positions.get(index as usize).ok_or_else(|| {
                    format!(
                        "model '{}' face {} references missing position {}",
                        model.name, face, index
                    )
                })?;
            }

            let face_normals = if use_normals {
                let mut face_normals = [Vector3::zeros(); 3];
                let normal_corners = &mesh.normal_indices[face * 3..face * 3 + 3];
                for (slot, &index) in face_normals.iter_mut().zip(normal_corners) {
                    *slot = *normals.get(index as usize).ok_or_else(|| {
                        format!(
                            "model '{}' face {} references missing normal {}",
                            model.name, face, index
                        )
                    })?;
                }
                face_normals
            } else {
                [flat_normal(&face_positions); 3]
            };

            vertices.extend(
                face_positions
                    .iter()
                    .zip(face_normals.iter())
                    .map(|(position, normal)| Vertex::new(*position, *normal)),
            );
        }
    }

    if vertices.is_empty() {
        return Err("no triangles found".to_string());
    }
    Ok(vertices)
}

/// Unit normal of a face, zero for a degenerate face.
fn flat_normal(positions: &[Point3<f32>; 3]) -> Vector3<f32> {
    let normal = (positions[1] - positions[0]).cross(&(positions[2] - positions[0]));
    normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}
