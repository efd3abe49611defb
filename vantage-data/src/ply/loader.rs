//! PLY decoding built on serde-ply.
//!
//! Vertex elements are decoded into property maps so files with unknown
//! extra properties (confidence, intensity, splat parameters) still load.

use crate::geometry::{DEFAULT_COLOR, Geometry};
use glam::Vec3;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PLY parsing error: {0}")]
    Parse(String),
    #[error("missing property '{property}' at vertex {index}")]
    MissingProperty { property: &'static str, index: usize },
    #[error("face references vertex {index} but file has {vertex_count} vertices")]
    FaceIndexOutOfRange { index: i64, vertex_count: usize },
    #[error("face with {0} vertices (need at least 3)")]
    DegenerateFace(usize),
}

#[derive(Deserialize, Debug)]
struct PlyFace {
    vertex_indices: Vec<i32>,
}

#[derive(Deserialize, Debug)]
struct PlyFile {
    #[serde(rename = "vertex")]
    vertex: Vec<HashMap<String, JsonValue>>,
    #[serde(default, rename = "face")]
    face: Vec<PlyFace>,
}

/// Decode a PLY document (ASCII or binary) into [`Geometry`].
pub fn decode_ply<R: std::io::BufRead>(reader: R) -> Result<Geometry, PlyError> {
    let ply: PlyFile = serde_ply::from_reader(reader).map_err(|e| PlyError::Parse(e.to_string()))?;

    info!(
        "PLY parsed: {} vertices, {} faces",
        ply.vertex.len(),
        ply.face.len()
    );

    let mut positions = Vec::with_capacity(ply.vertex.len());
    let mut normals = Vec::with_capacity(ply.vertex.len());
    let mut colors = Vec::with_capacity(ply.vertex.len());
    let mut normals_complete = true;

    for (i, vertex) in ply.vertex.iter().enumerate() {
        let x = get_f32(vertex.get("x")).ok_or(PlyError::MissingProperty {
            property: "x",
            index: i,
        })?;
        let y = get_f32(vertex.get("y")).ok_or(PlyError::MissingProperty {
            property: "y",
            index: i,
        })?;
        let z = get_f32(vertex.get("z")).ok_or(PlyError::MissingProperty {
            property: "z",
            index: i,
        })?;
        positions.push(Vec3::new(x, y, z));

        if normals_complete {
            match (
                get_f32(vertex.get("nx")),
                get_f32(vertex.get("ny")),
                get_f32(vertex.get("nz")),
            ) {
                (Some(nx), Some(ny), Some(nz)) => normals.push(Vec3::new(nx, ny, nz)),
                _ => normals_complete = false,
            }
        }

        colors.push(vertex_color(vertex));
    }

    if !normals_complete {
        if !normals.is_empty() {
            warn!("normals missing on some vertices, discarding partial normals");
        }
        normals.clear();
    }

    let faces = triangulate_faces(&ply.face, positions.len())?;

    debug!(
        "decoded {} vertices into {} triangles",
        positions.len(),
        faces.len()
    );

    Ok(Geometry {
        positions,
        normals,
        colors,
        faces,
    })
}

/// Decode a PLY file from disk.
pub fn load_ply_file<P: AsRef<Path>>(path: P) -> Result<Geometry, PlyError> {
    let file = File::open(path)?;
    decode_ply(BufReader::new(file))
}

fn get_f32(prop: Option<&JsonValue>) -> Option<f32> {
    prop.and_then(|v| match v {
        JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
        _ => None,
    })
}

fn get_u8(prop: Option<&JsonValue>) -> Option<u8> {
    prop.and_then(|v| match v {
        JsonValue::Number(n) => n
            .as_u64()
            .map(|u| u as u8)
            .or_else(|| n.as_i64().map(|i| i as u8)),
        _ => None,
    })
}

fn vertex_color(vertex: &HashMap<String, JsonValue>) -> Vec3 {
    if let (Some(r), Some(g), Some(b)) = (
        get_u8(vertex.get("red")),
        get_u8(vertex.get("green")),
        get_u8(vertex.get("blue")),
    ) {
        Vec3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    } else if let (Some(r), Some(g), Some(b)) = (
        get_u8(vertex.get("r")),
        get_u8(vertex.get("g")),
        get_u8(vertex.get("b")),
    ) {
        Vec3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    } else {
        DEFAULT_COLOR
    }
}

/// Fan-triangulate polygon faces, validating every index.
fn triangulate_faces(faces: &[PlyFace], vertex_count: usize) -> Result<Vec<[u32; 3]>, PlyError> {
    let mut triangles = Vec::with_capacity(faces.len());

    for face in faces {
        let indices = &face.vertex_indices;
        if indices.len() < 3 {
            return Err(PlyError::DegenerateFace(indices.len()));
        }

        let check = |raw: i32| -> Result<u32, PlyError> {
            if raw < 0 || raw as usize >= vertex_count {
                Err(PlyError::FaceIndexOutOfRange {
                    index: raw as i64,
                    vertex_count,
                })
            } else {
                Ok(raw as u32)
            }
        };

        let anchor = check(indices[0])?;
        for pair in indices[1..].windows(2) {
            triangles.push([anchor, check(pair[0])?, check(pair[1])?]);
        }
    }

    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TETRAHEDRON: &str = "\
ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
element face 4
property list uchar int vertex_indices
end_header
0 0 0 255 0 0
1 0 0 0 255 0
0 1 0 0 0 255
0 0 1 128 128 128
3 0 1 2
3 0 1 3
3 0 2 3
3 1 2 3
";

    const POINTS_ONLY: &str = "\
ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
end_header
0 0 0
1 2 3
-1 -2 -3
";

    const QUAD: &str = "\
ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3
";

    #[test]
    fn decodes_mesh_with_colors() {
        let geometry = decode_ply(Cursor::new(TETRAHEDRON)).unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.faces.len(), 4);
        assert!(geometry.has_faces());
        assert!(!geometry.has_normals());
        assert_eq!(geometry.colors[0], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(geometry.positions[1], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn decodes_point_cloud_with_default_color() {
        let geometry = decode_ply(Cursor::new(POINTS_ONLY)).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert!(!geometry.has_faces());
        assert_eq!(geometry.colors[0], DEFAULT_COLOR);
    }

    #[test]
    fn quad_is_fan_triangulated() {
        let geometry = decode_ply(Cursor::new(QUAD)).unwrap();
        assert_eq!(geometry.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn face_index_out_of_range_is_an_error() {
        let bad = QUAD.replace("4 0 1 2 3", "3 0 1 9");
        let err = decode_ply(Cursor::new(bad)).unwrap_err();
        assert!(matches!(err, PlyError::FaceIndexOutOfRange { index: 9, .. }));
    }

    #[test]
    fn truncated_header_is_a_parse_error() {
        let err = decode_ply(Cursor::new("ply\nformat ascii 1.0\n")).unwrap_err();
        assert!(matches!(err, PlyError::Parse(_)));
    }

    #[test]
    fn loads_a_file_from_disk() {
        let path = std::env::temp_dir().join("vantage_loader_test.ply");
        std::fs::write(&path, POINTS_ONLY).unwrap();
        let geometry = load_ply_file(&path).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_ply_file("/no/such/model.ply").unwrap_err();
        assert!(matches!(err, PlyError::Io(_)));
    }
}
