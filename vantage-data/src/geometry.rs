//! CPU-side geometry extracted from a model file.
//!
//! GPU-specific types with bytemuck derive live in vantage-gpu.

use glam::Vec3;

/// Default color used when a file carries no per-vertex color.
pub const DEFAULT_COLOR: Vec3 = Vec3::new(0.8, 0.8, 0.8);

/// Raw geometry: positions plus optional per-vertex attributes and faces.
///
/// `colors` always has one entry per position (filled with
/// [`DEFAULT_COLOR`] when the file has none). `normals` is either empty
/// or position-length. `faces` is empty for a pure point cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

impl Geometry {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether the geometry carries face connectivity (mesh vs point cloud).
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Whether per-vertex normals are present.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_geometry_has_no_faces_or_normals() {
        let g = Geometry::default();
        assert!(g.is_empty());
        assert!(!g.has_faces());
        assert!(!g.has_normals());
        assert_eq!(g.vertex_count(), 0);
    }

    #[test]
    fn vertex_count_tracks_positions() {
        let g = Geometry {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            colors: vec![DEFAULT_COLOR; 3],
            ..Default::default()
        };
        assert_eq!(g.vertex_count(), 3);
        assert!(!g.has_faces());
    }
}
