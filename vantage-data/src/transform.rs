//! The display transform: normalize a freshly decoded model for
//! presentation.
//!
//! Every model is shown the same way regardless of where it came from:
//! bounding-box center moved to the origin, then uniformly scaled so the
//! largest box dimension spans [`TARGET_EXTENT`] world units. Normals are
//! generated from faces when the file carries none.

use crate::bounds::Aabb;
use crate::geometry::Geometry;
use glam::Vec3;
use tracing::debug;

/// World-space size the largest model dimension is mapped to.
pub const TARGET_EXTENT: f32 = 5.0;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("model has no vertices")]
    EmptyGeometry,
}

/// Centering translation plus uniform scale, derived from a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub center: Vec3,
    pub scale: f32,
}

impl DisplayTransform {
    /// Derive the transform for `bounds`. A degenerate box (all points
    /// coincident) keeps unit scale.
    pub fn for_bounds(bounds: &Aabb) -> Self {
        let extent = bounds.max_extent();
        let scale = if extent > f32::EPSILON {
            TARGET_EXTENT / extent
        } else {
            1.0
        };
        Self {
            center: bounds.center(),
            scale,
        }
    }

    /// Translate to the origin, then scale.
    pub fn apply(&self, point: Vec3) -> Vec3 {
        (point - self.center) * self.scale
    }
}

/// A model ready for upload: transformed geometry plus the transform that
/// produced it.
#[derive(Debug, Clone)]
pub struct PreparedModel {
    pub geometry: Geometry,
    pub transform: DisplayTransform,
}

/// Run the display transform over raw geometry.
pub fn prepare_for_display(mut geometry: Geometry) -> Result<PreparedModel, TransformError> {
    let bounds =
        Aabb::from_positions(geometry.positions.iter().copied()).ok_or(TransformError::EmptyGeometry)?;
    let transform = DisplayTransform::for_bounds(&bounds);

    for position in &mut geometry.positions {
        *position = transform.apply(*position);
    }

    if geometry.has_faces() && !geometry.has_normals() {
        compute_vertex_normals(&mut geometry);
    }

    debug!(
        "prepared model: center={:?}, scale={}, {} vertices",
        transform.center,
        transform.scale,
        geometry.vertex_count()
    );

    Ok(PreparedModel {
        geometry,
        transform,
    })
}

/// Area-weighted vertex normals accumulated from face cross products.
pub fn compute_vertex_normals(geometry: &mut Geometry) {
    let mut normals = vec![Vec3::ZERO; geometry.positions.len()];

    for [i0, i1, i2] in &geometry.faces {
        let v0 = geometry.positions[*i0 as usize];
        let v1 = geometry.positions[*i1 as usize];
        let v2 = geometry.positions[*i2 as usize];
        // Cross product length is proportional to face area, so larger
        // faces contribute more before normalization.
        let face_normal = (v1 - v0).cross(v2 - v0);
        normals[*i0 as usize] += face_normal;
        normals[*i1 as usize] += face_normal;
        normals[*i2 as usize] += face_normal;
    }

    for normal in &mut normals {
        *normal = normal.normalize_or_zero();
    }

    geometry.normals = normals;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DEFAULT_COLOR;

    fn box_geometry(min: Vec3, max: Vec3) -> Geometry {
        let positions = vec![
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        let colors = vec![DEFAULT_COLOR; positions.len()];
        Geometry {
            positions,
            colors,
            ..Default::default()
        }
    }

    #[test]
    fn centers_bounding_box_at_origin() {
        let prepared =
            prepare_for_display(box_geometry(Vec3::new(2.0, 4.0, 6.0), Vec3::new(6.0, 8.0, 10.0)))
                .unwrap();
        let bounds = Aabb::from_positions(prepared.geometry.positions.iter().copied()).unwrap();
        assert!(bounds.center().length() < 1e-5);
    }

    #[test]
    fn scales_largest_dimension_to_target() {
        let prepared =
            prepare_for_display(box_geometry(Vec3::ZERO, Vec3::new(8.0, 2.0, 4.0))).unwrap();
        let bounds = Aabb::from_positions(prepared.geometry.positions.iter().copied()).unwrap();
        assert_eq!(bounds.max_extent(), TARGET_EXTENT);
        // Uniform scale: the other dimensions shrink proportionally.
        assert_eq!(bounds.size().y, TARGET_EXTENT * 2.0 / 8.0);
    }

    #[test]
    fn transform_is_idempotent_on_prepared_geometry() {
        let once =
            prepare_for_display(box_geometry(Vec3::new(-3.0, 1.0, 0.0), Vec3::new(7.0, 2.0, 1.0)))
                .unwrap();
        let twice = prepare_for_display(once.geometry.clone()).unwrap();
        assert_eq!(once.geometry.positions, twice.geometry.positions);
        assert_eq!(twice.transform.scale, 1.0);
    }

    #[test]
    fn degenerate_bounds_keep_unit_scale() {
        let geometry = Geometry {
            positions: vec![Vec3::splat(3.0); 2],
            colors: vec![DEFAULT_COLOR; 2],
            ..Default::default()
        };
        let prepared = prepare_for_display(geometry).unwrap();
        assert_eq!(prepared.transform.scale, 1.0);
        assert_eq!(prepared.geometry.positions[0], Vec3::ZERO);
    }

    #[test]
    fn empty_geometry_is_rejected() {
        assert!(matches!(
            prepare_for_display(Geometry::default()),
            Err(TransformError::EmptyGeometry)
        ));
    }

    #[test]
    fn normals_are_generated_for_meshes_without_them() {
        let mut geometry = box_geometry(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        geometry.positions[3] = Vec3::new(0.0, 1.0, 0.0);
        geometry.faces = vec![[0, 1, 2], [0, 2, 3]];
        let prepared = prepare_for_display(geometry).unwrap();
        assert!(prepared.geometry.has_normals());
        // Planar quad in the XY plane: every normal points along +Z.
        for normal in &prepared.geometry.normals {
            assert!((normal.z - 1.0).abs() < 1e-5, "normal {normal:?}");
        }
    }

    #[test]
    fn existing_normals_are_preserved() {
        let mut geometry = box_geometry(Vec3::ZERO, Vec3::ONE);
        geometry.faces = vec![[0, 1, 2]];
        geometry.normals = vec![Vec3::X; 4];
        let prepared = prepare_for_display(geometry).unwrap();
        assert_eq!(prepared.geometry.normals, vec![Vec3::X; 4]);
    }

    #[test]
    fn point_clouds_get_no_normals() {
        let prepared = prepare_for_display(box_geometry(Vec3::ZERO, Vec3::ONE)).unwrap();
        assert!(!prepared.geometry.has_normals());
    }
}
