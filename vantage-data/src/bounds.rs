//! Axis-aligned bounding boxes.

use glam::Vec3;

/// Axis-aligned bounding box over a set of positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Compute the box enclosing `positions`. Returns `None` for an
    /// empty iterator.
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut count = 0usize;

        for pos in positions {
            min = min.min(pos);
            max = max.max(pos);
            count += 1;
        }

        (count > 0).then_some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest side length of the box.
    pub fn max_extent(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Diagonal length, floored at 1 so camera framing never degenerates.
    pub fn radius(&self) -> f32 {
        self.size().length().max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_of_unit_points() {
        let bounds = Aabb::from_positions([
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, -2.0, 0.0),
            Vec3::new(0.0, 1.0, -4.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 2.0));
        assert_eq!(bounds.center(), Vec3::new(1.0, -0.5, -1.0));
        assert_eq!(bounds.max_extent(), 6.0);
    }

    #[test]
    fn empty_positions_have_no_bounds() {
        assert!(Aabb::from_positions(std::iter::empty()).is_none());
    }

    #[test]
    fn single_point_bounds_are_degenerate() {
        let bounds = Aabb::from_positions([Vec3::splat(2.0)]).unwrap();
        assert_eq!(bounds.size(), Vec3::ZERO);
        assert_eq!(bounds.radius(), 1.0);
    }
}
