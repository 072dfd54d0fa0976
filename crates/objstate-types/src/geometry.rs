//! Geometric primitives shared by states and physics backends.
//!
//! Vectors and rotations are `glam` double-precision types. Every predicate
//! here tolerates degenerate input (zero-extent boxes, NaN-free but tiny
//! volumes) by answering `false` rather than failing.

// glam operators are float math and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// World pose of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position of the body origin in world coordinates.
    pub position: DVec3,
    /// Orientation as a unit quaternion.
    pub orientation: DQuat,
}

impl Pose {
    /// A pose at `position` with identity orientation.
    pub const fn from_position(position: DVec3) -> Self {
        Self {
            position,
            orientation: DQuat::IDENTITY,
        }
    }

    /// A pose at `position` rotated by `yaw` radians about +Z.
    pub fn from_position_yaw(position: DVec3, yaw: f64) -> Self {
        Self {
            position,
            orientation: DQuat::from_rotation_z(yaw),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(DVec3::ZERO)
    }
}

/// Axis-aligned bounding box with `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Lower corner.
    pub min: DVec3,
    /// Upper corner.
    pub max: DVec3,
}

impl Aabb {
    /// Build a box from two arbitrary corners.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Build a box from its center and (non-negative) half extents.
    pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Full extent along each axis.
    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }

    /// Half extent along each axis.
    pub fn half_extents(&self) -> DVec3 {
        self.extent() * 0.5
    }

    /// Enclosed volume.
    pub fn volume(&self) -> f64 {
        let e = self.extent();
        e.x * e.y * e.z
    }

    /// Whether `point` lies in the closed box.
    pub fn contains_point(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Whether `point` lies strictly inside the box on all three axes.
    pub fn strictly_contains_point(&self, point: DVec3) -> bool {
        point.cmpgt(self.min).all() && point.cmplt(self.max).all()
    }

    /// Whether the x/y projection of `point` lies in the box footprint.
    pub fn footprint_contains(&self, point: DVec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Whether the two closed boxes intersect.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Expand both corners outward by `fraction` of the extent on each axis.
    #[must_use]
    pub fn inflated(&self, fraction: f64) -> Self {
        let margin = self.extent() * fraction;
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Translate the box by `offset`.
    #[must_use]
    pub fn translated(&self, offset: DVec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Horizontal (x/y) separation between two boxes; zero when the
    /// footprints overlap.
    pub fn horizontal_gap(&self, other: &Self) -> f64 {
        let dx = (other.min.x - self.max.x).max(self.min.x - other.max.x).max(0.0);
        let dy = (other.min.y - self.max.y).max(self.min.y - other.max.y).max(0.0);
        dx.hypot(dy)
    }

    /// Whether the vertical (z) ranges of two boxes overlap.
    pub fn z_overlaps(&self, other: &Self) -> bool {
        self.min.z <= other.max.z && other.min.z <= self.max.z
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(DVec3::ZERO, DVec3::ONE)
    }

    #[test]
    fn new_normalizes_corners() {
        let b = Aabb::new(DVec3::ONE, DVec3::ZERO);
        assert_eq!(b.min, DVec3::ZERO);
        assert_eq!(b.max, DVec3::ONE);
    }

    #[test]
    fn volume_and_center() {
        let b = Aabb::new(DVec3::ZERO, DVec3::new(2.0, 3.0, 4.0));
        assert_eq!(b.volume(), 24.0);
        assert_eq!(b.center(), DVec3::new(1.0, 1.5, 2.0));
    }

    #[test]
    fn inflation_is_ten_percent_of_each_extent() {
        let b = Aabb::new(DVec3::ZERO, DVec3::new(10.0, 2.0, 1.0)).inflated(0.1);
        assert!((b.min.x + 1.0).abs() < 1e-12);
        assert!((b.max.x - 11.0).abs() < 1e-12);
        assert!((b.min.y + 0.2).abs() < 1e-12);
        assert!((b.max.z - 1.1).abs() < 1e-12);
    }

    #[test]
    fn strict_containment_excludes_faces() {
        let b = unit_box();
        assert!(b.contains_point(DVec3::new(1.0, 0.5, 0.5)));
        assert!(!b.strictly_contains_point(DVec3::new(1.0, 0.5, 0.5)));
        assert!(b.strictly_contains_point(DVec3::splat(0.5)));
    }

    #[test]
    fn horizontal_gap_is_zero_for_overlapping_footprints() {
        let a = unit_box();
        let b = a.translated(DVec3::new(0.5, 0.0, 5.0));
        assert_eq!(a.horizontal_gap(&b), 0.0);
        let c = a.translated(DVec3::new(3.0, 0.0, 0.0));
        assert!((a.horizontal_gap(&c) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_box_contains_nothing_strictly() {
        let flat = Aabb::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
        assert_eq!(flat.volume(), 0.0);
        assert!(!flat.strictly_contains_point(DVec3::new(0.5, 0.5, 0.0)));
    }
}
