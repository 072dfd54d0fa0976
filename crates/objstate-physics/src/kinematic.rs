//! In-memory kinematic backend built from oriented boxes.
//!
//! [`KinematicWorld`] answers every [`PhysicsBackend`] query from box
//! geometry alone: bodies stay exactly where they are put, stepping only
//! advances a substep counter, and contacts are reported wherever two
//! bounding boxes overlap or come within the contact margin. It stands in
//! for a real engine in tests and in the demo binary.

// glam operators are float math and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use std::collections::BTreeMap;

use glam::{DMat3, DVec3};
use objstate_types::{Aabb, ContactPoint, ObjectId, Pose};
use tracing::trace;

use crate::backend::PhysicsBackend;
use crate::error::PhysicsError;

/// Default distance under which two separated boxes still count as touching.
pub const DEFAULT_CONTACT_MARGIN: f64 = 1e-3;

/// A box-shaped body.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBody {
    /// Half extents of the box in its local frame.
    pub half_extents: DVec3,
    /// World pose of the box center.
    pub pose: Pose,
}

impl BoxBody {
    /// World-space bounding box of the (possibly rotated) body.
    pub fn world_aabb(&self) -> Aabb {
        let rot = DMat3::from_quat(self.pose.orientation);
        let he = self.half_extents;
        let world_half =
            rot.x_axis.abs() * he.x + rot.y_axis.abs() * he.y + rot.z_axis.abs() * he.z;
        Aabb::from_center_half_extents(self.pose.position, world_half)
    }
}

/// Box-world physics backend.
#[derive(Debug, Clone)]
pub struct KinematicWorld {
    bodies: BTreeMap<ObjectId, BoxBody>,
    contact_margin: f64,
    substeps: u64,
}

impl KinematicWorld {
    /// Create an empty world with the default contact margin.
    pub const fn new() -> Self {
        Self {
            bodies: BTreeMap::new(),
            contact_margin: DEFAULT_CONTACT_MARGIN,
            substeps: 0,
        }
    }

    /// Override the contact margin.
    #[must_use]
    pub const fn with_contact_margin(mut self, margin: f64) -> Self {
        self.contact_margin = margin;
        self
    }

    /// Add a box body for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::DuplicateBody`] if the body already exists.
    pub fn add_box(
        &mut self,
        id: ObjectId,
        half_extents: DVec3,
        pose: Pose,
    ) -> Result<(), PhysicsError> {
        if self.bodies.contains_key(&id) {
            return Err(PhysicsError::DuplicateBody(id));
        }
        self.bodies.insert(id, BoxBody { half_extents, pose });
        Ok(())
    }

    /// Remove a body, returning it if it existed.
    pub fn remove_body(&mut self, id: ObjectId) -> Option<BoxBody> {
        self.bodies.remove(&id)
    }

    /// Look up a body.
    pub fn body(&self, id: ObjectId) -> Option<&BoxBody> {
        self.bodies.get(&id)
    }

    /// Number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Total substeps advanced since creation.
    pub const fn substeps_elapsed(&self) -> u64 {
        self.substeps
    }

    fn body_or_err(&self, id: ObjectId) -> Result<&BoxBody, PhysicsError> {
        self.bodies.get(&id).ok_or(PhysicsError::UnknownBody(id))
    }

    /// Contact between two boxes, if they overlap or are within the margin.
    fn box_contact(&self, a_id: ObjectId, a: &Aabb, b_id: ObjectId, b: &Aabb) -> Option<ContactPoint> {
        let lo = a.min.max(b.min);
        let hi = a.max.min(b.max);
        let overlap = hi - lo;
        if overlap.min_element() < -self.contact_margin {
            return None;
        }

        // Separate along the axis of least overlap.
        let axis = if overlap.x <= overlap.y && overlap.x <= overlap.z {
            DVec3::X
        } else if overlap.y <= overlap.z {
            DVec3::Y
        } else {
            DVec3::Z
        };
        let direction = (b.center() - a.center()).dot(axis);
        let normal = if direction < 0.0 { -axis } else { axis };

        Some(ContactPoint {
            body_a: a_id,
            body_b: b_id,
            position: (lo + hi) * 0.5,
            normal,
            penetration_depth: overlap.min_element().max(0.0),
        })
    }
}

impl Default for KinematicWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsBackend for KinematicWorld {
    fn aabb(&self, body: ObjectId) -> Result<Aabb, PhysicsError> {
        Ok(self.body_or_err(body)?.world_aabb())
    }

    fn pose(&self, body: ObjectId) -> Result<Pose, PhysicsError> {
        Ok(self.body_or_err(body)?.pose)
    }

    fn contacts(&self, body: ObjectId) -> Result<Vec<ContactPoint>, PhysicsError> {
        let own = self.body_or_err(body)?.world_aabb();
        Ok(self
            .bodies
            .iter()
            .filter(|(id, _)| **id != body)
            .filter_map(|(id, other)| self.box_contact(body, &own, *id, &other.world_aabb()))
            .collect())
    }

    fn set_pose(&mut self, body: ObjectId, pose: Pose) -> Result<(), PhysicsError> {
        let entry = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        entry.pose = pose;
        trace!(body = %body, position = ?pose.position, "pose committed");
        Ok(())
    }

    fn step(&mut self, substeps: u32) {
        self.substeps = self.substeps.saturating_add(u64::from(substeps));
    }
}
