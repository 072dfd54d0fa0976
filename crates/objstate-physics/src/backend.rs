//! The physics-engine boundary consumed by the state engine.
//!
//! The state engine never simulates rigid bodies itself. Everything it needs
//! from the physics engine goes through [`PhysicsBackend`]: bounding-box and
//! transform queries, contact queries, and the ability to commit a pose and
//! advance the engine by a bounded number of substeps.

use objstate_types::{Aabb, ContactPoint, ObjectId, Pose};

use crate::error::PhysicsError;

/// A physics engine as seen by the state engine.
///
/// Bodies are addressed by the [`ObjectId`] of the simulated object that
/// owns them. Query methods take `&self` so that any number of states can
/// read the engine during a tick; only placement mutates it.
pub trait PhysicsBackend {
    /// Axis-aligned bounding box of the body in world coordinates.
    fn aabb(&self, body: ObjectId) -> Result<Aabb, PhysicsError>;

    /// Current world pose of the body.
    fn pose(&self, body: ObjectId) -> Result<Pose, PhysicsError>;

    /// All contacts between the body and any other body.
    fn contacts(&self, body: ObjectId) -> Result<Vec<ContactPoint>, PhysicsError>;

    /// Teleport the body to `pose`.
    fn set_pose(&mut self, body: ObjectId, pose: Pose) -> Result<(), PhysicsError>;

    /// Advance the engine by `substeps` fixed substeps.
    fn step(&mut self, substeps: u32);
}
