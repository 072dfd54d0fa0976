//! Shared type definitions for the object-state engine.
//!
//! This crate is the single source of truth for the identifiers, closed
//! enumerations, geometry, and values exchanged between the state engine and
//! the physics backend.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for object identifiers
//! - [`enums`] -- State kinds, abilities, arity and value kinds
//! - [`geometry`] -- Poses and axis-aligned bounding boxes
//! - [`value`] -- State values and contact points

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod value;

// Re-export all public types at crate root for convenience.
pub use enums::{Ability, Arity, StateKind, UnknownIdentifier, ValueKind};
pub use geometry::{Aabb, Pose};
pub use ids::ObjectId;
pub use value::{ContactPoint, StateValue};

// Re-export the vector types so downstream crates agree on one `glam`.
pub use glam::{DQuat, DVec3};
