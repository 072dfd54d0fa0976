//! Physics backend boundary for the object-state engine.
//!
//! The physics engine is an external collaborator. This crate defines the
//! narrow interface the state engine consumes and ships one in-memory
//! implementation.
//!
//! # Modules
//!
//! - [`backend`] -- The [`PhysicsBackend`] trait.
//! - [`error`] -- [`PhysicsError`].
//! - [`kinematic`] -- [`KinematicWorld`], a box-world backend that never
//!   moves bodies on its own.

pub mod backend;
pub mod error;
pub mod kinematic;

pub use backend::PhysicsBackend;
pub use error::PhysicsError;
pub use kinematic::{BoxBody, DEFAULT_CONTACT_MARGIN, KinematicWorld};
