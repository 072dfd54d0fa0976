//! Error types for the `objstate-physics` crate.

use objstate_types::ObjectId;

/// Errors reported by a physics backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhysicsError {
    /// The backend has no body for this object.
    #[error("no physics body for object {0}")]
    UnknownBody(ObjectId),

    /// A body with this identifier already exists.
    #[error("duplicate physics body for object {0}")]
    DuplicateBody(ObjectId),

    /// The backend rejected the request.
    #[error("physics backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}
