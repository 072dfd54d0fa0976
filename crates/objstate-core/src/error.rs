//! Error types for the simulator facade.

use objstate_states::{RegistryError, StateError};
use objstate_types::{ObjectId, StateKind};

/// Errors returned by [`Simulator`](crate::simulator::Simulator) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// An object with this id is already in the scene.
    #[error("object {0} is already in the scene")]
    DuplicateObject(ObjectId),

    /// No object with this id is in the scene.
    #[error("unknown object: {0}")]
    UnknownObject(ObjectId),

    /// The object does not carry the requested state.
    #[error("object {object} has no {state} state")]
    MissingState {
        /// The object queried.
        object: ObjectId,
        /// The state it lacks.
        state: StateKind,
    },

    /// A state rejected the operation.
    #[error("state error: {source}")]
    State {
        /// The underlying state error.
        #[from]
        source: StateError,
    },

    /// The registry rejected the object's abilities.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },
}
