//! Error types for the `objstate-states` crate.
//!
//! [`RegistryError`] covers misconfiguration that must be caught once at
//! startup, before any object is instantiated. [`StateError`] covers
//! everything that can go wrong while reading, setting, or updating states
//! at runtime; all of its variants are recoverable.

use objstate_physics::PhysicsError;
use objstate_types::{ObjectId, StateKind, UnknownIdentifier, ValueKind};

/// Startup-time registry and dependency-graph errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A state identifier is not registered.
    #[error("unknown state: {0}")]
    UnknownState(String),

    /// An ability has no state mapping.
    #[error("unknown ability: {0}")]
    UnknownAbility(String),

    /// The same state was registered twice.
    #[error("state registered twice: {0}")]
    DuplicateState(StateKind),

    /// The dependency graph contains a cycle.
    #[error("cyclic state dependency: {}", format_cycle(.cycle))]
    CyclicDependency {
        /// The states along the cycle, first state repeated at the end.
        cycle: Vec<StateKind>,
    },
}

impl From<UnknownIdentifier> for RegistryError {
    fn from(err: UnknownIdentifier) -> Self {
        if err.category == "ability" {
            Self::UnknownAbility(err.name)
        } else {
            Self::UnknownState(err.name)
        }
    }
}

fn format_cycle(cycle: &[StateKind]) -> String {
    cycle
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Runtime errors raised while reading, setting, or updating states.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    /// The state does not support the requested operation.
    #[error("{state} does not support this operation: {reason}")]
    UnsupportedOperation {
        /// The state that rejected the operation.
        state: StateKind,
        /// Why it was rejected.
        reason: String,
    },

    /// The placement search exhausted its attempt budget.
    #[error("could not make {object} {relation} {target} after {attempts} attempts")]
    PlacementFailure {
        /// The object being placed.
        object: ObjectId,
        /// The relation being realized.
        relation: StateKind,
        /// The reference object.
        target: ObjectId,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// A dependency needed by a state is not present on the object.
    #[error("object {object} has no {state} state")]
    MissingDependencyValue {
        /// The object that lacks the state.
        object: ObjectId,
        /// The missing state.
        state: StateKind,
    },

    /// A value of the wrong kind was supplied.
    #[error("{state} expects a {expected:?} value, got {actual:?}")]
    ValueKindMismatch {
        /// The state being set.
        state: StateKind,
        /// The kind the state accepts.
        expected: ValueKind,
        /// The kind that was supplied.
        actual: ValueKind,
    },

    /// The object is not part of the scene.
    #[error("unknown object: {0}")]
    UnknownObject(ObjectId),

    /// The physics backend failed.
    #[error("physics error: {source}")]
    Physics {
        /// The underlying backend error.
        #[from]
        source: PhysicsError,
    },

    /// The registry rejected a lookup.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },
}

impl StateError {
    /// Shorthand for [`StateError::UnsupportedOperation`].
    pub fn unsupported(state: StateKind, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            state,
            reason: reason.into(),
        }
    }

    /// Whether this error means "the relation does not apply" rather than a
    /// real failure.
    pub const fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingDependencyValue { .. })
    }
}
