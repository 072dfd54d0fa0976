//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the run
//! loop, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: objstate_core::ConfigError,
    },

    /// The state registry failed validation.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: objstate_states::RegistryError,
    },

    /// A simulator operation failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: objstate_core::SimulationError,
    },

    /// Building the demo world failed.
    #[error("physics error: {source}")]
    Physics {
        /// The underlying physics error.
        #[from]
        source: objstate_physics::PhysicsError,
    },
}
