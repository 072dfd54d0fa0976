//! Scene, per-tick scheduling, and the simulator facade.
//!
//! This crate drives the state engine: it keeps the live objects and the
//! state-kind index, runs one update pass per tick in dependency order, and
//! exposes get/set of absolute and relative states through [`Simulator`].
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `objstate-config.yaml`.
//! - [`error`] -- [`SimulationError`].
//! - [`scene`] -- [`Scene`] and [`SimObject`].
//! - [`scheduler`] -- The update pass and [`TickSummary`].
//! - [`simulator`] -- [`Simulator`], the entry point for callers.

pub mod config;
pub mod error;
pub mod scene;
pub mod scheduler;
pub mod simulator;

pub use config::{ConfigError, LoggingConfig, SimulationSection, SimulatorConfig};
pub use error::SimulationError;
pub use scene::{Scene, SimObject};
pub use scheduler::{TickSummary, UpdateFailure, run_state_updates};
pub use simulator::Simulator;
