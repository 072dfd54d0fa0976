//! Demo binary for the object-state engine.
//!
//! Loads configuration, builds a small kitchen scene in the in-memory box
//! world, and steps the simulator for `simulation.max_ticks` ticks, logging
//! every state transition.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `objstate-config.yaml` (or `OBJSTATE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate the standard state registry
//! 4. Build the demo scene
//! 5. Run the tick loop
//! 6. Log the result

mod demo;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use objstate_core::{Simulator, SimulatorConfig};
use objstate_physics::KinematicWorld;
use objstate_states::StateRegistry;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::demo::Watcher;
use crate::error::EngineError;

/// Environment variable naming the configuration file.
const CONFIG_PATH_ENV: &str = "OBJSTATE_CONFIG";

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "objstate-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, registry validation, or scene
/// construction fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("objstate-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        seed = config.simulation.seed,
        substeps = config.simulation.physics_substeps_per_tick,
        max_ticks = config.simulation.max_ticks,
        particle_count = config.states.particles.count,
        "Simulation parameters"
    );

    // 3. Validate the registry.
    let registry = Arc::new(StateRegistry::standard().map_err(EngineError::from)?);
    info!(
        states = registry.descriptors().len(),
        "State registry ready"
    );

    // 4. Build the scene.
    let max_ticks = config.simulation.max_ticks;
    let mut sim = Simulator::new(registry, KinematicWorld::new(), config);
    let scene = demo::build(&mut sim)?;
    info!(
        table = %scene.table,
        sink = %scene.sink,
        stove = %scene.stove,
        "Fixtures in place"
    );
    let mut watcher = Watcher::new(&scene);
    watcher.report(&sim);

    // 5. Run.
    let mut failures = 0usize;
    for tick in 1..=max_ticks {
        demo::scripted_actions(&mut sim, &scene, tick)?;
        let summary = sim.step();
        if !summary.failures.is_empty() {
            warn!(
                tick = summary.tick,
                failures = summary.failures.len(),
                "Tick finished with failed updates"
            );
            failures = failures.saturating_add(summary.failures.len());
        }
        watcher.report(&sim);
    }

    // 6. Result.
    info!(
        ticks = sim.tick_count(),
        substeps = sim.physics().substeps_elapsed(),
        failures,
        "objstate-engine finished"
    );
    Ok(())
}

/// Load configuration from `OBJSTATE_CONFIG` or `objstate-config.yaml`.
///
/// Falls back to defaults if the file does not exist. Returns the path
/// that was read, if any.
fn load_config() -> Result<(SimulatorConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os(CONFIG_PATH_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = SimulatorConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = SimulatorConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, None))
    }
}
