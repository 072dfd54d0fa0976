//! Configuration loading for the object-state simulator.
//!
//! The canonical configuration lives in `objstate-config.yaml` at the
//! project root. Every section and field has a default, so an empty file
//! (or no file at all) yields a working configuration.
//!
//! ```yaml
//! simulation:
//!   seed: 42
//!   physics_substeps_per_tick: 1
//!   max_ticks: 100
//! particles:
//!   count: 100
//!   clean_threshold: 0.9
//! placement:
//!   max_attempts: 100
//! logging:
//!   level: info
//! ```

use std::path::Path;

use objstate_states::StatesConfig;
use serde::Deserialize;

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "OBJSTATE_LOG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulator configuration.
///
/// Mirrors the structure of `objstate-config.yaml`. The state-family
/// sections (`particles`, `placement`, `kinematics`, `thermal`) sit at the
/// top level of the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulatorConfig {
    /// Seed, stepping, and run length.
    #[serde(default)]
    pub simulation: SimulationSection,

    /// Tunables for every state family.
    #[serde(flatten)]
    pub states: StatesConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulatorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OBJSTATE_LOG` overrides `logging.level`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Seed, stepping, and run length.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationSection {
    /// Seed of the simulation RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Physics substeps advanced by each `step`.
    #[serde(default = "default_physics_substeps_per_tick")]
    pub physics_substeps_per_tick: u32,

    /// Ticks the engine binary runs before stopping.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            physics_substeps_per_tick: default_physics_substeps_per_tick(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Replace the level with `OBJSTATE_LOG` when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV)
            && !level.trim().is_empty()
        {
            self.level = level;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_physics_substeps_per_tick() -> u32 {
    1
}

const fn default_max_ticks() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SimulatorConfig::parse("{}").unwrap();
        assert_eq!(config, SimulatorConfig::default());
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.physics_substeps_per_tick, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.states.particles.count, 100);
    }

    #[test]
    fn sections_override_selectively() {
        let yaml = r"
simulation:
  seed: 7
particles:
  count: 20
  clean_threshold: 0.5
placement:
  max_attempts: 3
thermal:
  ambient_temperature: 18.0
logging:
  level: debug
";
        let config = SimulatorConfig::parse(yaml).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.max_ticks, 100);
        assert_eq!(config.states.particles.count, 20);
        assert_eq!(config.states.particles.clean_threshold, 0.5);
        assert_eq!(config.states.particles.aabb_inflation, 0.1);
        assert_eq!(config.states.placement.max_attempts, 3);
        assert_eq!(config.states.placement.settle_substeps, 10);
        assert_eq!(config.states.thermal.ambient_temperature, 18.0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let err = SimulatorConfig::parse("simulation: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn shipped_config_spells_out_the_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../objstate-config.yaml");
        let contents = std::fs::read_to_string(path).unwrap();
        let config = SimulatorConfig::parse(&contents).unwrap();
        assert_eq!(config, SimulatorConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimulatorConfig::from_file(Path::new("/nonexistent/objstate.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
