//! Tunable parameters for the state families.
//!
//! These sections are embedded in `objstate-config.yaml` (see the
//! `objstate-core` config loader) and bundled into [`StatesConfig`], which
//! every state receives by reference. Every field has a default, so a
//! partial YAML section only overrides what it names.

use serde::Deserialize;

/// Particle populations used by `dirty` and `stained`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Particles allocated per population (default: 100).
    pub count: usize,

    /// Fraction of active particles at or below which the object counts as
    /// clean (default: 0.9).
    pub clean_threshold: f64,

    /// Fraction of a cleaner's extent added on each side of its bounding
    /// box when sweeping particles (default: 0.1).
    pub aabb_inflation: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 100,
            clean_threshold: 0.9,
            aabb_inflation: 0.1,
        }
    }
}

/// Constrained random placement for settable relations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Candidate poses tried before giving up (default: 100).
    pub max_attempts: u32,

    /// Physics substeps run after committing each candidate (default: 10).
    pub settle_substeps: u32,

    /// Deepest tolerated overlap with bodies other than the target
    /// (default: 0.01).
    pub max_penetration: f64,

    /// Half-width of the yaw perturbation window in radians (default: 0.15).
    pub orientation_jitter: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            settle_substeps: 10,
            max_penetration: 0.01,
            orientation_jitter: 0.15,
        }
    }
}

/// Geometric tolerances for kinematic relations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Vertical gap under which a body counts as resting on another
    /// (default: 0.02).
    pub contact_tolerance: f64,

    /// Largest horizontal gap for `next_to` (default: 0.1).
    pub next_to_distance: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            contact_tolerance: 0.02,
            next_to_distance: 0.1,
        }
    }
}

/// Heat transfer for the temperature family.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Room temperature objects start at and decay towards (default: 23.0).
    pub ambient_temperature: f64,

    /// Fraction of the gap to ambient closed per tick when no heat source
    /// is near (default: 0.05).
    pub cooling_rate: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            ambient_temperature: 23.0,
            cooling_rate: 0.05,
        }
    }
}

/// Every state-family section in one bundle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatesConfig {
    /// Particle populations.
    pub particles: ParticleConfig,
    /// Relation placement.
    pub placement: PlacementConfig,
    /// Relation tolerances.
    pub kinematics: KinematicsConfig,
    /// Temperature family.
    pub thermal: ThermalConfig,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = StatesConfig::default();
        assert_eq!(config.particles.count, 100);
        assert_eq!(config.particles.clean_threshold, 0.9);
        assert_eq!(config.placement.max_attempts, 100);
        assert_eq!(config.thermal.ambient_temperature, 23.0);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: StatesConfig =
            serde_json::from_str(r#"{"particles": {"count": 10}}"#).unwrap();
        assert_eq!(config.particles.count, 10);
        assert_eq!(config.particles.aabb_inflation, 0.1);
        assert_eq!(config.placement, PlacementConfig::default());
    }
}
