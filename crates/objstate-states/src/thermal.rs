//! Heat sources, temperatures, and the cooked/burnt thresholds.
//!
//! A heat source emits from the top-center of its box while active. Every
//! tick an object's temperature moves a fraction of the way towards each
//! active source within reach, or relaxes towards ambient when none is. The
//! running maximum feeds `cooked` and `burnt`, which latch once the maximum
//! crosses their threshold.

use objstate_types::{DVec3, ObjectId, StateKind};
use tracing::debug;

use crate::context::StateContext;
use crate::error::StateError;
use crate::instance::StateInstance;
use crate::params::{AbilityParams, param_bool, param_f64};

/// Default emitted temperature.
pub const DEFAULT_SOURCE_TEMPERATURE: f64 = 200.0;
/// Default fraction of the gap closed per tick.
pub const DEFAULT_HEATING_RATE: f64 = 0.04;
/// Default reach of a heat source.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 0.2;
/// Default `cooked` threshold.
pub const DEFAULT_COOK_TEMPERATURE: f64 = 70.0;
/// Default `burnt` threshold.
pub const DEFAULT_BURN_TEMPERATURE: f64 = 250.0;

/// Heat emitted by an active source this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatEmission {
    /// Where the heat comes from.
    pub position: DVec3,
    /// Temperature the source drives objects towards.
    pub temperature: f64,
    /// Fraction of the gap closed per tick.
    pub rate: f64,
    /// Maximum distance from `position` to a heated object's center.
    pub reach: f64,
}

/// `heat_source`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatSourceState {
    owner: ObjectId,
    temperature: f64,
    rate: f64,
    reach: f64,
    requires_toggled_on: bool,
    heating_at: Option<DVec3>,
}

impl HeatSourceState {
    /// Build from ability parameters `temperature`, `heating_rate`,
    /// `distance_threshold` and `requires_toggled_on`.
    pub fn new(owner: ObjectId, params: &AbilityParams) -> Self {
        Self {
            owner,
            temperature: param_f64(params, "temperature", DEFAULT_SOURCE_TEMPERATURE),
            rate: param_f64(params, "heating_rate", DEFAULT_HEATING_RATE),
            reach: param_f64(params, "distance_threshold", DEFAULT_DISTANCE_THRESHOLD),
            requires_toggled_on: param_bool(params, "requires_toggled_on", true),
            heating_at: None,
        }
    }

    /// Whether the source emitted heat this tick.
    pub const fn value(&self) -> bool {
        self.heating_at.is_some()
    }

    /// The emission, if active.
    pub fn emission(&self) -> Option<HeatEmission> {
        self.heating_at.map(|position| HeatEmission {
            position,
            temperature: self.temperature,
            rate: self.rate,
            reach: self.reach,
        })
    }

    /// Activate when toggled on (or unconditionally if the source does not
    /// need toggling or has no switch).
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        let active = if self.requires_toggled_on {
            ctx.own_optional_flag(StateKind::ToggledOn)?.unwrap_or(true)
        } else {
            true
        };
        self.heating_at = if active {
            let aabb = ctx.own_aabb()?;
            let center = aabb.center();
            Some(DVec3::new(center.x, center.y, aabb.max.z))
        } else {
            None
        };
        if self.heating_at.is_some() {
            debug!(object = %self.owner, "Heat source active");
        }
        Ok(())
    }
}

/// `temperature`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureState {
    owner: ObjectId,
    value: f64,
}

impl TemperatureState {
    /// An object at `ambient`.
    pub const fn new(owner: ObjectId, ambient: f64) -> Self {
        Self {
            owner,
            value: ambient,
        }
    }

    /// Current temperature.
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Overwrite the temperature.
    pub const fn set(&mut self, value: f64) {
        self.value = value;
    }

    /// Approach every active heat source in reach, otherwise cool down.
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        let center = ctx.own_aabb()?.center();
        let reader = ctx.reader;

        let mut heated = false;
        for source in reader.objects_with_state(StateKind::HeatSource) {
            if source == self.owner {
                continue;
            }
            let emission = match reader.instance(source, StateKind::HeatSource)? {
                StateInstance::HeatSource(state) => state.emission(),
                _ => None,
            };
            let Some(emission) = emission else {
                continue;
            };
            if emission.position.distance(center) <= emission.reach {
                self.value += (emission.temperature - self.value) * emission.rate;
                heated = true;
            }
        }

        if !heated {
            let thermal = &reader.config.thermal;
            self.value += (thermal.ambient_temperature - self.value) * thermal.cooling_rate;
        }
        Ok(())
    }
}

/// `max_temperature`: the highest temperature seen so far.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxTemperatureState {
    owner: ObjectId,
    value: f64,
}

impl MaxTemperatureState {
    /// Start at `ambient`.
    pub const fn new(owner: ObjectId, ambient: f64) -> Self {
        Self {
            owner,
            value: ambient,
        }
    }

    /// Running maximum.
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Overwrite the maximum.
    pub const fn set(&mut self, value: f64) {
        self.value = value;
    }

    /// Fold in the current temperature.
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        let current = ctx.reader.float(self.owner, StateKind::Temperature)?;
        self.value = self.value.max(current);
        Ok(())
    }
}

/// `cooked` and `burnt`: `max_temperature >= threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdState {
    kind: StateKind,
    owner: ObjectId,
    threshold: f64,
    value: bool,
}

impl ThresholdState {
    /// Build from the `cook_temperature` / `burn_temperature` parameter.
    pub fn new(kind: StateKind, owner: ObjectId, params: &AbilityParams) -> Self {
        let threshold = if kind == StateKind::Burnt {
            param_f64(params, "burn_temperature", DEFAULT_BURN_TEMPERATURE)
        } else {
            param_f64(params, "cook_temperature", DEFAULT_COOK_TEMPERATURE)
        };
        Self {
            kind,
            owner,
            threshold,
            value: false,
        }
    }

    /// The state this instance backs.
    pub const fn kind(&self) -> StateKind {
        self.kind
    }

    /// Temperature at which the state turns on.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current value.
    pub const fn value(&self) -> bool {
        self.value
    }

    /// Compare the running maximum against the threshold.
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        let max = ctx.reader.float(self.owner, StateKind::MaxTemperature)?;
        let value = max >= self.threshold;
        if value && !self.value {
            debug!(object = %self.owner, state = %self.kind, max, "Threshold crossed");
        }
        self.value = value;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn heat_source_reads_parameters() {
        let mut params = AbilityParams::new();
        params.insert("temperature".to_owned(), json!(150.0));
        params.insert("requires_toggled_on".to_owned(), json!(false));
        let source = HeatSourceState::new(ObjectId::new(), &params);
        assert_eq!(source.temperature, 150.0);
        assert_eq!(source.rate, DEFAULT_HEATING_RATE);
        assert!(!source.requires_toggled_on);
        assert!(!source.value());
        assert!(source.emission().is_none());
    }

    #[test]
    fn thresholds_pick_their_parameter() {
        let mut params = AbilityParams::new();
        params.insert("cook_temperature".to_owned(), json!(60.0));
        let owner = ObjectId::new();
        assert_eq!(ThresholdState::new(StateKind::Cooked, owner, &params).threshold(), 60.0);
        assert_eq!(
            ThresholdState::new(StateKind::Burnt, owner, &params).threshold(),
            DEFAULT_BURN_TEMPERATURE
        );
    }

    #[test]
    fn temperatures_start_at_ambient() {
        let owner = ObjectId::new();
        assert_eq!(TemperatureState::new(owner, 23.0).value(), 23.0);
        assert_eq!(MaxTemperatureState::new(owner, 23.0).value(), 23.0);
    }
}
