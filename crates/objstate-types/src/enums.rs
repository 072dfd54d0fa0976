//! Enumeration types for the object-state engine.
//!
//! State identifiers and ability tags are closed enumerations. String forms
//! (as they appear in scene descriptions and config files) are parsed once
//! at load time, so an unknown identifier is a load error rather than a
//! surprise in the middle of a tick.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string did not name any known state or ability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {category} identifier: {name}")]
pub struct UnknownIdentifier {
    /// What was being parsed (`"state"` or `"ability"`).
    pub category: &'static str,
    /// The offending string.
    pub name: String,
}

// ---------------------------------------------------------------------------
// State kinds
// ---------------------------------------------------------------------------

/// Every state the engine knows how to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    // --- Kinematic ---
    /// World pose (position and orientation) of the object.
    Pose,
    /// Axis-aligned bounding box of the object.
    Aabb,
    /// Contact points between the object and its neighbours.
    ContactBodies,
    /// Object A rests on top of object B.
    OnTop,
    /// Articulated object is open.
    Open,
    /// Object A is inside object B.
    Inside,
    /// Object A is beside object B.
    NextTo,
    /// Object A is below object B.
    Under,
    /// Object A is in contact with object B.
    Touching,
    /// Toggleable object is switched on.
    ToggledOn,

    // --- Particle related ---
    /// Object has absorbed liquid.
    Soaked,
    /// Object is covered in dust particles.
    Dirty,
    /// Object is covered in stain particles.
    Stained,
    /// Object emits water.
    WaterSource,
    /// Object can wipe particles off other objects.
    CleaningTool,

    // --- Thermal ---
    /// Object can heat nearby objects.
    HeatSource,
    /// Current temperature of the object.
    Temperature,
    /// Highest temperature the object has reached.
    MaxTemperature,
    /// Object has been heated past its burn temperature.
    Burnt,
    /// Object has been heated past its cook temperature.
    Cooked,
}

impl StateKind {
    /// All state kinds in canonical registration order.
    pub const ALL: [Self; 20] = [
        Self::Pose,
        Self::Aabb,
        Self::ContactBodies,
        Self::OnTop,
        Self::Open,
        Self::Inside,
        Self::NextTo,
        Self::Under,
        Self::Touching,
        Self::ToggledOn,
        Self::Soaked,
        Self::Dirty,
        Self::Stained,
        Self::WaterSource,
        Self::CleaningTool,
        Self::HeatSource,
        Self::Temperature,
        Self::MaxTemperature,
        Self::Burnt,
        Self::Cooked,
    ];

    /// The snake-case identifier used in config files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pose => "pose",
            Self::Aabb => "aabb",
            Self::ContactBodies => "contact_bodies",
            Self::OnTop => "on_top",
            Self::Open => "open",
            Self::Inside => "inside",
            Self::NextTo => "next_to",
            Self::Under => "under",
            Self::Touching => "touching",
            Self::ToggledOn => "toggled_on",
            Self::Soaked => "soaked",
            Self::Dirty => "dirty",
            Self::Stained => "stained",
            Self::WaterSource => "water_source",
            Self::CleaningTool => "cleaning_tool",
            Self::HeatSource => "heat_source",
            Self::Temperature => "temperature",
            Self::MaxTemperature => "max_temperature",
            Self::Burnt => "burnt",
            Self::Cooked => "cooked",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateKind {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownIdentifier {
                category: "state",
                name: s.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Abilities
// ---------------------------------------------------------------------------

/// A capability tag declared on an object that implies a bundle of states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// Can be cooked by heating.
    Cookable,
    /// Can absorb water.
    Soakable,
    /// Can collect dust.
    Dustable,
    /// Can be stained and scrubbed clean.
    Scrubbable,
    /// Emits water.
    WaterSource,
    /// Wipes particles off other objects.
    CleaningTool,
    /// Can be switched on and off.
    Toggleable,
    /// Can burn when overheated.
    Burnable,
    /// Heats nearby objects.
    HeatSource,
}

impl Ability {
    /// All abilities in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Cookable,
        Self::Soakable,
        Self::Dustable,
        Self::Scrubbable,
        Self::WaterSource,
        Self::CleaningTool,
        Self::Toggleable,
        Self::Burnable,
        Self::HeatSource,
    ];

    /// The snake-case identifier used in config files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cookable => "cookable",
            Self::Soakable => "soakable",
            Self::Dustable => "dustable",
            Self::Scrubbable => "scrubbable",
            Self::WaterSource => "water_source",
            Self::CleaningTool => "cleaning_tool",
            Self::Toggleable => "toggleable",
            Self::Burnable => "burnable",
            Self::HeatSource => "heat_source",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ability {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ability| ability.as_str() == s)
            .ok_or_else(|| UnknownIdentifier {
                category: "ability",
                name: s.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Descriptor axes
// ---------------------------------------------------------------------------

/// Whether a state describes one object or an ordered pair of objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Property of a single object.
    Absolute,
    /// Relation between an object and a target object.
    Relative,
}

/// The shape of the value a state produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// A boolean.
    Bool,
    /// A continuous scalar.
    Float,
    /// A world pose.
    Pose,
    /// An axis-aligned bounding box.
    Aabb,
    /// A list of contact points.
    Contacts,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn state_kind_round_trips_through_str() {
        for kind in StateKind::ALL {
            assert_eq!(kind.as_str().parse::<StateKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_state_is_rejected() {
        let err = "sparkly".parse::<StateKind>().unwrap_err();
        assert_eq!(err.category, "state");
        assert_eq!(err.name, "sparkly");
    }

    #[test]
    fn ability_parses_snake_case() {
        assert_eq!("dustable".parse::<Ability>().unwrap(), Ability::Dustable);
        assert_eq!(
            "cleaning_tool".parse::<Ability>().unwrap(),
            Ability::CleaningTool
        );
        assert!("flammable".parse::<Ability>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&StateKind::MaxTemperature).unwrap();
        assert_eq!(json, "\"max_temperature\"");
        let ability: Ability = serde_json::from_str("\"heat_source\"").unwrap();
        assert_eq!(ability, Ability::HeatSource);
    }
}
