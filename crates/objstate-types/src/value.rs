//! Values produced and accepted by object states.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::ValueKind;
use crate::geometry::{Aabb, Pose};
use crate::ids::ObjectId;

/// A single contact reported by the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    /// The body the query was made for.
    pub body_a: ObjectId,
    /// The other body in contact.
    pub body_b: ObjectId,
    /// Contact position in world coordinates.
    pub position: DVec3,
    /// Contact normal pointing from `body_a` towards `body_b`.
    pub normal: DVec3,
    /// Overlap depth; zero for touching bodies, positive when interpenetrating.
    pub penetration_depth: f64,
}

/// The value of a state, tagged by its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StateValue {
    /// Boolean state (`dirty`, `open`, relations).
    Bool(bool),
    /// Continuous state (`temperature`).
    Float(f64),
    /// World pose.
    Pose(Pose),
    /// Bounding box.
    Aabb(Aabb),
    /// Contact list.
    Contacts(Vec<ContactPoint>),
}

impl StateValue {
    /// The kind of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Float(_) => ValueKind::Float,
            Self::Pose(_) => ValueKind::Pose,
            Self::Aabb(_) => ValueKind::Aabb,
            Self::Contacts(_) => ValueKind::Contacts,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The scalar payload, if this is a float.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The bounding box payload, if this is a box.
    pub const fn as_aabb(&self) -> Option<&Aabb> {
        match self {
            Self::Aabb(v) => Some(v),
            _ => None,
        }
    }

    /// The pose payload, if this is a pose.
    pub const fn as_pose(&self) -> Option<&Pose> {
        match self {
            Self::Pose(v) => Some(v),
            _ => None,
        }
    }

    /// The contact list, if this is a contact list.
    pub fn as_contacts(&self) -> Option<&[ContactPoint]> {
        match self {
            Self::Contacts(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        let v = StateValue::from(true);
        assert_eq!(v.kind(), ValueKind::Bool);
        assert_eq!(v.as_bool(), Some(true));
        assert!(v.as_float().is_none());
        assert!(v.as_aabb().is_none());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(StateValue::Float(23.5)).unwrap();
        assert_eq!(json.get("kind").and_then(serde_json::Value::as_str), Some("float"));
        assert_eq!(json.get("value").and_then(serde_json::Value::as_f64), Some(23.5));
    }
}
