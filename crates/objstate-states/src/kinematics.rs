//! Spatial relations between object pairs.
//!
//! The predicates are pure functions over bounding boxes so that both the
//! relation states and the placer can evaluate them. [`RelationState`] is
//! the per-object instance of a relation: it stores nothing and answers
//! each query from the cached `aabb` and `contact_bodies` states of the two
//! objects.

use objstate_types::{Aabb, ContactPoint, ObjectId, StateKind};

use crate::config::KinematicsConfig;
use crate::context::StateReader;
use crate::error::StateError;

/// Smallest extent or volume treated as a real box. Anything thinner is
/// physics noise and never satisfies a containment relation.
pub const MIN_EXTENT: f64 = 1e-9;

fn degenerate(aabb: &Aabb) -> bool {
    aabb.extent().min_element() <= MIN_EXTENT
}

/// Whether `a` is inside `b`.
///
/// Holds if either
/// - `a`'s center lies in `b`'s box, `a` has strictly smaller volume, and
///   at least two of `a`'s three extents are no larger than `b`'s, or
/// - `a`'s center lies within `b`'s footprint and `a`'s bottom is at or
///   above `b`'s top.
pub fn inside(a: &Aabb, b: &Aabb) -> bool {
    if degenerate(a) || degenerate(b) {
        return false;
    }
    let center = a.center();

    let a_extent = a.extent();
    let b_extent = b.extent();
    let fitting_axes = a_extent.cmple(b_extent).bitmask().count_ones();
    let contained = b.contains_point(center) && a.volume() < b.volume() && fitting_axes >= 2;

    let stacked = b.footprint_contains(center) && a.min.z >= b.max.z;

    contained || stacked
}

/// Whether `a` rests on `b`: `a`'s center is over `b`'s footprint and its
/// bottom is within `tolerance` of `b`'s top.
pub fn on_top(a: &Aabb, b: &Aabb, tolerance: f64) -> bool {
    b.footprint_contains(a.center()) && (a.min.z - b.max.z).abs() <= tolerance
}

/// Whether `a` is below `b`: `a`'s center is under `b`'s footprint and its
/// top is at or below `b`'s bottom.
pub fn under(a: &Aabb, b: &Aabb) -> bool {
    b.footprint_contains(a.center()) && a.max.z <= b.min.z
}

/// Whether `a` stands beside `b`: vertical ranges overlap, the horizontal
/// gap is at most `distance`, and `a` is not inside `b`.
pub fn next_to(a: &Aabb, b: &Aabb, distance: f64) -> bool {
    a.z_overlaps(b) && a.horizontal_gap(b) <= distance && !inside(a, b)
}

/// Whether `contacts` (reported for one body) include `other`.
pub fn touching(contacts: &[ContactPoint], other: ObjectId) -> bool {
    contacts.iter().any(|c| c.body_b == other)
}

/// Evaluate a box-based relation. `touching` is answered from contacts, so
/// it always reports `false` here.
pub fn relation_holds(kind: StateKind, a: &Aabb, b: &Aabb, config: &KinematicsConfig) -> bool {
    match kind {
        StateKind::Inside => inside(a, b),
        StateKind::OnTop => on_top(a, b, config.contact_tolerance),
        StateKind::Under => under(a, b),
        StateKind::NextTo => next_to(a, b, config.next_to_distance),
        _ => false,
    }
}

/// Whether `kind` can be realized by the placer.
pub const fn is_placeable(kind: StateKind) -> bool {
    matches!(kind, StateKind::Inside | StateKind::OnTop)
}

/// A relative state on one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationState {
    kind: StateKind,
    owner: ObjectId,
}

impl RelationState {
    /// A relation of `kind` owned by `owner`.
    pub const fn new(kind: StateKind, owner: ObjectId) -> Self {
        Self { kind, owner }
    }

    /// The relation this instance answers.
    pub const fn kind(&self) -> StateKind {
        self.kind
    }

    /// The owning object.
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// Evaluate the relation between the owner and `target`.
    ///
    /// # Errors
    ///
    /// [`StateError::MissingDependencyValue`] when either object lacks the
    /// geometry states, which callers treat as "does not apply".
    pub fn holds(&self, target: ObjectId, reader: &StateReader<'_>) -> Result<bool, StateError> {
        if target == self.owner {
            return Ok(false);
        }
        if self.kind == StateKind::Touching {
            let contacts = reader.contacts(self.owner)?;
            return Ok(touching(&contacts, target));
        }
        let own = reader.aabb(self.owner)?;
        let other = reader.aabb(target)?;
        Ok(relation_holds(self.kind, &own, &other, &reader.config.kinematics))
    }
}
