//! Stored boolean states.
//!
//! `open` and `toggled_on` are plain flags set from outside. `cleaning_tool`
//! and `water_source` are ability markers that start out `true`; clearing
//! one switches the object's ability off without removing the state.
//! `soaked` is a flag that also turns itself on while the object touches an
//! active water source.

use objstate_types::{Aabb, ObjectId, StateKind};
use tracing::{debug, warn};

use crate::context::{StateContext, StateReader};
use crate::error::StateError;

/// A stored boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagState {
    kind: StateKind,
    owner: ObjectId,
    value: bool,
}

impl FlagState {
    /// A flag with its initial value: `true` for ability markers, `false`
    /// otherwise.
    pub const fn new(kind: StateKind, owner: ObjectId) -> Self {
        let value = matches!(kind, StateKind::CleaningTool | StateKind::WaterSource);
        Self { kind, owner, value }
    }

    /// The state this flag stores.
    pub const fn kind(&self) -> StateKind {
        self.kind
    }

    /// The owning object.
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// Current value.
    pub const fn value(&self) -> bool {
        self.value
    }

    /// Overwrite the value.
    pub const fn set(&mut self, value: bool) {
        self.value = value;
    }
}

/// `soaked`: set directly, or by overlapping an active water source.
#[derive(Debug, Clone, PartialEq)]
pub struct SoakedState {
    owner: ObjectId,
    value: bool,
    inflation: f64,
}

impl SoakedState {
    /// A dry object. Water sources are inflated by `inflation` of their
    /// extent when testing for overlap.
    pub const fn new(owner: ObjectId, inflation: f64) -> Self {
        Self {
            owner,
            value: false,
            inflation,
        }
    }

    /// Current value.
    pub const fn value(&self) -> bool {
        self.value
    }

    /// Overwrite the value.
    pub const fn set(&mut self, value: bool) {
        self.value = value;
    }

    /// Soak the object if it overlaps any active water source. A soaked
    /// object stays soaked until set dry.
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        if self.value {
            return Ok(());
        }
        let own = ctx.own_aabb()?;
        for source in ctx.reader.objects_with_state(StateKind::WaterSource) {
            if source == self.owner {
                continue;
            }
            let region = match active_source_region(&ctx.reader, source, self.inflation) {
                Ok(Some(region)) => region,
                Ok(None) => continue,
                Err(err) => {
                    warn!(object = %self.owner, source = %source, error = %err, "Water source skipped");
                    continue;
                }
            };
            if region.overlaps(&own) {
                debug!(object = %self.owner, source = %source, "Object soaked");
                self.value = true;
                break;
            }
        }
        Ok(())
    }
}

/// The inflated box of `source` while its water is on.
fn active_source_region(
    reader: &StateReader<'_>,
    source: ObjectId,
    inflation: f64,
) -> Result<Option<Aabb>, StateError> {
    if !reader.flag(source, StateKind::WaterSource)? {
        return Ok(None);
    }
    Ok(Some(reader.aabb(source)?.inflated(inflation)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ability_markers_start_true() {
        let owner = ObjectId::new();
        assert!(FlagState::new(StateKind::CleaningTool, owner).value());
        assert!(FlagState::new(StateKind::WaterSource, owner).value());
        assert!(!FlagState::new(StateKind::Open, owner).value());
        assert!(!FlagState::new(StateKind::ToggledOn, owner).value());
    }

    #[test]
    fn set_overwrites() {
        let mut flag = FlagState::new(StateKind::Open, ObjectId::new());
        flag.set(true);
        assert!(flag.value());
        let mut soaked = SoakedState::new(ObjectId::new(), 0.1);
        soaked.set(true);
        assert!(soaked.value());
    }
}
