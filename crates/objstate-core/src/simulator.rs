//! The simulator facade.
//!
//! [`Simulator`] owns the scene, the physics backend, the configuration,
//! and the seeded RNG, and shares the validated [`StateRegistry`] through
//! an `Arc`. It is the only entry point external code needs: import and
//! remove objects, step the world, and read or write states.

use std::collections::BTreeMap;
use std::sync::Arc;

use objstate_physics::PhysicsBackend;
use objstate_states::{
    AbilityParams, Placement, StateContext, StateError, StateReader, StateRegistry,
    prepare_states,
};
use objstate_types::{Ability, ObjectId, StateKind, StateValue};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::config::SimulatorConfig;
use crate::error::SimulationError;
use crate::scene::{Scene, SimObject};
use crate::scheduler::{TickSummary, run_state_updates};

/// The object-state simulator over a physics backend `P`.
#[derive(Debug)]
pub struct Simulator<P: PhysicsBackend> {
    registry: Arc<StateRegistry>,
    scene: Scene,
    physics: P,
    config: SimulatorConfig,
    rng: SmallRng,
    tick: u64,
}

impl<P: PhysicsBackend> Simulator<P> {
    /// Create a simulator with an empty scene. The RNG is seeded from
    /// `simulation.seed`.
    pub fn new(registry: Arc<StateRegistry>, physics: P, config: SimulatorConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.simulation.seed);
        Self {
            registry,
            scene: Scene::new(),
            physics,
            config,
            rng,
            tick: 0,
        }
    }

    /// The shared registry.
    pub const fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    /// The active configuration.
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// The scene.
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The physics backend.
    pub const fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable access to the physics backend, for adding bodies or moving
    /// them directly. Cached values refresh at the next tick.
    pub const fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// Ticks run so far.
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Add an object to the scene with the states implied by `abilities`.
    ///
    /// Online objects query the physics backend for a body with the same
    /// id; offline objects get placeholder states.
    ///
    /// # Errors
    ///
    /// [`SimulationError::DuplicateObject`] or a registry error.
    pub fn import_object(
        &mut self,
        id: ObjectId,
        name: impl Into<String>,
        abilities: BTreeMap<Ability, AbilityParams>,
        online: bool,
    ) -> Result<(), SimulationError> {
        if self.scene.contains(id) {
            return Err(SimulationError::DuplicateObject(id));
        }
        let states = prepare_states(id, &abilities, online, &self.registry, &self.config.states)?;
        let name = name.into();
        info!(
            object = %id,
            name = %name,
            states = states.len(),
            online,
            "Object imported"
        );
        self.scene.add_object(SimObject {
            id,
            name,
            abilities,
            states,
        })
    }

    /// Add more abilities to an existing object. Preparing with abilities
    /// the object already has changes nothing.
    ///
    /// # Errors
    ///
    /// [`SimulationError::UnknownObject`] or a registry error.
    pub fn prepare_states(
        &mut self,
        id: ObjectId,
        abilities: &BTreeMap<Ability, AbilityParams>,
    ) -> Result<(), SimulationError> {
        self.scene
            .prepare_object(id, abilities, &self.registry, &self.config.states)
    }

    /// Remove an object from the scene. Its physics body is left alone.
    ///
    /// # Errors
    ///
    /// [`SimulationError::UnknownObject`] if the object is not live.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<SimObject, SimulationError> {
        let object = self
            .scene
            .remove_object(id)
            .ok_or(SimulationError::UnknownObject(id))?;
        info!(object = %id, name = %object.name, "Object removed");
        Ok(object)
    }

    /// Every live object carrying `kind`.
    pub fn objects_with_state(&self, kind: StateKind) -> Vec<ObjectId> {
        objstate_states::SceneView::objects_with_state(&self.scene, kind)
    }

    /// Run one state update pass without stepping physics.
    pub fn tick(&mut self) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        run_state_updates(
            &mut self.scene,
            &self.physics,
            self.registry.update_order(),
            &self.config.states,
            &mut self.rng,
            self.tick,
        )
    }

    /// Advance physics by the configured substeps, then run one update pass.
    pub fn step(&mut self) -> TickSummary {
        let substeps = self.config.simulation.physics_substeps_per_tick;
        self.physics.step(substeps);
        debug!(substeps, "Physics stepped");
        self.tick()
    }

    /// Current value of an absolute state.
    ///
    /// # Errors
    ///
    /// [`SimulationError::UnknownObject`], [`SimulationError::MissingState`],
    /// or the state's own error.
    pub fn get_state(&self, id: ObjectId, kind: StateKind) -> Result<StateValue, SimulationError> {
        let reader = self.reader();
        let instance = self.instance(id, kind)?;
        Ok(instance.value(&reader)?)
    }

    /// Boolean value of an absolute state.
    ///
    /// # Errors
    ///
    /// As [`Self::get_state`], plus a value-kind mismatch for non-boolean
    /// states.
    pub fn get_flag(&self, id: ObjectId, kind: StateKind) -> Result<bool, SimulationError> {
        let value = self.get_state(id, kind)?;
        value.as_bool().ok_or_else(|| {
            SimulationError::from(StateError::ValueKindMismatch {
                state: kind,
                expected: objstate_types::ValueKind::Bool,
                actual: value.kind(),
            })
        })
    }

    /// Set an absolute state.
    ///
    /// # Errors
    ///
    /// [`SimulationError::UnknownObject`], [`SimulationError::MissingState`],
    /// or the state's own error ([`StateError::UnsupportedOperation`],
    /// [`StateError::ValueKindMismatch`]).
    pub fn set_state(
        &mut self,
        id: ObjectId,
        kind: StateKind,
        value: impl Into<StateValue>,
    ) -> Result<(), SimulationError> {
        let value = value.into();
        self.instance(id, kind)?;
        let Some(mut instance) = self.scene.take_state(id, kind) else {
            return Err(SimulationError::MissingState { object: id, state: kind });
        };
        let result = {
            let reader = StateReader::new(&self.scene, &self.physics, &self.config.states);
            let mut ctx = StateContext::new(id, reader, &mut self.rng, self.tick);
            instance.set_value(&value, &mut ctx)
        };
        self.scene.restore_state(id, instance);
        result?;
        debug!(object = %id, state = %kind, value = ?value, "State set");
        Ok(())
    }

    /// Value of a relative state. A relation whose geometry is unavailable
    /// does not apply and reads as `false`.
    ///
    /// # Errors
    ///
    /// [`SimulationError::UnknownObject`] for either object,
    /// [`SimulationError::MissingState`], or
    /// [`StateError::UnsupportedOperation`] for absolute states.
    pub fn get_relation(
        &self,
        id: ObjectId,
        kind: StateKind,
        target: ObjectId,
    ) -> Result<bool, SimulationError> {
        if !self.scene.contains(target) {
            return Err(SimulationError::UnknownObject(target));
        }
        let reader = self.reader();
        match self.instance(id, kind)?.relation(target, &reader) {
            Ok(value) => Ok(value),
            Err(err) if err.is_missing_dependency() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Make a relative state hold by moving `id` (online objects), or record
    /// it (offline objects). On a successful placement the cached values of
    /// both objects are dropped.
    ///
    /// # Errors
    ///
    /// [`SimulationError::UnknownObject`] for either object,
    /// [`SimulationError::MissingState`], [`StateError::PlacementFailure`],
    /// or [`StateError::UnsupportedOperation`].
    pub fn set_relation(
        &mut self,
        id: ObjectId,
        kind: StateKind,
        target: ObjectId,
        value: bool,
    ) -> Result<Option<Placement>, SimulationError> {
        if !self.scene.contains(target) {
            return Err(SimulationError::UnknownObject(target));
        }
        let states = self
            .scene
            .states_mut(id)
            .ok_or(SimulationError::UnknownObject(id))?;
        let instance = states
            .get_mut(kind)
            .ok_or(SimulationError::MissingState { object: id, state: kind })?;
        let placement = instance.set_relation(
            target,
            value,
            &mut self.physics,
            &mut self.rng,
            &self.config.states,
        )?;

        if placement.is_some() {
            self.scene.invalidate_object(id);
            self.scene.invalidate_object(target);
        }
        Ok(placement)
    }

    fn reader(&self) -> StateReader<'_> {
        StateReader::new(&self.scene, &self.physics, &self.config.states)
    }

    fn instance(
        &self,
        id: ObjectId,
        kind: StateKind,
    ) -> Result<&objstate_states::StateInstance, SimulationError> {
        self.scene
            .object(id)
            .ok_or(SimulationError::UnknownObject(id))?
            .states
            .get(kind)
            .ok_or(SimulationError::MissingState { object: id, state: kind })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use objstate_physics::KinematicWorld;
    use objstate_types::{DVec3, Pose};

    use super::*;

    fn simulator() -> Simulator<KinematicWorld> {
        let registry = Arc::new(StateRegistry::standard().unwrap());
        Simulator::new(registry, KinematicWorld::new(), SimulatorConfig::default())
    }

    fn abilities(list: &[Ability]) -> BTreeMap<Ability, AbilityParams> {
        list.iter().map(|a| (*a, AbilityParams::new())).collect()
    }

    fn add_box(sim: &mut Simulator<KinematicWorld>, list: &[Ability], center: DVec3) -> ObjectId {
        let id = ObjectId::new();
        sim.physics_mut()
            .add_box(id, DVec3::splat(0.1), Pose::from_position(center))
            .unwrap();
        sim.import_object(id, "box", abilities(list), true).unwrap();
        id
    }

    #[test]
    fn import_rejects_duplicates() {
        let mut sim = simulator();
        let id = add_box(&mut sim, &[], DVec3::ZERO);
        let err = sim.import_object(id, "again", BTreeMap::new(), true).unwrap_err();
        assert_eq!(err, SimulationError::DuplicateObject(id));
        assert_eq!(sim.scene().len(), 1);
    }

    #[test]
    fn flags_round_trip_through_the_facade() {
        let mut sim = simulator();
        let lamp = add_box(&mut sim, &[Ability::Toggleable], DVec3::ZERO);
        assert!(!sim.get_flag(lamp, StateKind::ToggledOn).unwrap());
        sim.set_state(lamp, StateKind::ToggledOn, true).unwrap();
        assert!(sim.get_flag(lamp, StateKind::ToggledOn).unwrap());

        let err = sim.set_state(lamp, StateKind::ToggledOn, 1.0).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::State {
                source: StateError::ValueKindMismatch { .. }
            }
        ));
        // A rejected set leaves the state in place.
        assert!(sim.get_flag(lamp, StateKind::ToggledOn).unwrap());
    }

    #[test]
    fn missing_and_unknown_are_distinguished() {
        let mut sim = simulator();
        let plain = add_box(&mut sim, &[], DVec3::ZERO);
        assert_eq!(
            sim.get_state(plain, StateKind::Dirty).unwrap_err(),
            SimulationError::MissingState {
                object: plain,
                state: StateKind::Dirty
            }
        );
        let ghost = ObjectId::new();
        assert_eq!(
            sim.get_state(ghost, StateKind::Open).unwrap_err(),
            SimulationError::UnknownObject(ghost)
        );
        assert_eq!(
            sim.get_relation(plain, StateKind::Inside, ghost).unwrap_err(),
            SimulationError::UnknownObject(ghost)
        );
    }

    #[test]
    fn derived_states_reject_sets() {
        let mut sim = simulator();
        let pan = add_box(&mut sim, &[Ability::Cookable], DVec3::ZERO);
        assert!(sim.set_state(pan, StateKind::Cooked, true).is_err());
        assert!(sim.set_state(pan, StateKind::Aabb, true).is_err());
        assert!(!sim.get_flag(pan, StateKind::Cooked).unwrap());
    }

    #[test]
    fn step_advances_physics_and_tick() {
        let mut sim = simulator();
        add_box(&mut sim, &[Ability::Dustable], DVec3::ZERO);
        let summary = sim.step();
        assert_eq!(summary.tick, 1);
        assert_eq!(sim.tick_count(), 1);
        assert_eq!(sim.physics().substeps_elapsed(), 1);
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn query_only_relations_cannot_be_set() {
        let mut sim = simulator();
        let a = add_box(&mut sim, &[], DVec3::ZERO);
        let b = add_box(&mut sim, &[], DVec3::new(1.0, 0.0, 0.0));
        assert!(sim.set_relation(a, StateKind::NextTo, b, true).is_err());
        assert!(sim.set_relation(a, StateKind::Open, b, true).is_err());
    }

    #[test]
    fn removed_objects_leave_the_index() {
        let mut sim = simulator();
        let rag = add_box(&mut sim, &[Ability::CleaningTool], DVec3::ZERO);
        assert_eq!(sim.objects_with_state(StateKind::CleaningTool), vec![rag]);
        let removed = sim.remove_object(rag).unwrap();
        assert_eq!(removed.id, rag);
        assert!(sim.objects_with_state(StateKind::CleaningTool).is_empty());
        assert_eq!(
            sim.remove_object(rag).unwrap_err(),
            SimulationError::UnknownObject(rag)
        );
    }

    #[test]
    fn temperature_is_a_float_state() {
        let mut sim = simulator();
        let pan = add_box(&mut sim, &[Ability::Cookable], DVec3::ZERO);
        let ambient = sim.config().states.thermal.ambient_temperature;
        assert_eq!(
            sim.get_state(pan, StateKind::Temperature).unwrap(),
            StateValue::Float(ambient)
        );
        sim.set_state(pan, StateKind::Temperature, 90.0).unwrap();
        assert!(sim.get_flag(pan, StateKind::Temperature).is_err());
    }
}
