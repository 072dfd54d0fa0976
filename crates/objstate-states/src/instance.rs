//! State instances: one tagged variant per state family.
//!
//! [`instantiate`] maps a descriptor to the variant implementing it.
//! Offline objects get a [`DummyState`] for every state instead, which
//! stores whatever is set on it and never touches the physics engine.

use std::collections::BTreeMap;

use objstate_physics::PhysicsBackend;
use objstate_types::{Aabb, Arity, DVec3, ObjectId, Pose, StateKind, StateValue, ValueKind};
use rand::RngCore;

use crate::cache::CachedValue;
use crate::config::StatesConfig;
use crate::context::{StateContext, StateReader};
use crate::error::StateError;
use crate::flags::{FlagState, SoakedState};
use crate::kinematics::{RelationState, is_placeable};
use crate::params::{AbilityParams, param_usize};
use crate::particles::{ParticleFamily, ParticleSettings, ParticleState};
use crate::placement::{Placement, RelativeStatePlacer};
use crate::registry::StateDescriptor;
use crate::thermal::{HeatSourceState, MaxTemperatureState, TemperatureState, ThresholdState};

/// Placeholder used for offline objects.
#[derive(Debug, Clone, PartialEq)]
pub struct DummyState {
    kind: StateKind,
    arity: Arity,
    owner: ObjectId,
    value: StateValue,
    relations: BTreeMap<ObjectId, bool>,
}

impl DummyState {
    /// A placeholder holding the zero value of the descriptor's value kind.
    pub fn new(descriptor: &StateDescriptor, owner: ObjectId) -> Self {
        let value = match descriptor.value_kind {
            ValueKind::Bool => StateValue::Bool(false),
            ValueKind::Float => StateValue::Float(0.0),
            ValueKind::Pose => StateValue::Pose(Pose::default()),
            ValueKind::Aabb => StateValue::Aabb(Aabb::new(DVec3::ZERO, DVec3::ZERO)),
            ValueKind::Contacts => StateValue::Contacts(Vec::new()),
        };
        Self {
            kind: descriptor.kind,
            arity: descriptor.arity,
            owner,
            value,
            relations: BTreeMap::new(),
        }
    }

    /// The owning object.
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// The stored value.
    pub const fn value(&self) -> &StateValue {
        &self.value
    }

    /// The stored relation towards `target`, `false` if never set.
    pub fn relation(&self, target: ObjectId) -> bool {
        self.relations.get(&target).copied().unwrap_or(false)
    }
}

/// A physics-derived value memoized for the current tick.
#[derive(Debug)]
pub struct CachedState {
    kind: StateKind,
    owner: ObjectId,
    cache: CachedValue<StateValue>,
}

impl CachedState {
    /// An empty cache for `kind` (`pose`, `aabb` or `contact_bodies`).
    pub const fn new(kind: StateKind, owner: ObjectId) -> Self {
        Self {
            kind,
            owner,
            cache: CachedValue::new(),
        }
    }

    /// The memoized value, querying the physics engine on a miss.
    pub fn value(&self, physics: &dyn PhysicsBackend) -> Result<StateValue, StateError> {
        self.cache
            .get_or_compute(|| -> Result<StateValue, StateError> {
                Ok(match self.kind {
                    StateKind::Pose => StateValue::Pose(physics.pose(self.owner)?),
                    StateKind::ContactBodies => StateValue::Contacts(physics.contacts(self.owner)?),
                    _ => StateValue::Aabb(physics.aabb(self.owner)?),
                })
            })
            .cloned()
    }

    /// Whether a value is memoized.
    pub fn is_valid(&self) -> bool {
        self.cache.is_valid()
    }

    /// Physics queries made so far.
    pub fn computations(&self) -> u64 {
        self.cache.computations()
    }
}

/// An instantiated state on one object.
#[derive(Debug)]
pub enum StateInstance {
    /// Offline placeholder.
    Dummy(DummyState),
    /// Stored boolean.
    Flag(FlagState),
    /// `soaked`.
    Soaked(SoakedState),
    /// Physics-derived, memoized per tick.
    Cached(CachedState),
    /// Object-pair relation.
    Relation(RelationState),
    /// `dirty` or `stained`.
    Particles(ParticleState),
    /// `heat_source`.
    HeatSource(HeatSourceState),
    /// `temperature`.
    Temperature(TemperatureState),
    /// `max_temperature`.
    MaxTemperature(MaxTemperatureState),
    /// `cooked` or `burnt`.
    Threshold(ThresholdState),
}

/// Create the instance implementing `descriptor` for `owner`.
///
/// `params` are the parameters of the ability that brought the state in
/// (empty for defaults and dependencies).
pub fn instantiate(
    descriptor: &StateDescriptor,
    owner: ObjectId,
    params: &AbilityParams,
    config: &StatesConfig,
    online: bool,
) -> StateInstance {
    if !online {
        return StateInstance::Dummy(DummyState::new(descriptor, owner));
    }
    let kind = descriptor.kind;
    let ambient = config.thermal.ambient_temperature;
    let particle_settings = || ParticleSettings {
        count: param_usize(params, "particle_count", config.particles.count),
        threshold: config.particles.clean_threshold,
        inflation: config.particles.aabb_inflation,
    };

    match kind {
        StateKind::Pose | StateKind::Aabb | StateKind::ContactBodies => {
            StateInstance::Cached(CachedState::new(kind, owner))
        }
        StateKind::OnTop
        | StateKind::Inside
        | StateKind::NextTo
        | StateKind::Under
        | StateKind::Touching => StateInstance::Relation(RelationState::new(kind, owner)),
        StateKind::Open
        | StateKind::ToggledOn
        | StateKind::WaterSource
        | StateKind::CleaningTool => StateInstance::Flag(FlagState::new(kind, owner)),
        StateKind::Soaked => {
            StateInstance::Soaked(SoakedState::new(owner, config.particles.aabb_inflation))
        }
        StateKind::Dirty => StateInstance::Particles(ParticleState::new(
            owner,
            ParticleFamily::Dust,
            particle_settings(),
        )),
        StateKind::Stained => StateInstance::Particles(ParticleState::new(
            owner,
            ParticleFamily::Stain,
            particle_settings(),
        )),
        StateKind::HeatSource => StateInstance::HeatSource(HeatSourceState::new(owner, params)),
        StateKind::Temperature => StateInstance::Temperature(TemperatureState::new(owner, ambient)),
        StateKind::MaxTemperature => {
            StateInstance::MaxTemperature(MaxTemperatureState::new(owner, ambient))
        }
        StateKind::Burnt | StateKind::Cooked => {
            StateInstance::Threshold(ThresholdState::new(kind, owner, params))
        }
    }
}

fn expect_bool(kind: StateKind, value: &StateValue) -> Result<bool, StateError> {
    value.as_bool().ok_or(StateError::ValueKindMismatch {
        state: kind,
        expected: ValueKind::Bool,
        actual: value.kind(),
    })
}

fn expect_float(kind: StateKind, value: &StateValue) -> Result<f64, StateError> {
    value.as_float().ok_or(StateError::ValueKindMismatch {
        state: kind,
        expected: ValueKind::Float,
        actual: value.kind(),
    })
}

impl StateInstance {
    /// Which state this instance implements.
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Dummy(s) => s.kind,
            Self::Flag(s) => s.kind(),
            Self::Soaked(_) => StateKind::Soaked,
            Self::Cached(s) => s.kind,
            Self::Relation(s) => s.kind(),
            Self::Particles(s) => s.family().state(),
            Self::HeatSource(_) => StateKind::HeatSource,
            Self::Temperature(_) => StateKind::Temperature,
            Self::MaxTemperature(_) => StateKind::MaxTemperature,
            Self::Threshold(s) => s.kind(),
        }
    }

    /// Whether this is an offline placeholder.
    pub const fn is_dummy(&self) -> bool {
        matches!(self, Self::Dummy(_))
    }

    /// Current value of an absolute state.
    ///
    /// # Errors
    ///
    /// [`StateError::UnsupportedOperation`] for relative states, or a
    /// physics error for cached states.
    pub fn value(&self, reader: &StateReader<'_>) -> Result<StateValue, StateError> {
        match self {
            Self::Dummy(s) if s.arity == Arity::Relative => Err(StateError::unsupported(
                s.kind,
                "relative state; query it with a target",
            )),
            Self::Dummy(s) => Ok(s.value.clone()),
            Self::Flag(s) => Ok(StateValue::Bool(s.value())),
            Self::Soaked(s) => Ok(StateValue::Bool(s.value())),
            Self::Cached(s) => s.value(reader.physics),
            Self::Relation(s) => Err(StateError::unsupported(
                s.kind(),
                "relative state; query it with a target",
            )),
            Self::Particles(s) => Ok(StateValue::Bool(s.value())),
            Self::HeatSource(s) => Ok(StateValue::Bool(s.value())),
            Self::Temperature(s) => Ok(StateValue::Float(s.value())),
            Self::MaxTemperature(s) => Ok(StateValue::Float(s.value())),
            Self::Threshold(s) => Ok(StateValue::Bool(s.value())),
        }
    }

    /// Value of a relative state towards `target`.
    ///
    /// # Errors
    ///
    /// [`StateError::UnsupportedOperation`] for absolute states;
    /// [`StateError::MissingDependencyValue`] when geometry is unavailable.
    pub fn relation(&self, target: ObjectId, reader: &StateReader<'_>) -> Result<bool, StateError> {
        match self {
            Self::Relation(s) => s.holds(target, reader),
            Self::Dummy(s) if s.arity == Arity::Relative => Ok(s.relation(target)),
            other => Err(StateError::unsupported(
                other.kind(),
                "absolute state; query it without a target",
            )),
        }
    }

    /// Set an absolute state.
    ///
    /// # Errors
    ///
    /// - [`StateError::UnsupportedOperation`] for physics-derived, derived
    ///   thermal and relative states.
    /// - [`StateError::ValueKindMismatch`] if `value` has the wrong kind.
    pub fn set_value(&mut self, value: &StateValue, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        let kind = self.kind();
        match self {
            Self::Dummy(s) => {
                if s.arity == Arity::Relative {
                    return Err(StateError::unsupported(kind, "relative state; set it with a target"));
                }
                if s.value.kind() != value.kind() {
                    return Err(StateError::ValueKindMismatch {
                        state: kind,
                        expected: s.value.kind(),
                        actual: value.kind(),
                    });
                }
                s.value = value.clone();
                Ok(())
            }
            Self::Flag(s) => {
                s.set(expect_bool(kind, value)?);
                Ok(())
            }
            Self::Soaked(s) => {
                s.set(expect_bool(kind, value)?);
                Ok(())
            }
            Self::Particles(s) => s.set(expect_bool(kind, value)?, ctx),
            Self::Temperature(s) => {
                s.set(expect_float(kind, value)?);
                Ok(())
            }
            Self::MaxTemperature(s) => {
                s.set(expect_float(kind, value)?);
                Ok(())
            }
            Self::Cached(_) => Err(StateError::unsupported(
                kind,
                "value is read from the physics engine",
            )),
            Self::Relation(_) => Err(StateError::unsupported(
                kind,
                "relative state; set it with a target",
            )),
            Self::HeatSource(_) | Self::Threshold(_) => Err(StateError::unsupported(
                kind,
                "value is derived from other states",
            )),
        }
    }

    /// Make a relative state hold (or, for placeholders, record it).
    ///
    /// Returns the placement when the object was moved.
    ///
    /// # Errors
    ///
    /// - [`StateError::UnsupportedOperation`] for absolute states,
    ///   query-only relations, or a request to make a relation false.
    /// - [`StateError::PlacementFailure`] when the placer gives up.
    pub fn set_relation(
        &mut self,
        target: ObjectId,
        value: bool,
        physics: &mut dyn PhysicsBackend,
        rng: &mut dyn RngCore,
        config: &StatesConfig,
    ) -> Result<Option<Placement>, StateError> {
        match self {
            Self::Dummy(s) if s.arity == Arity::Relative => {
                s.relations.insert(target, value);
                Ok(None)
            }
            Self::Relation(s) => {
                if !is_placeable(s.kind()) {
                    return Err(StateError::unsupported(
                        s.kind(),
                        "relation can only be queried, not placed",
                    ));
                }
                if !value {
                    return Err(StateError::unsupported(
                        s.kind(),
                        "a relation can only be established, not removed",
                    ));
                }
                let placer = RelativeStatePlacer::new(&config.placement, &config.kinematics);
                placer
                    .place(physics, rng, s.kind(), s.owner(), target)
                    .map(Some)
            }
            other => Err(StateError::unsupported(
                other.kind(),
                "absolute state; set it without a target",
            )),
        }
    }

    /// Per-tick update hook.
    ///
    /// # Errors
    ///
    /// Whatever the family's update reports.
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        match self {
            Self::Soaked(s) => s.update(ctx),
            Self::Particles(s) => s.update(ctx),
            Self::HeatSource(s) => s.update(ctx),
            Self::Temperature(s) => s.update(ctx),
            Self::MaxTemperature(s) => s.update(ctx),
            Self::Threshold(s) => s.update(ctx),
            Self::Dummy(_) | Self::Flag(_) | Self::Cached(_) | Self::Relation(_) => Ok(()),
        }
    }

    /// Drop any memoized value.
    pub fn invalidate(&mut self) {
        if let Self::Cached(s) = self {
            s.cache.invalidate();
        }
    }

    /// The particle state, if this is `dirty` or `stained`.
    pub const fn as_particles(&self) -> Option<&ParticleState> {
        match self {
            Self::Particles(s) => Some(s),
            _ => None,
        }
    }

    /// The cached state, if this is `pose`, `aabb` or `contact_bodies`.
    pub const fn as_cached(&self) -> Option<&CachedState> {
        match self {
            Self::Cached(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use objstate_physics::KinematicWorld;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::context::SceneView;
    use crate::registry::StateRegistry;
    use crate::state_set::ObjectStateSet;

    struct EmptyScene;

    impl SceneView for EmptyScene {
        fn states_of(&self, _object: ObjectId) -> Option<&ObjectStateSet> {
            None
        }

        fn objects_with_state(&self, _kind: StateKind) -> Vec<ObjectId> {
            Vec::new()
        }
    }

    fn make(kind: StateKind, owner: ObjectId, online: bool) -> StateInstance {
        let registry = StateRegistry::standard().unwrap();
        instantiate(
            registry.resolve(kind).unwrap(),
            owner,
            &AbilityParams::new(),
            &StatesConfig::default(),
            online,
        )
    }

    #[test]
    fn each_kind_maps_to_its_family() {
        let owner = ObjectId::new();
        for kind in StateKind::ALL {
            assert_eq!(make(kind, owner, true).kind(), kind);
            let dummy = make(kind, owner, false);
            assert!(dummy.is_dummy());
            assert_eq!(dummy.kind(), kind);
        }
        assert!(matches!(make(StateKind::Aabb, owner, true), StateInstance::Cached(_)));
        assert!(matches!(make(StateKind::Inside, owner, true), StateInstance::Relation(_)));
        assert!(matches!(make(StateKind::Dirty, owner, true), StateInstance::Particles(_)));
    }

    #[test]
    fn cached_aabb_reads_physics_once_until_invalidated() {
        let owner = ObjectId::new();
        let mut world = KinematicWorld::new();
        world
            .add_box(owner, DVec3::splat(0.5), Pose::from_position(DVec3::ZERO))
            .unwrap();
        let config = StatesConfig::default();
        let reader = StateReader::new(&EmptyScene, &world, &config);

        let mut state = make(StateKind::Aabb, owner, true);
        let first = state.value(&reader).unwrap();
        let second = state.value(&reader).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.as_cached().unwrap().computations(), 1);

        state.invalidate();
        assert!(!state.as_cached().unwrap().is_valid());
        state.value(&reader).unwrap();
        assert_eq!(state.as_cached().unwrap().computations(), 2);
    }

    #[test]
    fn cached_state_rejects_set() {
        let owner = ObjectId::new();
        let world = KinematicWorld::new();
        let config = StatesConfig::default();
        let reader = StateReader::new(&EmptyScene, &world, &config);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ctx = StateContext::new(owner, reader, &mut rng, 0);

        let mut state = make(StateKind::Pose, owner, true);
        let err = state
            .set_value(&StateValue::Pose(Pose::default()), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, StateError::UnsupportedOperation { .. }));
    }

    #[test]
    fn flags_check_value_kind() {
        let owner = ObjectId::new();
        let world = KinematicWorld::new();
        let config = StatesConfig::default();
        let reader = StateReader::new(&EmptyScene, &world, &config);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ctx = StateContext::new(owner, reader, &mut rng, 0);

        let mut open = make(StateKind::Open, owner, true);
        open.set_value(&StateValue::Bool(true), &mut ctx).unwrap();
        assert_eq!(open.value(&reader).unwrap(), StateValue::Bool(true));
        assert_eq!(
            open.set_value(&StateValue::Float(1.0), &mut ctx).unwrap_err(),
            StateError::ValueKindMismatch {
                state: StateKind::Open,
                expected: ValueKind::Bool,
                actual: ValueKind::Float,
            }
        );

        let mut cooked = make(StateKind::Cooked, owner, true);
        assert!(matches!(
            cooked.set_value(&StateValue::Bool(true), &mut ctx),
            Err(StateError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn relations_need_a_target() {
        let owner = ObjectId::new();
        let world = KinematicWorld::new();
        let config = StatesConfig::default();
        let reader = StateReader::new(&EmptyScene, &world, &config);

        let inside = make(StateKind::Inside, owner, true);
        assert!(matches!(
            inside.value(&reader),
            Err(StateError::UnsupportedOperation { .. })
        ));
        let open = make(StateKind::Open, owner, true);
        assert!(matches!(
            open.relation(ObjectId::new(), &reader),
            Err(StateError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn dummy_stores_values_and_relations_without_physics() {
        let owner = ObjectId::new();
        let target = ObjectId::new();
        let mut world = KinematicWorld::new();
        let config = StatesConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let mut inside = make(StateKind::Inside, owner, false);
        let placed = inside
            .set_relation(target, true, &mut world, &mut rng, &config)
            .unwrap();
        assert!(placed.is_none());

        let reader = StateReader::new(&EmptyScene, &world, &config);
        assert!(inside.relation(target, &reader).unwrap());
        assert!(!inside.relation(ObjectId::new(), &reader).unwrap());

        let mut ctx = StateContext::new(owner, reader, &mut rng, 0);
        let mut dirty = make(StateKind::Dirty, owner, false);
        dirty.set_value(&StateValue::Bool(true), &mut ctx).unwrap();
        dirty.update(&mut ctx).unwrap();
        assert_eq!(dirty.value(&reader).unwrap(), StateValue::Bool(true));

        let aabb = make(StateKind::Aabb, owner, false);
        assert!(aabb.value(&reader).unwrap().as_aabb().is_some());
    }

    #[test]
    fn relations_cannot_be_removed_or_placed_when_query_only() {
        let owner = ObjectId::new();
        let mut world = KinematicWorld::new();
        let config = StatesConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let mut inside = make(StateKind::Inside, owner, true);
        assert!(matches!(
            inside.set_relation(ObjectId::new(), false, &mut world, &mut rng, &config),
            Err(StateError::UnsupportedOperation { .. })
        ));
        let mut touching = make(StateKind::Touching, owner, true);
        assert!(matches!(
            touching.set_relation(ObjectId::new(), true, &mut world, &mut rng, &config),
            Err(StateError::UnsupportedOperation { .. })
        ));
    }
}
