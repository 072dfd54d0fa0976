//! Per-object state collections.
//!
//! An [`ObjectStateSet`] holds at most one [`StateInstance`] per state kind.
//! It is populated by [`prepare_states`] from the registry's default
//! states, the states implied by the object's abilities, and the
//! breadth-first closure of their required dependencies. Optional
//! dependencies are never added automatically.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use objstate_types::{Ability, ObjectId, StateKind};
use tracing::debug;

use crate::config::StatesConfig;
use crate::error::RegistryError;
use crate::instance::{StateInstance, instantiate};
use crate::params::AbilityParams;
use crate::registry::StateRegistry;

/// The states carried by one object.
#[derive(Debug)]
pub struct ObjectStateSet {
    owner: ObjectId,
    online: bool,
    states: BTreeMap<StateKind, StateInstance>,
}

impl ObjectStateSet {
    /// An empty set for `owner`. Offline sets are filled with placeholders.
    pub const fn new(owner: ObjectId, online: bool) -> Self {
        Self {
            owner,
            online,
            states: BTreeMap::new(),
        }
    }

    /// The owning object.
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// Whether states query the physics engine.
    pub const fn is_online(&self) -> bool {
        self.online
    }

    /// Add every state implied by `abilities` plus the registry defaults and
    /// their required-dependency closure. States already present are kept
    /// as they are, so preparing twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownAbility`] or [`RegistryError::UnknownState`]
    /// if the registry lacks a mapping. The set is left unchanged.
    pub fn prepare(
        &mut self,
        abilities: &BTreeMap<Ability, AbilityParams>,
        registry: &StateRegistry,
        config: &StatesConfig,
    ) -> Result<(), RegistryError> {
        let mut queue: VecDeque<(StateKind, AbilityParams)> = VecDeque::new();
        let mut seen: BTreeSet<StateKind> = BTreeSet::new();

        for kind in registry.default_states() {
            enqueue(&mut queue, &mut seen, *kind, AbilityParams::new());
        }
        for (ability, params) in abilities {
            for kind in registry.abilities_to_states(*ability)? {
                enqueue(&mut queue, &mut seen, *kind, params.clone());
            }
        }

        // Resolve the whole closure before touching the set.
        let mut planned: Vec<(StateKind, AbilityParams)> = Vec::new();
        while let Some((kind, params)) = queue.pop_front() {
            let descriptor = registry.resolve(kind)?;
            for dep in &descriptor.required {
                enqueue(&mut queue, &mut seen, *dep, AbilityParams::new());
            }
            planned.push((kind, params));
        }

        let mut added = 0usize;
        for (kind, params) in planned {
            if self.states.contains_key(&kind) {
                continue;
            }
            let descriptor = registry.resolve(kind)?;
            self.states.insert(
                kind,
                instantiate(descriptor, self.owner, &params, config, self.online),
            );
            added = added.saturating_add(1);
        }

        debug!(
            object = %self.owner,
            added,
            total = self.states.len(),
            online = self.online,
            "States prepared"
        );
        Ok(())
    }

    /// The instance of `kind`, if carried.
    pub fn get(&self, kind: StateKind) -> Option<&StateInstance> {
        self.states.get(&kind)
    }

    /// Mutable access to the instance of `kind`.
    pub fn get_mut(&mut self, kind: StateKind) -> Option<&mut StateInstance> {
        self.states.get_mut(&kind)
    }

    /// Whether `kind` is carried.
    pub fn contains(&self, kind: StateKind) -> bool {
        self.states.contains_key(&kind)
    }

    /// Carried kinds in enum order.
    pub fn kinds(&self) -> impl Iterator<Item = StateKind> + '_ {
        self.states.keys().copied()
    }

    /// Number of carried states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no state is carried.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Temporarily remove an instance so it can be updated while the rest
    /// of the scene is read.
    pub fn take(&mut self, kind: StateKind) -> Option<StateInstance> {
        self.states.remove(&kind)
    }

    /// Put back an instance removed with [`Self::take`].
    pub fn restore(&mut self, instance: StateInstance) {
        self.states.insert(instance.kind(), instance);
    }

    /// Drop every memoized value.
    pub fn invalidate_caches(&mut self) {
        for instance in self.states.values_mut() {
            instance.invalidate();
        }
    }
}

fn enqueue(
    queue: &mut VecDeque<(StateKind, AbilityParams)>,
    seen: &mut BTreeSet<StateKind>,
    kind: StateKind,
    params: AbilityParams,
) {
    if seen.insert(kind) {
        queue.push_back((kind, params));
    }
}

/// Build the state set of a new object.
///
/// # Errors
///
/// As [`ObjectStateSet::prepare`].
pub fn prepare_states(
    owner: ObjectId,
    abilities: &BTreeMap<Ability, AbilityParams>,
    online: bool,
    registry: &StateRegistry,
    config: &StatesConfig,
) -> Result<ObjectStateSet, RegistryError> {
    let mut set = ObjectStateSet::new(owner, online);
    set.prepare(abilities, registry, config)?;
    Ok(set)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use objstate_types::ValueKind;
    use serde_json::json;

    use super::*;
    use crate::registry::StateDescriptor;

    fn abilities(list: &[Ability]) -> BTreeMap<Ability, AbilityParams> {
        list.iter().map(|a| (*a, AbilityParams::new())).collect()
    }

    #[test]
    fn dustable_gets_defaults_dirty_and_geometry() {
        let registry = StateRegistry::standard().unwrap();
        let set = prepare_states(
            ObjectId::new(),
            &abilities(&[Ability::Dustable]),
            true,
            &registry,
            &StatesConfig::default(),
        )
        .unwrap();

        let mut expected: Vec<StateKind> = registry.default_states().to_vec();
        expected.extend([
            StateKind::Dirty,
            StateKind::Pose,
            StateKind::Aabb,
            StateKind::ContactBodies,
        ]);
        expected.sort();
        assert_eq!(set.kinds().collect::<Vec<_>>(), expected);
        // Optional dependency of dirty.
        assert!(!set.contains(StateKind::CleaningTool));
    }

    #[test]
    fn preparing_twice_keeps_the_key_set() {
        let registry = StateRegistry::standard().unwrap();
        let config = StatesConfig::default();
        let wanted = abilities(&[Ability::Cookable, Ability::Scrubbable]);
        let mut set = prepare_states(ObjectId::new(), &wanted, true, &registry, &config).unwrap();
        let first: Vec<_> = set.kinds().collect();
        set.prepare(&wanted, &registry, &config).unwrap();
        assert_eq!(set.kinds().collect::<Vec<_>>(), first);
        // cooked -> max_temperature -> temperature -> aabb
        assert!(set.contains(StateKind::Temperature));
        assert!(!set.contains(StateKind::HeatSource));
        assert!(!set.contains(StateKind::Soaked));
    }

    #[test]
    fn offline_sets_hold_only_placeholders() {
        let registry = StateRegistry::standard().unwrap();
        let set = prepare_states(
            ObjectId::new(),
            &abilities(&[Ability::Dustable, Ability::HeatSource]),
            false,
            &registry,
            &StatesConfig::default(),
        )
        .unwrap();
        assert!(!set.is_online());
        assert!(!set.is_empty());
        for kind in set.kinds() {
            assert!(set.get(kind).unwrap().is_dummy(), "{kind} is not a placeholder");
        }
    }

    #[test]
    fn ability_params_reach_their_states() {
        let registry = StateRegistry::standard().unwrap();
        let mut wanted = AbilityParams::new();
        wanted.insert("particle_count".to_owned(), json!(12));
        let map = BTreeMap::from([(Ability::Dustable, wanted)]);
        let set = prepare_states(ObjectId::new(), &map, true, &registry, &StatesConfig::default())
            .unwrap();
        let dirty = set.get(StateKind::Dirty).unwrap().as_particles().unwrap();
        assert_eq!(dirty.settings().count, 12);
        assert!(dirty.population().is_none());
        assert_eq!(dirty.allocations(), 0);
    }

    #[test]
    fn unmapped_ability_leaves_set_untouched() {
        let registry = StateRegistry::builder()
            .state(StateDescriptor::absolute(StateKind::Open, ValueKind::Bool))
            .default_states(&[StateKind::Open])
            .build()
            .unwrap();
        let mut set = ObjectStateSet::new(ObjectId::new(), true);
        let err = set
            .prepare(&abilities(&[Ability::Dustable]), &registry, &StatesConfig::default())
            .unwrap_err();
        assert_eq!(err, RegistryError::UnknownAbility("dustable".to_owned()));
        assert!(set.is_empty());
    }

    #[test]
    fn take_and_restore_round_trip() {
        let registry = StateRegistry::standard().unwrap();
        let mut set = prepare_states(
            ObjectId::new(),
            &BTreeMap::new(),
            true,
            &registry,
            &StatesConfig::default(),
        )
        .unwrap();
        let open = set.take(StateKind::Open).unwrap();
        assert!(!set.contains(StateKind::Open));
        set.restore(open);
        assert!(set.contains(StateKind::Open));
    }
}
