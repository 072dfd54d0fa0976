//! The scene: live objects and the state-kind index.
//!
//! The index maps every state kind to the set of objects carrying it and is
//! maintained incrementally as objects are added, prepared, or removed, so
//! "all objects with state X" never scans the scene.

use std::collections::{BTreeMap, BTreeSet};

use objstate_states::{
    AbilityParams, ObjectStateSet, SceneView, StateInstance, StateRegistry, StatesConfig,
};
use objstate_types::{Ability, ObjectId, StateKind};

use crate::error::SimulationError;

/// A simulated object.
#[derive(Debug)]
pub struct SimObject {
    /// Unique identifier, also the physics body handle.
    pub id: ObjectId,
    /// Human-readable name.
    pub name: String,
    /// Abilities the object was imported with.
    pub abilities: BTreeMap<Ability, AbilityParams>,
    /// The object's states.
    pub states: ObjectStateSet,
}

/// All live objects.
#[derive(Debug, Default)]
pub struct Scene {
    objects: BTreeMap<ObjectId, SimObject>,
    index: BTreeMap<StateKind, BTreeSet<ObjectId>>,
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and index its states.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::DuplicateObject`] if the id is taken.
    pub fn add_object(&mut self, object: SimObject) -> Result<(), SimulationError> {
        if self.objects.contains_key(&object.id) {
            return Err(SimulationError::DuplicateObject(object.id));
        }
        for kind in object.states.kinds() {
            self.index.entry(kind).or_default().insert(object.id);
        }
        self.objects.insert(object.id, object);
        Ok(())
    }

    /// Remove an object and drop it from the index.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<SimObject> {
        let object = self.objects.remove(&id)?;
        for kind in object.states.kinds() {
            if let Some(ids) = self.index.get_mut(&kind) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.index.remove(&kind);
                }
            }
        }
        Some(object)
    }

    /// Add `abilities` to an existing object and index any new states.
    ///
    /// # Errors
    ///
    /// [`SimulationError::UnknownObject`] or a registry error.
    pub fn prepare_object(
        &mut self,
        id: ObjectId,
        abilities: &BTreeMap<Ability, AbilityParams>,
        registry: &StateRegistry,
        config: &StatesConfig,
    ) -> Result<(), SimulationError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(SimulationError::UnknownObject(id))?;
        object.states.prepare(abilities, registry, config)?;
        for (ability, params) in abilities {
            object.abilities.insert(*ability, params.clone());
        }
        for kind in object.states.kinds() {
            self.index.entry(kind).or_default().insert(id);
        }
        Ok(())
    }

    /// Look up an object.
    pub fn object(&self, id: ObjectId) -> Option<&SimObject> {
        self.objects.get(&id)
    }

    /// Whether the object is live.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Mutable access to an object's states.
    pub fn states_mut(&mut self, id: ObjectId) -> Option<&mut ObjectStateSet> {
        self.objects.get_mut(&id).map(|object| &mut object.states)
    }

    /// Live object ids.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// A copy of the index, taken before an update pass so that the pass
    /// sees a fixed object set.
    pub fn index_snapshot(&self) -> BTreeMap<StateKind, Vec<ObjectId>> {
        self.index
            .iter()
            .map(|(kind, ids)| (*kind, ids.iter().copied().collect()))
            .collect()
    }

    /// Remove a state instance for updating. The index is left untouched.
    pub fn take_state(&mut self, id: ObjectId, kind: StateKind) -> Option<StateInstance> {
        self.objects.get_mut(&id)?.states.take(kind)
    }

    /// Return a state instance removed with [`Self::take_state`].
    pub fn restore_state(&mut self, id: ObjectId, instance: StateInstance) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.states.restore(instance);
        }
    }

    /// Drop the memoized values of every object.
    pub fn invalidate_caches(&mut self) {
        for object in self.objects.values_mut() {
            object.states.invalidate_caches();
        }
    }

    /// Drop the memoized values of one object.
    pub fn invalidate_object(&mut self, id: ObjectId) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.states.invalidate_caches();
        }
    }
}

impl SceneView for Scene {
    fn states_of(&self, object: ObjectId) -> Option<&ObjectStateSet> {
        self.objects.get(&object).map(|o| &o.states)
    }

    fn objects_with_state(&self, kind: StateKind) -> Vec<ObjectId> {
        self.index
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use objstate_states::prepare_states;

    use super::*;

    fn object(registry: &StateRegistry, abilities: &[Ability]) -> SimObject {
        let id = ObjectId::new();
        let abilities: BTreeMap<Ability, AbilityParams> =
            abilities.iter().map(|a| (*a, AbilityParams::new())).collect();
        let states =
            prepare_states(id, &abilities, true, registry, &StatesConfig::default()).unwrap();
        SimObject {
            id,
            name: "thing".to_owned(),
            abilities,
            states,
        }
    }

    #[test]
    fn index_tracks_adds_and_removes() {
        let registry = StateRegistry::standard().unwrap();
        let mut scene = Scene::new();
        let rag = object(&registry, &[Ability::CleaningTool]);
        let plate = object(&registry, &[Ability::Dustable]);
        let (rag_id, plate_id) = (rag.id, plate.id);
        scene.add_object(rag).unwrap();
        scene.add_object(plate).unwrap();

        assert_eq!(scene.objects_with_state(StateKind::CleaningTool), vec![rag_id]);
        assert_eq!(scene.objects_with_state(StateKind::Dirty), vec![plate_id]);
        assert_eq!(scene.objects_with_state(StateKind::Inside).len(), 2);

        scene.remove_object(rag_id).unwrap();
        assert!(scene.objects_with_state(StateKind::CleaningTool).is_empty());
        assert_eq!(scene.objects_with_state(StateKind::Inside), vec![plate_id]);
        assert!(!scene.index_snapshot().contains_key(&StateKind::CleaningTool));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let registry = StateRegistry::standard().unwrap();
        let mut scene = Scene::new();
        let first = object(&registry, &[]);
        let id = first.id;
        scene.add_object(first).unwrap();
        let states = prepare_states(
            id,
            &BTreeMap::new(),
            true,
            &registry,
            &StatesConfig::default(),
        )
        .unwrap();
        let twin = SimObject {
            id,
            name: "twin".to_owned(),
            abilities: BTreeMap::new(),
            states,
        };
        assert_eq!(
            scene.add_object(twin).unwrap_err(),
            SimulationError::DuplicateObject(id)
        );
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn prepare_object_indexes_new_states() {
        let registry = StateRegistry::standard().unwrap();
        let mut scene = Scene::new();
        let thing = object(&registry, &[]);
        let id = thing.id;
        scene.add_object(thing).unwrap();
        assert!(scene.objects_with_state(StateKind::Soaked).is_empty());

        let more = BTreeMap::from([(Ability::Soakable, AbilityParams::new())]);
        scene
            .prepare_object(id, &more, &registry, &StatesConfig::default())
            .unwrap();
        assert_eq!(scene.objects_with_state(StateKind::Soaked), vec![id]);
        assert!(scene.object(id).unwrap().abilities.contains_key(&Ability::Soakable));
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let registry = StateRegistry::standard().unwrap();
        let mut scene = Scene::new();
        let first = object(&registry, &[Ability::Dustable]);
        scene.add_object(first).unwrap();
        let snapshot = scene.index_snapshot();
        scene.add_object(object(&registry, &[Ability::Dustable])).unwrap();
        assert_eq!(snapshot.get(&StateKind::Dirty).map(Vec::len), Some(1));
        assert_eq!(scene.objects_with_state(StateKind::Dirty).len(), 2);
    }
}
