//! The state registry: descriptors, ability mappings, and default states.
//!
//! A [`StateRegistry`] is built once at startup through [`RegistryBuilder`],
//! validated (every referenced state registered, dependency graph acyclic),
//! and then shared read-only, typically behind an `Arc`. There is no global
//! registry; callers pass it explicitly to whatever needs it.
//!
//! [`StateRegistry::standard`] builds the catalog of every built-in state.

use std::collections::BTreeMap;

use objstate_types::{Ability, Arity, StateKind, ValueKind};
use tracing::debug;

use crate::error::RegistryError;
use crate::graph::DependencyGraph;

/// Static description of one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDescriptor {
    /// The state this descriptor describes.
    pub kind: StateKind,
    /// Single object or object pair.
    pub arity: Arity,
    /// Shape of the produced value.
    pub value_kind: ValueKind,
    /// Whether the value is memoized per tick.
    pub cacheable: bool,
    /// Dependencies instantiated alongside this state, in order.
    pub required: Vec<StateKind>,
    /// Dependencies consulted only when present.
    pub optional: Vec<StateKind>,
}

impl StateDescriptor {
    /// An absolute (single-object) state with no dependencies.
    pub const fn absolute(kind: StateKind, value_kind: ValueKind) -> Self {
        Self {
            kind,
            arity: Arity::Absolute,
            value_kind,
            cacheable: false,
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    /// A relative (object-pair) boolean state with no dependencies.
    pub const fn relative(kind: StateKind) -> Self {
        Self {
            kind,
            arity: Arity::Relative,
            value_kind: ValueKind::Bool,
            cacheable: false,
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    /// Append required dependencies.
    #[must_use]
    pub fn requires(mut self, deps: &[StateKind]) -> Self {
        self.required.extend_from_slice(deps);
        self
    }

    /// Append optional dependencies.
    #[must_use]
    pub fn optionally(mut self, deps: &[StateKind]) -> Self {
        self.optional.extend_from_slice(deps);
        self
    }

    /// Mark the state as cacheable.
    #[must_use]
    pub const fn cached(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Required then optional dependencies.
    pub fn dependencies(&self) -> impl Iterator<Item = StateKind> + '_ {
        self.required.iter().chain(self.optional.iter()).copied()
    }
}

/// Validated, immutable catalog of states and abilities.
#[derive(Debug, Clone)]
pub struct StateRegistry {
    /// Descriptors in registration order.
    descriptors: Vec<StateDescriptor>,
    /// State -> index into `descriptors`.
    positions: BTreeMap<StateKind, usize>,
    /// Ability -> states it implies.
    abilities: BTreeMap<Ability, Vec<StateKind>>,
    /// States every object carries regardless of abilities.
    defaults: Vec<StateKind>,
    /// Global dependencies-first update order.
    update_order: Vec<StateKind>,
}

impl StateRegistry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The catalog of every built-in state, ability and default state.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in table itself is inconsistent.
    pub fn standard() -> Result<Self, RegistryError> {
        use StateKind as S;

        let kinematic = [S::Pose, S::Aabb, S::ContactBodies];

        Self::builder()
            // Kinematic
            .state(StateDescriptor::absolute(S::Pose, ValueKind::Pose).cached())
            .state(StateDescriptor::absolute(S::Aabb, ValueKind::Aabb).cached())
            .state(StateDescriptor::absolute(S::ContactBodies, ValueKind::Contacts).cached())
            .state(StateDescriptor::relative(S::OnTop).requires(&kinematic))
            .state(StateDescriptor::absolute(S::Open, ValueKind::Bool))
            .state(StateDescriptor::relative(S::Inside).requires(&kinematic))
            .state(StateDescriptor::relative(S::NextTo).requires(&kinematic))
            .state(StateDescriptor::relative(S::Under).requires(&kinematic))
            .state(StateDescriptor::relative(S::Touching).requires(&kinematic))
            .state(StateDescriptor::absolute(S::ToggledOn, ValueKind::Bool))
            // Particle related
            .state(
                StateDescriptor::absolute(S::Soaked, ValueKind::Bool)
                    .requires(&[S::Aabb])
                    .optionally(&[S::WaterSource]),
            )
            .state(
                StateDescriptor::absolute(S::Dirty, ValueKind::Bool)
                    .requires(&[S::Aabb])
                    .optionally(&[S::CleaningTool]),
            )
            .state(
                StateDescriptor::absolute(S::Stained, ValueKind::Bool)
                    .requires(&[S::Aabb])
                    .optionally(&[S::Soaked, S::CleaningTool]),
            )
            .state(StateDescriptor::absolute(S::WaterSource, ValueKind::Bool).requires(&[S::Aabb]))
            .state(StateDescriptor::absolute(S::CleaningTool, ValueKind::Bool))
            // Thermal
            .state(
                StateDescriptor::absolute(S::HeatSource, ValueKind::Bool)
                    .requires(&[S::Aabb])
                    .optionally(&[S::ToggledOn]),
            )
            .state(
                StateDescriptor::absolute(S::Temperature, ValueKind::Float)
                    .requires(&[S::Aabb])
                    .optionally(&[S::HeatSource]),
            )
            .state(
                StateDescriptor::absolute(S::MaxTemperature, ValueKind::Float)
                    .requires(&[S::Temperature]),
            )
            .state(StateDescriptor::absolute(S::Burnt, ValueKind::Bool).requires(&[S::MaxTemperature]))
            .state(StateDescriptor::absolute(S::Cooked, ValueKind::Bool).requires(&[S::MaxTemperature]))
            // Abilities
            .ability(Ability::Cookable, &[S::Cooked])
            .ability(Ability::Soakable, &[S::Soaked])
            .ability(Ability::Dustable, &[S::Dirty])
            .ability(Ability::Scrubbable, &[S::Stained])
            .ability(Ability::WaterSource, &[S::WaterSource])
            .ability(Ability::CleaningTool, &[S::CleaningTool])
            .ability(Ability::Toggleable, &[S::ToggledOn])
            .ability(Ability::Burnable, &[S::Burnt])
            .ability(Ability::HeatSource, &[S::HeatSource])
            // Carried by every object
            .default_states(&[S::OnTop, S::Inside, S::NextTo, S::Under, S::Touching, S::Open])
            .build()
    }

    /// Look up the descriptor of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownState`] if `kind` is not registered.
    pub fn resolve(&self, kind: StateKind) -> Result<&StateDescriptor, RegistryError> {
        self.positions
            .get(&kind)
            .and_then(|i| self.descriptors.get(*i))
            .ok_or_else(|| RegistryError::UnknownState(kind.to_string()))
    }

    /// Look up a descriptor by its string identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownState`] for unknown or unregistered
    /// identifiers.
    pub fn resolve_name(&self, name: &str) -> Result<&StateDescriptor, RegistryError> {
        let kind: StateKind = name.parse()?;
        self.resolve(kind)
    }

    /// States implied by `ability`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAbility`] if the ability has no
    /// mapping in this registry.
    pub fn abilities_to_states(&self, ability: Ability) -> Result<&[StateKind], RegistryError> {
        self.abilities
            .get(&ability)
            .map(Vec::as_slice)
            .ok_or_else(|| RegistryError::UnknownAbility(ability.to_string()))
    }

    /// States implied by an ability given by its string identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownAbility`] for unknown identifiers.
    pub fn ability_states_by_name(&self, name: &str) -> Result<&[StateKind], RegistryError> {
        let ability: Ability = name.parse()?;
        self.abilities_to_states(ability)
    }

    /// States every object carries.
    pub fn default_states(&self) -> &[StateKind] {
        &self.defaults
    }

    /// Every descriptor in registration order.
    pub fn descriptors(&self) -> &[StateDescriptor] {
        &self.descriptors
    }

    /// Whether `kind` is registered.
    pub fn contains(&self, kind: StateKind) -> bool {
        self.positions.contains_key(&kind)
    }

    /// The global dependencies-first update order computed at build time.
    pub fn update_order(&self) -> &[StateKind] {
        &self.update_order
    }
}

/// Incremental constructor for [`StateRegistry`].
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    descriptors: Vec<StateDescriptor>,
    abilities: BTreeMap<Ability, Vec<StateKind>>,
    defaults: Vec<StateKind>,
}

impl RegistryBuilder {
    /// Register a state. Registration order is the tie-break order of the
    /// update schedule.
    #[must_use]
    pub fn state(mut self, descriptor: StateDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Map an ability to the states it implies.
    #[must_use]
    pub fn ability(mut self, ability: Ability, states: &[StateKind]) -> Self {
        self.abilities.entry(ability).or_default().extend_from_slice(states);
        self
    }

    /// Add states carried by every object.
    #[must_use]
    pub fn default_states(mut self, states: &[StateKind]) -> Self {
        for kind in states {
            if !self.defaults.contains(kind) {
                self.defaults.push(*kind);
            }
        }
        self
    }

    /// Validate and freeze the registry.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateState`] if a state is registered twice.
    /// - [`RegistryError::UnknownState`] if a dependency, ability target or
    ///   default state is not registered.
    /// - [`RegistryError::CyclicDependency`] if the dependency graph has a
    ///   cycle.
    pub fn build(self) -> Result<StateRegistry, RegistryError> {
        let mut positions = BTreeMap::new();
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            if positions.insert(descriptor.kind, i).is_some() {
                return Err(RegistryError::DuplicateState(descriptor.kind));
            }
        }

        let referenced = self
            .descriptors
            .iter()
            .flat_map(StateDescriptor::dependencies)
            .chain(self.abilities.values().flatten().copied())
            .chain(self.defaults.iter().copied());
        for kind in referenced {
            if !positions.contains_key(&kind) {
                return Err(RegistryError::UnknownState(kind.to_string()));
            }
        }

        let update_order = DependencyGraph::from_descriptors(&self.descriptors).topological_order()?;
        debug!(
            states = self.descriptors.len(),
            abilities = self.abilities.len(),
            "State registry validated"
        );

        Ok(StateRegistry {
            descriptors: self.descriptors,
            positions,
            abilities: self.abilities,
            defaults: self.defaults,
            update_order,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_every_state() {
        let registry = StateRegistry::standard().unwrap();
        for kind in StateKind::ALL {
            assert!(registry.contains(kind), "{kind} missing");
        }
        assert_eq!(registry.update_order().len(), StateKind::ALL.len());
    }

    #[test]
    fn resolve_returns_declared_dependencies() {
        let registry = StateRegistry::standard().unwrap();
        let dirty = registry.resolve(StateKind::Dirty).unwrap();
        assert_eq!(dirty.required, vec![StateKind::Aabb]);
        assert_eq!(dirty.optional, vec![StateKind::CleaningTool]);
        assert_eq!(dirty.arity, Arity::Absolute);
        assert!(!dirty.cacheable);
        assert!(registry.resolve(StateKind::ContactBodies).unwrap().cacheable);
    }

    #[test]
    fn resolve_name_rejects_unknown_identifiers() {
        let registry = StateRegistry::standard().unwrap();
        assert_eq!(
            registry.resolve_name("inside").unwrap().arity,
            Arity::Relative
        );
        assert_eq!(
            registry.resolve_name("glowing").unwrap_err(),
            RegistryError::UnknownState("glowing".to_owned())
        );
    }

    #[test]
    fn unregistered_kind_is_unknown() {
        let registry = StateRegistry::builder()
            .state(StateDescriptor::absolute(StateKind::Open, ValueKind::Bool))
            .build()
            .unwrap();
        assert_eq!(
            registry.resolve(StateKind::Dirty).unwrap_err(),
            RegistryError::UnknownState("dirty".to_owned())
        );
    }

    #[test]
    fn abilities_map_to_states() {
        let registry = StateRegistry::standard().unwrap();
        assert_eq!(
            registry.abilities_to_states(Ability::Dustable).unwrap(),
            &[StateKind::Dirty]
        );
        assert_eq!(
            registry.ability_states_by_name("scrubbable").unwrap(),
            &[StateKind::Stained]
        );
        assert_eq!(
            registry.ability_states_by_name("telepathic").unwrap_err(),
            RegistryError::UnknownAbility("telepathic".to_owned())
        );
    }

    #[test]
    fn unmapped_ability_is_unknown() {
        let registry = StateRegistry::builder().build().unwrap();
        assert_eq!(
            registry.abilities_to_states(Ability::Cookable).unwrap_err(),
            RegistryError::UnknownAbility("cookable".to_owned())
        );
    }

    #[test]
    fn cycle_fails_construction() {
        let result = StateRegistry::builder()
            .state(StateDescriptor::absolute(StateKind::Dirty, ValueKind::Bool).requires(&[StateKind::Aabb]))
            .state(StateDescriptor::absolute(StateKind::Aabb, ValueKind::Aabb).requires(&[StateKind::Dirty]))
            .build();
        assert!(matches!(result, Err(RegistryError::CyclicDependency { .. })));
    }

    #[test]
    fn unregistered_dependency_fails_construction() {
        let result = StateRegistry::builder()
            .state(StateDescriptor::absolute(StateKind::Dirty, ValueKind::Bool).requires(&[StateKind::Aabb]))
            .build();
        assert_eq!(
            result.unwrap_err(),
            RegistryError::UnknownState("aabb".to_owned())
        );
    }

    #[test]
    fn duplicate_registration_fails_construction() {
        let result = StateRegistry::builder()
            .state(StateDescriptor::absolute(StateKind::Open, ValueKind::Bool))
            .state(StateDescriptor::absolute(StateKind::Open, ValueKind::Bool))
            .build();
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateState(StateKind::Open));
    }

    #[test]
    fn defaults_are_the_spatial_relations_and_open() {
        let registry = StateRegistry::standard().unwrap();
        assert_eq!(registry.default_states().len(), 6);
        assert!(registry.default_states().contains(&StateKind::Inside));
        assert!(registry.default_states().contains(&StateKind::Open));
    }
}
