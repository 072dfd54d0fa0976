//! State declarations, dependency resolution, and state families.
//!
//! This crate owns everything about a single state: what it depends on,
//! how it is instantiated on an object, how its value is computed or
//! cached, and how it is updated or set. Scheduling across objects lives in
//! `objstate-core`.
//!
//! # Modules
//!
//! - [`registry`] -- [`StateRegistry`], [`StateDescriptor`], the standard catalog
//! - [`graph`] -- Dependency graph and the global update order
//! - [`state_set`] -- [`ObjectStateSet`] and [`prepare_states`]
//! - [`instance`] -- [`StateInstance`], one variant per family
//! - [`cache`] -- Per-tick memoization
//! - [`context`] -- [`SceneView`], [`StateReader`], [`StateContext`]
//! - [`kinematics`] -- Spatial relation predicates
//! - [`placement`] -- [`RelativeStatePlacer`]
//! - [`particles`] -- `dirty` / `stained` particle populations
//! - [`flags`] -- Stored booleans and `soaked`
//! - [`thermal`] -- Heat sources, temperature, cooked and burnt
//! - [`params`] -- Ability parameter maps
//! - [`config`] -- Tunables for every family
//! - [`error`] -- [`RegistryError`], [`StateError`]

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod flags;
pub mod graph;
pub mod instance;
pub mod kinematics;
pub mod params;
pub mod particles;
pub mod placement;
pub mod registry;
pub mod state_set;
pub mod thermal;

pub use cache::CachedValue;
pub use config::{KinematicsConfig, ParticleConfig, PlacementConfig, StatesConfig, ThermalConfig};
pub use context::{SceneView, StateContext, StateReader};
pub use error::{RegistryError, StateError};
pub use graph::{DependencyGraph, build_graph, topological_order};
pub use instance::{StateInstance, instantiate};
pub use params::AbilityParams;
pub use particles::{ParticleFamily, ParticlePopulation, ParticleState, exceeds_threshold};
pub use placement::{Placement, RelativeStatePlacer};
pub use registry::{RegistryBuilder, StateDescriptor, StateRegistry};
pub use state_set::{ObjectStateSet, prepare_states};
