//! State dependency graph and its global update order.
//!
//! Nodes are state kinds; an edge `A -> B` means "A depends on B", for both
//! required and optional dependencies. The update order is a topological
//! sort in which every dependency precedes its dependents. Among states with
//! no ordering constraint between them, the one registered first comes
//! first, so the order is identical on every run.
//!
//! Internally the sort is Kahn's algorithm with a `BTreeSet` of registration
//! positions as the ready queue.

use std::collections::{BTreeMap, BTreeSet};

use objstate_types::StateKind;

use crate::error::RegistryError;
use crate::registry::{StateDescriptor, StateRegistry};

/// Directed graph over state kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Nodes in registration order.
    nodes: Vec<StateKind>,
    /// Outbound edges: state -> its required then optional dependencies.
    edges: BTreeMap<StateKind, Vec<StateKind>>,
}

impl DependencyGraph {
    /// Build the graph from descriptors given in registration order.
    pub fn from_descriptors(descriptors: &[StateDescriptor]) -> Self {
        let mut nodes = Vec::with_capacity(descriptors.len());
        let mut edges = BTreeMap::new();
        for descriptor in descriptors {
            nodes.push(descriptor.kind);
            let mut deps: Vec<StateKind> = Vec::new();
            for dep in descriptor.dependencies() {
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
            edges.insert(descriptor.kind, deps);
        }
        Self { nodes, edges }
    }

    /// All nodes in registration order.
    pub fn nodes(&self) -> &[StateKind] {
        &self.nodes
    }

    /// Direct dependencies of `kind`.
    pub fn dependencies(&self, kind: StateKind) -> &[StateKind] {
        self.edges.get(&kind).map_or(&[][..], Vec::as_slice)
    }

    /// Every `(state, dependency)` edge.
    pub fn edges(&self) -> impl Iterator<Item = (StateKind, StateKind)> + '_ {
        self.nodes
            .iter()
            .flat_map(move |kind| self.dependencies(*kind).iter().map(move |dep| (*kind, *dep)))
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Dependencies-first total order over every node.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CyclicDependency`] naming one cycle if the
    /// graph is not a DAG. No partial order is returned.
    pub fn topological_order(&self) -> Result<Vec<StateKind>, RegistryError> {
        let position: BTreeMap<StateKind, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, kind)| (*kind, i))
            .collect();

        // Outstanding dependency count per node, and the reverse adjacency.
        let mut remaining: BTreeMap<StateKind, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<StateKind, Vec<StateKind>> = BTreeMap::new();
        for kind in &self.nodes {
            let deps: Vec<StateKind> = self
                .dependencies(*kind)
                .iter()
                .copied()
                .filter(|dep| position.contains_key(dep))
                .collect();
            remaining.insert(*kind, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(*kind);
            }
        }

        let mut ready: BTreeSet<usize> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .filter_map(|(kind, _)| position.get(kind).copied())
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(next) = ready.pop_first() {
            let Some(kind) = self.nodes.get(next).copied() else {
                continue;
            };
            order.push(kind);
            for dependent in dependents.get(&kind).map_or(&[][..], Vec::as_slice) {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count = count.saturating_sub(1);
                    if *count == 0
                        && let Some(pos) = position.get(dependent)
                    {
                        ready.insert(*pos);
                    }
                }
            }
        }

        if order.len() < self.nodes.len() {
            let leftover: BTreeSet<StateKind> = self
                .nodes
                .iter()
                .copied()
                .filter(|kind| !order.contains(kind))
                .collect();
            return Err(RegistryError::CyclicDependency {
                cycle: self.find_cycle(&leftover),
            });
        }

        Ok(order)
    }

    /// Walk dependency edges inside the unsorted remainder until a node
    /// repeats. Every unsorted node has at least one unsorted dependency,
    /// so the walk always closes a loop.
    fn find_cycle(&self, leftover: &BTreeSet<StateKind>) -> Vec<StateKind> {
        let Some(mut current) = self.nodes.iter().copied().find(|k| leftover.contains(k)) else {
            return Vec::new();
        };
        let mut path: Vec<StateKind> = Vec::new();
        loop {
            if let Some(start) = path.iter().position(|kind| *kind == current) {
                let mut cycle = path.split_off(start);
                cycle.push(current);
                return cycle;
            }
            path.push(current);
            match self
                .dependencies(current)
                .iter()
                .copied()
                .find(|dep| leftover.contains(dep))
            {
                Some(next) => current = next,
                None => return path,
            }
        }
    }
}

/// Build the dependency graph of every state in `registry`.
pub fn build_graph(registry: &StateRegistry) -> DependencyGraph {
    DependencyGraph::from_descriptors(registry.descriptors())
}

/// Dependencies-first order over every node of `graph`.
///
/// # Errors
///
/// Returns [`RegistryError::CyclicDependency`] if the graph has a cycle.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<StateKind>, RegistryError> {
    graph.topological_order()
}
