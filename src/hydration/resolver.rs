//! # Dependency Resolver
//!
//! Topological layering of a table's hydrate declarations into waves.
//!
//! Wave *i* holds every spec whose dependencies are all satisfied by waves
//! `< i` (Kahn's algorithm). Resolution is computed once per table schema,
//! not per row, and is deterministic: wave membership order follows
//! declaration order, so plans are reproducible across runs. A cycle is a
//! fatal configuration error naming the implicated specs.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use super::errors::{HydrationError, HydrationResult};
use super::registry::HydrateRegistry;

/// Ordered partition of hydrate names into waves.
///
/// Built once at table registration and shared read-only across all
/// concurrent row hydrations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPlan {
    waves: Vec<Vec<String>>,
}

impl ExecutionPlan {
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// Number of waves.
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Total number of planned specs across all waves.
    pub fn spec_count(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// Zero-based wave index of a spec, if planned.
    pub fn wave_of(&self, name: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|n| n == name))
    }

    /// Plan restricted to the given names, preserving wave structure and
    /// dropping waves left empty. Used for lazy evaluation: only specs
    /// reachable from the requested columns are scheduled.
    pub fn restrict(&self, keep: &HashSet<String>) -> ExecutionPlan {
        let waves = self
            .waves
            .iter()
            .map(|wave| {
                wave.iter()
                    .filter(|name| keep.contains(*name))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .filter(|wave| !wave.is_empty())
            .collect();
        ExecutionPlan { waves }
    }
}

/// Resolve a registry's declarations into an execution plan.
///
/// # Errors
///
/// Returns [`HydrationError::UnknownDependency`] when a spec names a
/// dependency that is not registered, and
/// [`HydrationError::CycleDetected`] when the dependency graph is cyclic.
pub fn resolve(registry: &HydrateRegistry) -> HydrationResult<ExecutionPlan> {
    registry.validate()?;

    if registry.is_empty() {
        return Ok(ExecutionPlan::default());
    }

    // Build the dependency graph: edge dependency -> dependent.
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index_map: HashMap<String, NodeIndex> = HashMap::new();
    let mut insertion_order: Vec<NodeIndex> = Vec::new();

    for spec in registry.iter() {
        let idx = graph.add_node(spec.name().to_string());
        index_map.insert(spec.name().to_string(), idx);
        insertion_order.push(idx);
    }

    for spec in registry.iter() {
        let dependent = index_map[spec.name()];
        for dependency in spec.dependencies() {
            graph.add_edge(index_map[dependency], dependent, ());
        }
    }

    // Kahn layering with declaration-order tie-breaking within each wave.
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::with_capacity(graph.node_count());
    for &idx in &insertion_order {
        in_degree.insert(idx, 0);
    }
    for edge in graph.edge_references() {
        *in_degree.entry(edge.target()).or_insert(0) += 1;
    }

    let mut remaining: Vec<NodeIndex> = insertion_order.clone();
    let mut waves: Vec<Vec<String>> = Vec::new();

    while !remaining.is_empty() {
        let ready: Vec<NodeIndex> = remaining
            .iter()
            .filter(|idx| in_degree.get(idx).copied().unwrap_or(0) == 0)
            .copied()
            .collect();

        if ready.is_empty() {
            // Cycle: every remaining spec still has an unresolved dependency.
            let members = remaining
                .iter()
                .filter_map(|&idx| graph.node_weight(idx).cloned())
                .collect();
            return Err(HydrationError::CycleDetected { members });
        }

        let wave: Vec<String> = ready
            .iter()
            .filter_map(|&idx| graph.node_weight(idx).cloned())
            .collect();

        for &idx in &ready {
            for neighbor in graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&neighbor) {
                    *degree = degree.saturating_sub(1);
                }
            }
        }

        let ready_set: HashSet<NodeIndex> = ready.into_iter().collect();
        remaining.retain(|idx| !ready_set.contains(idx));
        waves.push(wave);
    }

    Ok(ExecutionPlan { waves })
}

/// Transitive dependency closure of the requested hydrate names.
///
/// # Errors
///
/// Returns [`HydrationError::UnknownHydrate`] when a requested name is not
/// registered.
pub fn dependency_closure(
    registry: &HydrateRegistry,
    requested: &HashSet<String>,
) -> HydrationResult<HashSet<String>> {
    let mut closure: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();

    for name in requested {
        if !registry.contains(name) {
            return Err(HydrationError::UnknownHydrate { name: name.clone() });
        }
        stack.push(name.clone());
    }

    while let Some(name) = stack.pop() {
        if !closure.insert(name.clone()) {
            continue;
        }
        if let Some(spec) = registry.get(&name) {
            for dependency in spec.dependencies() {
                if !closure.contains(dependency) {
                    stack.push(dependency.clone());
                }
            }
        }
    }

    Ok(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydration::registry::{HydrateFetch, HydrateSpec};
    use crate::provider::{ProviderError, QueryContext, RawRow};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct NullFetch;

    #[async_trait]
    impl HydrateFetch for NullFetch {
        async fn fetch(
            &self,
            _data: &crate::hydration::types::HydrateData,
            _ctx: &QueryContext,
        ) -> Result<RawRow, ProviderError> {
            Ok(Value::Null)
        }
    }

    fn registry_of(specs: &[(&str, &[&str])]) -> HydrateRegistry {
        let mut registry = HydrateRegistry::new();
        for (name, deps) in specs {
            registry
                .register(HydrateSpec::new(name, Arc::new(NullFetch)).depends_on(deps))
                .unwrap();
        }
        registry
    }

    #[test]
    fn empty_registry_resolves_to_empty_plan() {
        let plan = resolve(&HydrateRegistry::new()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.spec_count(), 0);
    }

    #[test]
    fn independent_specs_share_one_wave() {
        let registry = registry_of(&[("a", &[]), ("b", &[]), ("c", &[])]);
        let plan = resolve(&registry).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.waves()[0], vec!["a", "b", "c"]);
    }

    #[test]
    fn dependents_land_in_later_waves() {
        // location first; everything else depends on it
        let registry = registry_of(&[
            ("bucket_location", &[]),
            ("bucket_versioning", &["bucket_location"]),
            ("bucket_policy", &["bucket_location"]),
        ]);
        let plan = resolve(&registry).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.waves()[0], vec!["bucket_location"]);
        assert_eq!(plan.waves()[1], vec!["bucket_versioning", "bucket_policy"]);
    }

    #[test]
    fn wave_order_is_a_valid_topological_order() {
        let registry = registry_of(&[
            ("d", &["b", "c"]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("a", &[]),
        ]);
        let plan = resolve(&registry).unwrap();

        for spec in registry.iter() {
            let wave = plan.wave_of(spec.name()).unwrap();
            for dependency in spec.dependencies() {
                assert!(
                    plan.wave_of(dependency).unwrap() < wave,
                    "dependency '{}' must resolve before '{}'",
                    dependency,
                    spec.name()
                );
            }
        }
    }

    #[test]
    fn plan_is_deterministic_across_runs() {
        let registry = registry_of(&[("b", &[]), ("a", &[]), ("c", &["b"])]);
        let first = resolve(&registry).unwrap();
        let second = resolve(&registry).unwrap();
        assert_eq!(first, second);
        // Declaration order, not alphabetical order
        assert_eq!(first.waves()[0], vec!["b", "a"]);
    }

    #[test]
    fn two_spec_cycle_names_both_members() {
        let registry = registry_of(&[("x", &["y"]), ("y", &["x"])]);
        let err = resolve(&registry).unwrap_err();
        match err {
            HydrationError::CycleDetected { members } => {
                assert!(members.contains(&"x".to_string()));
                assert!(members.contains(&"y".to_string()));
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn cycle_behind_a_valid_prefix_is_still_detected() {
        let registry = registry_of(&[("a", &[]), ("b", &["a", "c"]), ("c", &["b"])]);
        let err = resolve(&registry).unwrap_err();
        match err {
            HydrationError::CycleDetected { members } => {
                assert_eq!(members.len(), 2);
                assert!(!members.contains(&"a".to_string()));
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn closure_pulls_transitive_dependencies() {
        let registry = registry_of(&[("a", &[]), ("b", &["a"]), ("c", &["b"]), ("d", &[])]);
        let requested: HashSet<String> = ["c".to_string()].into_iter().collect();
        let closure = dependency_closure(&registry, &requested).unwrap();
        assert_eq!(
            closure,
            ["a", "b", "c"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn closure_rejects_unknown_names() {
        let registry = registry_of(&[("a", &[])]);
        let requested: HashSet<String> = ["nope".to_string()].into_iter().collect();
        let err = dependency_closure(&registry, &requested).unwrap_err();
        assert_eq!(
            err,
            HydrationError::UnknownHydrate {
                name: "nope".to_string()
            }
        );
    }

    #[test]
    fn restricted_plan_drops_unrequested_specs_and_empty_waves() {
        let registry = registry_of(&[("a", &[]), ("b", &["a"]), ("c", &["b"]), ("d", &[])]);
        let plan = resolve(&registry).unwrap();
        let keep: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let restricted = plan.restrict(&keep);
        assert_eq!(restricted.len(), 2);
        assert_eq!(restricted.spec_count(), 2);
        assert_eq!(restricted.waves()[0], vec!["a"]);
        assert_eq!(restricted.waves()[1], vec!["b"]);
    }
}
