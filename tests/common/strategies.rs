//! Proptest strategies for hydrate dependency graphs.

use proptest::prelude::*;
use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::hydration::{HydrateData, HydrateFetch, HydrateRegistry, HydrateSpec};
use quarry_core::provider::{ProviderError, QueryContext, RawRow};

struct NullFetch;

#[async_trait]
impl HydrateFetch for NullFetch {
    async fn fetch(
        &self,
        _data: &HydrateData,
        _ctx: &QueryContext,
    ) -> Result<RawRow, ProviderError> {
        Ok(serde_json::Value::Null)
    }
}

/// Declared spec set: `(name, dependency names)` in declaration order.
pub type SpecSet = Vec<(String, Vec<String>)>;

/// Build a registry from a declared spec set.
pub fn build_registry(specs: &SpecSet) -> HydrateRegistry {
    let mut registry = HydrateRegistry::new();
    for (name, deps) in specs {
        let dep_refs: Vec<&str> = deps.iter().map(String::as_str).collect();
        registry
            .register(HydrateSpec::new(name, Arc::new(NullFetch)).depends_on(&dep_refs))
            .expect("unique names by construction");
    }
    registry
}

/// Map per-node edge flags into a spec set where node *i* may only depend
/// on nodes declared before it, which makes the set acyclic by construction.
fn flags_to_specs(rows: Vec<Vec<bool>>) -> SpecSet {
    rows.into_iter()
        .enumerate()
        .map(|(i, flags)| {
            let deps = flags
                .into_iter()
                .enumerate()
                .filter(|&(j, wanted)| j < i && wanted)
                .map(|(j, _)| format!("h{j}"))
                .collect();
            (format!("h{i}"), deps)
        })
        .collect()
}

/// Random acyclic spec sets.
pub fn acyclic_specs_strategy() -> impl Strategy<Value = SpecSet> {
    proptest::collection::vec(proptest::collection::vec(any::<bool>(), 0..9), 1..10)
        .prop_map(flags_to_specs)
}

/// Random spec sets guaranteed to contain a cycle: start from an acyclic
/// set of two or more specs and close a loop between two of them.
pub fn cyclic_specs_strategy() -> impl Strategy<Value = SpecSet> {
    proptest::collection::vec(proptest::collection::vec(any::<bool>(), 0..9), 2..10)
        .prop_map(flags_to_specs)
        .prop_flat_map(|specs| {
            let n = specs.len();
            (Just(specs), 0..n - 1).prop_flat_map(|(specs, i)| {
                let n = specs.len();
                (Just(specs), Just(i), (i + 1)..n)
            })
        })
        .prop_map(|(mut specs, i, j)| {
            // i -> j and j -> i close a two-spec cycle
            let earlier = specs[i].0.clone();
            let later = specs[j].0.clone();
            specs[i].1.push(later);
            specs[j].1.push(earlier);
            specs
        })
}
