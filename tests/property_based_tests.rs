mod common;

use common::strategies::*;
use proptest::prelude::*;
use quarry_core::hydration::{resolve, HydrationError};

proptest! {
    /// Property: every acyclic spec set resolves, and the plan is a valid
    /// topological order - no spec's wave precedes any dependency's wave.
    #[test]
    fn acyclic_sets_resolve_to_valid_wave_orders(specs in acyclic_specs_strategy()) {
        let registry = build_registry(&specs);
        let plan = resolve(&registry).unwrap();

        prop_assert_eq!(plan.spec_count(), specs.len());
        for (name, deps) in &specs {
            let wave = plan.wave_of(name).unwrap();
            for dep in deps {
                prop_assert!(
                    plan.wave_of(dep).unwrap() < wave,
                    "'{}' (wave {}) must come after its dependency '{}'",
                    name, wave, dep
                );
            }
        }
    }

    /// Property: resolution is deterministic - same declarations, same plan.
    #[test]
    fn resolution_is_deterministic(specs in acyclic_specs_strategy()) {
        let registry = build_registry(&specs);
        let first = resolve(&registry).unwrap();
        let second = resolve(&registry).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: a spec set containing a cycle always fails with a cycle
    /// error instead of hanging or silently dropping specs.
    #[test]
    fn cyclic_sets_fail_with_cycle_error(specs in cyclic_specs_strategy()) {
        let registry = build_registry(&specs);
        match resolve(&registry) {
            Err(HydrationError::CycleDetected { members }) => {
                prop_assert!(!members.is_empty());
            }
            other => prop_assert!(false, "expected CycleDetected, got {:?}", other),
        }
    }
}
