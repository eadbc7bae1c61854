//! # Hydration Engine
//!
//! Generic per-row enrichment engine shared by every table connector.
//!
//! A table declares a set of named hydrate fetches, each with optional
//! dependencies on other fetches and a policy for which provider errors
//! mean "absent" rather than "failed". At registration time the
//! [`resolver`] partitions the declarations into waves (Kahn's algorithm,
//! deterministic ordering, loud cycle failure). At query time the
//! [`executor`] runs one row's waves strictly in order, fetches within a
//! wave concurrently, caches each outcome exactly once, and poisons only
//! the dependents of a fatally failed branch. [`fanout`] covers the inner
//! pattern of fetching a dynamic list of sub-items with first-error-wins
//! semantics.
//!
//! ## Core Components
//!
//! - **HydrateRegistry**: named fetches, dependencies, ignore policies
//! - **ExecutionPlan**: wave partition, built once per table, shared by rows
//! - **RowHydrationExecutor**: per-row wave execution and outcome cache
//! - **fetch_all**: bounded fan-out/fan-in over dynamic sub-items

pub mod errors;
pub mod executor;
pub mod fanout;
pub mod registry;
pub mod resolver;
pub mod types;

pub use errors::{HydrationError, HydrationResult};
pub use executor::RowHydrationExecutor;
pub use fanout::fetch_all;
pub use registry::{HydrateFetch, HydrateRegistry, HydrateSpec};
pub use resolver::{dependency_closure, resolve, ExecutionPlan};
pub use types::{HydrateData, HydrateOutcome, HydrateResult, HydrationStatus, RowHydration};
