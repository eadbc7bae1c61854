//! # Hydrate Registry
//!
//! Named enrichment fetches for one table: each spec carries its fetch
//! implementation, its declared dependencies, and its ignorable-error
//! policy. The registry preserves declaration order so plan resolution is
//! deterministic, and validates names at table-build time so broken
//! dependency declarations fail loudly before any query runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::provider::{IgnoreConfig, ProviderError, QueryContext, RawRow};

use super::errors::{HydrationError, HydrationResult};
use super::types::HydrateData;

/// One enrichment fetch for one row.
///
/// Returning `Ok(Value::Null)` means "nothing there" and records an absent
/// outcome; dependents still run. Errors are classified against the spec's
/// [`IgnoreConfig`] by the executor.
#[async_trait]
pub trait HydrateFetch: Send + Sync {
    async fn fetch(&self, data: &HydrateData, ctx: &QueryContext) -> Result<RawRow, ProviderError>;
}

/// Declaration of one named hydrate: fetch, dependencies, error policy.
#[derive(Clone)]
pub struct HydrateSpec {
    name: String,
    fetch: Arc<dyn HydrateFetch>,
    depends_on: Vec<String>,
    ignore: IgnoreConfig,
}

impl HydrateSpec {
    pub fn new(name: &str, fetch: Arc<dyn HydrateFetch>) -> Self {
        Self {
            name: name.to_string(),
            fetch,
            depends_on: Vec::new(),
            ignore: IgnoreConfig::none(),
        }
    }

    /// Declare dependencies on other hydrates of the same table.
    pub fn depends_on(mut self, names: &[&str]) -> Self {
        self.depends_on = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    /// Declare which provider errors hydrate to an absent value.
    pub fn ignore(mut self, ignore: IgnoreConfig) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn ignore_config(&self) -> &IgnoreConfig {
        &self.ignore
    }

    pub fn fetcher(&self) -> Arc<dyn HydrateFetch> {
        self.fetch.clone()
    }
}

impl std::fmt::Debug for HydrateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydrateSpec")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// Declaration-ordered collection of one table's hydrate specs.
#[derive(Debug, Clone, Default)]
pub struct HydrateRegistry {
    specs: Vec<HydrateSpec>,
    index: HashMap<String, usize>,
}

impl HydrateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec. Duplicate names are a declaration bug and fail.
    pub fn register(&mut self, spec: HydrateSpec) -> HydrationResult<()> {
        if self.index.contains_key(spec.name()) {
            return Err(HydrationError::DuplicateHydrate {
                name: spec.name().to_string(),
            });
        }

        debug!(
            hydrate = spec.name(),
            dependencies = ?spec.dependencies(),
            "Registered hydrate"
        );

        self.index.insert(spec.name().to_string(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Check that every declared dependency names a registered spec.
    pub fn validate(&self) -> HydrationResult<()> {
        for spec in &self.specs {
            for dependency in spec.dependencies() {
                if !self.index.contains_key(dependency) {
                    return Err(HydrationError::UnknownDependency {
                        hydrate: spec.name().to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&HydrateSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &HydrateSpec> {
        self.specs.iter()
    }

    /// Names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
