//! # Row Hydration Executor
//!
//! Runs one row's execution plan: waves strictly in order, fetches within a
//! wave concurrently under a semaphore bound, each outcome cached exactly
//! once for dependents and column extraction.
//!
//! A fatal fetch poisons only its own direct and transitive dependents;
//! independent branches still complete and the row is still emitted with
//! whatever columns succeeded. Cancellation is observed between waves:
//! in-flight fetches finish, later waves never start, and the returned
//! hydration is marked aborted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::config::HydrationSettings;
use crate::provider::{ErrorKind, ProviderError, QueryContext, RawRow};

use super::errors::{HydrationError, HydrationResult};
use super::registry::HydrateRegistry;
use super::resolver::{dependency_closure, ExecutionPlan};
use super::types::{
    HydrateData, HydrateOutcome, HydrateResult, HydrationStatus, RowHydration,
};

/// Per-row wave executor. Cheap to clone; the registry, plan, and semaphore
/// are shared.
#[derive(Clone)]
pub struct RowHydrationExecutor {
    registry: Arc<HydrateRegistry>,
    plan: Arc<ExecutionPlan>,
    fetch_semaphore: Arc<Semaphore>,
}

impl RowHydrationExecutor {
    pub fn new(
        registry: Arc<HydrateRegistry>,
        plan: Arc<ExecutionPlan>,
        settings: &HydrationSettings,
    ) -> Self {
        Self {
            registry,
            plan,
            fetch_semaphore: Arc::new(Semaphore::new(settings.max_concurrent_fetches)),
        }
    }

    /// Hydrate one row, scheduling only the specs reachable from
    /// `requested` and their transitive dependencies.
    #[instrument(skip(self, row, ctx), fields(query_id = %ctx.query_id(), requested = requested.len()))]
    pub async fn hydrate(
        &self,
        row: RawRow,
        requested: &HashSet<String>,
        ctx: &Arc<QueryContext>,
    ) -> HydrationResult<RowHydration> {
        let closure = dependency_closure(&self.registry, requested)?;
        let plan = self.plan.restrict(&closure);

        debug!(
            planned_specs = plan.spec_count(),
            waves = plan.len(),
            "Starting row hydration"
        );

        let row = Arc::new(row);
        let mut results: HashMap<String, HydrateResult> = HashMap::with_capacity(plan.spec_count());

        for wave in plan.waves() {
            // Cancellation is observed between waves; in-flight fetches of
            // the previous wave have already been joined.
            if ctx.is_cancelled() {
                debug!(
                    resolved = results.len(),
                    "Cancellation observed; aborting row hydration"
                );
                return Ok(RowHydration {
                    results,
                    status: HydrationStatus::Aborted,
                });
            }

            // Earlier waves' outcomes, visible to every fetch in this wave.
            let resolved = Arc::new(results.clone());
            let mut handles = Vec::with_capacity(wave.len());

            for name in wave {
                let spec = self
                    .registry
                    .get(name)
                    .ok_or_else(|| HydrationError::UnknownHydrate { name: name.clone() })?;

                // A fatally failed or skipped dependency poisons this spec:
                // record it skipped without attempting the fetch.
                let poisoned = spec.dependencies().iter().any(|dependency| {
                    results
                        .get(dependency)
                        .is_some_and(|r| r.outcome.poisons_dependents())
                });
                if poisoned {
                    debug!(hydrate = name.as_str(), "Dependency not satisfied; skipping");
                    results.insert(name.clone(), HydrateResult::skipped(name));
                    continue;
                }

                let task = HydrateTask {
                    name: name.clone(),
                    spec_ignore: spec.ignore_config().clone(),
                    fetch: spec.fetcher(),
                    data: HydrateData::new(row.clone(), resolved.clone()),
                    ctx: ctx.clone(),
                    semaphore: self.fetch_semaphore.clone(),
                };
                handles.push(tokio::spawn(task.run()));
            }

            // Wave barrier: every spawned fetch completes before the next
            // wave is scheduled.
            for handle in handles {
                match handle.await {
                    Ok(result) => {
                        results.insert(result.name.clone(), result);
                    }
                    Err(join_error) => {
                        warn!(error = %join_error, "Hydrate task panicked");
                        return Err(HydrationError::TaskPanicked {
                            hydrate: "unknown".to_string(),
                            reason: join_error.to_string(),
                        });
                    }
                }
            }
        }

        debug!(resolved = results.len(), "Row hydration complete");
        Ok(RowHydration {
            results,
            status: HydrationStatus::Completed,
        })
    }
}

/// One spawned fetch: acquire a permit, call the fetcher, classify the result.
struct HydrateTask {
    name: String,
    spec_ignore: crate::provider::IgnoreConfig,
    fetch: Arc<dyn super::registry::HydrateFetch>,
    data: HydrateData,
    ctx: Arc<QueryContext>,
    semaphore: Arc<Semaphore>,
}

impl HydrateTask {
    async fn run(self) -> HydrateResult {
        let started = Instant::now();

        let _permit = match self.semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(closed) => {
                return HydrateResult {
                    name: self.name,
                    outcome: HydrateOutcome::Failed(ProviderError::new(
                        ErrorKind::Other,
                        "hydrate",
                        "SemaphoreClosed",
                        &closed.to_string(),
                    )),
                    duration: started.elapsed(),
                }
            }
        };

        let outcome = match self.fetch.fetch(&self.data, &self.ctx).await {
            // No data is a successful absence, not an error.
            Ok(RawRow::Null) => HydrateOutcome::Absent,
            Ok(value) => HydrateOutcome::Success(value),
            Err(error)
                if self.spec_ignore.should_ignore(&error)
                    || self.ctx.connection().ignores_code(&error.code) =>
            {
                debug!(
                    hydrate = self.name.as_str(),
                    code = error.code.as_str(),
                    "Ignorable fetch error treated as absent"
                );
                HydrateOutcome::Absent
            }
            Err(error) => {
                warn!(
                    hydrate = self.name.as_str(),
                    code = error.code.as_str(),
                    error = %error,
                    "Hydrate fetch failed"
                );
                HydrateOutcome::Failed(error)
            }
        };

        HydrateResult {
            name: self.name,
            outcome,
            duration: started.elapsed(),
        }
    }
}
