//! # Table Scanner
//!
//! List/get orchestration for one table: stream base rows, hydrate, project,
//! emit. The scanner owns nothing mutable across queries; all shared state
//! (definition, plan, hydrate registry) is read-only.

use futures::StreamExt;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{QuarryError, Result};
use crate::logging::log_scan_operation;
use crate::hydration::{HydrateData, RowHydration, RowHydrationExecutor};
use crate::projection::{extract, Column};
use crate::provider::{OutputRow, QueryContext, RawRow, RowSink};
use crate::schema::TableDefinition;

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// The row source was exhausted.
    Completed,
    /// The sink stopped accepting rows (query limit satisfied).
    LimitReached,
    /// Cancellation was observed; remaining rows were never produced.
    Aborted,
}

/// Outcome of one scan or get.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub rows_emitted: usize,
    pub status: ScanStatus,
}

/// Executes queries against one table definition.
pub struct TableScanner {
    table: Arc<TableDefinition>,
}

impl TableScanner {
    pub fn new(table: Arc<TableDefinition>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TableDefinition {
        &self.table
    }

    /// Stream every row of the table through hydration and projection into
    /// the sink. `requested_columns` of `None` selects all columns.
    #[instrument(skip(self, ctx, sink, requested_columns), fields(table = self.table.name(), query_id = %ctx.query_id()))]
    pub async fn scan(
        &self,
        ctx: Arc<QueryContext>,
        sink: Arc<dyn RowSink>,
        requested_columns: Option<&[String]>,
    ) -> Result<ScanSummary> {
        let list = self.table.list_config().ok_or_else(|| {
            QuarryError::SchemaError(format!("table '{}' has no list config", self.table.name()))
        })?;

        for qual in &list.required_quals {
            if ctx.qual(qual).is_none() {
                return Err(QuarryError::ValidationError(format!(
                    "table '{}' requires an equality qual on '{}'",
                    self.table.name(),
                    qual
                )));
            }
        }

        let columns = self
            .table
            .select_columns(requested_columns)
            .map_err(|e| QuarryError::SchemaError(e.to_string()))?;
        let requested = Arc::new(self.table.requested_hydrates(&columns));

        let executor = RowHydrationExecutor::new(
            self.table.hydrates(),
            self.table.plan(),
            ctx.hydration(),
        );

        debug!(
            columns = columns.len(),
            hydrates = requested.len(),
            "Starting table scan"
        );

        let stream = list
            .fetch
            .list(&ctx)
            .await
            .map_err(|e| QuarryError::ProviderError(e.to_string()))?;

        let max_rows = ctx.scan().max_concurrent_rows.max(1);
        let mut hydrated = stream
            .map(|raw_result| {
                let executor = executor.clone();
                let ctx = ctx.clone();
                let requested = requested.clone();
                async move {
                    let raw = raw_result.map_err(|e| QuarryError::ProviderError(e.to_string()))?;
                    let hydration = executor
                        .hydrate(raw.clone(), &requested, &ctx)
                        .await
                        .map_err(|e| QuarryError::HydrationError(e.to_string()))?;
                    Ok::<(RawRow, RowHydration), QuarryError>((raw, hydration))
                }
            })
            .buffer_unordered(max_rows);

        let mut emitted = 0usize;
        let mut status = ScanStatus::Completed;

        loop {
            if ctx.is_cancelled() {
                status = ScanStatus::Aborted;
                break;
            }
            if sink.remaining_capacity() == Some(0) {
                status = ScanStatus::LimitReached;
                break;
            }

            match hydrated.next().await {
                None => break,
                Some(Err(error)) => return Err(error),
                Some(Ok((raw, hydration))) => {
                    if !hydration.is_complete() {
                        // Cancellation surfaced inside the hydration cycle;
                        // a partially hydrated row is not emitted.
                        status = ScanStatus::Aborted;
                        break;
                    }
                    let row = project_row(&raw, &hydration, &columns)?;
                    sink.emit(row)
                        .await
                        .map_err(|e| QuarryError::ProviderError(e.to_string()))?;
                    emitted += 1;
                }
            }
        }

        log_scan_operation(
            "scan",
            Some(self.table.name()),
            Some(&ctx.query_id().to_string()),
            &format!("{status:?}"),
            Some(&format!("{emitted} rows emitted")),
        );

        Ok(ScanSummary {
            rows_emitted: emitted,
            status,
        })
    }

    /// Look up a single row by key quals, hydrate it, and emit it.
    ///
    /// A lookup miss (including get errors the table declares ignorable)
    /// emits nothing and completes with zero rows.
    #[instrument(skip(self, ctx, sink, requested_columns), fields(table = self.table.name(), query_id = %ctx.query_id()))]
    pub async fn get(
        &self,
        ctx: Arc<QueryContext>,
        sink: Arc<dyn RowSink>,
        requested_columns: Option<&[String]>,
    ) -> Result<ScanSummary> {
        let get = self.table.get_config().ok_or_else(|| {
            QuarryError::SchemaError(format!("table '{}' has no get config", self.table.name()))
        })?;

        if !get.key_columns.satisfied_by(&ctx) {
            return Err(QuarryError::ValidationError(format!(
                "table '{}' get requires a qual on one of {:?}",
                self.table.name(),
                get.key_columns.names()
            )));
        }

        let columns = self
            .table
            .select_columns(requested_columns)
            .map_err(|e| QuarryError::SchemaError(e.to_string()))?;
        let requested: HashSet<String> = self.table.requested_hydrates(&columns);

        let raw = match get
            .fetch
            .fetch(&HydrateData::for_row(Arc::new(Value::Null)), &ctx)
            .await
        {
            Ok(Value::Null) => {
                debug!("Get lookup found no row");
                return Ok(ScanSummary {
                    rows_emitted: 0,
                    status: ScanStatus::Completed,
                });
            }
            Ok(row) => row,
            Err(error)
                if get.ignore.should_ignore(&error)
                    || ctx.connection().ignores_code(&error.code) =>
            {
                debug!(code = error.code.as_str(), "Ignorable get error; no row");
                return Ok(ScanSummary {
                    rows_emitted: 0,
                    status: ScanStatus::Completed,
                });
            }
            Err(error) => {
                warn!(error = %error, "Get lookup failed");
                return Err(QuarryError::ProviderError(error.to_string()));
            }
        };

        let executor = RowHydrationExecutor::new(
            self.table.hydrates(),
            self.table.plan(),
            ctx.hydration(),
        );
        let hydration = executor
            .hydrate(raw.clone(), &requested, &ctx)
            .await
            .map_err(|e| QuarryError::HydrationError(e.to_string()))?;

        if !hydration.is_complete() {
            return Ok(ScanSummary {
                rows_emitted: 0,
                status: ScanStatus::Aborted,
            });
        }

        let row = project_row(&raw, &hydration, &columns)?;
        sink.emit(row)
            .await
            .map_err(|e| QuarryError::ProviderError(e.to_string()))?;

        Ok(ScanSummary {
            rows_emitted: 1,
            status: ScanStatus::Completed,
        })
    }
}

/// Project every requested column of one hydrated row.
fn project_row(raw: &RawRow, hydration: &RowHydration, columns: &[Column]) -> Result<OutputRow> {
    let mut values = Map::with_capacity(columns.len());
    for column in columns {
        let value = extract(raw, hydration, column)
            .map_err(|e| QuarryError::ProjectionError(e.to_string()))?;
        values.insert(column.name().to_string(), value);
    }
    Ok(OutputRow::new(values))
}
