//! # Row Sink
//!
//! Downstream surface the scanner emits finished rows into. The surrounding
//! query engine owns streaming and back-pressure; the core's only obligation
//! is to poll [`RowSink::remaining_capacity`] between rows (and waves) so a
//! satisfied limit terminates the scan early.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::ProviderError;

/// One fully projected row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRow {
    pub columns: Map<String, Value>,
}

impl OutputRow {
    pub fn new(columns: Map<String, Value>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }
}

/// Receiver for projected rows.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Emit one finished row downstream.
    async fn emit(&self, row: OutputRow) -> Result<(), ProviderError>;

    /// Rows the downstream still wants; `None` means unbounded. A return of
    /// `Some(0)` tells the scanner to stop producing.
    fn remaining_capacity(&self) -> Option<usize>;
}
