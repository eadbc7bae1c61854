//! # Table Execution
//!
//! Drives one query against one table: list (or get) the base rows through
//! the provider, hydrate each row through the engine, project the requested
//! columns, and emit finished rows into the sink. Rows are hydrated
//! independently and, up to a configured bound, concurrently; sink capacity
//! and cancellation are polled between rows.

pub mod scanner;

pub use scanner::{ScanStatus, ScanSummary, TableScanner};
