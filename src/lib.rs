#![allow(clippy::doc_markdown)] // Allow technical terms like CloudTrail, PascalCase in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Quarry Core
//!
//! Cloud-resource table connectors on a generic per-row hydration engine.
//!
//! ## Overview
//!
//! Quarry exposes cloud-provider resource metadata (IAM users, S3 buckets,
//! CloudTrail events) as queryable rows inside a query-engine plugin
//! framework. Each table declares its output columns, a list/get entry
//! point, and a graph of dependent enrichment fetches ("hydrates") that
//! the engine resolves into waves and executes concurrently per row.
//!
//! ## Architecture
//!
//! The engine is the reusable part; tables are declarative schema:
//!
//! - [`hydration`] - dependency resolution, wave execution, fan-out/fan-in
//! - [`projection`] - typed columns, transform chains, pure extraction
//! - [`schema`] - table definitions validated at registration time
//! - [`execution`] - list/get scans: hydrate, project, emit
//! - [`provider`] - external collaborator seams (API client, sink, errors)
//! - [`tables`] - the bundled resource tables
//! - [`registry`] - table registration and discovery
//! - [`config`] - environment-aware YAML configuration
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_core::config::QuarryConfig;
//! use quarry_core::registry::TableRegistry;
//! use quarry_core::tables;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = TableRegistry::new();
//! tables::register_all(&registry).await?;
//!
//! let table = registry.get("aws_s3_bucket").await.expect("registered");
//! println!("{} columns, {} hydrate waves", table.columns().len(), table.plan().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Model
//!
//! A fetch failure never fails a whole row by itself: ignorable errors
//! hydrate to null values, fatal errors poison only their own dependents,
//! and the row is emitted with whatever columns succeeded. Dependency
//! cycles are configuration errors and fail table registration loudly.

pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod hydration;
pub mod logging;
pub mod projection;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod tables;

pub use config::{ConfigManager, ConnectionConfig, HydrationSettings, QuarryConfig, ScanSettings};
pub use error::{QuarryError, Result};
pub use execution::{ScanStatus, ScanSummary, TableScanner};
pub use hydration::{
    ExecutionPlan, HydrateData, HydrateFetch, HydrateOutcome, HydrateRegistry, HydrateResult,
    HydrateSpec, HydrationError, HydrationStatus, RowHydration, RowHydrationExecutor,
};
pub use projection::{Column, ColumnType, Transform};
pub use provider::{
    ErrorKind, IgnoreConfig, ListFilter, OutputRow, ProviderError, QueryContext, RawRow,
    ResourceProvider, RowSink, RowStream,
};
pub use registry::TableRegistry;
pub use schema::{
    GetConfig, KeyColumns, ListConfig, ListFetch, SchemaError, TableBuilder, TableDefinition,
};
