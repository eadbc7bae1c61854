//! # Resource Provider Interfaces
//!
//! The seams between the hydration core and its external collaborators: the
//! cloud API client, the row sink of the surrounding query engine, and the
//! error classification contract between them.
//!
//! The core never talks to a cloud SDK directly. Every fetch goes through
//! [`ResourceProvider`], an explicit handle constructed once per connection
//! and threaded through [`QueryContext`]. Pagination, authentication, and
//! SDK-level retries are the provider's responsibility.

pub mod classifier;
pub mod context;
pub mod error;
pub mod sink;

pub use classifier::IgnoreConfig;
pub use context::QueryContext;
pub use error::{ErrorKind, ProviderError};
pub use sink::{OutputRow, RowSink};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::collections::HashMap;

/// One resource instance as returned by the provider, uninterpreted.
///
/// Rows are JSON documents keyed by the provider's own field names
/// (e.g. `UserName`, `CreateDate`). The projection layer maps them onto
/// typed columns.
pub type RawRow = Value;

/// Lazy sequence of raw rows produced by a list call.
pub type RowStream = BoxStream<'static, Result<RawRow, ProviderError>>;

/// Filter handed to a provider list call.
///
/// Carries the equality quals the query engine pushed down (e.g. an IAM
/// `path` prefix or a CloudTrail `event_time` start) and a page size hint
/// already reduced by the query's row limit.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub quals: HashMap<String, Value>,
    pub page_size: Option<i64>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_qual(mut self, name: &str, value: Value) -> Self {
        self.quals.insert(name.to_string(), value);
        self
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// String value of a qual, if present and a string.
    pub fn qual_str(&self, name: &str) -> Option<&str> {
        self.quals.get(name).and_then(Value::as_str)
    }
}

/// The cloud API client, reduced to the two shapes the core needs.
///
/// `kind` is a `service:Action` operation name (see
/// [`crate::constants::operations`]); `key` and the filter quals are JSON
/// parameter documents. Implementations own connection state, credentials,
/// pagination, and rate limiting.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Fetch a single resource or sub-resource document.
    async fn get(&self, kind: &str, key: &Value) -> Result<RawRow, ProviderError>;

    /// List resources of a kind as a lazy row stream.
    async fn list(&self, kind: &str, filter: &ListFilter) -> Result<RowStream, ProviderError>;
}
