//! # Query Context
//!
//! Per-query state threaded through list, get, and hydrate calls: the
//! provider handle, connection settings, pushed-down quals, the row limit,
//! and the cancellation flag observed between waves and rows.
//!
//! There is no ambient session; the provider handle is constructed once by
//! the host and passed in explicitly.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{ConnectionConfig, HydrationSettings, QuarryConfig, ScanSettings};

use super::ResourceProvider;

/// Context for one query against one table.
pub struct QueryContext {
    query_id: Uuid,
    provider: Arc<dyn ResourceProvider>,
    config: QuarryConfig,
    quals: HashMap<String, Value>,
    limit: Option<i64>,
    cancelled: AtomicBool,
}

impl QueryContext {
    pub fn new(provider: Arc<dyn ResourceProvider>, config: QuarryConfig) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            provider,
            config,
            quals: HashMap::new(),
            limit: None,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn with_quals(mut self, quals: HashMap<String, Value>) -> Self {
        self.quals = quals;
        self
    }

    pub fn with_qual(mut self, name: &str, value: Value) -> Self {
        self.quals.insert(name.to_string(), value);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    pub fn provider(&self) -> &dyn ResourceProvider {
        self.provider.as_ref()
    }

    /// Owned provider handle, for sub-fetch futures that outlive a borrow.
    pub fn provider_handle(&self) -> Arc<dyn ResourceProvider> {
        self.provider.clone()
    }

    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.config.connection
    }

    pub fn hydration(&self) -> &HydrationSettings {
        &self.config.hydration
    }

    pub fn scan(&self) -> &ScanSettings {
        &self.config.scan
    }

    pub fn quals(&self) -> &HashMap<String, Value> {
        &self.quals
    }

    /// Equality qual pushed down by the query engine, if any.
    pub fn qual(&self, name: &str) -> Option<&Value> {
        self.quals.get(name)
    }

    /// String form of a qual, if present and a string.
    pub fn qual_str(&self, name: &str) -> Option<&str> {
        self.quals.get(name).and_then(Value::as_str)
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    /// Page size for list calls: the basic request size, reduced when the
    /// query asked for fewer rows than one page.
    pub fn page_size(&self, basic: i64) -> i64 {
        match self.limit {
            Some(limit) if limit < basic => limit.max(1),
            _ => basic,
        }
    }

    /// Request early termination. In-flight fetches finish; no new waves or
    /// rows are started.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("query_id", &self.query_id)
            .field("quals", &self.quals)
            .field("limit", &self.limit)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
