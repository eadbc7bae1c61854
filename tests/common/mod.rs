//! Shared test helpers: a scriptable in-process provider, a collecting
//! sink with optional capacity, and query-context builders.

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use futures::stream;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quarry_core::config::QuarryConfig;
use quarry_core::provider::{
    ListFilter, OutputRow, ProviderError, QueryContext, RawRow, ResourceProvider, RowSink,
    RowStream,
};

type GetHandler = Box<dyn Fn(&Value) -> Result<Value, ProviderError> + Send + Sync>;

/// Scriptable provider: get handlers routed by operation name (with access
/// to the request params), list responses as canned row sets. Every call is
/// recorded for invocation assertions.
#[derive(Default)]
pub struct MockProvider {
    gets: HashMap<String, GetHandler>,
    lists: HashMap<String, Result<Vec<Value>, ProviderError>>,
    get_calls: Mutex<Vec<(String, Value)>>,
    list_calls: Mutex<Vec<(String, ListFilter)>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a get operation with a handler that inspects the params.
    pub fn on_get<F>(mut self, operation: &str, handler: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ProviderError> + Send + Sync + 'static,
    {
        self.gets.insert(operation.to_string(), Box::new(handler));
        self
    }

    /// Script a get operation with a constant response.
    pub fn on_get_value(self, operation: &str, value: Value) -> Self {
        self.on_get(operation, move |_| Ok(value.clone()))
    }

    /// Script a get operation with a constant error.
    pub fn on_get_error(self, operation: &str, error: ProviderError) -> Self {
        self.on_get(operation, move |_| Err(error.clone()))
    }

    /// Script a list operation with canned rows.
    pub fn on_list(mut self, operation: &str, rows: Vec<Value>) -> Self {
        self.lists.insert(operation.to_string(), Ok(rows));
        self
    }

    /// Script a list operation to fail.
    pub fn on_list_error(mut self, operation: &str, error: ProviderError) -> Self {
        self.lists.insert(operation.to_string(), Err(error));
        self
    }

    /// Number of recorded get calls for an operation.
    pub fn get_calls(&self, operation: &str) -> usize {
        self.get_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| op == operation)
            .count()
    }

    /// Recorded params of every get call for an operation.
    pub fn get_params(&self, operation: &str) -> Vec<Value> {
        self.get_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| op == operation)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn list_calls(&self, operation: &str) -> usize {
        self.list_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| op == operation)
            .count()
    }

    /// Page size the most recent list call for an operation carried.
    pub fn last_list_page_size(&self, operation: &str) -> Option<i64> {
        self.last_list_filter(operation).and_then(|f| f.page_size)
    }

    /// Filter of the most recent list call for an operation.
    pub fn last_list_filter(&self, operation: &str) -> Option<ListFilter> {
        self.list_calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(op, _)| op == operation)
            .map(|(_, filter)| filter.clone())
    }
}

#[async_trait]
impl ResourceProvider for MockProvider {
    async fn get(&self, kind: &str, key: &Value) -> Result<RawRow, ProviderError> {
        self.get_calls
            .lock()
            .unwrap()
            .push((kind.to_string(), key.clone()));

        match self.gets.get(kind) {
            Some(handler) => handler(key),
            None => Err(ProviderError::new(
                quarry_core::provider::ErrorKind::Other,
                kind,
                "UnmockedOperation",
                "no handler scripted for this operation",
            )),
        }
    }

    async fn list(&self, kind: &str, filter: &ListFilter) -> Result<RowStream, ProviderError> {
        self.list_calls
            .lock()
            .unwrap()
            .push((kind.to_string(), filter.clone()));

        match self.lists.get(kind) {
            Some(Ok(rows)) => {
                let rows: Vec<Result<RawRow, ProviderError>> =
                    rows.iter().cloned().map(Ok).collect();
                Ok(Box::pin(stream::iter(rows)))
            }
            Some(Err(error)) => Err(error.clone()),
            None => Err(ProviderError::new(
                quarry_core::provider::ErrorKind::Other,
                kind,
                "UnmockedOperation",
                "no rows scripted for this operation",
            )),
        }
    }
}

/// Sink collecting emitted rows, optionally with a capacity that counts
/// down as rows arrive.
pub struct CollectingSink {
    rows: Mutex<Vec<OutputRow>>,
    capacity: Option<AtomicUsize>,
}

impl CollectingSink {
    pub fn unbounded() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            capacity: None,
        })
    }

    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            capacity: Some(AtomicUsize::new(capacity)),
        })
    }

    pub fn rows(&self) -> Vec<OutputRow> {
        self.rows.lock().unwrap().clone()
    }

    /// The emitted row for which `column` equals `value`.
    pub fn row_where(&self, column: &str, value: &Value) -> Option<OutputRow> {
        self.rows()
            .into_iter()
            .find(|row| row.get(column) == Some(value))
    }
}

#[async_trait]
impl RowSink for CollectingSink {
    async fn emit(&self, row: OutputRow) -> Result<(), ProviderError> {
        if let Some(capacity) = &self.capacity {
            capacity.fetch_sub(1, Ordering::SeqCst);
        }
        self.rows.lock().unwrap().push(row);
        Ok(())
    }

    fn remaining_capacity(&self) -> Option<usize> {
        self.capacity
            .as_ref()
            .map(|capacity| capacity.load(Ordering::SeqCst))
    }
}

/// Query context over a mock provider with default configuration.
pub fn context(provider: Arc<MockProvider>) -> Arc<QueryContext> {
    Arc::new(QueryContext::new(provider, QuarryConfig::default()))
}

/// Query context with a caller-adjusted configuration.
pub fn context_with_config(
    provider: Arc<MockProvider>,
    config: QuarryConfig,
) -> Arc<QueryContext> {
    Arc::new(QueryContext::new(provider, config))
}
