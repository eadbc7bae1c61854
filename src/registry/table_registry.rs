//! # Table Registry
//!
//! Thread-safe registry of built table definitions.
//!
//! Registration consumes a [`TableBuilder`] so every validation the builder
//! performs (duplicate names, unknown dependencies, dependency cycles)
//! happens here, once, before the table is ever served. A failed build is
//! logged at error level and the table is not registered; it is never
//! silently dropped into a half-working state.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{QuarryError, Result};
use crate::logging::log_error;
use crate::schema::{TableBuilder, TableDefinition};

/// Registry of served tables.
#[derive(Default)]
pub struct TableRegistry {
    tables: Arc<RwLock<HashMap<String, Arc<TableDefinition>>>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a table definition.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the build fails (including
    /// hydrate dependency cycles) or the name is already registered.
    pub async fn register(&self, builder: TableBuilder) -> Result<Arc<TableDefinition>> {
        let table = match builder.build() {
            Ok(table) => Arc::new(table),
            Err(schema_error) => {
                log_error(
                    "TableRegistry",
                    "register",
                    &schema_error.to_string(),
                    None,
                );
                return Err(QuarryError::ConfigurationError(schema_error.to_string()));
            }
        };

        let mut tables = self.tables.write().await;
        if tables.contains_key(table.name()) {
            return Err(QuarryError::ConfigurationError(format!(
                "table '{}' is already registered",
                table.name()
            )));
        }

        info!(
            table = table.name(),
            columns = table.columns().len(),
            hydrates = table.hydrates().len(),
            waves = table.plan().len(),
            "Registered table"
        );

        tables.insert(table.name().to_string(), table.clone());
        Ok(table)
    }

    /// Look up a registered table by name.
    pub async fn get(&self, name: &str) -> Option<Arc<TableDefinition>> {
        let tables = self.tables.read().await;
        let found = tables.get(name).cloned();
        debug!(table = name, found = found.is_some(), "Table lookup");
        found
    }

    /// Names of every registered table, sorted.
    pub async fn list(&self) -> Vec<String> {
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.is_empty()
    }
}
