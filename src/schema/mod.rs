//! # Table Schema
//!
//! Declarative table definitions: output columns, list/get entry points,
//! and the table's hydrate declarations. [`TableBuilder::build`] validates
//! the whole declaration set and resolves the hydrate execution plan once,
//! at registration time; a dependency cycle or a column bound to an
//! unknown hydrate fails the build loudly instead of surfacing mid-query.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::hydration::{resolve, ExecutionPlan, HydrateFetch, HydrateRegistry, HydrateSpec, HydrationError};
use crate::projection::Column;
use crate::provider::{IgnoreConfig, ProviderError, QueryContext, RowStream};

/// Errors raised while building a table definition
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error("Table '{table}' declares duplicate column '{column}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Column '{column}' reads from unknown hydrate '{hydrate}'")]
    UnknownHydrateColumn { column: String, hydrate: String },

    #[error("Key column '{column}' is not a declared column")]
    UnknownKeyColumn { column: String },

    #[error("Unknown column: '{column}'")]
    UnknownColumn { column: String },

    #[error("Table '{table}' declares neither a list nor a get config")]
    NoEntryPoint { table: String },
}

/// Key columns accepted by a get call.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyColumns {
    /// Exactly this column must be qualified.
    Single(String),
    /// Any one of these columns may be qualified.
    Any(Vec<String>),
}

impl KeyColumns {
    pub fn single(name: &str) -> Self {
        KeyColumns::Single(name.to_string())
    }

    pub fn any(names: &[&str]) -> Self {
        KeyColumns::Any(names.iter().map(|n| (*n).to_string()).collect())
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            KeyColumns::Single(name) => vec![name.as_str()],
            KeyColumns::Any(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Whether the query's quals satisfy this key declaration.
    pub fn satisfied_by(&self, ctx: &QueryContext) -> bool {
        self.names().iter().any(|name| ctx.qual(name).is_some())
    }
}

/// Get (single-row lookup) entry point.
#[derive(Clone)]
pub struct GetConfig {
    pub key_columns: KeyColumns,
    /// Errors treated as "no such row" rather than a query failure.
    pub ignore: IgnoreConfig,
    pub fetch: Arc<dyn HydrateFetch>,
}

/// List entry point producing a lazy row stream.
#[async_trait]
pub trait ListFetch: Send + Sync {
    async fn list(&self, ctx: &QueryContext) -> Result<RowStream, ProviderError>;
}

#[derive(Clone)]
pub struct ListConfig {
    pub fetch: Arc<dyn ListFetch>,
    /// Quals the list call cannot run without (e.g. a start timestamp).
    pub required_quals: Vec<String>,
    /// Quals pushed down to the provider when present.
    pub optional_quals: Vec<String>,
}

impl ListConfig {
    pub fn new(fetch: Arc<dyn ListFetch>) -> Self {
        Self {
            fetch,
            required_quals: Vec::new(),
            optional_quals: Vec::new(),
        }
    }

    pub fn require_qual(mut self, name: &str) -> Self {
        self.required_quals.push(name.to_string());
        self
    }

    pub fn optional_qual(mut self, name: &str) -> Self {
        self.optional_quals.push(name.to_string());
        self
    }
}

/// A fully built, immutable table definition. Shared read-only across all
/// concurrent queries once registered.
pub struct TableDefinition {
    name: String,
    description: String,
    get: Option<GetConfig>,
    list: Option<ListConfig>,
    columns: Vec<Column>,
    hydrates: Arc<HydrateRegistry>,
    plan: Arc<ExecutionPlan>,
}

impl TableDefinition {
    pub fn builder(name: &str, description: &str) -> TableBuilder {
        TableBuilder::new(name, description)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn get_config(&self) -> Option<&GetConfig> {
        self.get.as_ref()
    }

    pub fn list_config(&self) -> Option<&ListConfig> {
        self.list.as_ref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn hydrates(&self) -> Arc<HydrateRegistry> {
        self.hydrates.clone()
    }

    pub fn plan(&self) -> Arc<ExecutionPlan> {
        self.plan.clone()
    }

    /// Columns selected by a query; `None` means every declared column.
    ///
    /// # Errors
    ///
    /// Unknown column names are a caller bug and fail.
    pub fn select_columns(&self, requested: Option<&[String]>) -> Result<Vec<Column>, SchemaError> {
        match requested {
            None => Ok(self.columns.clone()),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.column(name)
                        .cloned()
                        .ok_or_else(|| SchemaError::UnknownColumn {
                            column: name.clone(),
                        })
                })
                .collect(),
        }
    }

    /// Hydrate names needed to project the given columns. Transitive
    /// dependencies are resolved later by the executor.
    pub fn requested_hydrates(&self, columns: &[Column]) -> HashSet<String> {
        columns
            .iter()
            .filter_map(|c| c.hydrate_dependency())
            .map(ToString::to_string)
            .collect()
    }
}

impl std::fmt::Debug for TableDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableDefinition")
            .field("name", &self.name)
            .field("columns", &self.columns.len())
            .field("hydrates", &self.hydrates.len())
            .field("waves", &self.plan.len())
            .finish()
    }
}

/// Collects a table's declarations and validates them as a whole.
pub struct TableBuilder {
    name: String,
    description: String,
    get: Option<GetConfig>,
    list: Option<ListConfig>,
    columns: Vec<Column>,
    hydrates: Vec<HydrateSpec>,
}

impl TableBuilder {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            get: None,
            list: None,
            columns: Vec::new(),
            hydrates: Vec::new(),
        }
    }

    pub fn get(mut self, config: GetConfig) -> Self {
        self.get = Some(config);
        self
    }

    pub fn list(mut self, config: ListConfig) -> Self {
        self.list = Some(config);
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn hydrate(mut self, spec: HydrateSpec) -> Self {
        self.hydrates.push(spec);
        self
    }

    /// Validate the declaration set and resolve the execution plan.
    ///
    /// # Errors
    ///
    /// Fails on duplicate hydrate or column names, unknown dependency or
    /// key-column references, a cyclic dependency graph, or a table with
    /// no entry point.
    pub fn build(self) -> Result<TableDefinition, SchemaError> {
        if self.get.is_none() && self.list.is_none() {
            return Err(SchemaError::NoEntryPoint { table: self.name });
        }

        let mut registry = HydrateRegistry::new();
        for spec in self.hydrates {
            registry.register(spec)?;
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name().to_string()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name,
                    column: column.name().to_string(),
                });
            }
            if let Some(hydrate) = column.hydrate_dependency() {
                if !registry.contains(hydrate) {
                    return Err(SchemaError::UnknownHydrateColumn {
                        column: column.name().to_string(),
                        hydrate: hydrate.to_string(),
                    });
                }
            }
        }

        let declared: HashSet<&str> = self.columns.iter().map(Column::name).collect();
        if let Some(get) = &self.get {
            for key in get.key_columns.names() {
                if !declared.contains(key) {
                    return Err(SchemaError::UnknownKeyColumn {
                        column: key.to_string(),
                    });
                }
            }
        }
        if let Some(list) = &self.list {
            for key in list.required_quals.iter().chain(list.optional_quals.iter()) {
                if !declared.contains(key.as_str()) {
                    return Err(SchemaError::UnknownKeyColumn {
                        column: key.clone(),
                    });
                }
            }
        }

        // Plan resolution happens once, here; a cyclic declaration never
        // reaches query time.
        let plan = resolve(&registry)?;

        Ok(TableDefinition {
            name: self.name,
            description: self.description,
            get: self.get,
            list: self.list,
            columns: self.columns,
            hydrates: Arc::new(registry),
            plan: Arc::new(plan),
        })
    }
}
