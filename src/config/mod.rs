//! # Quarry Configuration System
//!
//! YAML-based configuration with environment-specific overrides. All
//! operational knobs come from explicit, validated configuration loading;
//! there are no silent fallbacks past the documented defaults.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quarry_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (environment auto-detected)
//! let manager = ConfigManager::load()?;
//!
//! let partition = &manager.config().connection.partition;
//! let bound = manager.config().hydration.max_concurrent_fetches;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring quarry-config.yaml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuarryConfig {
    /// Cloud connection settings shared by every table
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Hydration engine concurrency settings
    #[serde(default)]
    pub hydration: HydrationSettings,

    /// Table scan settings
    #[serde(default)]
    pub scan: ScanSettings,
}

impl Default for QuarryConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            hydration: HydrationSettings::default(),
            scan: ScanSettings::default(),
        }
    }
}

impl QuarryConfig {
    /// Validate the loaded values. Zero concurrency bounds and nonpositive
    /// page sizes are configuration mistakes, not tunings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.list_page_size < 1 {
            return Err(ConfigurationError::invalid_value(
                "connection.list_page_size",
                self.connection.list_page_size.to_string(),
                "must be at least 1",
            ));
        }
        if self.hydration.max_concurrent_fetches == 0 {
            return Err(ConfigurationError::invalid_value(
                "hydration.max_concurrent_fetches",
                "0",
                "must be at least 1",
            ));
        }
        if self.hydration.max_concurrent_subfetches == 0 {
            return Err(ConfigurationError::invalid_value(
                "hydration.max_concurrent_subfetches",
                "0",
                "must be at least 1",
            ));
        }
        if self.scan.max_concurrent_rows == 0 {
            return Err(ConfigurationError::invalid_value(
                "scan.max_concurrent_rows",
                "0",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Cloud connection configuration shared by every table on a connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Partition used when composing ARNs (`aws`, `aws-cn`, `aws-us-gov`)
    #[serde(default = "default_partition")]
    pub partition: String,

    /// Region used for calls that are not region-bound
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Account id, when known ahead of the first metadata fetch
    #[serde(default)]
    pub account_id: Option<String>,

    /// Raw provider error codes treated as absence for every hydrate call,
    /// in addition to each call's own declared policy
    #[serde(default)]
    pub ignore_error_codes: Vec<String>,

    /// Basic page size for paged list calls
    #[serde(default = "default_list_page_size")]
    pub list_page_size: i64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            partition: default_partition(),
            default_region: default_region(),
            account_id: None,
            ignore_error_codes: Vec::new(),
            list_page_size: default_list_page_size(),
        }
    }
}

impl ConnectionConfig {
    /// Whether connection configuration asks for this raw code to be
    /// treated as absence.
    pub fn ignores_code(&self, code: &str) -> bool {
        self.ignore_error_codes.iter().any(|c| c == code)
    }
}

/// Hydration engine concurrency settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HydrationSettings {
    /// Upper bound on concurrently running hydrate fetches per row
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Upper bound on concurrently running sub-fetches in a fan-out batch
    #[serde(default = "default_max_concurrent_subfetches")]
    pub max_concurrent_subfetches: usize,
}

impl Default for HydrationSettings {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            max_concurrent_subfetches: default_max_concurrent_subfetches(),
        }
    }
}

/// Table scan settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanSettings {
    /// Upper bound on rows hydrated concurrently by one scan
    #[serde(default = "default_max_concurrent_rows")]
    pub max_concurrent_rows: usize,

    /// Environment the configuration was loaded for
    #[serde(default)]
    pub environment: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_concurrent_rows: default_max_concurrent_rows(),
            environment: String::new(),
        }
    }
}

fn default_partition() -> String {
    defaults::FALLBACK_PARTITION.to_string()
}

fn default_region() -> String {
    defaults::FALLBACK_REGION.to_string()
}

fn default_list_page_size() -> i64 {
    defaults::LIST_PAGE_SIZE
}

fn default_max_concurrent_fetches() -> usize {
    defaults::MAX_CONCURRENT_FETCHES
}

fn default_max_concurrent_subfetches() -> usize {
    defaults::MAX_CONCURRENT_SUBFETCHES
}

fn default_max_concurrent_rows() -> usize {
    defaults::MAX_CONCURRENT_ROWS
}
