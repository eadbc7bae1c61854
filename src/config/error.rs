//! # Configuration Error Types
//!
//! Structured errors for configuration discovery, parsing, and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, parsing, or validating configuration
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("No configuration file found; searched: {searched:?}")]
    ConfigFileNotFound { searched: Vec<PathBuf> },

    #[error("Failed to read configuration file {path}: {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Invalid YAML in {path}: {reason}")]
    InvalidYaml { path: String, reason: String },

    #[error("Invalid configuration value for {field}: {value}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigurationError {
    pub fn config_file_not_found(searched: Vec<PathBuf>) -> Self {
        Self::ConfigFileNotFound { searched }
    }

    pub fn file_read_error(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::FileReadError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_yaml(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidYaml {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
