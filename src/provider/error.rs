//! # Provider Error Contract
//!
//! Errors surfaced by [`super::ResourceProvider`] implementations carry an
//! enumerated [`ErrorKind`] so the core can classify failures without
//! matching provider-specific code strings. The raw wire code is preserved
//! for logs and for configuration-driven ignore lists.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Enumerated classification a provider guarantees to assign to every error.
///
/// The hydration engine branches on this kind, never on the raw code string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The resource or optional sub-resource does not exist.
    NotFound,
    /// The resource exists but the requested facet was never configured
    /// (e.g. a bucket without a lifecycle configuration).
    NotConfigured,
    /// The request was rejected as malformed by the provider.
    InvalidParameter,
    /// The caller lacks permission for the operation.
    AccessDenied,
    /// The provider throttled the call.
    Throttled,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Whether this kind describes an absent optional sub-resource rather
    /// than a genuine failure.
    pub fn is_absence(&self) -> bool {
        matches!(self, ErrorKind::NotFound | ErrorKind::NotConfigured)
    }
}

/// Error returned by a provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{operation} failed: {code}: {message}")]
pub struct ProviderError {
    /// Enumerated classification, the only field the engine branches on.
    pub kind: ErrorKind,
    /// Operation that failed, `service:Action` form.
    pub operation: String,
    /// Raw provider error code, preserved for logs and ignore lists.
    pub code: String,
    /// Human-readable message from the provider.
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, operation: &str, code: &str, message: &str) -> Self {
        Self {
            kind,
            operation: operation.to_string(),
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for `NotFound` errors.
    pub fn not_found(operation: &str, code: &str, message: &str) -> Self {
        Self::new(ErrorKind::NotFound, operation, code, message)
    }

    /// Convenience constructor for `NotConfigured` errors.
    pub fn not_configured(operation: &str, code: &str, message: &str) -> Self {
        Self::new(ErrorKind::NotConfigured, operation, code, message)
    }
}
