//! # Hydration Error Types
//!
//! Structured errors for registry validation, plan resolution, and row
//! execution. Fetch-level failures are not errors at this level; they are
//! recorded as outcomes on the affected branch (see
//! [`super::types::HydrateOutcome`]).

use thiserror::Error;

/// Errors raised by the hydration engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HydrationError {
    #[error("Hydrate dependency cycle detected among: {members:?}")]
    CycleDetected { members: Vec<String> },

    #[error("Hydrate '{name}' is already registered")]
    DuplicateHydrate { name: String },

    #[error("Hydrate '{hydrate}' depends on unknown hydrate '{dependency}'")]
    UnknownDependency { hydrate: String, dependency: String },

    #[error("Unknown hydrate: '{name}'")]
    UnknownHydrate { name: String },

    #[error("Hydrate task '{hydrate}' panicked: {reason}")]
    TaskPanicked { hydrate: String, reason: String },
}

pub type HydrationResult<T> = std::result::Result<T, HydrationError>;
