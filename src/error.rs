use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum QuarryError {
    ProviderError(String),
    HydrationError(String),
    ProjectionError(String),
    SchemaError(String),
    ValidationError(String),
    ConfigurationError(String),
}

impl fmt::Display for QuarryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuarryError::ProviderError(msg) => write!(f, "Provider error: {msg}"),
            QuarryError::HydrationError(msg) => write!(f, "Hydration error: {msg}"),
            QuarryError::ProjectionError(msg) => write!(f, "Projection error: {msg}"),
            QuarryError::SchemaError(msg) => write!(f, "Schema error: {msg}"),
            QuarryError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            QuarryError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for QuarryError {}

pub type Result<T> = std::result::Result<T, QuarryError>;
