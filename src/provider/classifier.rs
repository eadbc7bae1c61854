//! # Ignorable-Error Classification
//!
//! Per-call policy deciding which provider errors mean "this optional
//! sub-resource doesn't exist" and should hydrate to a null value instead
//! of failing the branch.
//!
//! Two inputs combine: enumerated [`ErrorKind`]s declared by the table
//! author, and raw code strings supplied through connection configuration
//! (mirroring `ignore_error_codes` style settings).

use std::collections::HashSet;

use super::error::{ErrorKind, ProviderError};

/// Which provider errors a hydrate call treats as absence.
#[derive(Debug, Clone, Default)]
pub struct IgnoreConfig {
    kinds: HashSet<ErrorKind>,
    codes: HashSet<String>,
}

impl IgnoreConfig {
    /// Policy that ignores nothing; every error is fatal for its branch.
    pub fn none() -> Self {
        Self::default()
    }

    /// Policy that ignores the given kinds.
    pub fn kinds(kinds: &[ErrorKind]) -> Self {
        Self {
            kinds: kinds.iter().copied().collect(),
            codes: HashSet::new(),
        }
    }

    /// Policy that ignores both absence kinds (`NotFound`, `NotConfigured`).
    pub fn absence() -> Self {
        Self::kinds(&[ErrorKind::NotFound, ErrorKind::NotConfigured])
    }

    /// Add raw code strings from connection configuration.
    pub fn with_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codes.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Add a single enumerated kind.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    /// Whether the error should be converted into an absent (null) value.
    pub fn should_ignore(&self, error: &ProviderError) -> bool {
        self.kinds.contains(&error.kind) || self.codes.contains(&error.code)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.codes.is_empty()
    }
}
