//! Error types for `mela-core`.

use thiserror::Error;

/// A creation input that violates a domain invariant.
///
/// `field` carries the wire-level (camelCase) spelling of the offending
/// field, e.g. `startTime` or `location.lng`, so API consumers can
/// surface it directly.
#[derive(Debug, Clone, Error)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
  pub field:   &'static str,
  pub message: String,
}

impl ValidationError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self { field, message: message.into() }
  }
}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;
