//! Error types for `kinroll-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// One broken field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
  pub field:   String,
  pub message: String,
}

/// Every rule a submission or patch broke, in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.push(FieldViolation { field: field.into(), message: message.into() });
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = &FieldViolation> { self.0.iter() }

  pub fn contains_field(&self, field: &str) -> bool {
    self.0.iter().any(|v| v.field == field)
  }

  /// `Err(self)` when anything was recorded.
  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for Violations {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let joined = self
      .0
      .iter()
      .map(|v| v.message.as_str())
      .collect::<Vec<_>>()
      .join(", ");
    f.write_str(&joined)
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("Missing required fields: {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),

  #[error("Validation error: {0}")]
  Invalid(Violations),

  #[error("No valid fields provided for update.")]
  EmptyPatch,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
