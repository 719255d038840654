//! Structured error types for the expertise engine.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// Empty or malformed input dataset.
  #[error("invalid dataset: {reason}")]
  InvalidDataset { reason: String },

  /// The dataset spans fewer days than one window.
  #[error("insufficient data: dataset spans {span_days} day(s), window needs {window_size_days}")]
  InsufficientData { span_days: usize, window_size_days: usize },

  /// No more days to slide into. Expected loop termination, not a defect.
  #[error("slide exhausted: last included date is {last_date}")]
  SlideExhausted { last_date: NaiveDate },

  /// Upstream data broke a change-record invariant.
  #[error("assertion violation: {reason}")]
  AssertionViolation { reason: String },

  #[error("invalid state: {0}")]
  InvalidState(String),

  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn invalid_dataset(reason: impl Into<String>) -> Self {
    Self::InvalidDataset {
      reason: reason.into(),
    }
  }

  pub fn assertion(reason: impl Into<String>) -> Self {
    Self::AssertionViolation {
      reason: reason.into(),
    }
  }

  /// Only an exhausted slide is part of normal control flow.
  pub fn is_recoverable(&self) -> bool {
    matches!(self, Self::SlideExhausted { .. })
  }

  /// Short machine-readable kind, used by the CLI error stream.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::InvalidDataset { .. } => "invalid_dataset",
      Self::InsufficientData { .. } => "insufficient_data",
      Self::SlideExhausted { .. } => "slide_exhausted",
      Self::AssertionViolation { .. } => "assertion_violation",
      Self::InvalidState(_) => "invalid_state",
      Self::Validation { .. } => "validation",
      Self::Json(_) => "json",
      Self::Io(_) => "io",
    }
  }
}
