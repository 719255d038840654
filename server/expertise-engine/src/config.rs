//! Engine configuration with sane defaults.

use crate::error::EngineError;

/// Tunable parameters for window sliding and scoring.
#[derive(Debug, Clone)]
pub struct Config {
  /// Sliding window width in days.
  pub window_size_days: usize,
  /// Max accumulated edge distance a reachability walk may cover.
  pub distance_limit: f64,
  /// Change sets adding/modifying more files than this contribute no graph content.
  pub large_change_set_threshold: usize,
  /// Scores below this are dropped from the ranked tables.
  pub score_threshold: f64,
  /// Max edge count of a developer-to-developer path counted for RSRD.
  pub collaboration_path_cutoff: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      window_size_days: 365,
      distance_limit: 10.0,
      large_change_set_threshold: 50,
      score_threshold: 0.000005,
      collaboration_path_cutoff: 4,
    }
  }
}

impl Config {
  pub fn validate(&self) -> Result<(), EngineError> {
    if self.window_size_days == 0 {
      return Err(EngineError::validation("window_size_days", "must be at least 1"));
    }
    if !self.distance_limit.is_finite() || self.distance_limit < 0.0 {
      return Err(EngineError::validation(
        "distance_limit",
        "must be a finite, non-negative number",
      ));
    }
    if !self.score_threshold.is_finite() || self.score_threshold < 0.0 {
      return Err(EngineError::validation(
        "score_threshold",
        "must be a finite, non-negative number",
      ));
    }
    if self.collaboration_path_cutoff == 0 {
      return Err(EngineError::validation(
        "collaboration_path_cutoff",
        "must be at least 1",
      ));
    }
    Ok(())
  }
}
