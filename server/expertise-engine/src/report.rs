//! Per-window output surface.

use chrono::NaiveDate;
use serde::Serialize;

use crate::history::HistoryGraph;
use crate::types::ScoreTable;

/// Everything a caller records for one window position.
#[derive(Debug, Clone, Serialize)]
pub struct WindowReport {
  /// 1-based position of this window.
  pub iteration: usize,
  pub first_included_date: NaiveDate,
  pub last_included_date: NaiveDate,
  pub node_count: usize,
  pub edge_count: usize,
  /// Topology hash; equal digests mean identical graphs.
  pub graph_digest: String,
  pub project_file_count: u64,
  pub developers: Vec<String>,
  pub files: Vec<String>,
  pub jacks: ScoreTable,
  pub mavens: ScoreTable,
  pub connectors: ScoreTable,
  pub total_iterations: usize,
  pub remaining_iterations: usize,
}

impl WindowReport {
  /// Pull every analytic for the current position. Fills the graph's cache.
  pub fn capture(history: &mut HistoryGraph, iteration: usize) -> Self {
    Self {
      iteration,
      first_included_date: history.first_included_date(),
      last_included_date: history.last_included_date(),
      node_count: history.node_count(),
      edge_count: history.edge_count(),
      graph_digest: history.digest(),
      project_file_count: history.project_file_count(),
      developers: history.developers().to_vec(),
      files: history.files().to_vec(),
      jacks: history.jacks().clone(),
      mavens: history.mavens().clone(),
      connectors: history.connectors().clone(),
      total_iterations: history.iteration_count(),
      remaining_iterations: history.remaining_iterations(),
    }
  }
}
