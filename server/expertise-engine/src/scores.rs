//! Jack, maven and connector score tables.

use std::collections::{BTreeMap, BTreeSet};

use crate::centrality;
use crate::collab::CollaborationGraph;
use crate::types::{RankedDeveloper, ScoreTable};

pub type FileSets = BTreeMap<String, BTreeSet<String>>;

/// Drop scores below `threshold`, then sort: score desc, then name asc.
pub fn rank<I>(scores: I, threshold: f64) -> ScoreTable
where
  I: IntoIterator<Item = (String, f64)>,
{
  let mut table: ScoreTable = scores
    .into_iter()
    .filter(|(_, score)| *score >= threshold)
    .map(|(developer, score)| RankedDeveloper { developer, score })
    .collect();

  table.sort_by(|a, b| {
    b.score
      .partial_cmp(&a.score)
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| a.developer.cmp(&b.developer))
  });

  table
}

/// Breadth: share of the project's files a developer reaches.
pub fn jacks(reachable: &FileSets, project_file_count: u64, threshold: f64) -> ScoreTable {
  if project_file_count == 0 {
    return Vec::new();
  }
  let total = project_file_count as f64;
  rank(
    reachable
      .iter()
      .map(|(dev, files)| (dev.clone(), (files.len() as f64 / total).min(1.0))),
    threshold,
  )
}

/// Uniqueness: share of all rare files that belong to a developer.
pub fn mavens(rare: &FileSets, threshold: f64) -> ScoreTable {
  let total: usize = rare.values().map(BTreeSet::len).sum();
  if total == 0 {
    return Vec::new();
  }
  rank(
    rare
      .iter()
      .map(|(dev, files)| (dev.clone(), files.len() as f64 / total as f64)),
    threshold,
  )
}

/// Brokerage: normalized betweenness in the collaboration graph.
pub fn connectors(collab: &CollaborationGraph, threshold: f64) -> ScoreTable {
  let betweenness = centrality::normalized_betweenness(&collab.adjacency());
  rank(
    collab.developers().iter().cloned().zip(betweenness),
    threshold,
  )
}
