//! Recency-weighted edge distances and distance-limited file reachability.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use petgraph::stable_graph::NodeIndex;

use crate::graph::{ArtifactGraph, Edge, NodeKind};

/// Turns an edge's day into a distance relative to the current window.
#[derive(Debug, Clone, Copy)]
pub struct Recency {
  pub first_date: NaiveDate,
  pub window_size_days: usize,
}

impl Recency {
  /// 0 for authorship. Otherwise `window_size_days / age_days`, where the
  /// window's first day has age 1: the oldest edge is the longest, the newest
  /// approaches 1.
  pub fn distance(&self, edge: &Edge) -> f64 {
    let date = match edge.date() {
      Some(d) => d,
      None => return 0.0,
    };
    let age_days = (date - self.first_date).num_days() + 1;
    let recency = age_days as f64 / self.window_size_days as f64;
    if recency <= 0.0 {
      f64::INFINITY
    } else {
      1.0 / recency
    }
  }
}

struct Frame {
  distance: f64,
  neighbors: Vec<(NodeIndex, Edge)>,
  cursor: usize,
}

/// Files reachable from `developer` without the path distance exceeding
/// `distance_limit` and without passing through another developer.
///
/// Depth-first; each node is entered at most once (first arrival wins), so
/// this is a bounded exploration and not a shortest-path search.
pub fn reachable_files(
  graph: &ArtifactGraph,
  developer: NodeIndex,
  recency: Recency,
  distance_limit: f64,
) -> BTreeSet<String> {
  let mut files = BTreeSet::new();
  let mut visited: HashSet<NodeIndex> = HashSet::new();
  visited.insert(developer);

  let mut stack = vec![Frame {
    distance: 0.0,
    neighbors: graph.neighbors_sorted(developer),
    cursor: 0,
  }];

  while let Some(top) = stack.last_mut() {
    let (child, edge) = match top.neighbors.get(top.cursor) {
      Some(&next) => next,
      None => {
        stack.pop();
        continue;
      }
    };
    top.cursor += 1;

    if visited.contains(&child) {
      continue;
    }
    let distance = top.distance + recency.distance(&edge);
    if distance > distance_limit {
      continue;
    }

    let node = match graph.node(child) {
      Some(n) => n,
      None => continue,
    };
    match node.kind {
      NodeKind::Developer => continue,
      NodeKind::File => {
        files.insert(node.key.clone());
      }
      NodeKind::Issue | NodeKind::ChangeSet => {}
    }

    visited.insert(child);
    stack.push(Frame {
      distance,
      neighbors: graph.neighbors_sorted(child),
      cursor: 0,
    });
  }

  files
}
