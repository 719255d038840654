//! Developer collaboration graph weighted by RSRD distance.
//!
//! RSRD (reciprocal sum of reciprocal distances) between two developers is
//! `1 / Σ (1 / len)` over every simple path joining them in the artifact
//! graph with at most `cutoff` edges. Many short paths give a small distance;
//! a single long one gives a large distance.

use std::collections::{BTreeMap, HashSet};

use petgraph::stable_graph::NodeIndex;

use crate::graph::{ArtifactGraph, Edge, NodeKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollaborationGraph {
  /// Developers with at least one collaboration edge, sorted.
  developers: Vec<String>,
  /// Keyed by (smaller name, larger name).
  edges: BTreeMap<(String, String), f64>,
}

impl CollaborationGraph {
  pub fn from_distances(distances: BTreeMap<(String, String), f64>) -> Self {
    let edges: BTreeMap<(String, String), f64> = distances
      .into_iter()
      .filter(|(_, d)| *d > 0.0)
      .map(|((a, b), d)| if a <= b { ((a, b), d) } else { ((b, a), d) })
      .collect();
    let mut developers: Vec<String> = edges
      .keys()
      .flat_map(|(a, b)| [a.clone(), b.clone()])
      .collect();
    developers.sort();
    developers.dedup();
    Self { developers, edges }
  }

  pub fn developers(&self) -> &[String] {
    &self.developers
  }

  pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
    self.edges.iter().map(|((a, b), d)| (a.as_str(), b.as_str(), *d))
  }

  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  pub fn is_empty(&self) -> bool {
    self.edges.is_empty()
  }

  pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
    let key = if a <= b {
      (a.to_string(), b.to_string())
    } else {
      (b.to_string(), a.to_string())
    };
    self.edges.get(&key).copied()
  }

  /// Weighted adjacency lists indexed like `developers()`.
  pub fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
    let position = |name: &str| self.developers.binary_search_by(|d| d.as_str().cmp(name)).ok();
    let mut adj = vec![Vec::new(); self.developers.len()];
    for ((a, b), d) in &self.edges {
      if let (Some(i), Some(j)) = (position(a), position(b)) {
        adj[i].push((j, *d));
        adj[j].push((i, *d));
      }
    }
    adj
  }
}

struct Frame {
  neighbors: Vec<(NodeIndex, Edge)>,
  cursor: usize,
}

/// Sum of `1 / len` over simple paths from `source` to every other developer,
/// with at most `cutoff` edges. Paths may pass through other developers.
fn reciprocal_path_sums(
  graph: &ArtifactGraph,
  source: NodeIndex,
  cutoff: usize,
) -> BTreeMap<NodeIndex, f64> {
  let mut sums: BTreeMap<NodeIndex, f64> = BTreeMap::new();
  let mut on_path: HashSet<NodeIndex> = HashSet::new();
  let mut path: Vec<NodeIndex> = vec![source];
  on_path.insert(source);

  let mut stack = vec![Frame {
    neighbors: graph.neighbors_sorted(source),
    cursor: 0,
  }];

  while let Some(top) = stack.last_mut() {
    let child = match top.neighbors.get(top.cursor) {
      Some(&(child, _)) => child,
      None => {
        stack.pop();
        if let Some(done) = path.pop() {
          on_path.remove(&done);
        }
        continue;
      }
    };
    top.cursor += 1;

    if on_path.contains(&child) {
      continue;
    }
    // Edge count of the path ending at `child`.
    let len = path.len();
    if graph.kind_of(child) == Some(NodeKind::Developer) {
      *sums.entry(child).or_insert(0.0) += 1.0 / len as f64;
    }
    if len < cutoff {
      path.push(child);
      on_path.insert(child);
      stack.push(Frame {
        neighbors: graph.neighbors_sorted(child),
        cursor: 0,
      });
    }
  }

  sums
}

/// RSRD distance for every unordered developer pair joined by at least one
/// simple path of at most `cutoff` edges. Pairs without such a path are absent.
pub fn rsrd_distances(graph: &ArtifactGraph, cutoff: usize) -> BTreeMap<(String, String), f64> {
  let developers = graph.handles(NodeKind::Developer);
  let mut out = BTreeMap::new();

  for (name, handle) in &developers {
    for (other, srd) in reciprocal_path_sums(graph, *handle, cutoff) {
      let other_name = match graph.node(other) {
        Some(n) => n.key.clone(),
        None => continue,
      };
      // Paths are symmetric; keep one orientation per pair.
      if other_name.as_str() <= name.as_str() || srd == 0.0 {
        continue;
      }
      out.insert((name.clone(), other_name), 1.0 / srd);
    }
  }

  out
}

pub fn collaboration_graph(graph: &ArtifactGraph, cutoff: usize) -> CollaborationGraph {
  CollaborationGraph::from_distances(rsrd_distances(graph, cutoff))
}
