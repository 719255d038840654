//! Weighted betweenness centrality (Brandes).
//!
//! BC(v) = Σ σ_st(v) / σ_st over pairs s ≠ v ≠ t, where σ_st counts shortest
//! paths from s to t and σ_st(v) those passing through v. Shortest paths are
//! found with Dijkstra since edges carry distances. Path lengths are compared
//! exactly, so two routes tie only when their summed weights are equal.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct Candidate {
  dist: f64,
  seq: usize,
  node: usize,
}

impl PartialEq for Candidate {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Candidate {
  // Reversed: BinaryHeap is a max-heap and we want the nearest node first.
  fn cmp(&self, other: &Self) -> Ordering {
    other
      .dist
      .total_cmp(&self.dist)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

/// Betweenness of every node of an undirected weighted graph given as
/// symmetric adjacency lists. Normalized by `1 / ((n-1)(n-2))` when `n > 2`,
/// which maps scores into `[0, 1]`.
pub fn normalized_betweenness(adj: &[Vec<(usize, f64)>]) -> Vec<f64> {
  let n = adj.len();
  let mut betweenness = vec![0.0; n];

  for source in 0..n {
    // Nodes in order of non-decreasing distance from source.
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut num_paths: Vec<f64> = vec![0.0; n];
    let mut best: Vec<Option<f64>> = vec![None; n];
    let mut settled: Vec<bool> = vec![false; n];

    num_paths[source] = 1.0;
    best[source] = Some(0.0);
    let mut seq = 0;
    let mut queue = BinaryHeap::new();
    queue.push(Candidate {
      dist: 0.0,
      seq,
      node: source,
    });

    while let Some(Candidate { dist, node: v, .. }) = queue.pop() {
      if settled[v] {
        continue;
      }
      settled[v] = true;
      order.push(v);

      for &(w, weight) in &adj[v] {
        if settled[w] {
          continue;
        }
        let through_v = dist + weight;
        match best[w] {
          Some(known) if through_v > known => {}
          Some(known) if through_v == known => {
            num_paths[w] += num_paths[v];
            predecessors[w].push(v);
          }
          _ => {
            best[w] = Some(through_v);
            num_paths[w] = num_paths[v];
            predecessors[w] = vec![v];
            seq += 1;
            queue.push(Candidate {
              dist: through_v,
              seq,
              node: w,
            });
          }
        }
      }
    }

    // Dependency accumulation, farthest nodes first.
    let mut dependency: Vec<f64> = vec![0.0; n];
    while let Some(w) = order.pop() {
      let coeff = (1.0 + dependency[w]) / num_paths[w];
      for &v in &predecessors[w] {
        dependency[v] += num_paths[v] * coeff;
      }
      if w != source {
        betweenness[w] += dependency[w];
      }
    }
  }

  // Each undirected pair was counted from both ends; the factor 2 cancels
  // against the (n-1)(n-2)/2 pairs of the normalization.
  if n > 2 {
    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    for b in &mut betweenness {
      *b *= scale;
    }
  }

  betweenness
}

#[cfg(test)]
mod tests {
  use super::*;

  fn undirected(n: usize, edges: &[(usize, usize, f64)]) -> Vec<Vec<(usize, f64)>> {
    let mut adj = vec![Vec::new(); n];
    for &(a, b, w) in edges {
      adj[a].push((b, w));
      adj[b].push((a, w));
    }
    adj
  }

  #[test]
  fn empty_graph() {
    assert!(normalized_betweenness(&[]).is_empty());
  }

  #[test]
  fn path_center_is_fully_between() {
    let adj = undirected(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
    let bc = normalized_betweenness(&adj);
    assert_eq!(bc, vec![0.0, 1.0, 0.0]);
  }

  #[test]
  fn star_center_scores_one() {
    let adj = undirected(5, &[(0, 1, 2.0), (0, 2, 2.0), (0, 3, 2.0), (0, 4, 2.0)]);
    let bc = normalized_betweenness(&adj);
    assert!((bc[0] - 1.0).abs() < 1e-12);
    assert!(bc[1..].iter().all(|&b| b == 0.0));
  }

  #[test]
  fn weights_pick_the_shortest_route() {
    // 0-1-2 costs 2, direct 0-2 costs 5: node 1 carries the 0..2 pair.
    let adj = undirected(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 5.0)]);
    let bc = normalized_betweenness(&adj);
    assert_eq!(bc[1], 1.0);

    // Direct edge now shorter: nobody is between.
    let adj = undirected(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.5)]);
    let bc = normalized_betweenness(&adj);
    assert_eq!(bc, vec![0.0, 0.0, 0.0]);
  }

  #[test]
  fn equal_routes_split_credit() {
    // Square 0-1-3 and 0-2-3, all unit weights.
    let adj = undirected(4, &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)]);
    let bc = normalized_betweenness(&adj);
    // Every node carries half of one non-adjacent pair, counted from both
    // ends: (2 * 0.5) / (3 * 2) = 1/6.
    for b in bc {
      assert!((b - 1.0 / 6.0).abs() < 1e-12);
    }
  }

  #[test]
  fn two_nodes_are_not_rescaled() {
    let adj = undirected(2, &[(0, 1, 1.0)]);
    assert_eq!(normalized_betweenness(&adj), vec![0.0, 0.0]);
  }
}
