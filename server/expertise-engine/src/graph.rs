//! Artifact graph: developers, files, issues and change sets.
//!
//! Nodes live in a petgraph `StableUnGraph`, so a node keeps its `NodeIndex`
//! for as long as it exists. Each kind has its own key → index map; a file
//! rename only rewrites the file map (and the node's label), never the edges.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::Serialize;

use crate::types::{ChangeKind, ChangeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NodeKind {
  Developer,
  File,
  Issue,
  ChangeSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  pub kind: NodeKind,
  pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Edge {
  /// Developer – ChangeSet. Always zero distance.
  Authored,
  /// ChangeSet – File, tagged with the change set's day.
  Touches(NaiveDate),
  /// ChangeSet – Issue, tagged with the change set's day.
  Links(NaiveDate),
}

impl Edge {
  pub fn date(&self) -> Option<NaiveDate> {
    match self {
      Self::Authored => None,
      Self::Touches(d) | Self::Links(d) => Some(*d),
    }
  }
}

pub type NodeKey = (NodeKind, String);

/// Order-independent dump of the topology, for comparing two graphs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphSnapshot {
  pub nodes: BTreeSet<NodeKey>,
  pub edges: BTreeSet<(NodeKey, NodeKey, Edge)>,
}

/// What one batch of change sets did to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
  pub added: usize,
  pub skipped_large: usize,
  pub renamed: usize,
  pub deleted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactGraph {
  graph: StableUnGraph<Node, Edge>,
  developers: HashMap<String, NodeIndex>,
  files: HashMap<String, NodeIndex>,
  issues: HashMap<String, NodeIndex>,
  change_sets: HashMap<String, NodeIndex>,
}

impl ArtifactGraph {
  pub fn new() -> Self {
    Self::default()
  }

  // -------------------------------------------------------------------------
  // Batch mutation
  // -------------------------------------------------------------------------

  /// Apply change sets in order: renames, then deletions, then new content.
  ///
  /// A change set adding/modifying more than `large_threshold` files adds no
  /// nodes or edges, but its renames and deletions still apply.
  pub fn add_change_sets<'a, I>(&mut self, change_sets: I, large_threshold: usize) -> ApplyStats
  where
    I: IntoIterator<Item = &'a ChangeSet>,
  {
    let mut stats = ApplyStats::default();

    for cs in change_sets {
      let mut add_modify: Vec<&str> = Vec::new();
      let mut deletes: Vec<&str> = Vec::new();
      let mut renames: Vec<(&str, &str)> = Vec::new();
      for fc in cs.file_changes() {
        match (fc.kind(), fc.old_file_path()) {
          (ChangeKind::Delete, _) => deletes.push(fc.file_path()),
          (ChangeKind::Rename, Some(old)) => {
            // A later entry for the same old path wins.
            renames.retain(|(o, _)| *o != old);
            renames.push((old, fc.file_path()));
          }
          _ => add_modify.push(fc.file_path()),
        }
      }

      stats.renamed += self.rename_files(&renames);
      stats.deleted += self.remove_files(&deletes);

      if add_modify.len() > large_threshold {
        tracing::trace!(
          commit = cs.commit_id(),
          files = add_modify.len(),
          "skipping large change set"
        );
        stats.skipped_large += 1;
        continue;
      }

      let commit = self.ensure_node(NodeKind::ChangeSet, cs.commit_id());
      let author = self.ensure_node(NodeKind::Developer, cs.author());
      self.graph.update_edge(author, commit, Edge::Authored);

      for path in add_modify {
        let file = self.ensure_node(NodeKind::File, path);
        self.graph.update_edge(commit, file, Edge::Touches(cs.day()));
      }
      for issue_id in cs.issue_ids() {
        let issue = self.ensure_node(NodeKind::Issue, issue_id);
        self.graph.update_edge(commit, issue, Edge::Links(cs.day()));
      }
      stats.added += 1;
    }

    stats
  }

  /// Drop the given change sets and anything left without edges.
  pub fn remove_change_sets<'a, I>(&mut self, change_sets: I) -> usize
  where
    I: IntoIterator<Item = &'a ChangeSet>,
  {
    let handles: Vec<NodeIndex> = change_sets
      .into_iter()
      .filter_map(|cs| self.change_sets.get(cs.commit_id()).copied())
      .collect();
    let removed = handles.len();
    self.remove_and_prune(handles);
    removed
  }

  /// Relabel file nodes. All pairs apply simultaneously, so `a→b, b→c`
  /// moves both without chaining. A target that already names a live file
  /// absorbs the renamed node's edges.
  pub fn rename_files(&mut self, renames: &[(&str, &str)]) -> usize {
    let moving: Vec<(NodeIndex, &str)> = renames
      .iter()
      .filter_map(|(old, new)| self.files.remove(*old).map(|h| (h, *new)))
      .collect();
    let count = moving.len();

    for (handle, new) in moving {
      match self.files.get(new).copied() {
        Some(existing) => self.merge_into(handle, existing),
        None => {
          if let Some(node) = self.graph.node_weight_mut(handle) {
            node.key = new.to_string();
          }
          self.files.insert(new.to_string(), handle);
        }
      }
    }

    count
  }

  /// Remove file nodes by path and anything left without edges.
  pub fn remove_files(&mut self, paths: &[&str]) -> usize {
    let handles: Vec<NodeIndex> = paths
      .iter()
      .filter_map(|p| self.files.get(*p).copied())
      .collect();
    let removed = handles.len();
    self.remove_and_prune(handles);
    removed
  }

  fn merge_into(&mut self, from: NodeIndex, into: NodeIndex) {
    let moved: Vec<(NodeIndex, Edge)> = self
      .graph
      .edges(from)
      .map(|e| {
        let other = if e.source() == from { e.target() } else { e.source() };
        (other, *e.weight())
      })
      .collect();
    for (other, edge) in moved {
      self.graph.update_edge(into, other, edge);
    }
    self.graph.remove_node(from);
  }

  fn ensure_node(&mut self, kind: NodeKind, key: &str) -> NodeIndex {
    if let Some(&h) = self.index(kind).get(key) {
      return h;
    }
    let h = self.graph.add_node(Node {
      kind,
      key: key.to_string(),
    });
    self.index_mut(kind).insert(key.to_string(), h);
    h
  }

  fn remove_and_prune(&mut self, handles: Vec<NodeIndex>) {
    let mut touched: Vec<NodeIndex> = Vec::new();
    for h in handles {
      if !self.graph.contains_node(h) {
        continue;
      }
      touched.extend(self.graph.neighbors(h));
      self.remove_node(h);
    }
    for h in touched {
      if self.graph.contains_node(h) && self.graph.neighbors(h).next().is_none() {
        self.remove_node(h);
      }
    }
  }

  fn remove_node(&mut self, h: NodeIndex) {
    if let Some(node) = self.graph.remove_node(h) {
      self.index_mut(node.kind).remove(&node.key);
    }
  }

  fn index(&self, kind: NodeKind) -> &HashMap<String, NodeIndex> {
    match kind {
      NodeKind::Developer => &self.developers,
      NodeKind::File => &self.files,
      NodeKind::Issue => &self.issues,
      NodeKind::ChangeSet => &self.change_sets,
    }
  }

  fn index_mut(&mut self, kind: NodeKind) -> &mut HashMap<String, NodeIndex> {
    match kind {
      NodeKind::Developer => &mut self.developers,
      NodeKind::File => &mut self.files,
      NodeKind::Issue => &mut self.issues,
      NodeKind::ChangeSet => &mut self.change_sets,
    }
  }

  // -------------------------------------------------------------------------
  // Queries
  // -------------------------------------------------------------------------

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  pub fn handle(&self, kind: NodeKind, key: &str) -> Option<NodeIndex> {
    self.index(kind).get(key).copied()
  }

  pub fn node(&self, h: NodeIndex) -> Option<&Node> {
    self.graph.node_weight(h)
  }

  pub fn kind_of(&self, h: NodeIndex) -> Option<NodeKind> {
    self.graph.node_weight(h).map(|n| n.kind)
  }

  /// Keys of one kind, sorted.
  pub fn keys(&self, kind: NodeKind) -> Vec<String> {
    let mut keys: Vec<String> = self.index(kind).keys().cloned().collect();
    keys.sort();
    keys
  }

  /// Handles of one kind, sorted by key.
  pub fn handles(&self, kind: NodeKind) -> Vec<(String, NodeIndex)> {
    let mut out: Vec<(String, NodeIndex)> =
      self.index(kind).iter().map(|(k, &h)| (k.clone(), h)).collect();
    out.sort();
    out
  }

  /// Neighbors with the connecting edge, sorted by (kind, key) so that
  /// traversals do not depend on insertion history.
  pub fn neighbors_sorted(&self, h: NodeIndex) -> Vec<(NodeIndex, Edge)> {
    let mut out: Vec<(NodeIndex, Edge)> = self
      .graph
      .edges(h)
      .map(|e| {
        let other = if e.source() == h { e.target() } else { e.source() };
        (other, *e.weight())
      })
      .collect();
    out.sort_by(|(a, _), (b, _)| {
      let a = self.graph.node_weight(*a).map(|n| (n.kind, n.key.as_str()));
      let b = self.graph.node_weight(*b).map(|n| (n.kind, n.key.as_str()));
      a.cmp(&b)
    });
    out
  }

  pub fn degree(&self, h: NodeIndex) -> usize {
    self.graph.neighbors(h).count()
  }

  pub fn snapshot(&self) -> GraphSnapshot {
    let key_of = |h: NodeIndex| -> Option<NodeKey> {
      self.graph.node_weight(h).map(|n| (n.kind, n.key.clone()))
    };
    let nodes = self
      .graph
      .node_indices()
      .filter_map(key_of)
      .collect::<BTreeSet<_>>();
    let edges = self
      .graph
      .edge_references()
      .filter_map(|e| {
        let a = key_of(e.source())?;
        let b = key_of(e.target())?;
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Some((a, b, *e.weight()))
      })
      .collect::<BTreeSet<_>>();
    GraphSnapshot { nodes, edges }
  }

  /// Stable short hash of the topology. Equal graphs give equal digests.
  pub fn digest(&self) -> String {
    let snapshot = self.snapshot();
    let mut hasher = blake3::Hasher::new();
    for (kind, key) in &snapshot.nodes {
      hasher.update(format!("{:?}", kind).as_bytes());
      hasher.update(b":");
      hasher.update(key.as_bytes());
      hasher.update(b"|");
    }
    for ((ka, a), (kb, b), edge) in &snapshot.edges {
      hasher.update(format!("{:?}:{}-{:?}:{}={:?}", ka, a, kb, b, edge).as_bytes());
      hasher.update(b"|");
    }
    let hex = hasher.finalize().to_hex();
    hex[..16].to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::FileChange;
  use chrono::{TimeZone, Utc};

  fn cs(id: &str, author: &str, d: u32, issues: &[&str], changes: Vec<FileChange>) -> ChangeSet {
    let ts = Utc.with_ymd_and_hms(2019, 1, d, 12, 0, 0).unwrap();
    ChangeSet::new(
      id,
      author,
      ts,
      issues.iter().map(|s| s.to_string()).collect(),
      changes,
      3,
    )
    .unwrap()
  }

  fn touches(g: &ArtifactGraph, commit: &str, file: &str) -> bool {
    let snap = g.snapshot();
    snap.edges.iter().any(|(a, b, e)| {
      matches!(e, Edge::Touches(_))
        && ((a.1 == commit && b.1 == file) || (a.1 == file && b.1 == commit))
    })
  }

  #[test]
  fn add_builds_all_node_kinds() {
    let mut g = ArtifactGraph::new();
    let stats = g.add_change_sets(
      &[cs("CS0", "d1", 1, &["I0"], vec![FileChange::add("F0"), FileChange::add("F1")])],
      50,
    );
    assert_eq!(stats.added, 1);
    assert_eq!(g.node_count(), 5);
    assert_eq!(g.edge_count(), 4);
    assert_eq!(g.keys(NodeKind::File), vec!["F0", "F1"]);
    assert_eq!(g.keys(NodeKind::Developer), vec!["d1"]);
  }

  #[test]
  fn developer_and_file_are_shared_across_change_sets() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(
      &[
        cs("CS0", "d1", 1, &[], vec![FileChange::add("F0")]),
        cs("CS1", "d1", 2, &[], vec![FileChange::modify("F0")]),
      ],
      50,
    );
    assert_eq!(g.keys(NodeKind::Developer).len(), 1);
    assert_eq!(g.keys(NodeKind::File).len(), 1);
    assert_eq!(g.edge_count(), 4);
  }

  #[test]
  fn large_change_set_adds_nothing_but_still_deletes() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(&[cs("CS0", "d1", 1, &[], vec![FileChange::add("F0")])], 2);
    let big = cs(
      "CS1",
      "d2",
      2,
      &["I1"],
      vec![
        FileChange::delete("F0"),
        FileChange::add("A"),
        FileChange::add("B"),
        FileChange::add("C"),
      ],
    );
    let stats = g.add_change_sets(&[big], 2);
    assert_eq!(stats.skipped_large, 1);
    assert_eq!(stats.deleted, 1);
    // d1 and CS0 are still linked to each other.
    assert_eq!(g.keys(NodeKind::File), Vec::<String>::new());
    assert_eq!(g.keys(NodeKind::Developer), vec!["d1"]);
    assert_eq!(g.handle(NodeKind::ChangeSet, "CS1"), None);
  }

  #[test]
  fn rename_keeps_handle_and_edges() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(&[cs("CS0", "d1", 1, &[], vec![FileChange::add("F0")])], 50);
    let before = g.handle(NodeKind::File, "F0").unwrap();

    g.add_change_sets(
      &[cs("CS1", "d2", 2, &[], vec![FileChange::rename("F0", "F9")])],
      50,
    );
    assert_eq!(g.handle(NodeKind::File, "F0"), None);
    assert_eq!(g.handle(NodeKind::File, "F9"), Some(before));
    assert!(touches(&g, "CS0", "F9"));
    assert_eq!(g.node(before).unwrap().key, "F9");
  }

  #[test]
  fn renames_within_one_change_set_do_not_chain() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(
      &[
        cs("CS0", "d1", 1, &[], vec![FileChange::add("A")]),
        cs("CS1", "d2", 1, &[], vec![FileChange::add("B")]),
      ],
      50,
    );
    g.rename_files(&[("A", "B"), ("B", "C")]);
    assert!(touches(&g, "CS0", "B"));
    assert!(touches(&g, "CS1", "C"));
  }

  #[test]
  fn renames_across_change_sets_apply_in_order() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(&[cs("CS0", "d1", 1, &[], vec![FileChange::add("A")])], 50);
    g.add_change_sets(
      &[
        cs("CS1", "d2", 2, &[], vec![FileChange::rename("A", "B")]),
        cs("CS2", "d2", 2, &[], vec![FileChange::rename("B", "C")]),
      ],
      50,
    );
    assert_eq!(g.keys(NodeKind::File), vec!["C"]);
    assert!(touches(&g, "CS0", "C"));
  }

  #[test]
  fn rename_onto_live_file_merges() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(
      &[
        cs("CS0", "d1", 1, &[], vec![FileChange::add("A")]),
        cs("CS1", "d2", 1, &[], vec![FileChange::add("B")]),
      ],
      50,
    );
    g.rename_files(&[("A", "B")]);
    assert_eq!(g.keys(NodeKind::File), vec!["B"]);
    assert!(touches(&g, "CS0", "B"));
    assert!(touches(&g, "CS1", "B"));
  }

  #[test]
  fn deleting_last_file_prunes_nothing_else_while_authored() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(&[cs("CS0", "d1", 1, &[], vec![FileChange::add("F0")])], 50);
    g.remove_files(&["F0"]);
    assert_eq!(g.node_count(), 2);
    assert!(g.snapshot().nodes.iter().all(|(k, _)| *k != NodeKind::File));
  }

  #[test]
  fn delete_of_rename_target_drops_renamed_file() {
    let mut g = ArtifactGraph::new();
    let first = cs("CS0", "d1", 1, &[], vec![FileChange::add("a")]);
    let second = cs(
      "CS1",
      "d2",
      2,
      &[],
      vec![FileChange::rename("a", "b"), FileChange::delete("b")],
    );
    g.add_change_sets([&first], 50);
    assert!(g.handle(NodeKind::File, "a").is_some());

    let stats = g.add_change_sets([&second], 50);
    assert_eq!((stats.renamed, stats.deleted), (1, 1));
    assert_eq!(g.handle(NodeKind::File, "a"), None);
    assert_eq!(g.handle(NodeKind::File, "b"), None);
    assert!(g.keys(NodeKind::File).is_empty());

    // CS0 lost its Touches edge and hangs on by authorship alone.
    let commit = g.handle(NodeKind::ChangeSet, "CS0").unwrap();
    assert_eq!(g.degree(commit), 1);
    assert_eq!(g.node_count(), 4);
    assert_eq!(g.edge_count(), 2);

    g.remove_change_sets([&first]);
    assert_eq!(g.keys(NodeKind::Developer), vec!["d2"]);
    assert_eq!(g.node_count(), 2);
  }

  #[test]
  fn removing_change_set_cascades() {
    let mut g = ArtifactGraph::new();
    let first = cs("CS0", "d1", 1, &["I0"], vec![FileChange::add("F0")]);
    let second = cs("CS1", "d2", 2, &[], vec![FileChange::modify("F0")]);
    g.add_change_sets([&first, &second], 50);

    g.remove_change_sets([&first]);
    assert_eq!(g.keys(NodeKind::Developer), vec!["d2"]);
    assert_eq!(g.keys(NodeKind::Issue), Vec::<String>::new());
    assert_eq!(g.keys(NodeKind::File), vec!["F0"]);

    g.remove_change_sets([&second]);
    assert_eq!(g.node_count(), 0);
  }

  #[test]
  fn removing_absent_change_set_is_a_noop() {
    let mut g = ArtifactGraph::new();
    let first = cs("CS0", "d1", 1, &[], vec![FileChange::add("F0")]);
    assert_eq!(g.remove_change_sets([&first]), 0);
  }

  #[test]
  fn kinds_are_separate_namespaces() {
    let mut g = ArtifactGraph::new();
    g.add_change_sets(&[cs("X", "X", 1, &["X"], vec![FileChange::add("X")])], 50);
    assert_eq!(g.node_count(), 4);
  }

  #[test]
  fn digest_ignores_construction_order() {
    let a = cs("CS0", "d1", 1, &["I0"], vec![FileChange::add("F0")]);
    let b = cs("CS1", "d2", 2, &[], vec![FileChange::add("F1")]);
    let mut g1 = ArtifactGraph::new();
    g1.add_change_sets([&a, &b], 50);
    let mut g2 = ArtifactGraph::new();
    g2.add_change_sets([&b, &a], 50);
    assert_eq!(g1.snapshot(), g2.snapshot());
    assert_eq!(g1.digest(), g2.digest());
  }
}
