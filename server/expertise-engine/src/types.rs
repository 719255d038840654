//! Core types for the expertise engine (JSON contracts + internal models).

use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the ingestion step produces)
// ---------------------------------------------------------------------------

/// A whole normalized dataset. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
  pub change_sets: Vec<InboundChangeSet>,
}

impl Dataset {
  pub fn from_json_str(s: &str) -> Result<Self, EngineError> {
    Ok(serde_json::from_str(s)?)
  }

  pub fn from_reader<R: Read>(reader: R) -> Result<Self, EngineError> {
    Ok(serde_json::from_reader(reader)?)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundChangeSet {
  pub commit_hash: String,
  pub author: String,
  pub date: String,
  #[serde(default)]
  pub issues: Vec<String>,
  pub code_changes: Vec<InboundCodeChange>,
  pub num_current_files: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCodeChange {
  pub file_path: String,
  pub change_type: String,
  #[serde(default)]
  pub old_file_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Change kind (normalized)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
  Add,
  Delete,
  Modify,
  Rename,
}

impl ChangeKind {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_uppercase().as_str() {
      "ADD" => Some(Self::Add),
      "DELETE" => Some(Self::Delete),
      "MODIFY" => Some(Self::Modify),
      "RENAME" => Some(Self::Rename),
      _ => None,
    }
  }
}

// ---------------------------------------------------------------------------
// Internal event model
// ---------------------------------------------------------------------------

/// A single file-level change. `old_file_path` is set iff the kind is `Rename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
  file_path: String,
  kind: ChangeKind,
  old_file_path: Option<String>,
}

impl FileChange {
  pub fn new(
    file_path: impl Into<String>,
    kind: ChangeKind,
    old_file_path: Option<String>,
  ) -> Result<Self, EngineError> {
    let file_path = file_path.into();
    match (kind, &old_file_path) {
      (ChangeKind::Rename, None) => {
        return Err(EngineError::assertion(format!(
          "rename of {} is missing its old path",
          file_path
        )));
      }
      (ChangeKind::Add | ChangeKind::Delete | ChangeKind::Modify, Some(old)) => {
        return Err(EngineError::assertion(format!(
          "{:?} of {} carries an old path ({})",
          kind, file_path, old
        )));
      }
      _ => {}
    }
    Ok(Self {
      file_path,
      kind,
      old_file_path,
    })
  }

  pub fn add(file_path: impl Into<String>) -> Self {
    Self::plain(file_path, ChangeKind::Add)
  }

  pub fn modify(file_path: impl Into<String>) -> Self {
    Self::plain(file_path, ChangeKind::Modify)
  }

  pub fn delete(file_path: impl Into<String>) -> Self {
    Self::plain(file_path, ChangeKind::Delete)
  }

  pub fn rename(old_file_path: impl Into<String>, file_path: impl Into<String>) -> Self {
    Self {
      file_path: file_path.into(),
      kind: ChangeKind::Rename,
      old_file_path: Some(old_file_path.into()),
    }
  }

  fn plain(file_path: impl Into<String>, kind: ChangeKind) -> Self {
    Self {
      file_path: file_path.into(),
      kind,
      old_file_path: None,
    }
  }

  pub fn file_path(&self) -> &str {
    &self.file_path
  }

  pub fn kind(&self) -> ChangeKind {
    self.kind
  }

  pub fn old_file_path(&self) -> Option<&str> {
    self.old_file_path.as_deref()
  }
}

/// A commit-level change set. Immutable once constructed.
///
/// The commit time is kept for reference, but all window arithmetic uses the
/// calendar `day` (UTC), so time-of-day never influences bucketing or distances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  commit_id: String,
  author: String,
  committed_at: DateTime<Utc>,
  day: NaiveDate,
  issue_ids: Vec<String>,
  file_changes: Vec<FileChange>,
  project_file_count: u64,
}

impl ChangeSet {
  pub fn new(
    commit_id: impl Into<String>,
    author: impl Into<String>,
    committed_at: DateTime<Utc>,
    issue_ids: Vec<String>,
    file_changes: Vec<FileChange>,
    project_file_count: u64,
  ) -> Result<Self, EngineError> {
    let commit_id = commit_id.into();
    if file_changes.is_empty() {
      return Err(EngineError::assertion(format!(
        "change set {} has no file changes",
        commit_id
      )));
    }
    Ok(Self {
      commit_id,
      author: author.into(),
      committed_at,
      day: committed_at.date_naive(),
      issue_ids,
      file_changes,
      project_file_count,
    })
  }

  pub fn commit_id(&self) -> &str {
    &self.commit_id
  }

  pub fn author(&self) -> &str {
    &self.author
  }

  pub fn committed_at(&self) -> DateTime<Utc> {
    self.committed_at
  }

  /// Calendar day the change set is bucketed under.
  pub fn day(&self) -> NaiveDate {
    self.day
  }

  pub fn issue_ids(&self) -> &[String] {
    &self.issue_ids
  }

  pub fn file_changes(&self) -> &[FileChange] {
    &self.file_changes
  }

  pub fn project_file_count(&self) -> u64 {
    self.project_file_count
  }
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we emit)
// ---------------------------------------------------------------------------

/// One row of a ranked score table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDeveloper {
  pub developer: String,
  pub score: f64,
}

/// Developers sorted by score descending, ties by name ascending.
pub type ScoreTable = Vec<RankedDeveloper>;

/// Structured error output for the CLI stream.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      kind: None,
    }
  }

  pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = Some(kind.into());
    self
  }
}
