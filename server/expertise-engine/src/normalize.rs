//! Normalize inbound dataset records into canonical ChangeSet models.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::EngineError;
use crate::types::*;

/// Convert every record of a dataset, stopping at the first malformed one.
pub fn change_sets(dataset: &Dataset) -> Result<Vec<ChangeSet>, EngineError> {
  dataset.change_sets.iter().map(normalize).collect()
}

/// Parse and validate one inbound record.
pub fn normalize(raw: &InboundChangeSet) -> Result<ChangeSet, EngineError> {
  if raw.commit_hash.is_empty() {
    return Err(EngineError::invalid_dataset("commit_hash must not be empty"));
  }
  if raw.author.is_empty() {
    return Err(EngineError::invalid_dataset(format!(
      "{}: author must not be empty",
      raw.commit_hash
    )));
  }

  let committed_at = parse_timestamp(&raw.date).ok_or_else(|| {
    EngineError::invalid_dataset(format!(
      "{}: unparseable date {:?}",
      raw.commit_hash, raw.date
    ))
  })?;

  let file_changes = raw
    .code_changes
    .iter()
    .map(|cc| {
      let kind = ChangeKind::from_str_loose(&cc.change_type).ok_or_else(|| {
        EngineError::assertion(format!(
          "{}: change type {:?} is not ADD, DELETE, MODIFY or RENAME",
          raw.commit_hash, cc.change_type
        ))
      })?;
      FileChange::new(cc.file_path.clone(), kind, cc.old_file_path.clone())
    })
    .collect::<Result<Vec<_>, EngineError>>()?;

  ChangeSet::new(
    raw.commit_hash.clone(),
    raw.author.clone(),
    committed_at,
    raw.issues.clone(),
    file_changes,
    raw.num_current_files,
  )
}

/// RFC 3339 first, then a bare `YYYY-MM-DDTHH:MM:SS` read as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
    .ok()
    .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn record(change_type: &str, old: Option<&str>) -> InboundChangeSet {
    InboundChangeSet {
      commit_hash: "CS1".into(),
      author: "d1".into(),
      date: "2019-01-15T12:00:00Z".into(),
      issues: vec!["I1".into()],
      code_changes: vec![InboundCodeChange {
        file_path: "F1".into(),
        change_type: change_type.into(),
        old_file_path: old.map(String::from),
      }],
      num_current_files: 3,
    }
  }

  #[test]
  fn normalize_valid_record() {
    let cs = normalize(&record("ADD", None)).unwrap();
    assert_eq!(cs.commit_id(), "CS1");
    assert_eq!(cs.day(), NaiveDate::from_ymd_opt(2019, 1, 15).unwrap());
    assert_eq!(cs.file_changes()[0].kind(), ChangeKind::Add);
    assert_eq!(cs.project_file_count(), 3);
  }

  #[test]
  fn rename_without_old_path_aborts() {
    let err = normalize(&record("RENAME", None)).unwrap_err();
    assert_eq!(err.kind(), "assertion_violation");
  }

  #[test]
  fn modify_with_old_path_aborts() {
    let err = normalize(&record("MODIFY", Some("F0"))).unwrap_err();
    assert_eq!(err.kind(), "assertion_violation");
  }

  #[test]
  fn unknown_change_type_aborts() {
    let err = normalize(&record("COPY", None)).unwrap_err();
    assert!(err.to_string().contains("COPY"));
  }

  #[test]
  fn bad_date_is_invalid_dataset() {
    let mut raw = record("ADD", None);
    raw.date = "15/01/2019".into();
    let err = normalize(&raw).unwrap_err();
    assert_eq!(err.kind(), "invalid_dataset");
  }

  #[test]
  fn naive_timestamp_is_read_as_utc() {
    let mut raw = record("ADD", None);
    raw.date = "2019-01-15T23:30:00".into();
    let cs = normalize(&raw).unwrap();
    assert_eq!(cs.day(), NaiveDate::from_ymd_opt(2019, 1, 15).unwrap());
  }
}
