//! Day-bucketed timeline and the sliding window over it.
//!
//! The window covers `window_size_days` consecutive calendar days. Sliding
//! one day forward yields the change sets leaving (the old first day) and
//! entering (the new last day) so the graph never has to reprocess history.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::EngineError;
use crate::types::ChangeSet;

/// Change sets entering and leaving the window on one forward step.
#[derive(Debug, Clone, Copy)]
pub struct WindowDelta<'a> {
  pub added: &'a [ChangeSet],
  pub removed: &'a [ChangeSet],
  /// Bounds after the step.
  pub first_date: NaiveDate,
  pub last_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct WindowManager {
  window_size_days: usize,
  /// Every date from the first to the last observed one; gaps hold empty buckets.
  timeline: BTreeMap<NaiveDate, Vec<ChangeSet>>,
  first_date: Option<NaiveDate>,
  last_date: Option<NaiveDate>,
}

impl WindowManager {
  pub fn new(events: Vec<ChangeSet>, window_size_days: usize) -> Result<Self, EngineError> {
    if events.is_empty() {
      return Err(EngineError::invalid_dataset("no change sets"));
    }
    if window_size_days == 0 {
      return Err(EngineError::validation("window_size_days", "must be at least 1"));
    }

    let mut timeline: BTreeMap<NaiveDate, Vec<ChangeSet>> = BTreeMap::new();
    for cs in events {
      timeline.entry(cs.day()).or_default().push(cs);
    }

    // Fill the blanks with empty buckets.
    let (first, last) = match (timeline.keys().next(), timeline.keys().next_back()) {
      (Some(&first), Some(&last)) => (first, last),
      _ => return Err(EngineError::invalid_dataset("no change sets")),
    };
    let mut day = first;
    while day < last {
      timeline.entry(day).or_default();
      day = match day.succ_opt() {
        Some(next) => next,
        None => break,
      };
    }

    Ok(Self {
      window_size_days,
      timeline,
      first_date: None,
      last_date: None,
    })
  }

  pub fn window_size_days(&self) -> usize {
    self.window_size_days
  }

  /// Number of bucketed days, gaps included.
  pub fn total_days(&self) -> usize {
    self.timeline.len()
  }

  pub fn first_date(&self) -> Option<NaiveDate> {
    self.first_date
  }

  pub fn last_date(&self) -> Option<NaiveDate> {
    self.last_date
  }

  /// `(first_date, last_date)` once the window is materialized.
  pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
    self.first_date.zip(self.last_date)
  }

  /// Change sets inside the current window, in date order.
  pub fn current_window(&self) -> Vec<&ChangeSet> {
    match self.bounds() {
      Some((first, last)) => self
        .timeline
        .range(first..=last)
        .flat_map(|(_, bucket)| bucket.iter())
        .collect(),
      None => Vec::new(),
    }
  }

  /// Materialize the first window and return its change sets in date order.
  pub fn initial_window(&mut self) -> Result<Vec<&ChangeSet>, EngineError> {
    let first = match self.timeline.keys().next() {
      Some(&d) => d,
      None => return Err(EngineError::invalid_dataset("no change sets")),
    };
    let last = first
      .checked_add_days(chrono::Days::new(self.window_size_days as u64 - 1))
      .filter(|d| self.timeline.contains_key(d))
      .ok_or(EngineError::InsufficientData {
        span_days: self.timeline.len(),
        window_size_days: self.window_size_days,
      })?;

    self.first_date = Some(first);
    self.last_date = Some(last);

    Ok(self.current_window())
  }

  pub fn can_advance(&self) -> bool {
    self.next_date().is_some()
  }

  /// Slide one day forward.
  ///
  /// Fails with `SlideExhausted` when the day after the window has no bucket;
  /// the bounds are left untouched in that case.
  pub fn advance(&mut self) -> Result<WindowDelta<'_>, EngineError> {
    let (first, last) = match (self.first_date, self.last_date) {
      (Some(f), Some(l)) => (f, l),
      _ => {
        return Err(EngineError::InvalidState(
          "window advanced before the initial window was materialized".into(),
        ))
      }
    };
    let next = match self.next_date() {
      Some(d) => d,
      None => return Err(EngineError::SlideExhausted { last_date: last }),
    };
    let new_first = first.succ_opt().ok_or_else(|| {
      EngineError::InvalidState(format!("first date {} cannot move forward", first))
    })?;

    self.first_date = Some(new_first);
    self.last_date = Some(next);

    Ok(WindowDelta {
      added: self.bucket(next),
      removed: self.bucket(first),
      first_date: new_first,
      last_date: next,
    })
  }

  /// Window positions reachable from the initial one, the initial one included.
  pub fn iteration_count(&self) -> usize {
    (self.timeline.len() + 1).saturating_sub(self.window_size_days)
  }

  /// Successful `advance` calls still possible from the current position.
  pub fn remaining_advances(&self) -> usize {
    match (self.last_date, self.timeline.keys().next_back()) {
      (Some(last), Some(&end)) => (end - last).num_days().max(0) as usize,
      _ => self.iteration_count().saturating_sub(1),
    }
  }

  fn next_date(&self) -> Option<NaiveDate> {
    self
      .last_date
      .and_then(|d| d.succ_opt())
      .filter(|d| self.timeline.contains_key(d))
  }

  fn bucket(&self, date: NaiveDate) -> &[ChangeSet] {
    self.timeline.get(&date).map(Vec::as_slice).unwrap_or(&[])
  }
}
