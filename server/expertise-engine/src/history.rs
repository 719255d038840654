//! History graph: the artifact graph kept in sync with the sliding window,
//! plus per-window analytics memoized until the next slide.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::collab::{self, CollaborationGraph};
use crate::config::Config;
use crate::error::EngineError;
use crate::graph::{ArtifactGraph, GraphSnapshot, NodeKind};
use crate::normalize;
use crate::reach::{self, Recency};
use crate::scores::{self, FileSets};
use crate::types::{ChangeSet, Dataset, ScoreTable};
use crate::window::WindowManager;

/// Derived structures for the current window position.
///
/// Every field starts empty and is filled on first read. `invalidate` clears
/// all of them at once; the graph calls it after every topology change.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsCache {
  developers: Option<Vec<String>>,
  files: Option<Vec<String>>,
  dev_to_files: Option<FileSets>,
  file_to_devs: Option<FileSets>,
  dev_to_rare_files: Option<FileSets>,
  collaboration: Option<CollaborationGraph>,
  jacks: Option<ScoreTable>,
  mavens: Option<ScoreTable>,
  connectors: Option<ScoreTable>,
}

impl AnalyticsCache {
  pub fn invalidate(&mut self) {
    *self = Self::default();
  }

  /// True when nothing has been computed since the last invalidation.
  pub fn is_empty(&self) -> bool {
    self.developers.is_none()
      && self.files.is_none()
      && self.dev_to_files.is_none()
      && self.file_to_devs.is_none()
      && self.dev_to_rare_files.is_none()
      && self.collaboration.is_none()
      && self.jacks.is_none()
      && self.mavens.is_none()
      && self.connectors.is_none()
  }
}

/// The sliding-window engine. Built from the initial window and only ever
/// moves forward.
#[derive(Debug, Clone)]
pub struct HistoryGraph {
  config: Config,
  window: WindowManager,
  graph: ArtifactGraph,
  /// Project-wide file count as of the newest change set seen; the jack
  /// denominator.
  project_file_count: u64,
  cache: AnalyticsCache,
}

impl HistoryGraph {
  pub fn new(change_sets: Vec<ChangeSet>, config: Config) -> Result<Self, EngineError> {
    config.validate()?;
    let window = WindowManager::new(change_sets, config.window_size_days)?;
    Self::bootstrap(window, config)
  }

  pub fn from_dataset(dataset: &Dataset, config: Config) -> Result<Self, EngineError> {
    Self::new(normalize::change_sets(dataset)?, config)
  }

  pub fn with_defaults(change_sets: Vec<ChangeSet>) -> Result<Self, EngineError> {
    Self::new(change_sets, Config::default())
  }

  fn bootstrap(mut window: WindowManager, config: Config) -> Result<Self, EngineError> {
    let mut graph = ArtifactGraph::new();

    let initial = window.initial_window()?;
    let project_file_count = initial.last().map(|cs| cs.project_file_count()).unwrap_or(0);
    let stats = graph.add_change_sets(initial.iter().copied(), config.large_change_set_threshold);

    let (first_date, last_date) = window.bounds().ok_or_else(|| {
      EngineError::InvalidState("initial window did not set window bounds".into())
    })?;

    tracing::info!(
      %first_date,
      %last_date,
      change_sets = stats.added,
      skipped_large = stats.skipped_large,
      nodes = graph.node_count(),
      "history graph bootstrapped"
    );

    Ok(Self {
      config,
      window,
      graph,
      project_file_count,
      cache: AnalyticsCache::default(),
    })
  }

  /// Slide the window one day forward.
  ///
  /// Returns `Ok(false)` without touching anything when there is no more
  /// data. Departing change sets are removed before entering ones are added,
  /// so a node kept alive by the new day is never pruned in between.
  pub fn advance(&mut self) -> Result<bool, EngineError> {
    let delta = match self.window.advance() {
      Ok(delta) => delta,
      Err(EngineError::SlideExhausted { last_date }) => {
        tracing::debug!(%last_date, "window cannot slide further");
        return Ok(false);
      }
      Err(e) => return Err(e),
    };

    let removed = self.graph.remove_change_sets(delta.removed);
    let stats = self
      .graph
      .add_change_sets(delta.added, self.config.large_change_set_threshold);
    if let Some(newest) = delta.added.last() {
      self.project_file_count = newest.project_file_count();
    }
    let last_date = delta.last_date;
    self.cache.invalidate();

    tracing::debug!(
      %last_date,
      removed,
      added = stats.added,
      skipped_large = stats.skipped_large,
      renamed = stats.renamed,
      deleted = stats.deleted,
      nodes = self.graph.node_count(),
      "window advanced"
    );
    Ok(true)
  }

  // -------------------------------------------------------------------------
  // Window and topology
  // -------------------------------------------------------------------------

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn window(&self) -> &WindowManager {
    &self.window
  }

  pub fn graph(&self) -> &ArtifactGraph {
    &self.graph
  }

  pub fn cache(&self) -> &AnalyticsCache {
    &self.cache
  }

  pub fn first_included_date(&self) -> NaiveDate {
    self.bounds().0
  }

  pub fn last_included_date(&self) -> NaiveDate {
    self.bounds().1
  }

  fn bounds(&self) -> (NaiveDate, NaiveDate) {
    // Materialized by `bootstrap` and never cleared.
    self.window.bounds().unwrap_or_default()
  }

  /// Window positions over the whole dataset, the initial one included.
  pub fn iteration_count(&self) -> usize {
    self.window.iteration_count()
  }

  pub fn remaining_iterations(&self) -> usize {
    self.window.remaining_advances()
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Files in the whole project, not just in the graph.
  pub fn project_file_count(&self) -> u64 {
    self.project_file_count
  }

  pub fn snapshot(&self) -> GraphSnapshot {
    self.graph.snapshot()
  }

  pub fn digest(&self) -> String {
    self.graph.digest()
  }

  // -------------------------------------------------------------------------
  // Memoized analytics
  // -------------------------------------------------------------------------

  pub fn developers(&mut self) -> &[String] {
    let Self { graph, cache, .. } = self;
    cache
      .developers
      .get_or_insert_with(|| graph.keys(NodeKind::Developer))
  }

  pub fn files(&mut self) -> &[String] {
    let Self { graph, cache, .. } = self;
    cache.files.get_or_insert_with(|| graph.keys(NodeKind::File))
  }

  /// Developer → files reachable within the distance limit. Developers that
  /// reach nothing map to an empty set.
  pub fn dev_to_reachable_files(&mut self) -> &FileSets {
    let first_date = self.first_included_date();
    let Self {
      graph,
      config,
      cache,
      ..
    } = self;
    cache.dev_to_files.get_or_insert_with(|| {
      let recency = Recency {
        first_date,
        window_size_days: config.window_size_days,
      };
      graph
        .handles(NodeKind::Developer)
        .into_iter()
        .map(|(name, handle)| {
          let files = reach::reachable_files(graph, handle, recency, config.distance_limit);
          (name, files)
        })
        .collect()
    })
  }

  /// File → developers reaching it. Files nobody reaches are absent.
  pub fn file_to_devs(&mut self) -> &FileSets {
    self.dev_to_reachable_files();
    let AnalyticsCache {
      dev_to_files,
      file_to_devs,
      ..
    } = &mut self.cache;
    file_to_devs.get_or_insert_with(|| dev_to_files.as_ref().map(invert).unwrap_or_default())
  }

  /// Developer → files only that developer reaches. Developers without rare
  /// files are absent.
  pub fn dev_to_rare_files(&mut self) -> &FileSets {
    self.file_to_devs();
    let AnalyticsCache {
      file_to_devs,
      dev_to_rare_files,
      ..
    } = &mut self.cache;
    dev_to_rare_files
      .get_or_insert_with(|| file_to_devs.as_ref().map(rare_files).unwrap_or_default())
  }

  pub fn rare_file_count(&mut self) -> usize {
    self.dev_to_rare_files().values().map(BTreeSet::len).sum()
  }

  pub fn collaboration_graph(&mut self) -> &CollaborationGraph {
    let Self {
      graph,
      config,
      cache,
      ..
    } = self;
    cache
      .collaboration
      .get_or_insert_with(|| collab::collaboration_graph(graph, config.collaboration_path_cutoff))
  }

  pub fn jacks(&mut self) -> &ScoreTable {
    self.dev_to_reachable_files();
    let baseline = self.project_file_count;
    let threshold = self.config.score_threshold;
    let AnalyticsCache {
      dev_to_files, jacks, ..
    } = &mut self.cache;
    jacks.get_or_insert_with(|| {
      dev_to_files
        .as_ref()
        .map(|reachable| scores::jacks(reachable, baseline, threshold))
        .unwrap_or_default()
    })
  }

  pub fn mavens(&mut self) -> &ScoreTable {
    self.dev_to_rare_files();
    let threshold = self.config.score_threshold;
    let AnalyticsCache {
      dev_to_rare_files,
      mavens,
      ..
    } = &mut self.cache;
    mavens.get_or_insert_with(|| {
      dev_to_rare_files
        .as_ref()
        .map(|rare| scores::mavens(rare, threshold))
        .unwrap_or_default()
    })
  }

  pub fn connectors(&mut self) -> &ScoreTable {
    self.collaboration_graph();
    let threshold = self.config.score_threshold;
    let AnalyticsCache {
      collaboration,
      connectors,
      ..
    } = &mut self.cache;
    connectors.get_or_insert_with(|| {
      collaboration
        .as_ref()
        .map(|collab| scores::connectors(collab, threshold))
        .unwrap_or_default()
    })
  }
}

fn invert(dev_to_files: &FileSets) -> FileSets {
  let mut out: FileSets = BTreeMap::new();
  for (dev, files) in dev_to_files {
    for file in files {
      out.entry(file.clone()).or_default().insert(dev.clone());
    }
  }
  out
}

fn rare_files(file_to_devs: &FileSets) -> FileSets {
  let mut out: FileSets = BTreeMap::new();
  for (file, devs) in file_to_devs {
    if devs.len() == 1 {
      if let Some(dev) = devs.iter().next() {
        out.entry(dev.clone()).or_default().insert(file.clone());
      }
    }
  }
  out
}
