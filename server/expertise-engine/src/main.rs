//! Binary entrypoint: read a change-set dataset, write JSON lines to stdout.
//!
//! The dataset comes from the file given as argument, or stdin. One
//! WindowReport line is written per window position, from the initial window
//! until the data runs out (or `--max-iterations` is reached). On failure a
//! single ErrorOutput line is written and the process exits with status 1.
//!
//! Logs go to stderr; `RUST_LOG` controls the level (default `info`).

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use expertise_engine::types::ErrorOutput;
use expertise_engine::{Config, Dataset, EngineError, HistoryGraph, WindowReport};

#[derive(Parser)]
#[command(name = "expertise-engine")]
#[command(about = "Find jacks, mavens and connectors over a sliding window of commits", long_about = None)]
#[command(version)]
struct Cli {
  /// Dataset JSON file (`{"change_sets": [...]}`); stdin when omitted
  dataset: Option<PathBuf>,
  /// Sliding window width in days
  #[arg(long, env = "EXPERTISE_WINDOW_SIZE_DAYS", default_value_t = Config::default().window_size_days)]
  window_size_days: usize,
  /// Max accumulated distance of a reachability walk
  #[arg(long, env = "EXPERTISE_DISTANCE_LIMIT", default_value_t = Config::default().distance_limit)]
  distance_limit: f64,
  /// Change sets adding/modifying more files than this are ignored
  #[arg(long, env = "EXPERTISE_LARGE_CHANGE_SET_THRESHOLD", default_value_t = Config::default().large_change_set_threshold)]
  large_change_set_threshold: usize,
  /// Scores below this are left out of the tables
  #[arg(long, env = "EXPERTISE_SCORE_THRESHOLD", default_value_t = Config::default().score_threshold)]
  score_threshold: f64,
  /// Longest developer-to-developer path counted for collaboration distance
  #[arg(long, env = "EXPERTISE_COLLABORATION_PATH_CUTOFF", default_value_t = Config::default().collaboration_path_cutoff)]
  collaboration_path_cutoff: usize,
  /// Stop after this many window positions
  #[arg(long)]
  max_iterations: Option<usize>,
}

impl Cli {
  fn config(&self) -> Config {
    Config {
      window_size_days: self.window_size_days,
      distance_limit: self.distance_limit,
      large_change_set_threshold: self.large_change_set_threshold,
      score_threshold: self.score_threshold,
      collaboration_path_cutoff: self.collaboration_path_cutoff,
    }
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  if let Err(e) = run(&cli, &mut out) {
    tracing::error!("{:#}", e);
    let err = match e.downcast_ref::<EngineError>() {
      Some(engine) => ErrorOutput::new(engine.to_string()).with_kind(engine.kind()),
      None => ErrorOutput::new(format!("{:#}", e)),
    };
    let _ = serde_json::to_writer(&mut out, &err);
    let _ = writeln!(out);
    let _ = out.flush();
    std::process::exit(1);
  }

  let _ = out.flush();
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
  let dataset = match &cli.dataset {
    Some(path) => {
      let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
      Dataset::from_reader(BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))?
    }
    None => Dataset::from_reader(io::stdin().lock()).context("reading stdin")?,
  };

  let mut history = HistoryGraph::from_dataset(&dataset, cli.config())?;
  tracing::info!(
    total_iterations = history.iteration_count(),
    change_sets = dataset.change_sets.len(),
    "started"
  );

  let mut iteration = 0;
  loop {
    iteration += 1;
    let report = WindowReport::capture(&mut history, iteration);
    tracing::info!(
      iteration,
      last_date = %report.last_included_date,
      nodes = report.node_count,
      "window"
    );
    serde_json::to_writer(&mut *out, &report)?;
    writeln!(out)?;

    if cli.max_iterations.is_some_and(|max| iteration >= max) {
      break;
    }
    if !history.advance()? {
      break;
    }
  }

  tracing::info!(iterations = iteration, "ended");
  Ok(())
}
