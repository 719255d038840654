//! Expertise Engine: sliding-window developer role analysis.
//!
//! Buckets a project's change sets by day, keeps a developer / file / issue /
//! change-set graph in sync with a window that slides one day at a time, and
//! ranks developers per window as jacks (breadth of reachable files), mavens
//! (sole reachers of rare files) and connectors (betweenness in the
//! collaboration graph).
//!
//! No DB, no network; pure computation + in-memory state.

pub mod centrality;
pub mod collab;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod normalize;
pub mod reach;
pub mod report;
pub mod scores;
pub mod types;
pub mod window;

pub use config::Config;
pub use error::EngineError;
pub use history::HistoryGraph;
pub use report::WindowReport;
pub use types::{ChangeKind, ChangeSet, Dataset, FileChange};
pub use window::WindowManager;
