//! Session configuration.
//!
//! A `SessionConfig` is the slice of interaction state handed to the pipeline:
//! which store, how its benchmark is chosen, and how charts are sliced. It is
//! read from JSON; every field is optional and falls back to the dashboard
//! defaults.

use crate::benchmark::{BenchmarkMode, FilterSelection};
use crate::error::Result;
use crate::models::{AggMode, Metric, Periodicity};
use crate::slice::{SliceFilter, ViewOption};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Target store id or name.
    pub target: Option<String>,
    pub stores: Option<PathBuf>,
    pub transactions: Option<PathBuf>,
    pub baskets: Option<PathBuf>,
    pub mode: BenchmarkMode,
    pub filters: FilterSelection,
    pub periodicity: Periodicity,
    pub agg_mode: AggMode,
    pub metric: Metric,
    pub slice: SliceFilter,
    pub view: ViewOption,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            target: None,
            stores: None,
            transactions: None,
            baskets: None,
            mode: BenchmarkMode::Default,
            filters: FilterSelection::default(),
            periodicity: Periodicity::Weekly,
            agg_mode: AggMode::AveragePerStore,
            metric: Metric::Sales,
            slice: SliceFilter::default(),
            view: ViewOption::TargetVsBenchmark,
        }
    }
}

impl SessionConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Read a session config from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SessionConfig> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let cfg = SessionConfig::from_json(&text)?;
    log::info!("loaded session config from {}", path.as_ref().display());
    Ok(cfg)
}
