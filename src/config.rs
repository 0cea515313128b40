//! TOML-loadable run configuration.
//!
//! Every field has a default, so a partial file (or none at all) yields a
//! working setup.

use crate::error::Result;
use crate::strategy::DEFAULT_COST_RATE;
use crate::types::ParamGrid;
use crate::walkforward::WalkForwardConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Complete run configuration for backtests and walk-forward analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Per-flip transaction cost for single backtests (10 bps default).
    #[serde(default = "default_cost_rate")]
    pub cost_rate: f64,
    #[serde(default)]
    pub walkforward: WalkForwardConfig,
    #[serde(default)]
    pub grid: GridConfig,
}

fn default_cost_rate() -> f64 {
    DEFAULT_COST_RATE
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cost_rate: DEFAULT_COST_RATE,
            walkforward: WalkForwardConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a configuration from a TOML file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        info!("loaded run configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Candidate lists the walk-forward parameter grid is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_fast")]
    pub fast: Vec<usize>,
    #[serde(default = "default_slow")]
    pub slow: Vec<usize>,
}

fn default_fast() -> Vec<usize> {
    vec![10, 20, 50]
}

fn default_slow() -> Vec<usize> {
    vec![50, 100, 200]
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            fast: default_fast(),
            slow: default_slow(),
        }
    }
}

impl GridConfig {
    /// Build the validated cross-product grid.
    pub fn build(&self) -> Result<ParamGrid> {
        ParamGrid::cross(&self.fast, &self.slow)
    }
}
