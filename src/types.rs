//! Core data types for the backtest and allocation engines.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLCV bar representing a single time period of market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Validate that bar data is internally consistent.
    pub fn validate(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// Extract the close-price series from a bar series.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Moving-average crossover parameters.
///
/// Invariant: `1 <= fast < slow`, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    fast: usize,
    slow: usize,
}

impl StrategyParams {
    /// Create validated crossover parameters.
    pub fn new(fast: usize, slow: usize) -> Result<Self> {
        if fast < 1 || slow < 1 {
            return Err(Error::InvalidParameter(format!(
                "moving-average windows must be at least 1, got {}/{}",
                fast, slow
            )));
        }
        if fast >= slow {
            return Err(Error::InvalidParameter(format!(
                "fast window ({}) must be smaller than slow window ({})",
                fast, slow
            )));
        }
        Ok(Self { fast, slow })
    }

    pub fn fast(&self) -> usize {
        self.fast
    }

    pub fn slow(&self) -> usize {
        self.slow
    }
}

impl fmt::Display for StrategyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.fast, self.slow)
    }
}

/// An explicit, finite set of candidate crossover parameters.
///
/// Candidates are validated when the grid is built, before any simulation
/// runs; the stored order is the tie-break order during optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamGrid {
    params: Vec<StrategyParams>,
}

impl ParamGrid {
    /// Build a grid from explicit `(fast, slow)` pairs.
    ///
    /// Every pair must be valid; an invalid pair rejects the whole grid.
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Result<Self> {
        let params = pairs
            .iter()
            .map(|&(fast, slow)| StrategyParams::new(fast, slow))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { params })
    }

    /// Build a grid from fast/slow candidate lists, keeping every cross
    /// pair that satisfies `fast < slow`.
    pub fn cross(fast: &[usize], slow: &[usize]) -> Result<Self> {
        let mut params = Vec::new();
        for &f in fast {
            for &s in slow {
                if let Ok(p) = StrategyParams::new(f, s) {
                    params.push(p);
                }
            }
        }
        if params.is_empty() {
            return Err(Error::InvalidParameter(
                "parameter grid has no valid (fast, slow) pair".to_string(),
            ));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &[StrategyParams] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl Default for ParamGrid {
    /// The classic daily-data candidate lists: fast {10, 20, 50},
    /// slow {50, 100, 200}.
    fn default() -> Self {
        Self::cross(&[10, 20, 50], &[50, 100, 200])
            .expect("default candidate lists contain valid pairs")
    }
}
