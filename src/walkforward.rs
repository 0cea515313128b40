//! Walk-forward optimization over rolling train/test windows.
//!
//! History is partitioned into a fixed-size rolling train window followed
//! by an adjacent test window; the grid is optimized on each train slice
//! and the winner is evaluated on the test slice it never saw. Test
//! windows are contiguous and non-overlapping, so the aggregate is a true
//! out-of-sample estimate.

use crate::error::{Error, Result};
use crate::strategy::SmaCrossover;
use crate::types::{ParamGrid, StrategyParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::ops::Range;
use tracing::info;

/// How per-window test returns are combined into the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Simple sum of window test returns. Not a compounded figure; kept
    /// as the default for compatibility with the historical behavior.
    #[default]
    Additive,
    /// Compound the window test returns: `prod(1 + r) - 1`.
    Compounded,
}

/// Configuration for a walk-forward run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Observations in each rolling train slice.
    #[serde(default = "default_train_periods")]
    pub train_periods: usize,
    /// Observations in each test slice; also the step between windows.
    #[serde(default = "default_test_periods")]
    pub test_periods: usize,
    /// Per-flip transaction cost used when scoring and testing
    /// candidates. Defaults to 0.0: in-sample selection compares raw
    /// signal returns.
    #[serde(default)]
    pub cost_rate: f64,
    #[serde(default)]
    pub aggregation: Aggregation,
}

fn default_train_periods() -> usize {
    252
}

fn default_test_periods() -> usize {
    63
}

impl Default for WalkForwardConfig {
    /// Twelve months of daily training data, three months of testing.
    fn default() -> Self {
        Self {
            train_periods: default_train_periods(),
            test_periods: default_test_periods(),
            cost_rate: 0.0,
            aggregation: Aggregation::default(),
        }
    }
}

impl WalkForwardConfig {
    pub fn new(train_periods: usize, test_periods: usize) -> Result<Self> {
        let config = Self {
            train_periods,
            test_periods,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.train_periods == 0 || self.test_periods == 0 {
            return Err(Error::InvalidParameter(format!(
                "train and test periods must be positive, got {}/{}",
                self.train_periods, self.test_periods
            )));
        }
        Ok(())
    }
}

/// A single optimized train/test window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    pub index: usize,
    /// Train slice, as indices into the price series.
    pub train: Range<usize>,
    /// Test slice, adjacent to and strictly after the train slice.
    pub test: Range<usize>,
    /// Grid winner on the train slice.
    pub params: StrategyParams,
    /// Sum of the winner's per-period returns on the test slice.
    pub test_return: f64,
}

/// Complete walk-forward results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub config: WalkForwardConfig,
    pub windows: Vec<WalkForwardWindow>,
    /// Out-of-sample aggregate per the configured [`Aggregation`].
    pub total_return: f64,
}

impl WalkForwardReport {
    /// Multi-line text rendering; one line per window plus the aggregate.
    pub fn summary(&self) -> String {
        let mut out = String::from("Walk Forward Analysis Results:\n");
        for w in &self.windows {
            writeln!(
                out,
                "[bars {}..{}] Params: {}, Return: {:.2}%",
                w.test.start,
                w.test.end,
                w.params,
                w.test_return * 100.0
            )
            .expect("writing to a String cannot fail");
        }
        write!(
            out,
            "Total Walk Forward Return: {:.2}%",
            self.total_return * 100.0
        )
        .expect("writing to a String cannot fail");
        out
    }
}

/// Sum of simulated per-period strategy returns over a slice; zero when
/// the slice is too short to produce any return.
fn return_sum(closes: &[f64], params: StrategyParams, cost_rate: f64) -> f64 {
    SmaCrossover::new(params)
        .with_cost_rate(cost_rate)
        .simulate(closes)
        .strategy_returns
        .iter()
        .sum()
}

/// Run walk-forward optimization over a close-price series.
///
/// Candidates are scored in parallel, but the winner is selected by a
/// deterministic rule: a strictly greater in-sample return sum wins, and
/// ties keep the earliest grid entry. A history too short for even one
/// window yields an empty report, not an error.
pub fn run(
    closes: &[f64],
    grid: &ParamGrid,
    config: &WalkForwardConfig,
) -> Result<WalkForwardReport> {
    config.validate()?;
    if grid.is_empty() {
        return Err(Error::InvalidParameter(
            "parameter grid is empty".to_string(),
        ));
    }

    let train = config.train_periods;
    let test = config.test_periods;
    let mut windows = Vec::new();
    let mut start = 0;

    while start + train + test <= closes.len() {
        let train_slice = &closes[start..start + train];
        let test_slice = &closes[start + train..start + train + test];

        let scores: Vec<f64> = grid
            .params()
            .par_iter()
            .map(|&p| return_sum(train_slice, p, config.cost_rate))
            .collect();

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, &score) in scores.iter().enumerate() {
            if score.is_finite() && score > best_score {
                best_score = score;
                best = i;
            }
        }
        let params = grid.params()[best];

        // The winner re-warms on the test slice alone; no moving average
        // state crosses the train/test boundary.
        let test_return = return_sum(test_slice, params, config.cost_rate);

        let index = windows.len();
        info!(
            window = index,
            params = %params,
            in_sample = best_score,
            out_of_sample = test_return,
            "walk-forward window optimized"
        );

        windows.push(WalkForwardWindow {
            index,
            train: start..start + train,
            test: start + train..start + train + test,
            params,
            test_return,
        });

        start += test;
    }

    let total_return = match config.aggregation {
        Aggregation::Additive => windows.iter().map(|w| w.test_return).sum(),
        Aggregation::Compounded => {
            windows.iter().fold(1.0, |acc, w| acc * (1.0 + w.test_return)) - 1.0
        }
    };

    info!(
        windows = windows.len(),
        total_return, "walk-forward analysis complete"
    );

    Ok(WalkForwardReport {
        config: config.clone(),
        windows,
        total_return,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising_closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn config(train: usize, test: usize) -> WalkForwardConfig {
        WalkForwardConfig::new(train, test).unwrap()
    }

    #[test]
    fn test_window_partitioning_bounds() {
        let grid = ParamGrid::from_pairs(&[(2, 4)]).unwrap();

        // Exactly one window fits when len == train + test.
        let report = run(&rising_closes(30), &grid, &config(20, 10)).unwrap();
        assert_eq!(report.windows.len(), 1);
        assert_eq!(report.windows[0].train, 0..20);
        assert_eq!(report.windows[0].test, 20..30);

        // One observation short: no window, zero aggregate, no error.
        let report = run(&rising_closes(29), &grid, &config(20, 10)).unwrap();
        assert!(report.windows.is_empty());
        assert_eq!(report.total_return, 0.0);
    }

    #[test]
    fn test_windows_are_contiguous_and_ordered() {
        let grid = ParamGrid::from_pairs(&[(2, 4)]).unwrap();
        let report = run(&rising_closes(100), &grid, &config(20, 10)).unwrap();
        assert_eq!(report.windows.len(), 8);

        for (i, w) in report.windows.iter().enumerate() {
            assert_eq!(w.index, i);
            assert_eq!(w.train.end, w.test.start);
            assert_eq!(w.test.end - w.test.start, 10);
        }
        for pair in report.windows.windows(2) {
            assert_eq!(pair[0].test.end, pair[1].test.start);
        }
    }

    #[test]
    fn test_single_candidate_is_selected() {
        let grid = ParamGrid::from_pairs(&[(10, 50)]).unwrap();
        let closes = rising_closes(120);
        let report = run(&closes, &grid, &config(60, 60)).unwrap();
        assert_eq!(report.windows.len(), 1);
        assert_eq!(
            report.windows[0].params,
            StrategyParams::new(10, 50).unwrap()
        );
    }

    #[test]
    fn test_selection_prefers_higher_in_sample_sum() {
        // In a monotonic uptrend every defined fast SMA exceeds the slow
        // SMA, so a shorter slow window is long for more periods and
        // accumulates a strictly larger return sum.
        let grid = ParamGrid::from_pairs(&[(2, 8), (2, 4)]).unwrap();
        let report = run(&rising_closes(40), &grid, &config(20, 20)).unwrap();
        assert_eq!(
            report.windows[0].params,
            StrategyParams::new(2, 4).unwrap()
        );
    }

    #[test]
    fn test_tie_breaks_to_earliest_grid_entry() {
        // Both slow windows exceed the train slice, so both candidates
        // are all-flat with identical zero scores.
        let grid = ParamGrid::from_pairs(&[(10, 60), (20, 80)]).unwrap();
        let report = run(&rising_closes(40), &grid, &config(20, 20)).unwrap();
        assert_eq!(
            report.windows[0].params,
            StrategyParams::new(10, 60).unwrap()
        );
    }

    #[test]
    fn test_aggregation_modes() {
        let grid = ParamGrid::from_pairs(&[(2, 4)]).unwrap();
        let closes = rising_closes(100);

        let additive = run(&closes, &grid, &config(20, 10)).unwrap();
        let sum: f64 = additive.windows.iter().map(|w| w.test_return).sum();
        assert!((additive.total_return - sum).abs() < 1e-12);

        let mut compounded_config = config(20, 10);
        compounded_config.aggregation = Aggregation::Compounded;
        let compounded = run(&closes, &grid, &compounded_config).unwrap();
        let product: f64 = compounded
            .windows
            .iter()
            .fold(1.0, |acc, w| acc * (1.0 + w.test_return))
            - 1.0;
        assert!((compounded.total_return - product).abs() < 1e-12);
        assert_ne!(additive.total_return, compounded.total_return);
    }

    #[test]
    fn test_invalid_inputs() {
        let grid = ParamGrid::from_pairs(&[(2, 4)]).unwrap();
        assert!(run(&rising_closes(30), &grid, &WalkForwardConfig {
            train_periods: 0,
            ..Default::default()
        })
        .is_err());
        assert!(WalkForwardConfig::new(10, 0).is_err());
    }

    #[test]
    fn test_summary_lists_windows_and_total() {
        let grid = ParamGrid::from_pairs(&[(2, 4)]).unwrap();
        let report = run(&rising_closes(60), &grid, &config(20, 20)).unwrap();
        let summary = report.summary();
        assert!(summary.starts_with("Walk Forward Analysis Results:"));
        assert!(summary.contains("Params: 2/4"));
        assert!(summary.contains("Total Walk Forward Return:"));
    }
}
