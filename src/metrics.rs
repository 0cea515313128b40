//! Performance metrics for strategy return series.

use crate::error::{Error, Result};
use crate::series;
use serde::{Deserialize, Serialize};

/// Annualization constant; the engines assume daily periodicity.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard deviations below this are treated as numerically zero.
const ZERO_VOL_TOL: f64 = 1e-12;

/// Risk/return profile of a simulated strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Compounded return over the full period, as a fraction.
    pub total_return: f64,
    /// Annualized Sharpe ratio; 0.0 when the return series has zero
    /// variance (the documented substitution, not an error).
    pub sharpe_ratio: f64,
    /// Most negative drawdown of the strategy's own equity curve.
    pub max_drawdown: f64,
}

/// Compute the risk/return profile of a strategy return series.
///
/// Requires at least two returns; the Sharpe ratio uses the sample
/// standard deviation over the same returns as the mean.
pub fn measure(strategy_returns: &[f64]) -> Result<BacktestResult> {
    if strategy_returns.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: strategy_returns.len(),
        });
    }

    let total_return = strategy_returns
        .iter()
        .fold(1.0, |acc, r| acc * (1.0 + r))
        - 1.0;

    let curve = series::equity_curve(strategy_returns)?;
    let max_drawdown = series::max_drawdown(&curve)?;

    Ok(BacktestResult {
        total_return,
        sharpe_ratio: annualized_sharpe(strategy_returns),
        max_drawdown,
    })
}

fn annualized_sharpe(returns: &[f64]) -> f64 {
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stdev = variance.sqrt();
    if stdev < ZERO_VOL_TOL {
        return 0.0;
    }
    mean / stdev * TRADING_DAYS_PER_YEAR.sqrt()
}
