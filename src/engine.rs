//! Caller-facing orchestration: fetch, simulate, measure.

use crate::config::RunConfig;
use crate::data::PriceProvider;
use crate::error::{Error, Result};
use crate::metrics::{self, BacktestResult};
use crate::portfolio::PortfolioOptimizer;
use crate::series;
use crate::strategy::SmaCrossover;
use crate::types::{closes, ParamGrid, StrategyParams};
use crate::walkforward::{self, WalkForwardReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// A completed single backtest: the structured result is the contract of
/// record; `summary()` derives the text rendering from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub params: StrategyParams,
    pub cost_rate: f64,
    pub result: BacktestResult,
}

impl BacktestReport {
    pub fn summary(&self) -> String {
        format!(
            "Backtest Results ({} {}) [w/ Costs]:\n\
             Total Return: {:.2}%\n\
             Sharpe Ratio: {:.2}\n\
             Max Drawdown: {:.2}%",
            self.symbol,
            self.params,
            self.result.total_return * 100.0,
            self.result.sharpe_ratio,
            self.result.max_drawdown * 100.0
        )
    }
}

/// Backtest and walk-forward runner bound to a [`RunConfig`].
#[derive(Debug, Clone, Default)]
pub struct Backtester {
    config: RunConfig,
}

impl Backtester {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Backtest the crossover strategy on one symbol's history.
    pub fn backtest(
        &self,
        provider: &dyn PriceProvider,
        symbol: &str,
        params: StrategyParams,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BacktestReport> {
        let prices = fetch_closes(provider, symbol, start, end)?;
        info!(symbol, params = %params, bars = prices.len(), "running backtest");

        let simulation = SmaCrossover::new(params)
            .with_cost_rate(self.config.cost_rate)
            .simulate(&prices);
        let result = metrics::measure(&simulation.strategy_returns)?;

        Ok(BacktestReport {
            symbol: symbol.to_string(),
            params,
            cost_rate: self.config.cost_rate,
            result,
        })
    }

    /// Walk-forward analysis on one symbol's history, using the supplied
    /// parameter grid and the configured windows.
    pub fn walk_forward(
        &self,
        provider: &dyn PriceProvider,
        symbol: &str,
        grid: &ParamGrid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WalkForwardReport> {
        let prices = fetch_closes(provider, symbol, start, end)?;
        info!(
            symbol,
            bars = prices.len(),
            candidates = grid.len(),
            "running walk-forward analysis"
        );
        walkforward::run(&prices, grid, &self.config.walkforward)
    }
}

fn fetch_closes(
    provider: &dyn PriceProvider,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<f64>> {
    let bars = provider.fetch(symbol, start, end)?;
    let prices = closes(&bars);
    // An empty provider response is a defined no-data condition.
    if prices.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: prices.len(),
        });
    }
    Ok(prices)
}

/// Assemble aligned return series for a basket of symbols.
fn collect_asset_returns(
    provider: &dyn PriceProvider,
    symbols: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<(String, Vec<f64>)>> {
    symbols
        .iter()
        .map(|symbol| {
            let prices = fetch_closes(provider, symbol, start, end)?;
            Ok((symbol.clone(), series::pct_returns(&prices)?))
        })
        .collect()
}

/// Maximum-Sharpe weights for a basket of symbols over a date range.
pub fn max_sharpe_weights(
    provider: &dyn PriceProvider,
    symbols: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<HashMap<String, f64>> {
    let assets = collect_asset_returns(provider, symbols, start, end)?;
    PortfolioOptimizer::from_returns(assets)?.max_sharpe()
}

/// Inverse-volatility weights for a basket of symbols over a date range.
pub fn risk_parity_weights(
    provider: &dyn PriceProvider,
    symbols: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<HashMap<String, f64>> {
    let assets = collect_asset_returns(provider, symbols, start, end)?;
    PortfolioOptimizer::from_returns(assets)?.risk_parity()
}
