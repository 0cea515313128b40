//! Quantegy - strategy backtesting and portfolio allocation.
//!
//! # Overview
//!
//! Quantegy evaluates rule-based trading strategies against historical
//! price series and computes capital-allocation weights across a basket
//! of instruments:
//!
//! - **Crossover simulation**: moving-average-crossover positions with a
//!   strict one-period signal lag (no lookahead) and per-flip costs
//! - **Performance metrics**: total return, annualized Sharpe, maximum
//!   drawdown
//! - **Walk-forward validation**: rolling train/test windows with a
//!   parallel parameter grid search and out-of-sample aggregation
//! - **Portfolio allocation**: constrained max-Sharpe weights and
//!   closed-form inverse-volatility risk parity
//! - **Injectable data access**: a `PriceProvider` trait with an
//!   in-memory implementation and a CSV loader
//! - **Configuration files**: TOML-based run configuration for
//!   reproducible analyses
//!
//! # Quick Start
//!
//! ```no_run
//! use quantegy::{
//!     config::RunConfig,
//!     data::{load_csv, CsvConfig, MemoryProvider},
//!     engine::Backtester,
//!     types::StrategyParams,
//! };
//! use chrono::{TimeZone, Utc};
//!
//! let bars = load_csv("data/AAPL.csv", &CsvConfig::default()).unwrap();
//! let mut provider = MemoryProvider::new();
//! provider.insert("AAPL", bars);
//!
//! let backtester = Backtester::new(RunConfig::default());
//! let report = backtester
//!     .backtest(
//!         &provider,
//!         "AAPL",
//!         StrategyParams::new(10, 50).unwrap(),
//!         Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap(),
//!     )
//!     .unwrap();
//!
//! println!("{}", report.summary());
//! ```
//!
//! # Modules
//!
//! - [`types`]: bars, validated strategy parameters, parameter grids
//! - [`series`]: returns, equity curves, drawdowns
//! - [`strategy`]: the crossover simulator
//! - [`metrics`]: risk/return measurement
//! - [`walkforward`]: rolling train/test optimization
//! - [`portfolio`]: weight solvers over return baskets
//! - [`data`]: price providers and CSV loading
//! - [`engine`]: provider-driven entry points
//! - [`config`]: TOML run configuration
//! - [`report`]: terminal rendering of structured results

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod portfolio;
pub mod report;
pub mod series;
pub mod strategy;
pub mod types;
pub mod walkforward;

// Re-exports for convenience
pub use config::{GridConfig, RunConfig};
pub use data::{load_csv, CsvConfig, MemoryProvider, PriceProvider};
pub use engine::{max_sharpe_weights, risk_parity_weights, Backtester, BacktestReport};
pub use error::{Error, Result};
pub use metrics::{measure, BacktestResult, TRADING_DAYS_PER_YEAR};
pub use portfolio::PortfolioOptimizer;
pub use report::{format_weights, print_walkforward, DISPLAY_WEIGHT_THRESHOLD};
pub use series::{drawdown, equity_curve, max_drawdown, pct_returns};
pub use strategy::{sma_series, Simulation, SmaCrossover, DEFAULT_COST_RATE};
pub use types::{closes, Bar, ParamGrid, StrategyParams};
pub use walkforward::{Aggregation, WalkForwardConfig, WalkForwardReport, WalkForwardWindow};
