//! Error types for the backtesting and allocation engines.

use thiserror::Error;

/// Main error type for backtest and allocation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A series was shorter than the minimum the computation requires.
    #[error("insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A zero-variance series fed a ratio with no defined answer.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// The constrained solver did not converge; carries its diagnostics.
    #[error("optimization failed: {0}")]
    OptimizationFailure(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("no data loaded")]
    NoData,

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for backtest and allocation operations.
pub type Result<T> = std::result::Result<T, Error>;
