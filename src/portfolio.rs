//! Portfolio allocation over multiple return series.
//!
//! Two schemes: maximum-Sharpe weights found by a constrained iterative
//! solver over the long-only simplex, and closed-form inverse-volatility
//! ("naive risk parity") weights.

use crate::error::{Error, Result};
use crate::metrics::TRADING_DAYS_PER_YEAR;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Portfolio volatilities below this are numerically zero; the Sharpe
/// objective flattens to 0.0 there instead of dividing by zero.
const VOL_FLOOR: f64 = 1e-6;

/// Per-asset standard deviations below this are degenerate inputs.
const ZERO_VOL_TOL: f64 = 1e-12;

const MAX_ITERATIONS: usize = 500;
const STEP_HALVINGS: usize = 60;
const IMPROVEMENT_TOL: f64 = 1e-10;

/// Mean/covariance estimates for a basket of return series, and the
/// solvers that allocate over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOptimizer {
    symbols: Vec<String>,
    mean_returns: Vec<f64>,
    covariance: Vec<Vec<f64>>,
}

impl PortfolioOptimizer {
    /// Estimate per-period mean returns and the covariance matrix from
    /// aligned return series.
    ///
    /// Every series must have the same length and at least two
    /// observations; symbols must be distinct.
    pub fn from_returns(assets: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if assets.is_empty() {
            return Err(Error::InvalidParameter(
                "need at least one return series".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (symbol, _) in &assets {
            if !seen.insert(symbol.clone()) {
                return Err(Error::InvalidParameter(format!(
                    "duplicate symbol: {}",
                    symbol
                )));
            }
        }

        let len = assets[0].1.len();
        if len < 2 {
            return Err(Error::InsufficientData { needed: 2, got: len });
        }
        for (symbol, returns) in &assets {
            if returns.len() != len {
                return Err(Error::InvalidParameter(format!(
                    "return series are not aligned: {} has {} observations, expected {}",
                    symbol,
                    returns.len(),
                    len
                )));
            }
        }

        let n = assets.len();
        let symbols: Vec<String> = assets.iter().map(|(s, _)| s.clone()).collect();
        let mean_returns: Vec<f64> = assets
            .iter()
            .map(|(_, r)| r.iter().sum::<f64>() / len as f64)
            .collect();

        let mut covariance = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let cov = assets[i]
                    .1
                    .iter()
                    .zip(assets[j].1.iter())
                    .map(|(ri, rj)| (ri - mean_returns[i]) * (rj - mean_returns[j]))
                    .sum::<f64>()
                    / len as f64;
                covariance[i][j] = cov;
                covariance[j][i] = cov;
            }
        }

        Ok(Self {
            symbols,
            mean_returns,
            covariance,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn portfolio_return(&self, weights: &[f64]) -> f64 {
        weights
            .iter()
            .zip(self.mean_returns.iter())
            .map(|(w, m)| w * m)
            .sum()
    }

    fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        let n = weights.len();
        let mut variance = 0.0;
        for i in 0..n {
            for j in 0..n {
                variance += weights[i] * weights[j] * self.covariance[i][j];
            }
        }
        variance
    }

    /// Annualized Sharpe objective. Flat 0.0 below the volatility floor
    /// so the degenerate ray neither attracts nor repels the solver.
    fn sharpe_objective(&self, weights: &[f64]) -> f64 {
        let annual_return = self.portfolio_return(weights) * TRADING_DAYS_PER_YEAR;
        let annual_vol =
            (self.portfolio_variance(weights) * TRADING_DAYS_PER_YEAR).sqrt();
        if annual_vol < VOL_FLOOR {
            return 0.0;
        }
        annual_return / annual_vol
    }

    fn sharpe_gradient(&self, weights: &[f64]) -> Vec<f64> {
        let annual_return = self.portfolio_return(weights) * TRADING_DAYS_PER_YEAR;
        let annual_var = self.portfolio_variance(weights) * TRADING_DAYS_PER_YEAR;
        let annual_vol = annual_var.sqrt();

        if annual_vol < VOL_FLOOR {
            // Degenerate region: climb toward return until variance
            // becomes informative.
            return self
                .mean_returns
                .iter()
                .map(|m| m * TRADING_DAYS_PER_YEAR)
                .collect();
        }

        (0..weights.len())
            .map(|i| {
                let d_return = self.mean_returns[i] * TRADING_DAYS_PER_YEAR;
                let sigma_w: f64 = (0..weights.len())
                    .map(|j| self.covariance[i][j] * weights[j])
                    .sum();
                let d_vol = sigma_w * TRADING_DAYS_PER_YEAR / annual_vol;
                (d_return * annual_vol - annual_return * d_vol) / annual_var
            })
            .collect()
    }

    /// Maximum-Sharpe weights over the long-only simplex.
    ///
    /// Projected gradient ascent with backtracking line search, seeded
    /// from equal weights. Fails with [`Error::OptimizationFailure`] when
    /// the iteration budget runs out while the objective is still moving,
    /// or when the objective stops being finite.
    pub fn max_sharpe(&self) -> Result<HashMap<String, f64>> {
        let n = self.symbols.len();
        let mut weights = vec![1.0 / n as f64; n];
        let mut objective = self.sharpe_objective(&weights);
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..MAX_ITERATIONS {
            iterations = iter + 1;
            let gradient = self.sharpe_gradient(&weights);

            let mut accepted = None;
            let mut step = 1.0;
            for _ in 0..STEP_HALVINGS {
                let candidate = project_onto_simplex(
                    &weights
                        .iter()
                        .zip(gradient.iter())
                        .map(|(w, g)| w + step * g)
                        .collect::<Vec<f64>>(),
                );
                let candidate_objective = self.sharpe_objective(&candidate);
                if !candidate_objective.is_finite() {
                    return Err(Error::OptimizationFailure(format!(
                        "objective became non-finite after {} iterations",
                        iterations
                    )));
                }
                if candidate_objective > objective {
                    accepted = Some((candidate, candidate_objective));
                    break;
                }
                step *= 0.5;
            }

            match accepted {
                Some((candidate, candidate_objective)) => {
                    let gain = candidate_objective - objective;
                    weights = candidate;
                    objective = candidate_objective;
                    debug!(iteration = iterations, objective, gain, "ascent step");
                    if gain < IMPROVEMENT_TOL {
                        converged = true;
                        break;
                    }
                }
                // No step length improves the objective: constrained
                // stationary point.
                None => {
                    converged = true;
                    break;
                }
            }
        }

        if !converged {
            return Err(Error::OptimizationFailure(format!(
                "max-Sharpe solver still improving after {} iterations (objective {:.6})",
                iterations, objective
            )));
        }

        info!(
            iterations,
            sharpe = objective,
            "max-Sharpe optimization converged"
        );

        Ok(self
            .symbols
            .iter()
            .cloned()
            .zip(weights)
            .collect())
    }

    /// Inverse-volatility ("naive risk parity") weights:
    /// `w_i = (1/sigma_i) / sum(1/sigma_j)`.
    ///
    /// Closed form; fails only when an input series has zero variance.
    pub fn risk_parity(&self) -> Result<HashMap<String, f64>> {
        let mut inverse_vols = Vec::with_capacity(self.symbols.len());
        for (i, symbol) in self.symbols.iter().enumerate() {
            let vol = self.covariance[i][i].sqrt();
            if vol < ZERO_VOL_TOL {
                return Err(Error::DegenerateInput(format!(
                    "zero-variance return series for {}",
                    symbol
                )));
            }
            inverse_vols.push(1.0 / vol);
        }
        let total: f64 = inverse_vols.iter().sum();
        Ok(self
            .symbols
            .iter()
            .cloned()
            .zip(inverse_vols.into_iter().map(|iv| iv / total))
            .collect())
    }
}

/// Clip into `[0, 1]` and renormalize to sum 1. Every output satisfies
/// the simplex constraints; a fully clipped vector resets to equal
/// weights rather than dividing by zero.
fn project_onto_simplex(weights: &[f64]) -> Vec<f64> {
    let clipped: Vec<f64> = weights.iter().map(|w| w.clamp(0.0, 1.0)).collect();
    let sum: f64 = clipped.iter().sum();
    if sum <= 0.0 {
        return vec![1.0 / weights.len() as f64; weights.len()];
    }
    clipped.into_iter().map(|w| w / sum).collect()
}
