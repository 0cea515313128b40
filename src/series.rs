//! Return-series utilities: percentage returns, equity curves, drawdowns.
//!
//! Every transformation allocates a fresh series; inputs are never mutated.

use crate::error::{Error, Result};

fn require_observations(got: usize) -> Result<()> {
    if got < 2 {
        return Err(Error::InsufficientData { needed: 2, got });
    }
    Ok(())
}

/// Period-over-period fractional returns: `r[i] = closes[i+1]/closes[i] - 1`.
///
/// One element shorter than the input series.
pub fn pct_returns(closes: &[f64]) -> Result<Vec<f64>> {
    require_observations(closes.len())?;
    Ok(closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Cumulative equity curve of `(1 + r)` products, starting at 1.0 the
/// period before the first return. One element longer than the input.
pub fn equity_curve(returns: &[f64]) -> Result<Vec<f64>> {
    require_observations(returns.len())?;
    let mut curve = Vec::with_capacity(returns.len() + 1);
    let mut equity = 1.0;
    curve.push(equity);
    for r in returns {
        equity *= 1.0 + r;
        curve.push(equity);
    }
    Ok(curve)
}

/// Drawdown series: `equity[t] / running_max(equity[0..=t]) - 1`.
pub fn drawdown(equity: &[f64]) -> Result<Vec<f64>> {
    require_observations(equity.len())?;
    let mut peak = f64::NEG_INFINITY;
    let mut out = Vec::with_capacity(equity.len());
    for &e in equity {
        peak = peak.max(e);
        out.push(e / peak - 1.0);
    }
    Ok(out)
}

/// Most negative value of the drawdown series, or 0.0 for a curve that
/// never declines.
pub fn max_drawdown(equity: &[f64]) -> Result<f64> {
    let dd = drawdown(equity)?;
    Ok(dd.into_iter().fold(0.0, f64::min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_returns() {
        let returns = pct_returns(&[100.0, 102.0, 101.0]).unwrap();
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.02).abs() < 1e-12);
        assert!((returns[1] - (101.0 / 102.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_short_series_rejected() {
        assert!(matches!(
            pct_returns(&[100.0]),
            Err(Error::InsufficientData { needed: 2, got: 1 })
        ));
        assert!(pct_returns(&[]).is_err());
        assert!(equity_curve(&[0.01]).is_err());
        assert!(drawdown(&[1.0]).is_err());
    }

    #[test]
    fn test_equity_curve_matches_direct_product() {
        let returns = [0.02, -0.01, 0.03];
        let curve = equity_curve(&returns).unwrap();
        assert_eq!(curve.len(), 4);
        assert!((curve[0] - 1.0).abs() < 1e-12);
        let direct: f64 = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r));
        assert!((curve[3] - direct).abs() < 1e-12);
    }

    #[test]
    fn test_drawdown_peak_to_trough() {
        // Scenario from the contract: trough 0.9 after peak 1.1.
        let dd = drawdown(&[1.0, 1.1, 0.9, 1.05]).unwrap();
        assert!((dd[0]).abs() < 1e-12);
        assert!((dd[1]).abs() < 1e-12);
        assert!((dd[2] - (0.9 / 1.1 - 1.0)).abs() < 1e-12);

        let max_dd = max_drawdown(&[1.0, 1.1, 0.9, 1.05]).unwrap();
        assert!((max_dd - (-0.18181818)).abs() < 1e-6);
    }

    #[test]
    fn test_max_drawdown_monotonic_curve_is_zero() {
        let max_dd = max_drawdown(&[1.0, 1.0, 1.2, 1.5]).unwrap();
        assert_eq!(max_dd, 0.0);
    }
}
