//! Moving-average crossover simulation.
//!
//! The simulator is vectorized over the close-price series: it derives the
//! fast/slow SMA series, a raw {0, 1} signal, and a position series lagged
//! one period behind the signal. A signal computed from today's close can
//! only affect tomorrow's position; the lag is the no-lookahead invariant,
//! not a tunable.

use crate::types::StrategyParams;
use serde::{Deserialize, Serialize};

/// Transaction cost charged per position flip, as a fraction (10 bps).
pub const DEFAULT_COST_RATE: f64 = 0.001;

/// Simple moving average series. `None` during the `window - 1` warm-up
/// prefix, and everywhere when `window > closes.len()`.
pub fn sma_series(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || window > closes.len() {
        return out;
    }
    let mut sum: f64 = closes[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);
    for t in window..closes.len() {
        sum += closes[t] - closes[t - window];
        out[t] = Some(sum / window as f64);
    }
    out
}

/// Output of a crossover simulation, aligned to the input price series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    /// Raw signal per period: 1 when the fast SMA is above the slow SMA,
    /// 0 otherwise (including the warm-up prefix).
    pub signals: Vec<u8>,
    /// Position held during each period: `positions[t] = signals[t - 1]`.
    pub positions: Vec<u8>,
    /// Market returns, one element shorter than the price series.
    pub market_returns: Vec<f64>,
    /// Strategy returns net of transaction costs, aligned to
    /// `market_returns`.
    pub strategy_returns: Vec<f64>,
}

/// Moving-average crossover strategy simulator.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    params: StrategyParams,
    cost_rate: f64,
}

impl SmaCrossover {
    /// Create a simulator with the default 10 bps per-flip cost.
    pub fn new(params: StrategyParams) -> Self {
        Self {
            params,
            cost_rate: DEFAULT_COST_RATE,
        }
    }

    /// Override the per-flip transaction cost. Negative rates are clamped
    /// to zero.
    pub fn with_cost_rate(mut self, cost_rate: f64) -> Self {
        self.cost_rate = cost_rate.max(0.0);
        self
    }

    pub fn params(&self) -> StrategyParams {
        self.params
    }

    /// Simulate the crossover rule over a close-price series.
    ///
    /// Fewer than two observations produce empty return series (a defined
    /// no-data outcome, not an error); a slow window longer than the
    /// series produces an all-flat simulation with zero returns
    /// throughout.
    pub fn simulate(&self, closes: &[f64]) -> Simulation {
        let n = closes.len();
        let fast = sma_series(closes, self.params.fast());
        let slow = sma_series(closes, self.params.slow());

        let signals: Vec<u8> = (0..n)
            .map(|t| match (fast[t], slow[t]) {
                (Some(f), Some(s)) if f > s => 1,
                _ => 0,
            })
            .collect();

        let mut positions = vec![0u8; n];
        for t in 1..n {
            positions[t] = signals[t - 1];
        }

        let market_returns: Vec<f64> =
            closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

        let mut strategy_returns = Vec::with_capacity(market_returns.len());
        for t in 1..n {
            let flips = (signals[t] as i32 - signals[t - 1] as i32).abs() as f64;
            strategy_returns
                .push(market_returns[t - 1] * positions[t] as f64 - self.cost_rate * flips);
        }

        Simulation {
            signals,
            positions,
            market_returns,
            strategy_returns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(fast: usize, slow: usize) -> StrategyParams {
        StrategyParams::new(fast, slow).unwrap()
    }

    const SCENARIO: [f64; 10] = [
        100.0, 102.0, 101.0, 105.0, 108.0, 107.0, 110.0, 115.0, 112.0, 118.0,
    ];

    #[test]
    fn test_sma_warmup_and_values() {
        let sma = sma_series(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(sma[0], None);
        assert!((sma[1].unwrap() - 1.5).abs() < 1e-12);
        assert!((sma[2].unwrap() - 2.5).abs() < 1e-12);
        assert!((sma[3].unwrap() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_sma_window_longer_than_series() {
        let sma = sma_series(&[1.0, 2.0], 5);
        assert!(sma.iter().all(Option::is_none));
    }

    #[test]
    fn test_scenario_warmup_is_flat_then_long() {
        let sim = SmaCrossover::new(params(2, 4)).simulate(&SCENARIO);

        // Slow SMA is undefined until index 3, so the signal stays 0 and
        // the lagged position stays flat through index 3.
        assert_eq!(&sim.signals[..3], &[0, 0, 0]);
        assert_eq!(&sim.positions[..4], &[0, 0, 0, 0]);

        // At index 3 the 2-period average (103) exceeds the 4-period
        // average (102); the position goes long one period later and the
        // uptrend keeps it long to the end.
        assert_eq!(sim.signals[3], 1);
        assert!(sim.positions[4..].iter().all(|&p| p == 1));
    }

    #[test]
    fn test_scenario_costs_and_total_return() {
        let sim = SmaCrossover::new(params(2, 4)).simulate(&SCENARIO);

        // Flat periods earn nothing; the single flip at index 3 is charged
        // while the position is still flat.
        assert_eq!(sim.strategy_returns[0], 0.0);
        assert_eq!(sim.strategy_returns[1], 0.0);
        assert!((sim.strategy_returns[2] - (-DEFAULT_COST_RATE)).abs() < 1e-12);

        // Long from index 4 on, the strategy compounds the market ratios,
        // which telescope to 118/105.
        let total: f64 = sim
            .strategy_returns
            .iter()
            .fold(1.0, |acc, r| acc * (1.0 + r));
        let expected = (1.0 - DEFAULT_COST_RATE) * (118.0 / 105.0);
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_lookahead_future_perturbation() {
        let sim = SmaCrossover::new(params(2, 4)).simulate(&SCENARIO);
        for t in 0..SCENARIO.len() - 1 {
            let mut perturbed = SCENARIO;
            perturbed[t + 1] *= 1.5;
            let sim2 = SmaCrossover::new(params(2, 4)).simulate(&perturbed);
            assert_eq!(
                sim.positions[..=t],
                sim2.positions[..=t],
                "perturbing price {} changed an earlier position",
                t + 1
            );
        }
    }

    #[test]
    fn test_slow_window_exceeding_series_is_all_flat() {
        let sim = SmaCrossover::new(params(2, 50)).simulate(&SCENARIO);
        assert!(sim.signals.iter().all(|&s| s == 0));
        assert!(sim.positions.iter().all(|&p| p == 0));
        assert!(sim.strategy_returns.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_short_series_yields_empty_returns() {
        let sim = SmaCrossover::new(params(2, 4)).simulate(&[100.0]);
        assert_eq!(sim.positions, vec![0]);
        assert!(sim.strategy_returns.is_empty());

        let sim = SmaCrossover::new(params(2, 4)).simulate(&[]);
        assert!(sim.signals.is_empty());
        assert!(sim.strategy_returns.is_empty());
    }

    #[test]
    fn test_cost_rate_override() {
        let free = SmaCrossover::new(params(2, 4))
            .with_cost_rate(0.0)
            .simulate(&SCENARIO);
        assert_eq!(free.strategy_returns[2], 0.0);
    }
}
