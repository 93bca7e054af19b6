//! Monte Carlo prop firm evaluation
//!
//! Replays a state's trade statistics as random trade sequences against the
//! account rules (static max drawdown, daily loss limit, profit target) and
//! counts how often the evaluation passes. A sanity check next to the
//! closed-form risk of ruin, which ignores the profit target entirely.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::info;

use crate::contracts::Instrument;
use crate::engine::compute_metrics;
use crate::error::{CalcError, Result};
use crate::state::InputState;

/// Monte Carlo run parameters
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub num_simulations: usize,
    /// Evaluation times out after this many trades
    pub max_trades: usize,
    /// Standard deviation of trade amounts as a fraction of the average
    pub spread: f64,
    /// Fixed seed for reproducible runs; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: 10_000,
            max_trades: 300,
            spread: 0.3,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Small deterministic run for previews
    pub fn quick(seed: u64) -> Self {
        Self {
            num_simulations: 1_000,
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.num_simulations == 0 {
            return Err(CalcError::InvalidSimulation(
                "number of simulations must be greater than zero".to_string(),
            ));
        }
        if self.max_trades == 0 {
            return Err(CalcError::InvalidSimulation(
                "max trades must be greater than zero".to_string(),
            ));
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(CalcError::InvalidSimulation(
                "spread must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-trade outcome model for one account
#[derive(Debug, Clone, Copy)]
struct TradeModel {
    win_rate: f64,
    scratch_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    /// Round-trip commission for the whole position
    commission: f64,
    trades_per_day: usize,
}

/// Outcome counts across all simulated evaluations
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    pub simulations: usize,
    pub passed: usize,
    pub failed_drawdown: usize,
    pub failed_daily_limit: usize,
    pub failed_max_trades: usize,
    /// Trades taken by each passing run
    pub trades_to_pass: Vec<usize>,
    /// Smallest drawdown headroom seen by each passing run
    pub min_buffers: Vec<f64>,
}

impl SimulationResults {
    pub fn pass_rate(&self) -> f64 {
        rate(self.passed, self.simulations)
    }

    pub fn drawdown_failure_rate(&self) -> f64 {
        rate(self.failed_drawdown + self.failed_daily_limit, self.simulations)
    }

    pub fn timeout_rate(&self) -> f64 {
        rate(self.failed_max_trades, self.simulations)
    }

    pub fn avg_trades_to_pass(&self) -> Option<f64> {
        if self.trades_to_pass.is_empty() {
            return None;
        }
        let total: usize = self.trades_to_pass.iter().sum();
        Some(total as f64 / self.trades_to_pass.len() as f64)
    }

    pub fn median_trades_to_pass(&self) -> Option<usize> {
        if self.trades_to_pass.is_empty() {
            return None;
        }
        let mut sorted = self.trades_to_pass.clone();
        sorted.sort_unstable();
        Some(sorted[sorted.len() / 2])
    }

    /// Min-buffer value at percentile `p` (0.0-1.0) across passing runs
    pub fn percentile_min_buffer(&self, p: f64) -> Option<f64> {
        if self.min_buffers.is_empty() {
            return None;
        }
        let mut sorted = self.min_buffers.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let index = ((sorted.len() as f64 * p.clamp(0.0, 1.0)) as usize).min(sorted.len() - 1);
        Some(sorted[index])
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Simulate one account's evaluation `config.num_simulations` times.
///
/// Uses the breakeven-adjusted win and scratch rates, so the overlay is
/// reflected when enabled. A day is `total_trades` trades.
pub fn simulate_evaluation(
    state: &InputState,
    instrument: &Instrument,
    config: &SimulationConfig,
) -> Result<SimulationResults> {
    state.ensure_valid()?;
    config.validate()?;

    let metrics = compute_metrics(state, instrument);
    let model = TradeModel {
        win_rate: metrics.breakeven_adjusted_win_rate,
        scratch_rate: metrics.breakeven_scratch_rate,
        avg_win: metrics.avg_win_amount,
        avg_loss: metrics.avg_loss_amount,
        commission: state.commission_per_round_trip * state.num_contracts as f64,
        trades_per_day: metrics.total_trades.max(1) as usize,
    };

    let win_dist = Normal::new(model.avg_win, model.avg_win * config.spread)
        .map_err(|e| CalcError::InvalidSimulation(e.to_string()))?;
    let loss_dist = Normal::new(model.avg_loss, model.avg_loss * config.spread)
        .map_err(|e| CalcError::InvalidSimulation(e.to_string()))?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut results = SimulationResults {
        simulations: config.num_simulations,
        ..Default::default()
    };

    for _ in 0..config.num_simulations {
        let mut pnl = 0.0f64;
        let mut daily_pnl = 0.0f64;
        let mut trades = 0usize;
        let mut min_buffer = state.max_drawdown;

        loop {
            trades += 1;

            let roll: f64 = rng.gen();
            let trade_pnl = if roll < model.win_rate {
                win_dist.sample(&mut rng).max(model.avg_win * 0.3) - model.commission
            } else if roll < model.win_rate + model.scratch_rate {
                -model.commission
            } else {
                -(loss_dist.sample(&mut rng).max(model.avg_loss * 0.5) + model.commission)
            };

            pnl += trade_pnl;
            daily_pnl += trade_pnl;

            if state.daily_loss_limit > 0.0 && daily_pnl <= -state.daily_loss_limit {
                results.failed_daily_limit += 1;
                break;
            }

            // Static drawdown, never trails
            let buffer = state.max_drawdown + pnl;
            min_buffer = min_buffer.min(buffer);
            if buffer <= 0.0 {
                results.failed_drawdown += 1;
                break;
            }

            if pnl >= state.profit_target {
                results.passed += 1;
                results.trades_to_pass.push(trades);
                results.min_buffers.push(min_buffer);
                break;
            }

            if trades >= config.max_trades {
                results.failed_max_trades += 1;
                break;
            }

            if trades % model.trades_per_day == 0 {
                daily_pnl = 0.0;
            }
        }
    }

    info!(
        "Simulated {} {} evaluations: {:.2}% passed, {:.2}% failed on drawdown, {:.2}% timed out",
        results.simulations,
        instrument.symbol,
        results.pass_rate() * 100.0,
        results.drawdown_failure_rate() * 100.0,
        results.timeout_rate() * 100.0
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts;

    fn mnq() -> &'static Instrument {
        contracts::lookup("MNQ").unwrap()
    }

    fn config(num_simulations: usize, spread: f64) -> SimulationConfig {
        SimulationConfig {
            num_simulations,
            max_trades: 300,
            spread,
            seed: Some(7),
        }
    }

    #[test]
    fn test_all_winners_pass() {
        let state = InputState {
            winning_trades: 4,
            losing_trades: 0,
            ..Default::default()
        };

        let results = simulate_evaluation(&state, mnq(), &config(200, 0.0)).unwrap();
        assert_eq!(results.passed, 200);
        assert_eq!(results.pass_rate(), 1.0);
        // $6,000 at $58.65 net per trade
        assert_eq!(results.median_trades_to_pass(), Some(103));
        assert_eq!(results.avg_trades_to_pass(), Some(103.0));
        assert_eq!(results.percentile_min_buffer(0.05), Some(2000.0));
    }

    #[test]
    fn test_all_losers_hit_drawdown() {
        let state = InputState {
            winning_trades: 0,
            losing_trades: 4,
            ..Default::default()
        };

        let results = simulate_evaluation(&state, mnq(), &config(100, 0.3)).unwrap();
        assert_eq!(results.passed, 0);
        assert_eq!(results.failed_drawdown, 100);
        assert!(results.avg_trades_to_pass().is_none());
        assert!(results.median_trades_to_pass().is_none());
    }

    #[test]
    fn test_daily_limit_failure() {
        // One loss is $1,500 + commission against an $1,100 daily limit
        let state = InputState {
            winning_trades: 0,
            losing_trades: 4,
            ticks_lost: 3000.0,
            max_drawdown: 100_000.0,
            ..Default::default()
        };

        let results = simulate_evaluation(&state, mnq(), &config(50, 0.0)).unwrap();
        assert_eq!(results.failed_daily_limit, 50);
        assert_eq!(results.drawdown_failure_rate(), 1.0);
    }

    #[test]
    fn test_timeout() {
        let state = InputState {
            profit_target: 1_000_000.0,
            daily_loss_limit: 0.0,
            max_drawdown: 1_000_000.0,
            ..Default::default()
        };
        let config = SimulationConfig {
            max_trades: 20,
            ..config(10, 0.3)
        };

        let results = simulate_evaluation(&state, mnq(), &config).unwrap();
        assert_eq!(results.failed_max_trades, 10);
        assert_eq!(results.timeout_rate(), 1.0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let state = InputState::default();
        let a = simulate_evaluation(&state, mnq(), &SimulationConfig::quick(42)).unwrap();
        let b = simulate_evaluation(&state, mnq(), &SimulationConfig::quick(42)).unwrap();

        assert_eq!(a.passed, b.passed);
        assert_eq!(a.failed_drawdown, b.failed_drawdown);
        assert_eq!(a.trades_to_pass, b.trades_to_pass);
        assert_eq!(
            a.passed + a.failed_drawdown + a.failed_daily_limit + a.failed_max_trades,
            1_000
        );
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let state = InputState::default();

        let zero_runs = SimulationConfig {
            num_simulations: 0,
            ..Default::default()
        };
        assert!(matches!(
            simulate_evaluation(&state, mnq(), &zero_runs),
            Err(CalcError::InvalidSimulation(_))
        ));

        let bad_spread = SimulationConfig {
            spread: -1.0,
            ..Default::default()
        };
        assert!(simulate_evaluation(&state, mnq(), &bad_spread).is_err());

        let invalid_state = InputState {
            num_contracts: 0,
            ..Default::default()
        };
        assert!(matches!(
            simulate_evaluation(&invalid_state, mnq(), &SimulationConfig::quick(1)),
            Err(CalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rates_on_empty_results() {
        let results = SimulationResults::default();
        assert_eq!(results.pass_rate(), 0.0);
        assert_eq!(results.percentile_min_buffer(0.5), None);
    }
}
