//! Breakeven-stop overlay
//!
//! Models a stop moved to entry once a trade is `trigger_points` in profit.
//! Some winners reach the trigger and then come back to entry; those become
//! scratches that cost only commission.

use crate::state::BreakevenSimulation;

/// Share of winners assumed to reach the trigger when it sits at or beyond
/// the average win, and the lower clamp otherwise
const MIN_REACH_RATE: f64 = 0.10;
const MAX_REACH_RATE: f64 = 0.95;

/// Outcome rates after applying the breakeven overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakevenRates {
    /// Fraction of winners that reach the trigger (0 when the overlay is off)
    pub reach_rate: f64,
    pub adjusted_win_rate: f64,
    pub scratch_rate: f64,
}

impl BreakevenRates {
    /// Rates when the overlay is disabled
    pub fn passthrough(win_rate: f64) -> Self {
        Self {
            reach_rate: 0.0,
            adjusted_win_rate: win_rate,
            scratch_rate: 0.0,
        }
    }

    /// Everything that is neither a full win nor a scratch
    pub fn loss_rate(&self) -> f64 {
        1.0 - self.adjusted_win_rate - self.scratch_rate
    }
}

/// Fraction of winning trades that travel far enough to trigger the stop move.
/// Triggers closer to entry are reached more often.
pub fn reach_rate(trigger_points: f64, ticks_per_point: u32, effective_ticks: f64) -> f64 {
    let trigger_ticks = trigger_points * ticks_per_point as f64;

    if trigger_ticks >= effective_ticks {
        return MIN_REACH_RATE;
    }

    (1.0 - trigger_ticks / effective_ticks).clamp(MIN_REACH_RATE, MAX_REACH_RATE)
}

pub fn breakeven_rates(
    win_rate: f64,
    overlay: &BreakevenSimulation,
    ticks_per_point: u32,
    effective_ticks: f64,
) -> BreakevenRates {
    if !overlay.enabled {
        return BreakevenRates::passthrough(win_rate);
    }

    let reach = reach_rate(overlay.trigger_points, ticks_per_point, effective_ticks);
    let reaching = win_rate * reach;
    let not_reaching = win_rate * (1.0 - reach);

    BreakevenRates {
        reach_rate: reach,
        adjusted_win_rate: not_reaching + reaching * overlay.win_rate,
        scratch_rate: reaching * (1.0 - overlay.win_rate),
    }
}

/// Expectancy with scratches booked as a pure commission loss.
///
/// `net_win` and `net_loss` already include commission; `scratch_cost` is the
/// positive commission paid on a scratched trade.
pub fn adjusted_expectancy(
    rates: &BreakevenRates,
    net_win: f64,
    net_loss: f64,
    scratch_cost: f64,
) -> f64 {
    rates.adjusted_win_rate * net_win - rates.scratch_rate * scratch_cost - rates.loss_rate() * net_loss
}
