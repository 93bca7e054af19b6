//! Core metrics engine
//!
//! A pure function graph from [`InputState`] and an [`Instrument`] to a full
//! [`DerivedMetrics`] snapshot:
//! - Exit resolution (plain ticks or weighted multi-target exits)
//! - Win/loss amounts and commission-adjusted expectancy
//! - Breakeven-stop overlay
//! - Daily P&L and projections across accounts
//! - Risk of ruin, losing streaks and position sizing
//!
//! Nothing here caches or mutates; call [`compute_metrics`] again after any
//! edit to the state.

pub mod breakeven;
pub mod risk;
pub mod targets;

use serde::Serialize;

use crate::contracts::Instrument;
use crate::state::InputState;

pub use breakeven::BreakevenRates;
pub use risk::RuinInputs;
pub use targets::ExitResolution;

/// Trading days in a week, for the weekly projection
const DAYS_PER_WEEK: f64 = 5.0;

/// Time horizon that may never be reached.
///
/// Serializes as a number of days, or `null` for `Never`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Horizon {
    Days(f64),
    Never,
}

impl Horizon {
    /// `days` when positive-gain arithmetic applies, `Never` otherwise
    fn from_gain(amount: f64, daily_gain: f64) -> Self {
        if daily_gain > 0.0 {
            Self::Days(amount / daily_gain)
        } else {
            Self::Never
        }
    }

    /// Day count, with `Never` reported as 0
    pub fn days_or_zero(&self) -> f64 {
        match self {
            Self::Days(d) => *d,
            Self::Never => 0.0,
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }
}

/// Trade count that may have no upper bound.
///
/// Serializes as a number, or `null` for `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TradeCount {
    Finite(u32),
    Unbounded,
}

impl TradeCount {
    pub fn finite(&self) -> Option<u32> {
        match self {
            Self::Finite(n) => Some(*n),
            Self::Unbounded => None,
        }
    }
}

/// Every metric derived from one input state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    // Basic
    pub total_trades: u32,
    pub win_rate: f64,
    pub win_loss_percent: u32,

    // Exit resolution
    pub total_target_contracts: u32,
    pub avg_exit_points: f64,
    pub avg_exit_ticks: f64,
    pub effective_ticks: f64,
    #[serde(rename = "blendedRR")]
    pub blended_rr: f64,

    // Amounts
    pub avg_win_amount: f64,
    pub avg_loss_amount: f64,
    pub max_trade_gain: f64,
    pub max_trade_loss: f64,
    pub r_value: f64,

    // Expectancy
    pub expectancy: f64,
    pub expectancy_r: f64,
    pub expectancy_percent: f64,

    // Breakeven overlay
    pub breakeven_reach_rate: f64,
    pub breakeven_adjusted_win_rate: f64,
    pub breakeven_scratch_rate: f64,
    pub breakeven_adjusted_expectancy: f64,

    // Daily P&L
    pub gross_daily_gain: f64,
    pub total_commissions: f64,
    pub net_daily_gain: f64,
    pub gross_daily_gain_total: f64,
    pub net_daily_gain_total: f64,
    pub weekly_net_total: f64,
    pub monthly_net_total: f64,
    pub custom_period_net_total: f64,
    pub days_to_target: Horizon,
    pub days_to_target_all_accounts: Horizon,

    // Risk
    pub max_consecutive_losses: TradeCount,
    pub max_drawdown_from_losses: f64,
    pub trades_to_daily_limit: TradeCount,
    pub days_to_blow_account: Horizon,
    pub risk_of_ruin: f64,
    pub recommended_max_contracts: u32,
    pub is_oversized: bool,
}

/// Compute every derived metric for `state` traded on `instrument`.
///
/// Total: degenerate inputs (no trades, zero risk, non-finite numbers) yield
/// fallback values instead of NaN or infinity. Run
/// [`InputState::validate`] separately to tell the user what is wrong.
pub fn compute_metrics(state: &InputState, instrument: &Instrument) -> DerivedMetrics {
    let state = sanitize(state);

    let total_trades = state.total_trades();
    let win_rate = ratio(state.winning_trades as f64, total_trades as f64);
    let win_loss_percent = (win_rate * 100.0).round() as u32;

    let contracts = state.num_contracts;
    let accounts = state.num_accounts as f64;
    let commission = state.commission_per_round_trip * contracts as f64;

    let exit = targets::resolve_exit(&state, instrument);
    let blended_rr = ratio(exit.avg_exit_ticks, state.ticks_lost);

    let avg_win_amount = instrument.ticks_to_amount(exit.effective_ticks, contracts);
    let avg_loss_amount = instrument.ticks_to_amount(state.ticks_lost, contracts);
    let r_value = ratio(exit.effective_ticks, state.ticks_lost);

    let net_win = avg_win_amount - commission;
    let net_loss = avg_loss_amount + commission;
    let expectancy = win_rate * net_win - (1.0 - win_rate) * net_loss;
    let expectancy_r = ratio(expectancy, avg_loss_amount);

    let rates = breakeven::breakeven_rates(
        win_rate,
        &state.breakeven,
        instrument.ticks_per_point,
        exit.effective_ticks,
    );
    let breakeven_adjusted_expectancy = if state.breakeven.enabled {
        breakeven::adjusted_expectancy(&rates, net_win, net_loss, commission)
    } else {
        expectancy
    };

    let trades = total_trades as f64;
    let (gross_daily_gain, net_daily_gain) = if state.breakeven.enabled {
        let wins = rates.adjusted_win_rate * trades;
        let losses = rates.loss_rate() * trades;
        (
            avg_win_amount * wins - avg_loss_amount * losses,
            breakeven_adjusted_expectancy * trades,
        )
    } else {
        let gross = avg_win_amount * state.winning_trades as f64
            - avg_loss_amount * state.losing_trades as f64;
        (gross, gross - commission * trades)
    };

    let total_commissions = commission * trades * accounts;
    let gross_daily_gain_total = gross_daily_gain * accounts;
    let net_daily_gain_total = net_daily_gain * accounts;

    let max_consecutive_losses = risk::max_consecutive_losses(win_rate, total_trades);
    let recommended_max_contracts = risk::recommended_max_contracts(
        state.max_drawdown,
        state.ticks_lost,
        instrument.tick_value,
        state.commission_per_round_trip,
    );

    DerivedMetrics {
        total_trades,
        win_rate,
        win_loss_percent,

        total_target_contracts: state.targets.total_contracts(),
        avg_exit_points: exit.avg_exit_points,
        avg_exit_ticks: exit.avg_exit_ticks,
        effective_ticks: exit.effective_ticks,
        blended_rr,

        avg_win_amount,
        avg_loss_amount,
        max_trade_gain: avg_win_amount,
        max_trade_loss: avg_loss_amount,
        r_value,

        expectancy,
        expectancy_r,
        expectancy_percent: expectancy_r * 100.0,

        breakeven_reach_rate: rates.reach_rate,
        breakeven_adjusted_win_rate: rates.adjusted_win_rate,
        breakeven_scratch_rate: rates.scratch_rate,
        breakeven_adjusted_expectancy,

        gross_daily_gain,
        total_commissions,
        net_daily_gain,
        gross_daily_gain_total,
        net_daily_gain_total,
        weekly_net_total: net_daily_gain_total * DAYS_PER_WEEK,
        monthly_net_total: net_daily_gain_total * state.trading_days_per_month as f64,
        custom_period_net_total: net_daily_gain_total * state.custom_days as f64,
        days_to_target: Horizon::from_gain(state.profit_target, net_daily_gain),
        days_to_target_all_accounts: Horizon::from_gain(state.profit_target, net_daily_gain_total),

        max_consecutive_losses,
        max_drawdown_from_losses: risk::max_drawdown_from_losses(
            max_consecutive_losses,
            avg_loss_amount,
            state.num_accounts,
            state.daily_loss_limit,
        ),
        trades_to_daily_limit: risk::trades_to_daily_limit(
            state.daily_loss_limit,
            avg_loss_amount,
            commission,
        ),
        days_to_blow_account: risk::days_to_blow_account(state.max_drawdown, net_daily_gain_total),
        risk_of_ruin: risk::risk_of_ruin(&RuinInputs {
            win_rate,
            r_value,
            expectancy,
            max_trade_loss: avg_loss_amount,
            num_accounts: state.num_accounts,
            max_drawdown: state.max_drawdown,
        }),
        recommended_max_contracts,
        is_oversized: contracts > recommended_max_contracts,
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Copy of `state` with non-finite numbers zeroed and the breakeven win rate
/// clamped, so no NaN can enter the graph.
fn sanitize(state: &InputState) -> InputState {
    let mut clean = state.clone();

    for value in [
        &mut clean.ticks_gained,
        &mut clean.ticks_lost,
        &mut clean.commission_per_round_trip,
        &mut clean.profit_target,
        &mut clean.daily_loss_limit,
        &mut clean.max_drawdown,
        &mut clean.breakeven.trigger_points,
        &mut clean.breakeven.win_rate,
    ] {
        if !value.is_finite() {
            *value = 0.0;
        }
    }
    for leg in clean.targets.legs.iter_mut() {
        if !leg.points.is_finite() {
            leg.points = 0.0;
        }
    }
    clean.breakeven.win_rate = clean.breakeven.win_rate.clamp(0.0, 1.0);

    clean
}
