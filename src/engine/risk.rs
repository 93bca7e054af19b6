//! Risk metrics: losing streaks, daily limit headroom, risk of ruin and
//! position sizing against the account drawdown.

use super::{Horizon, TradeCount};

/// Probability at which a losing streak is considered the practical worst case
const STREAK_CONFIDENCE: f64 = 0.01;

/// Fraction of max drawdown risked per trade when sizing positions
const RISK_PER_TRADE: f64 = 0.01;

/// Longest losing streak whose probability is still above 1%,
/// assuming independent trades.
pub fn max_consecutive_losses(win_rate: f64, total_trades: u32) -> TradeCount {
    let loss_rate = 1.0 - win_rate;

    if total_trades == 0 || loss_rate <= 0.0 {
        return TradeCount::Finite(0);
    }
    if loss_rate >= 1.0 {
        return TradeCount::Unbounded;
    }

    let streak = (STREAK_CONFIDENCE.ln() / loss_rate.ln()).ceil();
    TradeCount::Finite(streak as u32)
}

/// Drawdown across all accounts from the worst-case streak, capped at the
/// daily loss limit when one is configured.
pub fn max_drawdown_from_losses(
    streak: TradeCount,
    max_trade_loss: f64,
    num_accounts: u32,
    daily_loss_limit: f64,
) -> f64 {
    let has_limit = daily_loss_limit > 0.0;

    let drawdown = match streak {
        TradeCount::Finite(n) => n as f64 * max_trade_loss * num_accounts as f64,
        TradeCount::Unbounded if max_trade_loss <= 0.0 || num_accounts == 0 => 0.0,
        // Every trade loses: the limit is the only thing that stops the bleed
        TradeCount::Unbounded if has_limit => daily_loss_limit,
        TradeCount::Unbounded => 0.0,
    };

    if has_limit {
        drawdown.min(daily_loss_limit)
    } else {
        drawdown
    }
}

/// Full losses (with commission) that fit inside the daily loss limit
pub fn trades_to_daily_limit(
    daily_loss_limit: f64,
    max_trade_loss: f64,
    commission_per_trade: f64,
) -> TradeCount {
    if daily_loss_limit <= 0.0 || max_trade_loss <= 0.0 {
        return TradeCount::Unbounded;
    }

    let per_trade = max_trade_loss + commission_per_trade;
    if per_trade <= 0.0 {
        return TradeCount::Unbounded;
    }

    TradeCount::Finite((daily_loss_limit / per_trade).floor() as u32)
}

/// Days of average net losses until the max drawdown is gone
pub fn days_to_blow_account(max_drawdown: f64, net_daily_gain_total: f64) -> Horizon {
    if net_daily_gain_total >= 0.0 {
        return Horizon::Never;
    }
    Horizon::Days(max_drawdown / net_daily_gain_total.abs())
}

/// Inputs to the gambler's-ruin estimate
#[derive(Debug, Clone, Copy)]
pub struct RuinInputs {
    pub win_rate: f64,
    pub r_value: f64,
    pub expectancy: f64,
    pub max_trade_loss: f64,
    pub num_accounts: u32,
    pub max_drawdown: f64,
}

/// Probability of losing the whole drawdown allowance.
///
/// Negative-edge systems are treated as certain ruin. Otherwise the classic
/// `(q / (p * b)) ^ n` approximation with `n` full losses to ruin. Commission
/// and partial losses are not modelled.
pub fn risk_of_ruin(inputs: &RuinInputs) -> f64 {
    if inputs.win_rate <= 0.0 || inputs.r_value <= 0.0 || inputs.expectancy <= 0.0 {
        return 1.0;
    }

    let total_risk = inputs.max_trade_loss * inputs.num_accounts as f64;
    if total_risk <= 0.0 {
        return 1.0;
    }

    let trades_to_ruin = (inputs.max_drawdown / total_risk).floor();
    if trades_to_ruin <= 0.0 {
        return 1.0;
    }

    let ratio = (1.0 - inputs.win_rate) / (inputs.win_rate * inputs.r_value);
    if ratio >= 1.0 {
        return 1.0;
    }

    ratio.powf(trades_to_ruin).clamp(0.0, 1.0)
}

/// Contracts that keep a full loss (plus round-trip commission on both
/// sides) within 1% of the max drawdown. Never below one.
pub fn recommended_max_contracts(
    max_drawdown: f64,
    ticks_lost: f64,
    tick_value: f64,
    commission: f64,
) -> u32 {
    let loss_per_contract = ticks_lost * tick_value + 2.0 * commission;
    if loss_per_contract <= 0.0 {
        return 1;
    }

    let contracts = (max_drawdown * RISK_PER_TRADE / loss_per_contract).floor();
    (contracts as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruin_inputs() -> RuinInputs {
        RuinInputs {
            win_rate: 0.5,
            r_value: 120.0 / 68.0,
            expectancy: 11.65,
            max_trade_loss: 34.0,
            num_accounts: 1,
            max_drawdown: 2000.0,
        }
    }

    #[test]
    fn test_consecutive_losses() {
        // 0.5^7 < 1% < 0.5^6
        assert_eq!(max_consecutive_losses(0.5, 4), TradeCount::Finite(7));
        // 0.7^13 ~= 0.97%
        assert_eq!(max_consecutive_losses(0.3, 10), TradeCount::Finite(13));
        assert_eq!(max_consecutive_losses(1.0, 4), TradeCount::Finite(0));
        assert_eq!(max_consecutive_losses(0.0, 4), TradeCount::Unbounded);
        assert_eq!(max_consecutive_losses(0.0, 0), TradeCount::Finite(0));
    }

    #[test]
    fn test_drawdown_from_losses_capped() {
        assert_eq!(
            max_drawdown_from_losses(TradeCount::Finite(7), 34.0, 1, 1100.0),
            238.0
        );
        assert_eq!(
            max_drawdown_from_losses(TradeCount::Finite(7), 34.0, 10, 1100.0),
            1100.0
        );
        // No limit configured
        assert_eq!(
            max_drawdown_from_losses(TradeCount::Finite(7), 34.0, 10, 0.0),
            2380.0
        );
        assert_eq!(
            max_drawdown_from_losses(TradeCount::Unbounded, 34.0, 1, 1100.0),
            1100.0
        );
        assert_eq!(
            max_drawdown_from_losses(TradeCount::Unbounded, 0.0, 1, 1100.0),
            0.0
        );
    }

    #[test]
    fn test_trades_to_daily_limit() {
        assert_eq!(
            trades_to_daily_limit(1100.0, 34.0, 1.35),
            TradeCount::Finite(31)
        );
        assert_eq!(trades_to_daily_limit(0.0, 34.0, 1.35), TradeCount::Unbounded);
        assert_eq!(trades_to_daily_limit(1100.0, 0.0, 1.35), TradeCount::Unbounded);
    }

    #[test]
    fn test_days_to_blow_account() {
        assert_eq!(days_to_blow_account(2000.0, 46.6), Horizon::Never);
        assert_eq!(days_to_blow_account(2000.0, 0.0), Horizon::Never);
        assert_eq!(days_to_blow_account(2000.0, -100.0), Horizon::Days(20.0));
    }

    #[test]
    fn test_risk_of_ruin_positive_edge() {
        let ror = risk_of_ruin(&ruin_inputs());
        assert!(ror > 0.0);
        assert!(ror < 1e-10);
    }

    #[test]
    fn test_risk_of_ruin_certain_cases() {
        let base = ruin_inputs();

        assert_eq!(risk_of_ruin(&RuinInputs { win_rate: 0.0, ..base }), 1.0);
        assert_eq!(risk_of_ruin(&RuinInputs { r_value: 0.0, ..base }), 1.0);
        assert_eq!(risk_of_ruin(&RuinInputs { expectancy: 0.0, ..base }), 1.0);
        assert_eq!(risk_of_ruin(&RuinInputs { expectancy: -5.0, ..base }), 1.0);
        // Drawdown smaller than a single loss
        assert_eq!(risk_of_ruin(&RuinInputs { max_drawdown: 20.0, ..base }), 1.0);
        assert_eq!(risk_of_ruin(&RuinInputs { num_accounts: 0, ..base }), 1.0);
        // q / (p * b) = 0.7 / 0.45, reached only with a positive dollar
        // expectancy since the earlier guard returns first otherwise
        assert_eq!(
            risk_of_ruin(&RuinInputs { win_rate: 0.3, r_value: 1.5, ..base }),
            1.0
        );
    }

    #[test]
    fn test_risk_of_ruin_grows_with_accounts() {
        let one = risk_of_ruin(&ruin_inputs());
        let many = risk_of_ruin(&RuinInputs { num_accounts: 20, ..ruin_inputs() });
        assert!(many > one);
        assert!(many <= 1.0);
    }

    #[test]
    fn test_recommended_contracts() {
        // 20 / (34 + 2.7) rounds down to 0, floored at 1
        assert_eq!(recommended_max_contracts(2000.0, 68.0, 0.5, 1.35), 1);
        // 1000 / (10 * 0.5 + 2.7) = 129.87
        assert_eq!(recommended_max_contracts(100_000.0, 10.0, 0.5, 1.35), 129);
        assert_eq!(recommended_max_contracts(2000.0, 0.0, 0.5, 0.0), 1);
    }
}
