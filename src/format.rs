//! Text rendering for metric values

use crate::engine::{Horizon, TradeCount};

/// US dollar amount with thousands separators: `$1,234.56`, `-$12.00`
///
/// Rounds to the nearest cent the way `{:.2}` does; amounts that round to
/// zero lose their sign, and non-finite input renders as `$0.00`.
pub fn format_currency(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{:.2}", amount.abs());
    // Rounding can turn tiny negatives into "0.00"
    let negative = amount < 0.0 && fixed != "0.00";

    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

/// `value` already in percent units, e.g. `format_percentage(34.26, 1)` -> `34.3%`
pub fn format_percentage(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.*}%", decimals, value)
}

/// Reward-to-risk as `1.76:1`
pub fn format_r_ratio(r_value: f64) -> String {
    format!("{:.2}:1", r_value)
}

pub fn format_horizon(horizon: Horizon) -> String {
    match horizon {
        Horizon::Days(days) => format!("{:.1} days", days),
        Horizon::Never => "never".to_string(),
    }
}

pub fn format_trade_count(count: TradeCount) -> String {
    match count {
        TradeCount::Finite(n) => n.to_string(),
        TradeCount::Unbounded => "unlimited".to_string(),
    }
}
