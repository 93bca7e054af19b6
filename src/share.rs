//! Shareable link encoding
//!
//! Maps [`InputState`] to a flat, ordered set of short string keys and back.
//! Decoding is total: anything missing or malformed falls back to the value a
//! fresh state would have, so a hand-edited or truncated link still loads.

use serde::Deserialize;
use tracing::debug;

use crate::contracts::{self, DEFAULT_SYMBOL};
use crate::presets::PropFirm;
use crate::state::{BreakevenSimulation, InputState, TargetLeg, TargetSimulation, TARGET_LEGS};

// Parameter keys, in encoding order
pub const CONTRACT: &str = "c";
pub const WINNING_TRADES: &str = "wt";
pub const LOSING_TRADES: &str = "lt";
pub const TICKS_GAINED: &str = "tg";
pub const TICKS_LOST: &str = "tl";
pub const NUM_CONTRACTS: &str = "nc";
pub const NUM_ACCOUNTS: &str = "na";
pub const COMMISSION: &str = "cr";
pub const PROP_FIRM: &str = "pf";
pub const PROFIT_TARGET: &str = "pt";
pub const DAILY_LOSS_LIMIT: &str = "dl";
pub const MAX_DRAWDOWN: &str = "md";
pub const TRADING_DAYS_PER_MONTH: &str = "tdm";
pub const CUSTOM_DAYS: &str = "cd";
pub const USE_TARGET_SIM: &str = "ts";
pub const TARGET_CONTRACTS: [&str; TARGET_LEGS] = ["t1c", "t2c", "t3c"];
pub const TARGET_POINTS: [&str; TARGET_LEGS] = ["t1p", "t2p", "t3p"];
pub const USE_BREAKEVEN: &str = "bes";
pub const BREAKEVEN_TRIGGER: &str = "btp";
pub const BREAKEVEN_WIN_RATE: &str = "bwr";
pub const DETAILED_VIEW: &str = "dv";

/// Ordered key/value pairs, as carried in a URL query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct ParamSet {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for ParamSet {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` query string, pairs in order
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(&self.pairs).unwrap_or_else(|e| {
            debug!("Failed to encode share params: {}", e);
            String::new()
        })
    }

    /// Parse a query string, with or without the leading `?`.
    /// Pairs without `=` get an empty value; unparseable input yields no pairs.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .map(Self::from)
            .unwrap_or_else(|e| {
                debug!("Ignoring malformed query string: {}", e);
                Self::default()
            })
    }
}

/// Encode every field of `state` in the fixed key order.
pub fn encode(state: &InputState) -> ParamSet {
    let mut params = ParamSet::new();

    params.push(CONTRACT, state.contract.as_str());
    params.push(WINNING_TRADES, state.winning_trades.to_string());
    params.push(LOSING_TRADES, state.losing_trades.to_string());
    params.push(TICKS_GAINED, state.ticks_gained.to_string());
    params.push(TICKS_LOST, state.ticks_lost.to_string());
    params.push(NUM_CONTRACTS, state.num_contracts.to_string());
    params.push(NUM_ACCOUNTS, state.num_accounts.to_string());
    params.push(COMMISSION, state.commission_per_round_trip.to_string());
    params.push(PROP_FIRM, state.prop_firm.key());
    params.push(PROFIT_TARGET, state.profit_target.to_string());
    params.push(DAILY_LOSS_LIMIT, state.daily_loss_limit.to_string());
    params.push(MAX_DRAWDOWN, state.max_drawdown.to_string());
    params.push(TRADING_DAYS_PER_MONTH, state.trading_days_per_month.to_string());
    params.push(CUSTOM_DAYS, state.custom_days.to_string());

    params.push(USE_TARGET_SIM, flag(state.targets.enabled));
    for (i, leg) in state.targets.legs.iter().enumerate() {
        params.push(TARGET_CONTRACTS[i], leg.contracts.to_string());
        params.push(TARGET_POINTS[i], leg.points.to_string());
    }

    params.push(USE_BREAKEVEN, flag(state.breakeven.enabled));
    params.push(BREAKEVEN_TRIGGER, state.breakeven.trigger_points.to_string());
    params.push(BREAKEVEN_WIN_RATE, state.breakeven.win_rate.to_string());

    params.push(DETAILED_VIEW, flag(state.show_detailed_view));

    params
}

/// Rebuild a state from parameters. Never fails.
pub fn decode(params: &ParamSet) -> InputState {
    let defaults = InputState::default();
    let reader = Reader { params };

    let instrument = match params.get(CONTRACT) {
        Some(symbol) => contracts::lookup(symbol).unwrap_or_else(|_| {
            debug!("Unknown contract '{}' in link, using {}", symbol, DEFAULT_SYMBOL);
            contracts::default_instrument()
        }),
        None => contracts::default_instrument(),
    };

    let prop_firm = match params.get(PROP_FIRM) {
        Some(key) => PropFirm::from_key(key).unwrap_or_else(|| {
            debug!("Unknown prop firm '{}' in link, using custom", key);
            PropFirm::Custom
        }),
        None => PropFirm::Custom,
    };
    // Links without explicit limits take the selected firm's rules
    let rules = prop_firm.rules();

    let default_legs = defaults.targets.legs;
    let mut legs = default_legs;
    for (i, leg) in legs.iter_mut().enumerate() {
        *leg = TargetLeg::new(
            reader.count(TARGET_CONTRACTS[i], default_legs[i].contracts),
            reader.finite(TARGET_POINTS[i], default_legs[i].points),
        );
    }

    let mut winning_trades = reader.count(WINNING_TRADES, defaults.winning_trades);
    let mut losing_trades = reader.count(LOSING_TRADES, defaults.losing_trades);
    if winning_trades == 0 && losing_trades == 0 {
        debug!("Link has no trades, using default counts");
        winning_trades = defaults.winning_trades;
        losing_trades = defaults.losing_trades;
    }

    InputState {
        contract: instrument.symbol.to_string(),
        winning_trades,
        losing_trades,
        ticks_gained: reader.non_negative(TICKS_GAINED, defaults.ticks_gained),
        ticks_lost: reader.non_negative(TICKS_LOST, defaults.ticks_lost),
        num_contracts: reader.positive_count(NUM_CONTRACTS, defaults.num_contracts),
        num_accounts: reader.positive_count(NUM_ACCOUNTS, defaults.num_accounts),
        commission_per_round_trip: reader.non_negative(COMMISSION, instrument.default_commission),
        prop_firm,
        profit_target: reader.non_negative(PROFIT_TARGET, rules.profit_target),
        daily_loss_limit: reader.non_negative(DAILY_LOSS_LIMIT, rules.daily_loss_limit),
        max_drawdown: reader.non_negative(MAX_DRAWDOWN, rules.max_drawdown),
        trading_days_per_month: reader
            .count(TRADING_DAYS_PER_MONTH, defaults.trading_days_per_month),
        custom_days: reader.count(CUSTOM_DAYS, defaults.custom_days),
        targets: TargetSimulation {
            enabled: reader.flag(USE_TARGET_SIM),
            legs,
        },
        breakeven: BreakevenSimulation {
            enabled: reader.flag(USE_BREAKEVEN),
            trigger_points: reader.non_negative(BREAKEVEN_TRIGGER, defaults.breakeven.trigger_points),
            win_rate: reader.probability(BREAKEVEN_WIN_RATE, defaults.breakeven.win_rate),
        },
        show_detailed_view: reader.flag(DETAILED_VIEW),
    }
}

/// Full shareable link for `state` under `base_url`
pub fn share_url(base_url: &str, state: &InputState) -> String {
    format!("{}?{}", base_url.trim_end_matches('?'), encode(state).to_query_string())
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Typed lookups with explicit fallback
struct Reader<'a> {
    params: &'a ParamSet,
}

impl Reader<'_> {
    fn parsed<T: std::str::FromStr>(&self, key: &str, accept: impl Fn(&T) -> bool) -> Option<T> {
        let raw = self.params.get(key)?;
        match raw.trim().parse::<T>() {
            Ok(value) if accept(&value) => Some(value),
            _ => {
                debug!("Ignoring malformed '{}' value '{}'", key, raw);
                None
            }
        }
    }

    fn count(&self, key: &str, default: u32) -> u32 {
        self.parsed(key, |_: &u32| true).unwrap_or(default)
    }

    fn positive_count(&self, key: &str, default: u32) -> u32 {
        self.parsed(key, |v: &u32| *v >= 1).unwrap_or(default)
    }

    fn finite(&self, key: &str, default: f64) -> f64 {
        self.parsed(key, |v: &f64| v.is_finite()).unwrap_or(default)
    }

    fn non_negative(&self, key: &str, default: f64) -> f64 {
        self.parsed(key, |v: &f64| v.is_finite() && *v >= 0.0)
            .unwrap_or(default)
    }

    fn probability(&self, key: &str, default: f64) -> f64 {
        self.parsed(key, |v: &f64| (0.0..=1.0).contains(v))
            .unwrap_or(default)
    }

    fn flag(&self, key: &str) -> bool {
        self.params.get(key) == Some("1")
    }
}
