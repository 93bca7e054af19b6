//! Bulk state presets
//!
//! - Target distributions: split the position across the three exit legs at
//!   fixed R-multiples of the stop
//! - Prop firm accounts: profit target, daily loss limit and max drawdown

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contracts::Instrument;
use crate::error::CalcError;
use crate::state::{InputState, TargetLeg};

// ============================================================================
// Target presets
// ============================================================================

/// Exit distribution style for the target simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStyle {
    /// 60% at 1R, 30% at 2R, 10% at 3R
    Conservative,
    /// 40% at 1.5R, 40% at 2.5R, 20% at 4R
    Moderate,
    /// 20% at 2R, 30% at 3R, 50% at 5R
    Aggressive,
}

/// How a leg's fractional contract count is rounded
#[derive(Debug, Clone, Copy)]
enum Rounding {
    Ceil,
    Floor,
}

impl Rounding {
    fn apply(self, value: f64) -> u32 {
        match self {
            Self::Ceil => value.ceil() as u32,
            Self::Floor => value.floor() as u32,
        }
    }
}

struct TargetPlan {
    leg1: (f64, Rounding),
    leg2: (f64, Rounding),
    r_multiples: [f64; 3],
}

impl TargetStyle {
    pub const ALL: [TargetStyle; 3] = [Self::Conservative, Self::Moderate, Self::Aggressive];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }

    fn plan(&self) -> TargetPlan {
        match self {
            Self::Conservative => TargetPlan {
                leg1: (0.6, Rounding::Ceil),
                leg2: (0.3, Rounding::Floor),
                r_multiples: [1.0, 2.0, 3.0],
            },
            Self::Moderate => TargetPlan {
                leg1: (0.4, Rounding::Ceil),
                leg2: (0.4, Rounding::Ceil),
                r_multiples: [1.5, 2.5, 4.0],
            },
            Self::Aggressive => TargetPlan {
                leg1: (0.2, Rounding::Ceil),
                leg2: (0.3, Rounding::Floor),
                r_multiples: [2.0, 3.0, 5.0],
            },
        }
    }
}

impl fmt::Display for TargetStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetStyle {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.name() == s)
            .ok_or_else(|| CalcError::UnknownTargetStyle(s.to_string()))
    }
}

/// Spread the position across the three target legs.
///
/// Leg 3 absorbs the rounding remainder. Leg points are R-multiples of the
/// stop distance, rounded to whole points. No-op for a zero position.
pub fn apply_target_preset(style: TargetStyle, state: &mut InputState, instrument: &Instrument) {
    let total = state.num_contracts;
    if total == 0 {
        return;
    }

    let plan = style.plan();
    let leg1 = plan.leg1.1.apply(total as f64 * plan.leg1.0).min(total);
    let leg2 = plan.leg2.1.apply(total as f64 * plan.leg2.0).min(total - leg1);
    let leg3 = total - leg1 - leg2;

    let stop_points = instrument.ticks_to_points(state.ticks_lost);
    let points = plan.r_multiples.map(|r| (stop_points * r).round());

    state.targets.legs = [
        TargetLeg::new(leg1, points[0]),
        TargetLeg::new(leg2, points[1]),
        TargetLeg::new(leg3, points[2]),
    ];

    debug!(
        "Applied {} targets: {}@{} / {}@{} / {}@{}",
        style, leg1, points[0], leg2, points[1], leg3, points[2]
    );
}

// ============================================================================
// Prop firm presets
// ============================================================================

/// Account rules for a funded evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropFirmRules {
    pub profit_target: f64,
    pub daily_loss_limit: f64,
    pub max_drawdown: f64,
}

impl PropFirmRules {
    const fn new(profit_target: f64, daily_loss_limit: f64, max_drawdown: f64) -> Self {
        Self {
            profit_target,
            daily_loss_limit,
            max_drawdown,
        }
    }
}

/// Prop firm account selection. `Custom` keeps user-entered values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum PropFirm {
    Custom,
    Topstep50k,
    Topstep100k,
    Topstep150k,
    Elite25k,
    Elite50k,
    Elite100k,
    Elite150k,
    TakeProfit25k,
    TakeProfit50k,
    TakeProfit100k,
    Mff25k,
    Mff50k,
    Mff100k,
    Mff150k,
    BlueSky25k,
    BlueSky50k,
    BlueSky100k,
}

static PROP_FIRMS: [(PropFirm, &str, PropFirmRules); 18] = [
    (PropFirm::Custom, "custom", PropFirmRules::new(6000.0, 1100.0, 2000.0)),
    // TopStep
    (PropFirm::Topstep50k, "topstep_50k", PropFirmRules::new(3000.0, 1100.0, 2000.0)),
    (PropFirm::Topstep100k, "topstep_100k", PropFirmRules::new(6000.0, 2200.0, 3000.0)),
    (PropFirm::Topstep150k, "topstep_150k", PropFirmRules::new(9000.0, 3300.0, 4500.0)),
    // Elite Trader Funding
    (PropFirm::Elite25k, "elite_25k", PropFirmRules::new(1500.0, 500.0, 1500.0)),
    (PropFirm::Elite50k, "elite_50k", PropFirmRules::new(2750.0, 1100.0, 2500.0)),
    (PropFirm::Elite100k, "elite_100k", PropFirmRules::new(6000.0, 2200.0, 3000.0)),
    (PropFirm::Elite150k, "elite_150k", PropFirmRules::new(9000.0, 3300.0, 4500.0)),
    // TakeProfit Trader
    (PropFirm::TakeProfit25k, "takeprofit_25k", PropFirmRules::new(1500.0, 500.0, 1500.0)),
    (PropFirm::TakeProfit50k, "takeprofit_50k", PropFirmRules::new(3000.0, 1100.0, 2000.0)),
    (PropFirm::TakeProfit100k, "takeprofit_100k", PropFirmRules::new(6000.0, 2200.0, 3000.0)),
    // My Funded Futures
    (PropFirm::Mff25k, "mff_25k", PropFirmRules::new(1250.0, 375.0, 1500.0)),
    (PropFirm::Mff50k, "mff_50k", PropFirmRules::new(2500.0, 1100.0, 2500.0)),
    (PropFirm::Mff100k, "mff_100k", PropFirmRules::new(5000.0, 2200.0, 4000.0)),
    (PropFirm::Mff150k, "mff_150k", PropFirmRules::new(7500.0, 3300.0, 6000.0)),
    // BlueSky Trading
    (PropFirm::BlueSky25k, "bluesky_25k", PropFirmRules::new(1500.0, 500.0, 1500.0)),
    (PropFirm::BlueSky50k, "bluesky_50k", PropFirmRules::new(3000.0, 1100.0, 2500.0)),
    (PropFirm::BlueSky100k, "bluesky_100k", PropFirmRules::new(6250.0, 2200.0, 5000.0)),
];

impl PropFirm {
    fn entry(&self) -> &'static (PropFirm, &'static str, PropFirmRules) {
        // Every variant has exactly one row in PROP_FIRMS
        &PROP_FIRMS[*self as usize]
    }

    /// Share-link key, e.g. "topstep_50k"
    pub fn key(&self) -> &'static str {
        self.entry().1
    }

    pub fn rules(&self) -> PropFirmRules {
        self.entry().2
    }

    pub fn from_key(key: &str) -> Option<Self> {
        PROP_FIRMS.iter().find(|(_, k, _)| *k == key).map(|(firm, _, _)| *firm)
    }

    /// All firms in table order, `Custom` first
    pub fn all() -> impl Iterator<Item = PropFirm> {
        PROP_FIRMS.iter().map(|(firm, _, _)| *firm)
    }
}

impl fmt::Display for PropFirm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PropFirm {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| CalcError::UnknownPropFirm(s.to_string()))
    }
}

impl From<PropFirm> for &'static str {
    fn from(firm: PropFirm) -> Self {
        firm.key()
    }
}

impl TryFrom<String> for PropFirm {
    type Error = CalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Select a prop firm account and load its rules.
///
/// `Custom` only records the selection; the user's own target, limit and
/// drawdown are preserved.
pub fn apply_prop_firm_preset(firm: PropFirm, state: &mut InputState) {
    state.prop_firm = firm;
    if firm == PropFirm::Custom {
        return;
    }

    let rules = firm.rules();
    state.profit_target = rules.profit_target;
    state.daily_loss_limit = rules.daily_loss_limit;
    state.max_drawdown = rules.max_drawdown;

    debug!(
        "Applied {} rules: target ${}, daily limit ${}, max DD ${}",
        firm, rules.profit_target, rules.daily_loss_limit, rules.max_drawdown
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts;

    fn contracts_per_leg(state: &InputState) -> [u32; 3] {
        state.targets.legs.map(|l| l.contracts)
    }

    fn points_per_leg(state: &InputState) -> [f64; 3] {
        state.targets.legs.map(|l| l.points)
    }

    #[test]
    fn test_conservative_split() {
        let mnq = contracts::lookup("MNQ").unwrap();
        let mut state = InputState {
            num_contracts: 10,
            ticks_lost: 40.0,
            ..Default::default()
        };

        apply_target_preset(TargetStyle::Conservative, &mut state, mnq);
        assert_eq!(contracts_per_leg(&state), [6, 3, 1]);
        // 40 ticks = 10 points of risk
        assert_eq!(points_per_leg(&state), [10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_moderate_split() {
        let mnq = contracts::lookup("MNQ").unwrap();
        let mut state = InputState {
            num_contracts: 5,
            ticks_lost: 40.0,
            ..Default::default()
        };

        apply_target_preset(TargetStyle::Moderate, &mut state, mnq);
        assert_eq!(contracts_per_leg(&state), [2, 2, 1]);
        assert_eq!(points_per_leg(&state), [15.0, 25.0, 40.0]);
    }

    #[test]
    fn test_aggressive_split() {
        let mnq = contracts::lookup("MNQ").unwrap();
        let mut state = InputState {
            num_contracts: 10,
            ticks_lost: 68.0,
            ..Default::default()
        };

        apply_target_preset(TargetStyle::Aggressive, &mut state, mnq);
        assert_eq!(contracts_per_leg(&state), [2, 3, 5]);
        // 68 ticks = 17 points
        assert_eq!(points_per_leg(&state), [34.0, 51.0, 85.0]);
    }

    #[test]
    fn test_small_positions_never_overallocate() {
        let mnq = contracts::lookup("MNQ").unwrap();
        for style in TargetStyle::ALL {
            for total in 1..=12u32 {
                let mut state = InputState {
                    num_contracts: total,
                    ..Default::default()
                };
                apply_target_preset(style, &mut state, mnq);
                assert_eq!(state.targets.total_contracts(), total, "{style} with {total}");
            }
        }

        // One contract all goes to the first leg
        let mut single = InputState::default();
        apply_target_preset(TargetStyle::Moderate, &mut single, mnq);
        assert_eq!(contracts_per_leg(&single), [1, 0, 0]);
    }

    #[test]
    fn test_zero_position_is_noop() {
        let mnq = contracts::lookup("MNQ").unwrap();
        let mut state = InputState {
            num_contracts: 0,
            ..Default::default()
        };
        let before = state.clone();

        apply_target_preset(TargetStyle::Aggressive, &mut state, mnq);
        assert_eq!(state, before);
    }

    #[test]
    fn test_target_style_parse() {
        assert_eq!("moderate".parse::<TargetStyle>(), Ok(TargetStyle::Moderate));
        assert_eq!(
            "breakout".parse::<TargetStyle>(),
            Err(CalcError::UnknownTargetStyle("breakout".to_string()))
        );
    }

    #[test]
    fn test_prop_firm_table_order() {
        // Discriminant indexes the table
        for (i, firm) in PropFirm::all().enumerate() {
            assert_eq!(firm as usize, i);
            assert_eq!(PropFirm::from_key(firm.key()), Some(firm));
        }
        assert_eq!(PropFirm::all().count(), 18);
    }

    #[test]
    fn test_apply_prop_firm() {
        let mut state = InputState::default();
        apply_prop_firm_preset(PropFirm::Mff150k, &mut state);

        assert_eq!(state.prop_firm, PropFirm::Mff150k);
        assert_eq!(state.profit_target, 7500.0);
        assert_eq!(state.daily_loss_limit, 3300.0);
        assert_eq!(state.max_drawdown, 6000.0);
    }

    #[test]
    fn test_custom_preserves_user_values() {
        let mut state = InputState {
            prop_firm: PropFirm::Elite50k,
            profit_target: 1234.0,
            daily_loss_limit: 321.0,
            max_drawdown: 999.0,
            ..Default::default()
        };

        apply_prop_firm_preset(PropFirm::Custom, &mut state);
        assert_eq!(state.prop_firm, PropFirm::Custom);
        assert_eq!(state.profit_target, 1234.0);
        assert_eq!(state.daily_loss_limit, 321.0);
        assert_eq!(state.max_drawdown, 999.0);
    }

    #[test]
    fn test_prop_firm_serde_uses_keys() {
        let json = serde_json::to_string(&PropFirm::TakeProfit100k).unwrap();
        assert_eq!(json, "\"takeprofit_100k\"");

        let parsed: PropFirm = serde_json::from_str("\"bluesky_25k\"").unwrap();
        assert_eq!(parsed, PropFirm::BlueSky25k);
        assert!(serde_json::from_str::<PropFirm>("\"apex_50k\"").is_err());
    }
}
