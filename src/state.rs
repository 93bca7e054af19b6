//! Calculator input state
//!
//! The single mutable record the caller owns. Everything in
//! [`crate::engine::DerivedMetrics`] is recomputed from this on demand.

use serde::{Deserialize, Serialize};

use crate::contracts::{self, Instrument, DEFAULT_SYMBOL};
use crate::error::{CalcError, Result};
use crate::presets::PropFirm;

/// Number of exit legs in the target simulation
pub const TARGET_LEGS: usize = 3;

/// One partial-exit leg: `contracts` closed at `points` of profit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLeg {
    pub contracts: u32,
    pub points: f64,
}

impl TargetLeg {
    pub const fn new(contracts: u32, points: f64) -> Self {
        Self { contracts, points }
    }
}

/// Multi-target exit overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSimulation {
    pub enabled: bool,
    pub legs: [TargetLeg; TARGET_LEGS],
}

impl Default for TargetSimulation {
    fn default() -> Self {
        Self {
            enabled: false,
            legs: [
                TargetLeg::new(0, 10.0),
                TargetLeg::new(0, 20.0),
                TargetLeg::new(0, 40.0),
            ],
        }
    }
}

impl TargetSimulation {
    /// Sum of contracts allocated across all legs (may exceed position size)
    pub fn total_contracts(&self) -> u32 {
        self.legs.iter().map(|l| l.contracts).sum()
    }
}

/// Breakeven-stop overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakevenSimulation {
    pub enabled: bool,
    /// Profit in points at which the stop moves to entry
    pub trigger_points: f64,
    /// Probability a trade that reaches the trigger still closes as a full win
    pub win_rate: f64,
}

impl Default for BreakevenSimulation {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger_points: 10.0,
            win_rate: 0.30,
        }
    }
}

/// User-supplied trade statistics and account settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputState {
    /// Registry symbol, e.g. "MNQ"
    pub contract: String,
    pub winning_trades: u32,
    pub losing_trades: u32,
    /// Average ticks captured on a winner
    pub ticks_gained: f64,
    /// Average ticks given up on a loser
    pub ticks_lost: f64,
    pub num_contracts: u32,
    pub num_accounts: u32,
    pub commission_per_round_trip: f64,

    pub prop_firm: PropFirm,
    pub profit_target: f64,
    pub daily_loss_limit: f64,
    pub max_drawdown: f64,

    /// Projection horizons
    pub trading_days_per_month: u32,
    pub custom_days: u32,

    pub targets: TargetSimulation,
    pub breakeven: BreakevenSimulation,

    pub show_detailed_view: bool,
}

impl Default for InputState {
    fn default() -> Self {
        let instrument = contracts::default_instrument();
        let rules = PropFirm::Custom.rules();
        Self {
            contract: DEFAULT_SYMBOL.to_string(),
            winning_trades: 2,
            losing_trades: 2,
            ticks_gained: 120.0,
            ticks_lost: 68.0,
            num_contracts: 1,
            num_accounts: 1,
            commission_per_round_trip: instrument.default_commission,
            prop_firm: PropFirm::Custom,
            profit_target: rules.profit_target,
            daily_loss_limit: rules.daily_loss_limit,
            max_drawdown: rules.max_drawdown,
            trading_days_per_month: 21,
            custom_days: 235,
            targets: TargetSimulation::default(),
            breakeven: BreakevenSimulation::default(),
            show_detailed_view: false,
        }
    }
}

impl InputState {
    /// Registry entry for the selected contract
    pub fn instrument(&self) -> Result<&'static Instrument> {
        contracts::lookup(&self.contract)
    }

    /// Switch contract and reset commission to that contract's default.
    /// Unknown symbols leave the state untouched.
    pub fn select_contract(&mut self, symbol: &str) -> Result<()> {
        let instrument = contracts::lookup(symbol)?;
        self.contract = instrument.symbol.to_string();
        self.commission_per_round_trip = instrument.default_commission;
        Ok(())
    }

    pub fn total_trades(&self) -> u32 {
        self.winning_trades.saturating_add(self.losing_trades)
    }

    /// Human-readable validation failures; empty when the state is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if contracts::lookup(&self.contract).is_err() {
            errors.push(format!("Unknown contract symbol: {}", self.contract));
        }
        if self.total_trades() == 0 {
            errors.push("Total trades must be greater than zero".to_string());
        }
        if !is_non_negative(self.ticks_gained) {
            errors.push("Ticks gained must be non-negative".to_string());
        }
        if !is_non_negative(self.ticks_lost) {
            errors.push("Ticks lost must be non-negative".to_string());
        }
        if self.num_contracts == 0 {
            errors.push("Number of contracts must be greater than zero".to_string());
        }
        if self.num_accounts == 0 {
            errors.push("Number of accounts must be greater than zero".to_string());
        }
        if !is_non_negative(self.commission_per_round_trip) {
            errors.push("Commission must be non-negative".to_string());
        }
        if !is_non_negative(self.profit_target) {
            errors.push("Profit target must be non-negative".to_string());
        }
        if !is_non_negative(self.daily_loss_limit) {
            errors.push("Daily loss limit must be non-negative".to_string());
        }
        if !is_non_negative(self.max_drawdown) {
            errors.push("Max drawdown must be non-negative".to_string());
        }
        if self.targets.legs.iter().any(|l| !l.points.is_finite()) {
            errors.push("Target points must be finite".to_string());
        }
        if !is_non_negative(self.breakeven.trigger_points) {
            errors.push("Breakeven trigger must be non-negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.breakeven.win_rate) {
            errors.push("Breakeven win rate must be between 0 and 1".to_string());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validation as a `Result`, for callers that want to bail early
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CalcError::InvalidInput(errors))
        }
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
