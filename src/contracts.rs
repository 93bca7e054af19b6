//! Futures contract registry
//!
//! Static specifications for the instruments the calculator supports.
//! Values are per contract; commission is a round trip.

use serde::Serialize;

use crate::error::{CalcError, Result};

/// Symbol selected when nothing (or something unknown) is requested
pub const DEFAULT_SYMBOL: &str = "MNQ";

/// Commission per round trip for E-mini and full-size contracts
const STANDARD_COMMISSION: f64 = 2.50;

/// Commission per round trip for micro contracts
const MICRO_COMMISSION: f64 = 1.35;

/// Futures instrument specification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: &'static str,
    pub name: &'static str,
    /// Dollar value of one tick
    pub tick_value: f64,
    /// Dollar value of one point (tick_value * ticks_per_point)
    pub point_value: f64,
    pub ticks_per_point: u32,
    pub tier: Tier,
    /// Round-trip commission for the tier
    pub default_commission: f64,
}

/// Contract size class; sets the default commission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Micro,
    Standard,
}

impl Tier {
    pub const fn commission(self) -> f64 {
        match self {
            Self::Micro => MICRO_COMMISSION,
            Self::Standard => STANDARD_COMMISSION,
        }
    }
}

impl Instrument {
    const fn new(
        symbol: &'static str,
        name: &'static str,
        tick_value: f64,
        point_value: f64,
        ticks_per_point: u32,
        tier: Tier,
    ) -> Self {
        Self {
            symbol,
            name,
            tick_value,
            point_value,
            ticks_per_point,
            tier,
            default_commission: tier.commission(),
        }
    }

    pub fn ticks_to_points(&self, ticks: f64) -> f64 {
        ticks / self.ticks_per_point as f64
    }

    pub fn points_to_ticks(&self, points: f64) -> f64 {
        points * self.ticks_per_point as f64
    }

    /// Dollar value of `ticks` across `contracts`
    pub fn ticks_to_amount(&self, ticks: f64, contracts: u32) -> f64 {
        ticks * self.tick_value * contracts as f64
    }

    pub fn is_micro(&self) -> bool {
        self.tier == Tier::Micro
    }
}

static CONTRACTS: [Instrument; 12] = [
    // Micro contracts
    Instrument::new("MNQ", "Micro E-mini Nasdaq-100", 0.50, 2.0, 4, Tier::Micro),
    Instrument::new("MES", "Micro E-mini S&P 500", 1.25, 5.0, 4, Tier::Micro),
    Instrument::new("MYM", "Micro E-mini Dow", 0.50, 0.50, 1, Tier::Micro),
    Instrument::new("M2K", "Micro E-mini Russell 2000", 0.50, 5.0, 10, Tier::Micro),
    Instrument::new("MCL", "Micro Crude Oil", 1.00, 100.0, 100, Tier::Micro),
    Instrument::new("MGC", "Micro Gold", 1.00, 10.0, 10, Tier::Micro),
    // E-mini contracts
    Instrument::new("ES", "E-mini S&P 500", 12.50, 50.0, 4, Tier::Standard),
    Instrument::new("NQ", "E-mini Nasdaq-100", 5.00, 20.0, 4, Tier::Standard),
    Instrument::new("YM", "E-mini Dow", 5.00, 5.0, 1, Tier::Standard),
    Instrument::new("RTY", "E-mini Russell 2000", 5.00, 50.0, 10, Tier::Standard),
    // Full-size contracts
    Instrument::new("CL", "Crude Oil", 10.00, 1000.0, 100, Tier::Standard),
    Instrument::new("GC", "Gold", 10.00, 100.0, 10, Tier::Standard),
];

/// Look up a contract by symbol (exact, case-sensitive)
pub fn lookup(symbol: &str) -> Result<&'static Instrument> {
    CONTRACTS
        .iter()
        .find(|c| c.symbol == symbol)
        .ok_or_else(|| CalcError::UnknownInstrument(symbol.to_string()))
}

/// Registry entry for [`DEFAULT_SYMBOL`]
pub fn default_instrument() -> &'static Instrument {
    // DEFAULT_SYMBOL is always present in CONTRACTS
    &CONTRACTS[0]
}

/// All registered contracts, micros first
pub fn all() -> impl Iterator<Item = &'static Instrument> {
    CONTRACTS.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_symbols() {
        let mnq = lookup("MNQ").unwrap();
        assert_eq!(mnq.tick_value, 0.50);
        assert_eq!(mnq.ticks_per_point, 4);
        assert_eq!(mnq.default_commission, 1.35);

        let cl = lookup("CL").unwrap();
        assert_eq!(cl.ticks_per_point, 100);
        assert_eq!(cl.tick_value, 10.0);
        assert_eq!(cl.default_commission, 2.50);
    }

    #[test]
    fn test_lookup_unknown_symbol() {
        assert_eq!(
            lookup("ZB"),
            Err(CalcError::UnknownInstrument("ZB".to_string()))
        );
        // Symbols are case-sensitive
        assert!(lookup("mnq").is_err());
    }

    #[test]
    fn test_point_value_matches_ticks() {
        for c in all() {
            let expected = c.tick_value * c.ticks_per_point as f64;
            assert!(
                (c.point_value - expected).abs() < 1e-9,
                "{} point value {} != {}",
                c.symbol,
                c.point_value,
                expected
            );
        }
    }

    #[test]
    fn test_micro_commission() {
        let micros: Vec<_> = all().filter(|c| c.is_micro()).map(|c| c.symbol).collect();
        assert_eq!(micros, vec!["MNQ", "MES", "MYM", "M2K", "MCL", "MGC"]);
        assert_eq!(all().count(), 12);
    }

    #[test]
    fn test_commission_follows_tier() {
        for c in all() {
            assert_eq!(c.default_commission, c.tier.commission(), "{}", c.symbol);
        }
        // Tier, not the commission value, decides micro status
        let custom = Instrument {
            default_commission: 0.0,
            ..lookup("MES").unwrap().clone()
        };
        assert!(custom.is_micro());
        assert!(!lookup("ES").unwrap().is_micro());
    }

    #[test]
    fn test_default_instrument() {
        assert_eq!(default_instrument().symbol, DEFAULT_SYMBOL);
    }

    #[test]
    fn test_conversions() {
        let nq = lookup("NQ").unwrap();
        assert_eq!(nq.ticks_to_points(10.0), 2.5);
        assert_eq!(nq.points_to_ticks(2.5), 10.0);
        assert_eq!(nq.ticks_to_amount(10.0, 2), 100.0);
    }
}
