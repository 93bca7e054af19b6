//! Multi-target exit resolution
//!
//! Legs are filled in order against the position size. Once every contract in
//! the position has been assigned, later legs are ignored rather than scaled.

use crate::contracts::Instrument;
use crate::state::{InputState, TargetLeg};

/// Ticks and points a winning trade is assumed to exit at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitResolution {
    pub avg_exit_points: f64,
    pub avg_exit_ticks: f64,
    /// Ticks used for every downstream win calculation
    pub effective_ticks: f64,
}

/// Weighted average exit in points, consuming at most `capacity` contracts.
///
/// Returns `None` when no leg contributes any contracts.
pub fn weighted_average_exit(legs: &[TargetLeg], capacity: u32) -> Option<f64> {
    let mut total_points = 0.0;
    let mut used = 0u32;

    for leg in legs {
        if used >= capacity {
            break;
        }
        let contracts = leg.contracts.min(capacity - used);
        total_points += contracts as f64 * leg.points;
        used += contracts;
    }

    (used > 0).then(|| total_points / used as f64)
}

pub fn resolve_exit(state: &InputState, instrument: &Instrument) -> ExitResolution {
    let fallback_points = instrument.ticks_to_points(state.ticks_gained);

    if !state.targets.enabled {
        return ExitResolution {
            avg_exit_points: fallback_points,
            avg_exit_ticks: state.ticks_gained,
            effective_ticks: state.ticks_gained,
        };
    }

    let avg_exit_points =
        weighted_average_exit(&state.targets.legs, state.num_contracts).unwrap_or(fallback_points);
    let avg_exit_ticks = instrument.points_to_ticks(avg_exit_points);

    ExitResolution {
        avg_exit_points,
        avg_exit_ticks,
        effective_ticks: avg_exit_ticks,
    }
}
