// Library crate - calculator engine, presets, share links and the HTTP API

pub mod api;
pub mod contracts;
pub mod engine;
pub mod error;
pub mod format;
pub mod presets;
pub mod share;
pub mod simulation;
pub mod state;

// Re-export commonly used types
pub use contracts::Instrument;
pub use engine::{compute_metrics, DerivedMetrics, Horizon, TradeCount};
pub use error::{CalcError, Result};
pub use presets::{PropFirm, PropFirmRules, TargetStyle};
pub use state::InputState;
