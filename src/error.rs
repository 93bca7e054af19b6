//! Error types for the calculator

use thiserror::Error;

/// Errors surfaced by the calculator library.
///
/// None of these are fatal to metric computation: the engine always returns
/// a complete snapshot, these only come back from lookups, parsers and
/// explicit validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Contract symbol is not in the registry
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Prop firm key is not in the preset table
    #[error("unknown prop firm: {0}")]
    UnknownPropFirm(String),

    /// Target preset name is not recognised
    #[error("unknown target style: {0}")]
    UnknownTargetStyle(String),

    /// One or more input validation failures
    #[error("invalid input: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    /// Monte Carlo configuration cannot be run
    #[error("invalid simulation: {0}")]
    InvalidSimulation(String),
}

pub type Result<T> = std::result::Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_joins_messages() {
        let err = CalcError::InvalidInput(vec![
            "Ticks lost must be non-negative".to_string(),
            "Number of accounts must be greater than zero".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid input: Ticks lost must be non-negative; Number of accounts must be greater than zero"
        );
    }
}
