//! Error taxonomy for the trade engine

use thiserror::Error;

/// Errors raised by the curve, solver, fee layer and AMM engine.
///
/// Every variant is raised before any state is mutated, so a failed call
/// leaves the engine exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmmError {
    /// Negative or non-finite share count / currency amount.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The trade would take supply below zero.
    #[error("insufficient supply: trade needs {requested} shares, only {available} outstanding")]
    InsufficientSupply {
        /// Shares the trade would remove
        requested: f64,
        /// Shares currently outstanding
        available: f64,
    },

    /// Exponential bracket search hit its ceiling without crossing the target.
    #[error("failed to bracket dx: target cost {target_cost} unreachable from supply {x_start} (step reached {max_step:e})")]
    Bracketing {
        /// Supply the search started from
        x_start: f64,
        /// Signed cost the solver was asked to match
        target_cost: f64,
        /// Step ceiling that was exceeded
        max_step: f64,
    },

    /// Rejected engine / curve parameters.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A simulated buy-then-sell returned more than it invested.
    #[error("round-trip arbitrage: invested {invested}, recovered {proceeds}")]
    Arbitrage {
        /// Currency spent on the buy leg
        invested: f64,
        /// Currency received on the sell leg
        proceeds: f64,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AmmError>;

pub(crate) fn require_non_negative(what: &str, v: f64) -> Result<()> {
    if !v.is_finite() {
        return Err(AmmError::InvalidArgument(format!("{what} must be finite (got {v})")));
    }
    if v < 0.0 {
        return Err(AmmError::InvalidArgument(format!("{what} must be non-negative (got {v})")));
    }
    Ok(())
}
