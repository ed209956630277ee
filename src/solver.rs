//! Inverse of the curve's cost integral: bracketing + bisection

use crate::curves::Curve;
use crate::error::{AmmError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tuning knobs for [`solve_for_dx`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Absolute cost error accepted as a root; smaller targets are a no-op
    pub tolerance: f64,
    /// Bisection iteration budget
    pub max_iter: u32,
    /// First bracket width tried
    pub initial_step: f64,
    /// Bracket width beyond which the target is declared unreachable
    pub max_step: f64,
}
impl Default for SolverConfig {
    fn default() -> Self {
        Self { tolerance: 1e-12, max_iter: 200, initial_step: 1e-12, max_step: 1e20 }
    }
}

/// Outcome of a solve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Solution {
    /// Signed supply delta (positive buys, negative sells)
    pub dx: f64,
    /// Bisection steps taken
    pub iterations: u32,
    /// False when the budget ran out before reaching tolerance
    pub converged: bool,
}

/// Finds `dx` with `cost_to_move(x_start, x_start + dx) == target_cost`.
///
/// `cost_to_move` is monotonic in `dx` for any curve with non-negative
/// price, so once a bracket is found bisection always converges. Candidate
/// supply is clamped at zero and the returned `dx` points at the clamped
/// candidate, so `x_start + dx` is never negative.
///
/// Running out of iterations is not an error: the midpoint of the final
/// bracket is returned with `converged == false`.
pub fn solve_for_dx<C: Curve + ?Sized>(
    curve: &C,
    x_start: f64,
    target_cost: f64,
    cfg: &SolverConfig,
) -> Result<Solution> {
    if !x_start.is_finite() || x_start < 0.0 {
        return Err(AmmError::InvalidArgument(format!("x_start must be finite and ≥ 0 (got {x_start})")));
    }
    if !target_cost.is_finite() {
        return Err(AmmError::InvalidArgument(format!("target cost must be finite (got {target_cost})")));
    }
    if !(cfg.initial_step > 0.0 && cfg.initial_step.is_finite()) {
        return Err(AmmError::InvalidConfig(format!("initial_step must be finite and > 0 (got {})", cfg.initial_step)));
    }
    if target_cost.abs() < cfg.tolerance {
        return Ok(Solution { dx: 0.0, iterations: 0, converged: true });
    }

    let direction = if target_cost > 0.0 { 1.0 } else { -1.0 };
    let probe = |step: f64| (x_start + direction * step).max(0.0);
    let crossed = |cost: f64| if direction > 0.0 { cost >= target_cost } else { cost <= target_cost };

    let mut lower = 0.0_f64;
    let mut upper = cfg.initial_step;
    loop {
        let cost = curve.cost_to_move(x_start, probe(upper));
        if crossed(cost) { break; }
        upper *= 2.0;
        // a non-finite max_step would never trip the first test
        if upper > cfg.max_step || !upper.is_finite() {
            return Err(AmmError::Bracketing { x_start, target_cost, max_step: cfg.max_step });
        }
    }
    debug!(x_start, target_cost, upper, "bracketed");

    for i in 0..cfg.max_iter {
        let mid = 0.5 * (lower + upper);
        let x_mid = probe(mid);
        let cost_mid = curve.cost_to_move(x_start, x_mid);
        if (cost_mid - target_cost).abs() < cfg.tolerance {
            return Ok(Solution { dx: x_mid - x_start, iterations: i + 1, converged: true });
        }
        if crossed(cost_mid) { upper = mid; } else { lower = mid; }
    }

    let x_best = probe(0.5 * (lower + upper));
    let residual = curve.cost_to_move(x_start, x_best) - target_cost;
    warn!(
        x_start,
        target_cost,
        residual,
        max_iter = cfg.max_iter,
        "bisection budget exhausted, using best estimate"
    );
    Ok(Solution { dx: x_best - x_start, iterations: cfg.max_iter, converged: false })
}
