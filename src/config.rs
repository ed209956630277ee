//! Engine configuration: curve choice, fee, quanta and solver tuning

use crate::amm::BondingCurveAmm;
use crate::curves::{AnyCurve, CurveKind, DEFAULT_SCALE};
use crate::error::{AmmError, Result};
use crate::fees::{FeeSchedule, DEFAULT_QUANTA};
use crate::solver::SolverConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to stand up an engine.
///
/// Missing JSON fields take their defaults: sqrt curve, scale 500 000,
/// no fee, quanta 1e-8.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmmConfig {
    /// Curve family
    pub curve: CurveKind,
    /// Curve shape parameter
    pub scale: f64,
    /// Proportional fee, `[0, 1)`
    pub fee_rate: f64,
    /// Smallest currency unit
    pub quanta: f64,
    /// Bisection tuning
    pub solver: SolverConfig,
}

impl Default for AmmConfig {
    fn default() -> Self {
        Self {
            curve: CurveKind::default(),
            scale: DEFAULT_SCALE,
            fee_rate: 0.0,
            quanta: DEFAULT_QUANTA,
            solver: SolverConfig::default(),
        }
    }
}

impl AmmConfig {
    /// Parses a JSON document
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(s).context("parsing AMM config JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// Checks parameter ranges without building anything
    pub fn validate(&self) -> Result<()> {
        self.curve.with_scale(self.scale)?;
        FeeSchedule::new(self.fee_rate, self.quanta)?;
        let s = &self.solver;
        if !(s.tolerance.is_finite() && s.tolerance > 0.0) {
            return Err(AmmError::InvalidConfig(format!("solver.tolerance must be > 0 (got {})", s.tolerance)));
        }
        if !(s.initial_step > 0.0 && s.initial_step < s.max_step && s.max_step.is_finite()) {
            return Err(AmmError::InvalidConfig(format!(
                "solver steps must satisfy 0 < initial_step < max_step < ∞ (got {} / {})",
                s.initial_step, s.max_step
            )));
        }
        Ok(())
    }

    /// Builds an empty engine over the configured curve
    pub fn build(&self) -> Result<BondingCurveAmm<AnyCurve>> {
        self.validate()?;
        let curve = self.curve.with_scale(self.scale)?;
        let fees = FeeSchedule::new(self.fee_rate, self.quanta)?;
        Ok(BondingCurveAmm::with_fees(curve, fees).with_solver(self.solver))
    }
}
