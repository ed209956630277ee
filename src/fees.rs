//! Currency quantization ("breakage") and proportional fees

use crate::error::{AmmError, Result};
use serde::Serialize;

/// Smallest currency denomination used when none is configured.
pub const DEFAULT_QUANTA: f64 = 1e-8;

/// Fee rate plus currency granularity.
///
/// Amounts are always snapped to whole quanta in the pool's favour; the
/// leftover fraction ("breakage") is kept as an extra fee. The proportional
/// fee is charged on the quantized amount, never on breakage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FeeSchedule {
    fee_rate: f64,
    quanta: f64,
}

/// An amount floored to whole quanta with its fee split out
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Quantized {
    /// Whole quanta kept
    pub quanta_used: f64,
    /// quanta_used · quanta
    pub gross: f64,
    /// Fraction below one quantum, forfeited
    pub breakage: f64,
    /// gross · fee_rate
    pub fee: f64,
    /// gross − fee
    pub net: f64,
}

/// A payment rounded up so that its after-fee part covers a required amount
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Covered {
    /// required / (1 − fee_rate), before rounding
    pub ideal_total: f64,
    /// Whole quanta charged
    pub quanta_used: f64,
    /// quanta_used · quanta
    pub total_paid: f64,
    /// Overpayment caused by rounding up
    pub breakage: f64,
    /// total_paid · fee_rate
    pub fee: f64,
}

impl FeeSchedule {
    /// Validates `fee_rate ∈ [0, 1)` and `quanta > 0`
    pub fn new(fee_rate: f64, quanta: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&fee_rate) {
            return Err(AmmError::InvalidConfig(format!("fee_rate must be in [0, 1) (got {fee_rate})")));
        }
        if !quanta.is_finite() || quanta <= 0.0 {
            return Err(AmmError::InvalidConfig(format!("quanta must be finite and > 0 (got {quanta})")));
        }
        Ok(Self { fee_rate, quanta })
    }

    /// Proportional fee rate
    pub fn fee_rate(&self) -> f64 { self.fee_rate }
    /// Smallest currency unit
    pub fn quanta(&self) -> f64 { self.quanta }

    /// Whole quanta contained in `amount` (rounded down).
    ///
    /// Counts are kept as `f64` so they do not saturate past `u64::MAX` quanta.
    pub fn floor_quanta(&self, amount: f64) -> f64 {
        if amount > 0.0 { (amount / self.quanta).floor() } else { 0.0 }
    }

    /// Whole quanta needed to reach `amount` (rounded up)
    pub fn ceil_quanta(&self, amount: f64) -> f64 {
        if amount > 0.0 { (amount / self.quanta).ceil() } else { 0.0 }
    }

    /// Floors `amount` to whole quanta and charges the fee on the remainder.
    ///
    /// Used both for currency paid in (buys) and curve proceeds paid out
    /// (sells): the pool never hands over a fractional quantum.
    pub fn quantize(&self, amount: f64) -> Quantized {
        let quanta_used = self.floor_quanta(amount);
        let gross = quanta_used * self.quanta;
        let breakage = (amount - gross).max(0.0);
        let fee = gross * self.fee_rate;
        Quantized { quanta_used, gross, breakage, fee, net: gross - fee }
    }

    /// Smallest whole-quanta payment whose after-fee part is at least `required`.
    pub fn cover(&self, required: f64) -> Covered {
        let ideal_total = required.max(0.0) / (1.0 - self.fee_rate);
        let quanta_used = self.ceil_quanta(ideal_total);
        let total_paid = quanta_used * self.quanta;
        let breakage = (total_paid - ideal_total).max(0.0);
        Covered { ideal_total, quanta_used, total_paid, breakage, fee: total_paid * self.fee_rate }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self { Self { fee_rate: 0.0, quanta: DEFAULT_QUANTA } }
}
