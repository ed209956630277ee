//! Verification tools for curve properties and numerical accuracy

use crate::curves::{Curve, CurveKind};
use anyhow::{anyhow, Result};

/// Finite-difference step for derivative checks
const H: f64 = 1e-4;

/// Verification report containing numerical checks and validation results
#[derive(Debug)]
pub struct Report {
    /// Number of sample points checked
    pub points: usize,
    /// Largest |dI/dx − price| seen
    pub max_abs_err: f64,
    /// Sample point where the largest error occurred
    pub worst_x: f64,
    /// price_integral(0)
    pub integral_at_zero: f64,
    /// Whether price and price_integral are non-decreasing across the samples
    pub monotone_ok: bool,
}

/// Numerically differentiate `price_integral` at each `x` and compare with `price`.
///
/// Central differences where possible; a second-order one-sided stencil
/// near zero so the curve is never evaluated at negative supply. Fails if
/// any point differs by more than `tolerance`, if `price_integral(0) != 0`,
/// or if price goes negative.
pub fn verify_integral_accuracy<C: Curve + ?Sized>(c: &C, xs: &[f64], tolerance: f64) -> Result<Report> {
    let integral_at_zero = c.price_integral(0.0);
    if integral_at_zero.abs() > tolerance {
        return Err(anyhow!("{}: price_integral(0) = {} ≠ 0", c.name(), integral_at_zero));
    }

    let mut sorted: Vec<f64> = xs.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut max_abs_err = 0.0_f64;
    let mut worst_x = 0.0_f64;
    let mut monotone_ok = true;
    let (mut prev_p, mut prev_i) = (f64::NEG_INFINITY, f64::NEG_INFINITY);

    for &x in &sorted {
        if !x.is_finite() || x < 0.0 {
            return Err(anyhow!("sample points must be finite and ≥ 0 (got {})", x));
        }
        let d = if x >= H {
            (c.price_integral(x + H) - c.price_integral(x - H)) / (2.0 * H)
        } else {
            (-3.0 * c.price_integral(x) + 4.0 * c.price_integral(x + H) - c.price_integral(x + 2.0 * H)) / (2.0 * H)
        };
        let p = c.price(x);
        if p < 0.0 { return Err(anyhow!("{}: price({}) = {} < 0", c.name(), x, p)); }
        let err = (d - p).abs();
        if err > max_abs_err { max_abs_err = err; worst_x = x; }

        let i = c.price_integral(x);
        if p < prev_p || i < prev_i { monotone_ok = false; }
        prev_p = p;
        prev_i = i;
    }

    if max_abs_err > tolerance {
        return Err(anyhow!(
            "{}: dI/dx differs from price by {:.3e} at x={} (tolerance {:.1e})",
            c.name(), max_abs_err, worst_x, tolerance
        ));
    }
    Ok(Report { points: sorted.len(), max_abs_err, worst_x, integral_at_zero, monotone_ok })
}

/// Check that `scale` only stretches the supply axis:
/// p_s(x) = p_1(x/s) and I_s(x) = s·I_1(x/s), relative to `tolerance`.
pub fn verify_scale_convention(kind: CurveKind, tolerance: f64) -> Result<()> {
    let unit = kind.with_scale(1.0)?;
    for s in [0.5, 10.0, 1_000.0, 500_000.0] {
        let c = kind.with_scale(s)?;
        for u in [0.0, 0.25, 1.0, 3.0, 10.0] {
            let x = u * s;
            let (p, p_ref) = (c.price(x), unit.price(u));
            let (i, i_ref) = (c.price_integral(x), s * unit.price_integral(u));
            let rel = |a: f64, b: f64| (a - b).abs() / b.abs().max(1.0);
            if rel(p, p_ref) > tolerance || rel(i, i_ref) > tolerance {
                return Err(anyhow!(
                    "{}: scale {} breaks convention at x={} (p {} vs {}, I {} vs {})",
                    kind, s, x, p, p_ref, i, i_ref
                ));
            }
        }
    }
    Ok(())
}

/// Check that the curve opens at unit price: price(0) == 1
pub fn verify_initial_unit_price<C: Curve + ?Sized>(c: &C, tolerance: f64) -> Result<()> {
    let p0 = c.price(0.0);
    if (p0 - 1.0).abs() > tolerance {
        return Err(anyhow!("{}: price(0) = {}, expected 1", c.name(), p0));
    }
    Ok(())
}
