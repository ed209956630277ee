//! Bonding curve implementations

use crate::error::{AmmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default shape parameter, matching the engine's historical default.
pub const DEFAULT_SCALE: f64 = 500_000.0;

/// Continuous bonding curve: a marginal price over supply and its antiderivative.
///
/// Implementations must keep `price(x) >= 0` and `price_integral(0) == 0`
/// for every `x >= 0`, with `price_integral` non-decreasing. The engine
/// never evaluates negative supply.
pub trait Curve {
    /// Returns the name/type of this curve implementation
    fn name(&self) -> &'static str;

    /// Instantaneous price at supply `x`
    fn price(&self, x: f64) -> f64;

    /// Cost to mint everything from 0 up to `x`: ∫₀ˣ price(u) du
    fn price_integral(&self, x: f64) -> f64;

    /// Signed cost to move supply from `x_start` to `x_end`.
    /// Positive when buying (x_end > x_start), negative when selling.
    fn cost_to_move(&self, x_start: f64, x_end: f64) -> f64 {
        self.price_integral(x_end) - self.price_integral(x_start)
    }
}

impl<C: Curve + ?Sized> Curve for Box<C> {
    fn name(&self) -> &'static str { (**self).name() }
    fn price(&self, x: f64) -> f64 { (**self).price(x) }
    fn price_integral(&self, x: f64) -> f64 { (**self).price_integral(x) }
    fn cost_to_move(&self, x_start: f64, x_end: f64) -> f64 { (**self).cost_to_move(x_start, x_end) }
}

/// Linear curve: P(x) = slope·x + intercept
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    /// Price increase per unit of supply
    pub slope: f64,
    /// Price at zero supply
    pub intercept: f64,
}
impl Linear {
    /// Unit starting price rising by 1 every `scale` shares: P(x) = 1 + x/scale
    pub fn with_scale(scale: f64) -> Self { Self { slope: 1.0 / scale, intercept: 1.0 } }
}
impl Curve for Linear {
    fn name(&self) -> &'static str { "Linear(m·x+b)" }
    fn price(&self, x: f64) -> f64 { self.slope * x + self.intercept }
    fn price_integral(&self, x: f64) -> f64 { 0.5 * self.slope * x * x + self.intercept * x }
    // (x1² − x0²) factored so small moves far up the curve don't cancel
    fn cost_to_move(&self, x_start: f64, x_end: f64) -> f64 {
        (x_end - x_start) * (0.5 * self.slope * (x_end + x_start) + self.intercept)
    }
}

/// Hyperbolic square-root curve: P(x) = √(1 + (x/s)²)
///
/// Starts at unit price, grows quadratically-then-linearly; the integral is
/// ½·[x·√(1 + (x/s)²) + s·asinh(x/s)].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sqrt {
    /// Supply at which the curve turns from flat to linear growth
    pub scale: f64,
}
impl Default for Sqrt {
    fn default() -> Self { Self { scale: DEFAULT_SCALE } }
}
impl Curve for Sqrt {
    fn name(&self) -> &'static str { "Sqrt(√(1+(x/s)²))" }
    fn price(&self, x: f64) -> f64 { (x / self.scale).hypot(1.0) }
    fn price_integral(&self, x: f64) -> f64 {
        let u = x / self.scale;
        0.5 * (x * u.hypot(1.0) + self.scale * u.asinh())
    }
}

/// Logarithmic curve: P(x) = 1 + ln(1 + x/s), integral (s + x)·ln(1 + x/s)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Logarithmic {
    /// Supply at which price has grown by ln 2
    pub scale: f64,
}
impl Curve for Logarithmic {
    fn name(&self) -> &'static str { "Log(1+ln(1+x/s))" }
    fn price(&self, x: f64) -> f64 { 1.0 + (x / self.scale).ln_1p() }
    fn price_integral(&self, x: f64) -> f64 { (self.scale + x) * (x / self.scale).ln_1p() }
}

/// Curve family selected by configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    /// [`Linear::with_scale`]
    Linear,
    /// [`Sqrt`]
    #[default]
    Sqrt,
    /// [`Logarithmic`]
    Log,
}
impl CurveKind {
    /// Every supported family, for sweeping tests and reports
    pub const ALL: [CurveKind; 3] = [CurveKind::Linear, CurveKind::Sqrt, CurveKind::Log];

    /// Builds the curve of this family with shape parameter `scale`
    pub fn with_scale(self, scale: f64) -> Result<AnyCurve> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AmmError::InvalidConfig(format!("scale must be finite and > 0 (got {scale})")));
        }
        Ok(match self {
            CurveKind::Linear => AnyCurve::Linear(Linear::with_scale(scale)),
            CurveKind::Sqrt => AnyCurve::Sqrt(Sqrt { scale }),
            CurveKind::Log => AnyCurve::Log(Logarithmic { scale }),
        })
    }
}
impl FromStr for CurveKind {
    type Err = AmmError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(CurveKind::Linear),
            "sqrt" => Ok(CurveKind::Sqrt),
            "log" | "logarithmic" => Ok(CurveKind::Log),
            other => Err(AmmError::InvalidConfig(format!("unknown curve: {other}"))),
        }
    }
}
impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CurveKind::Linear => "linear",
            CurveKind::Sqrt => "sqrt",
            CurveKind::Log => "log",
        })
    }
}

/// Tagged union over the built-in curves
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnyCurve {
    /// Linear variant
    Linear(Linear),
    /// Square-root variant
    Sqrt(Sqrt),
    /// Logarithmic variant
    Log(Logarithmic),
}
impl Curve for AnyCurve {
    fn name(&self) -> &'static str {
        match self {
            AnyCurve::Linear(c) => c.name(),
            AnyCurve::Sqrt(c) => c.name(),
            AnyCurve::Log(c) => c.name(),
        }
    }
    fn price(&self, x: f64) -> f64 {
        match self {
            AnyCurve::Linear(c) => c.price(x),
            AnyCurve::Sqrt(c) => c.price(x),
            AnyCurve::Log(c) => c.price(x),
        }
    }
    fn price_integral(&self, x: f64) -> f64 {
        match self {
            AnyCurve::Linear(c) => c.price_integral(x),
            AnyCurve::Sqrt(c) => c.price_integral(x),
            AnyCurve::Log(c) => c.price_integral(x),
        }
    }
    fn cost_to_move(&self, x_start: f64, x_end: f64) -> f64 {
        match self {
            AnyCurve::Linear(c) => c.cost_to_move(x_start, x_end),
            AnyCurve::Sqrt(c) => c.cost_to_move(x_start, x_end),
            AnyCurve::Log(c) => c.cost_to_move(x_start, x_end),
        }
    }
}
