#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
//! Library entry for the bonding-curve AMM.
//!
//! An automated market maker whose price is a continuous function of
//! outstanding supply. Trades are sized by numerically inverting the
//! curve's cost integral, then quantized to whole currency units with a
//! proportional fee so that no buy/sell sequence can extract free value.
//!
//! # Modules
//! - [`curves`]: Curve contract and built-in curve families
//! - [`solver`]: Bracketing + bisection inverse of the cost integral
//! - [`fees`]: Quantization ("breakage") and proportional fees
//! - [`amm`]: Trade engine with simulate/commit primitives
//! - [`config`]: JSON-backed engine configuration
//! - [`verifier`]: Analytic vs numeric curve checks
//! - [`plot`]: Visualization (optional in binaries)

/// Error taxonomy shared by every module
pub mod error;

/// Curve contract and built-in curve families
pub mod curves;

/// Bracketing + bisection inverse of the cost integral
pub mod solver;

/// Currency quantization and proportional fees
pub mod fees;

/// Trade engine: four primitives, each with simulate and commit variants
pub mod amm;

/// Engine configuration
pub mod config;

/// Verification tools for curve properties and numerical accuracy
pub mod verifier;

/// Visualization utilities for generating charts
pub mod plot;

pub use amm::{AmmState, BondingCurveAmm};
pub use error::{AmmError, Result};
