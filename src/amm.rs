//! Bonding-curve AMM: trade sizing and accounting

use crate::curves::{Curve, Sqrt};
use crate::error::{require_non_negative, AmmError, Result};
use crate::fees::{FeeSchedule, DEFAULT_QUANTA};
use crate::solver::{solve_for_dx, SolverConfig};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Trade sizes probed by [`BondingCurveAmm::assert_no_round_trip_arbitrage`]:
/// share counts, and currency amounts in units of the current marginal price.
const ARBITRAGE_PROBES: [f64; 5] = [1e-6, 1e-2, 1.0, 10.0, 1_000.0];

/// Breakdown of a buy for a fixed currency amount
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BuyValueQuote {
    /// Whole quanta of the payment that reach the pool
    pub quanta_used: f64,
    /// Sub-quantum remainder of the payment
    pub breakage_fee: f64,
    /// Proportional fee on the quantized payment
    pub fee_amount: f64,
    /// Currency that drives the curve
    pub net_currency: f64,
    /// Shares minted
    pub shares_received: f64,
}

/// Breakdown of a buy for a fixed share count
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BuySharesQuote {
    /// Curve cost of the shares, before fees
    pub gross_cost: f64,
    /// Whole quanta charged
    pub quanta_used: f64,
    /// Overpayment from rounding up to whole quanta
    pub breakage_fee: f64,
    /// Proportional fee on the total paid
    pub fee_amount: f64,
    /// Currency the buyer pays
    pub total_paid: f64,
}

/// Breakdown of a sale of a fixed share count
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SellSharesQuote {
    /// Curve proceeds before quantization and fees
    pub gross_currency: f64,
    /// Whole quanta paid out before the fee
    pub quanta_used: f64,
    /// Sub-quantum remainder of the proceeds
    pub breakage_fee: f64,
    /// Proportional fee on the quantized proceeds
    pub fee_amount: f64,
    /// Currency the seller receives
    pub net_currency: f64,
}

/// Breakdown of a sale targeting a currency amount
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SellValueQuote {
    /// Whole quanta of the target drawn from the curve
    pub quanta_used: f64,
    /// Sub-quantum remainder of the target
    pub breakage_fee: f64,
    /// Proportional fee on the quantized target
    pub fee_amount: f64,
    /// Currency drawn from the curve
    pub gross_currency: f64,
    /// Currency the seller receives
    pub net_currency: f64,
    /// Shares burned (positive)
    pub shares_sold: f64,
}

/// Result of a simulated buy immediately followed by a sell
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RoundTrip {
    /// Currency paid on the buy leg
    pub invested: f64,
    /// Shares held between the legs
    pub shares: f64,
    /// Currency received on the sell leg
    pub proceeds: f64,
}
impl RoundTrip {
    /// Proceeds minus investment; never meaningfully positive
    pub fn pnl(&self) -> f64 { self.proceeds - self.invested }
}

/// Snapshot of the mutable accounting fields
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AmmState {
    /// Shares outstanding
    pub supply: f64,
    /// Currency held by the curve, fees excluded
    pub total_cash_collected: f64,
    /// Fees plus breakage retained
    pub total_fees_collected: f64,
}

/// Automated market maker pricing shares along a bonding curve.
///
/// Each trade primitive comes in two flavours: `simulate_*` borrows the
/// engine immutably and returns a full breakdown, while the commit method
/// runs the same simulation and then applies supply, cash and fee updates
/// in one step. Any failure happens before that step.
#[derive(Clone, Debug)]
pub struct BondingCurveAmm<C> {
    curve: C,
    fees: FeeSchedule,
    solver: SolverConfig,
    supply: f64,
    total_cash_collected: f64,
    total_fees_collected: f64,
}

impl Default for BondingCurveAmm<Sqrt> {
    fn default() -> Self { Self::with_fees(Sqrt::default(), FeeSchedule::default()) }
}

impl<C: Curve> BondingCurveAmm<C> {
    /// Engine over `curve` with zero supply.
    ///
    /// Rejects `fee_rate` outside `[0, 1)` and non-positive `quanta`.
    pub fn new(curve: C, fee_rate: f64, quanta: f64) -> Result<Self> {
        Ok(Self::with_fees(curve, FeeSchedule::new(fee_rate, quanta)?))
    }

    /// [`BondingCurveAmm::new`] with the default quanta of 1e-8
    pub fn with_fee_rate(curve: C, fee_rate: f64) -> Result<Self> {
        Self::new(curve, fee_rate, DEFAULT_QUANTA)
    }

    /// Engine over a pre-validated fee schedule
    pub fn with_fees(curve: C, fees: FeeSchedule) -> Self {
        Self {
            curve,
            fees,
            solver: SolverConfig::default(),
            supply: 0.0,
            total_cash_collected: 0.0,
            total_fees_collected: 0.0,
        }
    }

    /// Replaces the solver tuning
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Pricing curve
    pub fn curve(&self) -> &C { &self.curve }
    /// Fee rate and currency granularity
    pub fn fees(&self) -> &FeeSchedule { &self.fees }
    /// Proportional fee rate
    pub fn fee_rate(&self) -> f64 { self.fees.fee_rate() }
    /// Smallest currency unit
    pub fn quanta(&self) -> f64 { self.fees.quanta() }
    /// Shares outstanding
    pub fn supply(&self) -> f64 { self.supply }
    /// Currency held by the curve, fees excluded
    pub fn total_cash_collected(&self) -> f64 { self.total_cash_collected }
    /// Fees and breakage retained so far
    pub fn total_fees_collected(&self) -> f64 { self.total_fees_collected }

    /// Copy of the accounting fields
    pub fn state(&self) -> AmmState {
        AmmState {
            supply: self.supply,
            total_cash_collected: self.total_cash_collected,
            total_fees_collected: self.total_fees_collected,
        }
    }

    // ---- simulation -------------------------------------------------------

    /// Spend `total_value` currency: floor it to quanta, take the fee, and
    /// mint whatever the remaining net buys on the curve.
    pub fn simulate_buy_value(&self, total_value: f64) -> Result<BuyValueQuote> {
        require_non_negative("buy value", total_value)?;
        let q = self.fees.quantize(total_value);
        let sol = solve_for_dx(&self.curve, self.supply, q.net, &self.solver)?;
        Ok(BuyValueQuote {
            quanta_used: q.quanta_used,
            breakage_fee: q.breakage,
            fee_amount: q.fee,
            net_currency: q.net,
            shares_received: sol.dx,
        })
    }

    /// Mint exactly `num_shares`: the price is the curve cost grossed up by
    /// the fee and rounded up to whole quanta, so the curve is always fully
    /// funded.
    pub fn simulate_buy_shares(&self, num_shares: f64) -> Result<BuySharesQuote> {
        require_non_negative("shares to buy", num_shares)?;
        let gross_cost = self.curve.cost_to_move(self.supply, self.supply + num_shares).max(0.0);
        let c = self.fees.cover(gross_cost);
        Ok(BuySharesQuote {
            gross_cost,
            quanta_used: c.quanta_used,
            breakage_fee: c.breakage,
            fee_amount: c.fee,
            total_paid: c.total_paid,
        })
    }

    /// Burn exactly `num_shares`; proceeds are floored to whole quanta
    /// before the fee is taken.
    pub fn simulate_sell_shares(&self, num_shares: f64) -> Result<SellSharesQuote> {
        require_non_negative("shares to sell", num_shares)?;
        if num_shares > self.supply {
            return Err(AmmError::InsufficientSupply { requested: num_shares, available: self.supply });
        }
        let gross_currency = (-self.curve.cost_to_move(self.supply, self.supply - num_shares)).max(0.0);
        let q = self.fees.quantize(gross_currency);
        Ok(SellSharesQuote {
            gross_currency,
            quanta_used: q.quanta_used,
            breakage_fee: q.breakage,
            fee_amount: q.fee,
            net_currency: q.net,
        })
    }

    /// Burn enough shares for the curve to release `target_value`, floored to
    /// whole quanta. The fee comes out of that amount.
    ///
    /// Does not check the result against supply; [`BondingCurveAmm::sell_value`]
    /// does that before committing.
    pub fn simulate_sell_value(&self, target_value: f64) -> Result<SellValueQuote> {
        require_non_negative("sell value", target_value)?;
        let q = self.fees.quantize(target_value);
        let sol = solve_for_dx(&self.curve, self.supply, -q.gross, &self.solver)?;
        Ok(SellValueQuote {
            quanta_used: q.quanta_used,
            breakage_fee: q.breakage,
            fee_amount: q.fee,
            gross_currency: q.gross,
            net_currency: q.net,
            shares_sold: -sol.dx,
        })
    }

    // ---- commits ----------------------------------------------------------

    /// Spend `value` currency; returns the shares minted.
    pub fn buy_value(&mut self, value: f64) -> Result<f64> {
        let sim = self.simulate_buy_value(value)?;
        self.apply(
            self.supply + sim.shares_received,
            sim.net_currency,
            sim.breakage_fee + sim.fee_amount,
        );
        debug!(value, shares = sim.shares_received, supply = self.supply, "buy_value");
        Ok(sim.shares_received)
    }

    /// Buy exactly `num_shares`; returns the currency paid.
    pub fn buy_shares(&mut self, num_shares: f64) -> Result<f64> {
        let sim = self.simulate_buy_shares(num_shares)?;
        self.apply(
            self.supply + num_shares,
            sim.total_paid - sim.fee_amount,
            sim.breakage_fee + sim.fee_amount,
        );
        debug!(num_shares, paid = sim.total_paid, supply = self.supply, "buy_shares");
        Ok(sim.total_paid)
    }

    /// Sell exactly `num_shares`; returns the currency received.
    pub fn sell_shares(&mut self, num_shares: f64) -> Result<f64> {
        let sim = self.simulate_sell_shares(num_shares)?;
        self.apply(
            self.supply - num_shares,
            -sim.net_currency,
            sim.breakage_fee + sim.fee_amount,
        );
        debug!(num_shares, received = sim.net_currency, supply = self.supply, "sell_shares");
        Ok(sim.net_currency)
    }

    /// Sell enough shares to receive `value` currency; returns the shares sold.
    pub fn sell_value(&mut self, value: f64) -> Result<f64> {
        let sim = self.simulate_sell_value(value)?;
        let new_supply = self.supply - sim.shares_sold;
        // Unreachable while the solver clamps at zero supply; targets beyond
        // the curve's value fail earlier as `Bracketing`.
        if new_supply < 0.0 {
            return Err(AmmError::InsufficientSupply { requested: sim.shares_sold, available: self.supply });
        }
        self.apply(new_supply, -sim.net_currency, sim.breakage_fee + sim.fee_amount);
        debug!(value, shares = sim.shares_sold, supply = self.supply, "sell_value");
        Ok(sim.shares_sold)
    }

    fn apply(&mut self, supply: f64, cash_delta: f64, fee_delta: f64) {
        debug_assert!(supply >= 0.0 && fee_delta >= 0.0);
        self.supply = supply;
        self.total_cash_collected += cash_delta;
        self.total_fees_collected += fee_delta;
    }

    // ---- queries ----------------------------------------------------------

    /// Marginal price at the current supply
    pub fn current_price(&self) -> f64 { self.curve.price(self.supply) }

    /// Curve cost of minting from zero to `x` (current supply when `None`)
    pub fn total_cost_at_supply(&self, x: Option<f64>) -> f64 {
        self.curve.price_integral(x.unwrap_or(self.supply))
    }

    /// Net currency obtainable by selling the whole supply, floored to quanta.
    pub fn maximum_sell_value(&self) -> Result<f64> {
        if self.supply <= 0.0 {
            return Ok(0.0);
        }
        let sim = self.simulate_sell_shares(self.supply)?;
        Ok(self.fees.floor_quanta(sim.net_currency) * self.quanta())
    }
}

impl<C: Curve + Clone> BondingCurveAmm<C> {
    /// Simulates buying with `value` and immediately selling every share received.
    pub fn check_round_trip(&self, value: f64) -> Result<RoundTrip> {
        let mut scratch = self.clone();
        let shares = scratch.buy_value(value)?;
        let proceeds = scratch.simulate_sell_shares(shares)?.net_currency;
        Ok(RoundTrip { invested: value, shares, proceeds })
    }

    /// Simulates buying exactly `num_shares` and immediately selling them.
    pub fn simulate_buy_shares_then_sell_shares(&self, num_shares: f64) -> Result<RoundTrip> {
        let mut scratch = self.clone();
        let invested = scratch.buy_shares(num_shares)?;
        let proceeds = scratch.simulate_sell_shares(num_shares)?.net_currency;
        Ok(RoundTrip { invested, shares: num_shares, proceeds })
    }

    /// Checks that no buy-then-sell at the current state returns more than
    /// it cost, across investments from tiny to large.
    ///
    /// One quantum of slack (or a few ulps of the investment, if larger)
    /// absorbs float noise in the solver; anything smaller cannot be paid
    /// out anyway.
    pub fn assert_no_round_trip_arbitrage(&self) -> Result<()> {
        let unit = self.current_price().max(self.quanta());
        let by_value = ARBITRAGE_PROBES.iter().map(|k| self.check_round_trip(k * unit));
        let by_shares = ARBITRAGE_PROBES.iter().map(|k| self.simulate_buy_shares_then_sell_shares(*k));
        for rt in by_value.chain(by_shares) {
            let rt = rt?;
            let slack = self.quanta().max(rt.invested * 16.0 * f64::EPSILON);
            if rt.pnl() > slack {
                return Err(AmmError::Arbitrage { invested: rt.invested, proceeds: rt.proceeds });
            }
        }
        Ok(())
    }
}

impl<C: Curve> fmt::Display for BondingCurveAmm<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<BondingCurveAmm({}, quanta={}, fee_rate={}, supply={:.6}, cash_collected={:.6}, fees_collected={:.6})>",
            self.curve.name(),
            self.quanta(),
            self.fee_rate(),
            self.supply,
            self.total_cash_collected,
            self.total_fees_collected,
        )
    }
}
