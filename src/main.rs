use bcamm::config::AmmConfig;
use bcamm::curves::{AnyCurve, Curve, CurveKind};
use bcamm::plot::{plot_cost_vs_supply, plot_price_vs_supply};
use bcamm::verifier::{verify_integral_accuracy, verify_initial_unit_price};
use bcamm::BondingCurveAmm;

use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bcamm",
    version,
    about = "Bonding-curve AMM trade simulator"
)]
struct Args {
    /// JSON config file; flags below override its fields
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    curve: Option<String>,
    #[arg(long)]
    scale: Option<f64>,
    #[arg(long)]
    fee_rate: Option<f64>,
    #[arg(long)]
    quanta: Option<f64>,

    /// round-trip | split | max-sell | schedule
    #[arg(long, default_value = "round-trip")]
    mode: String,
    /// Currency invested by the trading modes
    #[arg(long, default_value_t = 1000.0)]
    value: f64,
    #[arg(long, default_value_t = 10)]
    splits: u32,

    /// Supply range covered by the schedule and charts (default: 3×scale)
    #[arg(long)]
    x_max: Option<f64>,
    #[arg(long, default_value_t = 500)]
    points: usize,

    #[arg(long, default_value = "out")]
    out_dir: String,
    #[arg(long = "no-draw", action = clap::ArgAction::SetFalse, default_value_t = true)]
    draw: bool,
    #[arg(long, action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Serialize)]
struct TradeRow {
    step: usize,
    action: &'static str,
    input: f64,
    output: f64,
    supply: f64,
    price: f64,
    cash_collected: f64,
    fees_collected: f64,
}

#[derive(Serialize)]
struct ScheduleRow {
    x: f64,
    price: f64,
    price_integral: f64,
}

/// Appends committed trades to `trades.csv` as they happen
struct Ledger {
    wtr: csv::Writer<File>,
    step: usize,
}
impl Ledger {
    fn create(out_dir: &str, amm: &BondingCurveAmm<AnyCurve>, mode: &str) -> Result<Self> {
        let mut file = File::create(format!("{}/trades.csv", out_dir))?;
        writeln!(file, "# Bonding Curve AMM Trades")?;
        writeln!(file, "# Mode: {}", mode)?;
        writeln!(file, "# Curve: {}", amm.curve().name())?;
        writeln!(file, "# Fee rate: {}, quanta: {:e}", amm.fee_rate(), amm.quanta())?;
        writeln!(file)?;
        Ok(Self { wtr: csv::Writer::from_writer(file), step: 0 })
    }

    fn record(&mut self, amm: &BondingCurveAmm<AnyCurve>, action: &'static str, input: f64, output: f64) -> Result<()> {
        self.wtr.serialize(TradeRow {
            step: self.step,
            action,
            input,
            output,
            supply: amm.supply(),
            price: amm.current_price(),
            cash_collected: amm.total_cash_collected(),
            fees_collected: amm.total_fees_collected(),
        })?;
        self.step += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

fn resolve_config(args: &Args) -> Result<AmmConfig> {
    let mut cfg = match &args.config {
        Some(path) => AmmConfig::load(path)?,
        None => AmmConfig::default(),
    };
    if let Some(c) = &args.curve { cfg.curve = c.parse::<CurveKind>()?; }
    if let Some(s) = args.scale { cfg.scale = s; }
    if let Some(f) = args.fee_rate { cfg.fee_rate = f; }
    if let Some(q) = args.quanta { cfg.quanta = q; }
    cfg.validate()?;
    Ok(cfg)
}

fn validate_inputs(args: &Args) -> Result<()> {
    if !args.value.is_finite() || args.value < 0.0 {
        return Err(anyhow!("value must be finite and ≥ 0 (got {})", args.value));
    }
    if args.splits < 1 {
        return Err(anyhow!("splits must be ≥ 1 (got {})", args.splits));
    }
    if let Some(x) = args.x_max {
        if !x.is_finite() || x <= 0.0 {
            return Err(anyhow!("x_max must be finite and > 0 (got {})", x));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    validate_inputs(&args)?;
    let cfg = resolve_config(&args)?;
    let amm = cfg.build()?;
    info!("{}", amm);

    create_dir_all(&args.out_dir)?;

    match args.mode.as_str() {
        "round-trip" => run_round_trip(&args, amm),
        "split" => run_split(&args, &cfg),
        "max-sell" => run_max_sell(&args, amm),
        "schedule" => run_schedule(&args, &cfg, amm.curve()),
        m => Err(anyhow!("unknown mode: {}", m)),
    }
}

fn run_round_trip(args: &Args, mut amm: BondingCurveAmm<AnyCurve>) -> Result<()> {
    let mut ledger = Ledger::create(&args.out_dir, &amm, "round-trip")?;
    let shares = amm.buy_value(args.value)?;
    ledger.record(&amm, "buy_value", args.value, shares)?;
    let received = amm.sell_shares(shares)?;
    ledger.record(&amm, "sell_shares", shares, received)?;
    ledger.finish()?;

    println!("Bought {:.8} shares for {:.8}", shares, args.value);
    println!("Proceeds from selling all shares: {:.8}", received);
    println!("Net cost of the round trip: {:.8}", args.value - received);
    if args.verbose {
        println!("  {}", amm);
    }
    Ok(())
}

fn run_split(args: &Args, cfg: &AmmConfig) -> Result<()> {
    let mut single = cfg.build()?;
    let shares_single = single.buy_value(args.value)?;
    let net_single = single.sell_shares(shares_single)?;

    let mut split = cfg.build()?;
    let mut ledger = Ledger::create(&args.out_dir, &split, "split")?;
    let chunk = args.value / args.splits as f64;
    let mut shares_split = 0.0;
    for _ in 0..args.splits {
        let s = split.buy_value(chunk)?;
        ledger.record(&split, "buy_value", chunk, s)?;
        shares_split += s;
    }
    let net_split = split.sell_shares(shares_split)?;
    ledger.record(&split, "sell_shares", shares_split, net_split)?;
    ledger.finish()?;

    println!("net_single={:.8}, net_split={:.8} ({} splits)", net_single, net_split, args.splits);
    if net_split > net_single + 1e-6 {
        return Err(anyhow!("splitting yielded {} more than a single trade", net_split - net_single));
    }
    Ok(())
}

fn run_max_sell(args: &Args, mut amm: BondingCurveAmm<AnyCurve>) -> Result<()> {
    let mut ledger = Ledger::create(&args.out_dir, &amm, "max-sell")?;
    let bought = amm.buy_value(args.value)?;
    ledger.record(&amm, "buy_value", args.value, bought)?;
    let value_to_sell = amm.maximum_sell_value()?;
    let sold = amm.sell_value(value_to_sell)?;
    ledger.record(&amm, "sell_value", value_to_sell, sold)?;
    ledger.finish()?;

    println!("shares_bought={:.8} versus shares_sold={:.8}", bought, sold);
    println!("Shares forfeited = {:.8}", bought - sold);
    Ok(())
}

fn run_schedule(args: &Args, cfg: &AmmConfig, curve: &AnyCurve) -> Result<()> {
    let x_max = args.x_max.unwrap_or(3.0 * cfg.scale);
    let n = args.points.max(2);
    let xs: Vec<f64> = (0..n).map(|i| x_max * i as f64 / (n - 1) as f64).collect();

    if args.verbose {
        let probe: Vec<f64> = xs.iter().step_by((n / 10).max(1)).copied().collect();
        let rep = verify_integral_accuracy(curve, &probe, 1e-6 * cfg.scale.max(1.0))?;
        println!(
            "[{}] points={} max|dI/dx−p|={:.3e} at x={} monotone={}",
            curve.name(),
            rep.points,
            rep.max_abs_err,
            rep.worst_x,
            rep.monotone_ok
        );
        if let Err(e) = verify_initial_unit_price(curve, 1e-12) {
            println!("  note: {}", e);
        }
    }

    let mut file = File::create(format!("{}/schedule.csv", args.out_dir))?;
    writeln!(file, "# Bonding Curve Schedule")?;
    writeln!(file, "# Curve: {}, scale={}", curve.name(), cfg.scale)?;
    writeln!(file, "# Supply range: [0, {}] in {} points", x_max, n)?;
    writeln!(file)?;

    let mut wtr = csv::Writer::from_writer(file);
    for &x in &xs {
        wtr.serialize(ScheduleRow { x, price: curve.price(x), price_integral: curve.price_integral(x) })?;
    }
    wtr.flush()?;

    if args.draw {
        plot_price_vs_supply(curve, x_max, n, &format!("{}/price_vs_supply.png", &args.out_dir))?;
        plot_cost_vs_supply(curve, x_max, n, &format!("{}/cost_vs_supply.png", &args.out_dir))?;
    }
    Ok(())
}
