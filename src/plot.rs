//! Visualization utilities for generating charts

use crate::curves::Curve;
use anyhow::{anyhow, Result};
use plotters::prelude::*;

/// Evenly spaced (x, f(x)) samples over [0, x_max]
fn sample(x_max: f64, points: usize, f: impl Fn(f64) -> f64) -> Vec<(f64, f64)> {
    let n = points.max(2);
    (0..n)
        .map(|i| {
            let x = x_max * i as f64 / (n - 1) as f64;
            (x, f(x))
        })
        .collect()
}

fn line_chart(data: Vec<(f64, f64)>, caption: &str, out_path: &str) -> Result<()> {
    let root = BitMapBackend::new(out_path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let x_max = data.last().map(|(x, _)| *x).unwrap_or(1.0).max(1e-12);
    let y_max = data.iter().map(|(_, y)| *y).fold(0.0, f64::max).max(1e-12);
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(caption, ("sans-serif", 28))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..(y_max * 1.05))?;
    chart.configure_mesh().x_desc("supply").draw()?;
    chart.draw_series(LineSeries::new(data, &BLACK))?;
    root.present()?;
    Ok(())
}

/// Generates a marginal price vs supply chart
pub fn plot_price_vs_supply<C: Curve + ?Sized>(c: &C, x_max: f64, points: usize, out_path: &str) -> Result<()> {
    if !(x_max > 0.0) { return Err(anyhow!("x_max must be > 0 (got {})", x_max)); }
    line_chart(sample(x_max, points, |x| c.price(x)), &format!("Price vs Supply: {}", c.name()), out_path)
}

/// Generates a cumulative cost (price integral) vs supply chart
pub fn plot_cost_vs_supply<C: Curve + ?Sized>(c: &C, x_max: f64, points: usize, out_path: &str) -> Result<()> {
    if !(x_max > 0.0) { return Err(anyhow!("x_max must be > 0 (got {})", x_max)); }
    line_chart(
        sample(x_max, points, |x| c.price_integral(x)),
        &format!("Cost to Mint vs Supply: {}", c.name()),
        out_path,
    )
}
