use approx::assert_relative_eq;
use bcamm::config::AmmConfig;
use bcamm::curves::{AnyCurve, Curve, CurveKind, Linear, Logarithmic, Sqrt};
use bcamm::fees::FeeSchedule;
use bcamm::solver::{solve_for_dx, SolverConfig};
use bcamm::verifier::{verify_initial_unit_price, verify_integral_accuracy, verify_scale_convention};
use bcamm::{AmmError, BondingCurveAmm};

const XS: [f64; 6] = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];

/// Integral off by a constant factor, for negative checks
struct Skewed;
impl Curve for Skewed {
    fn name(&self) -> &'static str { "skewed" }
    fn price(&self, x: f64) -> f64 { 1.0 + x }
    fn price_integral(&self, x: f64) -> f64 { 1.1 * (x + 0.5 * x * x) }
}

// ---- curves / verifier ------------------------------------------------------

#[test]
fn every_curve_passes_the_checks() {
    for kind in CurveKind::ALL {
        for scale in [1.0, 10.0, 500_000.0] {
            let c = kind.with_scale(scale).unwrap();
            let rep = verify_integral_accuracy(&c, &XS, 1e-6).unwrap();
            assert_eq!(rep.points, XS.len());
            assert_eq!(rep.integral_at_zero, 0.0);
            assert!(rep.monotone_ok, "{kind} scale={scale}");
            verify_initial_unit_price(&c, 1e-12).unwrap();
        }
        verify_scale_convention(kind, 1e-9).unwrap();
    }
}

#[test]
fn verifier_catches_a_wrong_integral() {
    assert!(verify_integral_accuracy(&Skewed, &XS, 1e-6).is_err());
    assert!(verify_integral_accuracy(&Sqrt::default(), &[-1.0], 1e-6).is_err());
}

#[test]
fn verifier_catches_a_non_unit_start() {
    let c = Linear { slope: 0.1, intercept: 2.0 };
    assert!(verify_integral_accuracy(&c, &XS, 1e-6).is_ok());
    assert!(verify_initial_unit_price(&c, 1e-12).is_err());
}

#[test]
fn linear_closed_form_cost_matches_integral_difference() {
    let c = Linear { slope: 0.02, intercept: 1.5 };
    for (a, b) in [(0.0, 10.0), (3.0, 7.5), (12.0, 4.0)] {
        assert_relative_eq!(c.cost_to_move(a, b), c.price_integral(b) - c.price_integral(a), max_relative = 1e-12);
    }
}

#[test]
fn curve_kinds_parse_and_print() {
    assert_eq!("linear".parse::<CurveKind>().unwrap(), CurveKind::Linear);
    assert_eq!("SQRT".parse::<CurveKind>().unwrap(), CurveKind::Sqrt);
    assert_eq!("logarithmic".parse::<CurveKind>().unwrap(), CurveKind::Log);
    assert!(matches!("cubic".parse::<CurveKind>(), Err(AmmError::InvalidConfig(_))));
    for k in CurveKind::ALL {
        assert_eq!(k.to_string().parse::<CurveKind>().unwrap(), k);
    }
    assert!(CurveKind::Sqrt.with_scale(0.0).is_err());
    assert!(CurveKind::Log.with_scale(f64::INFINITY).is_err());
    assert_eq!(CurveKind::Log.with_scale(7.0).unwrap(), AnyCurve::Log(Logarithmic { scale: 7.0 }));
}

#[test]
fn boxed_curves_dispatch() {
    let c: Box<dyn Curve> = Box::new(Sqrt { scale: 10.0 });
    assert_eq!(c.price(0.0), 1.0);
    assert_relative_eq!(c.cost_to_move(0.0, 10.0), Sqrt { scale: 10.0 }.price_integral(10.0));
}

// ---- solver -----------------------------------------------------------------

#[test]
fn solver_treats_tiny_targets_as_noop() {
    let c = Sqrt { scale: 10.0 };
    let sol = solve_for_dx(&c, 5.0, 1e-13, &SolverConfig::default()).unwrap();
    assert_eq!(sol.dx, 0.0);
    assert_eq!(sol.iterations, 0);
    assert!(sol.converged);
}

#[test]
fn solver_finds_linear_root() {
    // P = 1 + x: cost from 0 to dx is dx + dx²/2; 4 → dx = 2
    let c = Linear { slope: 1.0, intercept: 1.0 };
    let sol = solve_for_dx(&c, 0.0, 4.0, &SolverConfig::default()).unwrap();
    assert!(sol.converged);
    assert_relative_eq!(sol.dx, 2.0, max_relative = 1e-10);

    let back = solve_for_dx(&c, 2.0, -4.0, &SolverConfig::default()).unwrap();
    assert_relative_eq!(back.dx, -2.0, max_relative = 1e-10);
}

#[test]
fn solver_never_goes_below_zero_supply() {
    let c = Linear { slope: 1.0, intercept: 1.0 };
    // selling exactly everything: the root sits on the clamp
    let sol = solve_for_dx(&c, 2.0, -4.0, &SolverConfig::default()).unwrap();
    assert!(2.0 + sol.dx >= 0.0);
}

#[test]
fn solver_reports_unreachable_targets() {
    let c = Sqrt { scale: 10.0 };
    let err = solve_for_dx(&c, 3.0, -1_000.0, &SolverConfig::default()).unwrap_err();
    assert!(matches!(err, AmmError::Bracketing { .. }), "{err}");
}

#[test]
fn solver_flat_curve_cannot_be_bracketed() {
    let flat = Linear { slope: 0.0, intercept: 0.0 };
    let err = solve_for_dx(&flat, 0.0, 1.0, &SolverConfig::default()).unwrap_err();
    assert!(matches!(err, AmmError::Bracketing { .. }));
}

#[test]
fn solver_returns_best_estimate_when_budget_runs_out() {
    let c = Sqrt { scale: 10.0 };
    let cfg = SolverConfig { max_iter: 4, ..SolverConfig::default() };
    let sol = solve_for_dx(&c, 0.0, 25.0, &cfg).unwrap();
    assert!(!sol.converged);
    assert_eq!(sol.iterations, 4);
    assert!(sol.dx > 0.0);
    // coarse, but in the right neighbourhood
    let exact = solve_for_dx(&c, 0.0, 25.0, &SolverConfig::default()).unwrap();
    assert_relative_eq!(sol.dx, exact.dx, max_relative = 0.1);
}

#[test]
fn solver_terminates_without_a_step_ceiling() {
    let c = Sqrt { scale: 10.0 };
    let cfg = SolverConfig { max_step: f64::INFINITY, ..SolverConfig::default() };
    let err = solve_for_dx(&c, 3.0, -1_000.0, &cfg).unwrap_err();
    assert!(matches!(err, AmmError::Bracketing { .. }), "{err}");

    let cfg = SolverConfig { initial_step: 0.0, ..SolverConfig::default() };
    assert!(matches!(solve_for_dx(&c, 3.0, -1.0, &cfg), Err(AmmError::InvalidConfig(_))));
}

#[test]
fn unbounded_solver_config_cannot_hang_the_engine() {
    let solver = SolverConfig { max_step: f64::INFINITY, ..SolverConfig::default() };
    let cfg = AmmConfig { scale: 100.0, solver, ..AmmConfig::default() };
    assert!(matches!(cfg.validate(), Err(AmmError::InvalidConfig(_))));

    let mut amm = BondingCurveAmm::with_fee_rate(Sqrt { scale: 100.0 }, 0.0).unwrap().with_solver(solver);
    amm.buy_value(10.0).unwrap();
    let before = amm.state();
    assert!(matches!(amm.sell_value(1e6), Err(AmmError::Bracketing { .. })));
    assert_eq!(amm.state(), before);
}

#[test]
fn solver_rejects_bad_inputs() {
    let c = Sqrt { scale: 10.0 };
    let cfg = SolverConfig::default();
    assert!(matches!(solve_for_dx(&c, -1.0, 1.0, &cfg), Err(AmmError::InvalidArgument(_))));
    assert!(matches!(solve_for_dx(&c, 0.0, f64::NAN, &cfg), Err(AmmError::InvalidArgument(_))));
}

// ---- fees -------------------------------------------------------------------

#[test]
fn quantize_floors_and_charges_fee_on_gross() {
    let f = FeeSchedule::new(0.1, 0.25).unwrap();
    let q = f.quantize(1.3);
    assert_eq!(q.quanta_used, 5.0);
    assert_relative_eq!(q.gross, 1.25);
    assert_relative_eq!(q.breakage, 0.05, max_relative = 1e-12);
    assert_relative_eq!(q.fee, 0.125, max_relative = 1e-12);
    assert_relative_eq!(q.net, 1.125, max_relative = 1e-12);

    let z = f.quantize(0.0);
    assert_eq!((z.quanta_used, z.gross, z.breakage, z.fee, z.net), (0.0, 0.0, 0.0, 0.0, 0.0));
}

#[test]
fn cover_rounds_up_until_net_pays_the_curve() {
    let f = FeeSchedule::new(0.2, 0.25).unwrap();
    let c = f.cover(1.0);
    assert_relative_eq!(c.ideal_total, 1.25, max_relative = 1e-12);
    assert_eq!(c.quanta_used, 5.0);
    assert_relative_eq!(c.breakage, 0.0, epsilon = 1e-12);

    let c = f.cover(1.1);
    assert_relative_eq!(c.ideal_total, 1.375, max_relative = 1e-12);
    assert_eq!(c.quanta_used, 6.0);
    assert_relative_eq!(c.total_paid, 1.5);
    assert_relative_eq!(c.breakage, 0.125, max_relative = 1e-12);
    assert_relative_eq!(c.fee, 0.3, max_relative = 1e-12);
    assert!(c.total_paid - c.fee >= 1.1);

    assert_eq!(f.cover(0.0).quanta_used, 0.0);
}

#[test]
fn fee_schedule_validation() {
    assert!(FeeSchedule::new(0.0, 1e-8).is_ok());
    assert!(FeeSchedule::new(0.999, 1e-8).is_ok());
    assert!(FeeSchedule::new(1.0, 1e-8).is_err());
    assert!(FeeSchedule::new(0.1, -1e-8).is_err());
    assert!(FeeSchedule::new(0.1, f64::NAN).is_err());
    let d = FeeSchedule::default();
    assert_eq!((d.fee_rate(), d.quanta()), (0.0, 1e-8));
}

// ---- config -----------------------------------------------------------------

#[test]
fn config_defaults_fill_missing_fields() {
    let cfg = AmmConfig::from_json_str(r#"{ "curve": "log", "fee_rate": 0.003 }"#).unwrap();
    assert_eq!(cfg.curve, CurveKind::Log);
    assert_eq!(cfg.fee_rate, 0.003);
    assert_eq!(cfg.scale, 500_000.0);
    assert_eq!(cfg.quanta, 1e-8);
    assert_eq!(cfg.solver, SolverConfig::default());

    let amm = cfg.build().unwrap();
    assert_eq!(amm.curve(), &AnyCurve::Log(Logarithmic { scale: 500_000.0 }));
    assert_eq!(amm.fee_rate(), 0.003);
    assert_eq!(amm.supply(), 0.0);
}

#[test]
fn config_solver_overrides() {
    let cfg = AmmConfig::from_json_str(r#"{ "scale": 1000, "solver": { "max_iter": 50 } }"#).unwrap();
    assert_eq!(cfg.solver.max_iter, 50);
    assert_eq!(cfg.solver.tolerance, 1e-12);
    let mut amm = cfg.build().unwrap();
    assert!(amm.buy_value(10.0).unwrap() > 0.0);
}

#[test]
fn config_rejects_bad_values() {
    assert!(AmmConfig::from_json_str(r#"{ "fee_rate": 1.0 }"#).is_err());
    assert!(AmmConfig::from_json_str(r#"{ "scale": -5 }"#).is_err());
    assert!(AmmConfig::from_json_str(r#"{ "curve": "cubic" }"#).is_err());
    assert!(AmmConfig::from_json_str(r#"{ "fees": 0.1 }"#).is_err());
    assert!(AmmConfig::from_json_str(r#"{ "solver": { "initial_step": 0 } }"#).is_err());

    let cfg = AmmConfig { quanta: 0.0, ..AmmConfig::default() };
    assert!(matches!(cfg.validate(), Err(AmmError::InvalidConfig(_))));
    assert!(cfg.build().is_err());
}

#[test]
fn config_loads_from_file() {
    let dir = std::env::temp_dir().join(format!("bcamm_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("amm.json");
    std::fs::write(&path, r#"{ "curve": "linear", "scale": 250, "quanta": 0.01 }"#).unwrap();

    let cfg = AmmConfig::load(&path).unwrap();
    assert_eq!(cfg.curve, CurveKind::Linear);
    assert_eq!(cfg.quanta, 0.01);
    assert!(AmmConfig::load(dir.join("missing.json")).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
