use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn out_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bcamm_{}_{}", tag, std::process::id()))
}

fn run(args: &[&str], out: &PathBuf) -> bool {
    Command::new(env!("CARGO_BIN_EXE_bcamm"))
        .args(args)
        .arg("--out-dir")
        .arg(out)
        .arg("--no-draw")
        .status()
        .expect("run bcamm")
        .success()
}

fn data_lines(s: &str) -> Vec<&str> {
    s.lines().filter(|l| !l.is_empty() && !l.starts_with('#')).collect()
}

#[test]
fn round_trip_ledger_has_one_header_and_two_trades() {
    let out = out_dir("round_trip");
    assert!(run(
        &["--mode", "round-trip", "--curve", "sqrt", "--scale", "1000", "--fee-rate", "0.001", "--value", "1000"],
        &out
    ));

    let s = fs::read_to_string(out.join("trades.csv")).unwrap();
    let lines = data_lines(&s);
    assert_eq!(
        lines[0],
        "step,action,input,output,supply,price,cash_collected,fees_collected"
    );
    assert_eq!(lines.iter().filter(|l| l.starts_with("step,")).count(), 1);
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("0,buy_value,"));
    assert!(lines[2].starts_with("1,sell_shares,"));

    // proceeds of the sell leg are below the amount invested
    let sell: Vec<&str> = lines[2].split(',').collect();
    let received: f64 = sell[3].parse().unwrap();
    assert!(received < 1000.0);
    let supply: f64 = sell[4].parse().unwrap();
    assert!(supply.abs() < 1e-6);

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn split_mode_records_every_chunk() {
    let out = out_dir("split");
    assert!(run(&["--mode", "split", "--curve", "log", "--scale", "500", "--splits", "4", "--fee-rate", "0.002"], &out));

    let s = fs::read_to_string(out.join("trades.csv")).unwrap();
    let lines = data_lines(&s);
    assert_eq!(lines.len(), 1 + 4 + 1);
    assert_eq!(lines.iter().filter(|l| l.contains(",buy_value,")).count(), 4);

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn max_sell_mode_runs() {
    let out = out_dir("max_sell");
    assert!(run(&["--mode", "max-sell", "--curve", "linear", "--scale", "1000", "--fee-rate", "0.001"], &out));
    let s = fs::read_to_string(out.join("trades.csv")).unwrap();
    assert!(data_lines(&s).iter().any(|l| l.contains(",sell_value,")));
    let _ = fs::remove_dir_all(&out);
}

#[test]
fn schedule_is_monotone() {
    let out = out_dir("schedule");
    assert!(run(&["--mode", "schedule", "--curve", "sqrt", "--scale", "100", "--points", "50"], &out));

    let s = fs::read_to_string(out.join("schedule.csv")).unwrap();
    assert!(s.starts_with("# Bonding Curve Schedule"));
    let lines = data_lines(&s);
    assert_eq!(lines[0], "x,price,price_integral");
    assert_eq!(lines.len(), 51);

    let mut prev = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for l in &lines[1..] {
        let f: Vec<f64> = l.split(',').map(|v| v.parse().unwrap()).collect();
        assert!(f[1] >= prev.0 && f[2] >= prev.1, "{l}");
        prev = (f[1], f[2]);
    }

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn config_file_is_honoured_and_flags_override_it() {
    let out = out_dir("config");
    fs::create_dir_all(&out).unwrap();
    let cfg = out.join("amm.json");
    fs::write(&cfg, r#"{ "curve": "linear", "scale": 10, "fee_rate": 0.5 }"#).unwrap();

    assert!(run(&["--config", cfg.to_str().unwrap(), "--fee-rate", "0", "--value", "10"], &out));
    let s = fs::read_to_string(out.join("trades.csv")).unwrap();
    assert!(s.contains("# Curve: Linear"));
    assert!(s.contains("# Fee rate: 0,"));

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn bad_arguments_fail() {
    let out = out_dir("bad");
    assert!(!run(&["--mode", "nope"], &out));
    assert!(!run(&["--fee-rate", "1.0"], &out));
    assert!(!run(&["--curve", "cubic"], &out));
    assert!(!run(&["--value", "-5"], &out));
    let _ = fs::remove_dir_all(&out);
}
