//! The `dryfit` binary, driven the way a user runs it.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::test_helpers::write_mass_log;

/// Five readings over five hours, 250 g down to 210 g.
fn short_log(dir: &TempDir) -> std::path::PathBuf {
    write_mass_log(
        dir.path(),
        "board.txt",
        &[
            (0.0, 250.0),
            (75.0, 235.0),
            (150.0, 224.0),
            (225.0, 216.0),
            (300.0, 210.0),
        ],
    )
}

fn dryfit() -> Command {
    let mut cmd = Command::cargo_bin("dryfit").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_fit_prints_report() {
    let dir = TempDir::new().unwrap();
    let log = short_log(&dir);

    let output = dryfit()
        .args(["-m", "1", "--no-plot"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("model: 1\n"))
        .stdout(predicate::str::contains("m0\tmi\tk\tmlast\n"))
        .stdout(predicate::str::contains(
            "Total evaporated mass at final state: 56.0g (29.1%)",
        ))
        .stdout(predicate::str::contains("Evaporation mass left: 16.0g (8.4%)"))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let values: Vec<f64> = text
        .lines()
        .nth(2)
        .unwrap()
        .split('\t')
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(values.len(), 4);
    assert!(values.iter().all(|v| *v >= 0.0));
    assert_eq!(values[3], 210.0);
}

/// Five readings over five hours, 100 g down to 60 g in nearly even steps.
fn small_board_log(dir: &TempDir, masses: [f64; 5]) -> std::path::PathBuf {
    let rows: Vec<(f64, f64)> = masses
        .iter()
        .enumerate()
        .map(|(i, m)| (75.0 * i as f64, *m))
        .collect();
    write_mass_log(dir.path(), "small.txt", &rows)
}

#[test]
fn test_small_board_reports_physical_masses() {
    let dir = TempDir::new().unwrap();
    let log = small_board_log(&dir, [100.0, 87.0, 76.0, 67.0, 60.0]);

    let output = dryfit()
        .args(["-m", "1", "--no-plot"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Total evaporated mass at final state: 73.0g (269.6%)",
        ))
        .stdout(predicate::str::contains("Evaporation mass left: 33.0g (121.6%)"))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let values: Vec<f64> = text
        .lines()
        .nth(2)
        .unwrap()
        .split('\t')
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(values.len(), 4);
    assert!(values.iter().all(|v| *v >= 0.0), "{values:?}");
    // Dry mass below the last reading
    assert!(values[1] < 60.0);
}

#[test]
fn test_straight_line_log_is_not_reported() {
    // No single exponential fits a straight line better than one with mi at
    // minus infinity, so the run must fail instead of printing negative masses
    let dir = TempDir::new().unwrap();
    let log = small_board_log(&dir, [100.0, 90.0, 80.0, 70.0, 60.0]);

    for model in ["1", "2"] {
        dryfit()
            .args(["-m", model, "--no-plot"])
            .arg(&log)
            .assert()
            .failure()
            .stdout(predicate::str::starts_with(format!("model: {model}\n")))
            .stdout(predicate::str::contains("evaporated").not())
            .stderr(predicate::str::contains(format!("failed to fit model {model}")));
    }
}

#[test]
fn test_missing_model_option() {
    let dir = TempDir::new().unwrap();
    let log = short_log(&dir);

    dryfit()
        .arg("--no-plot")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("model: None\n"))
        .stdout(predicate::str::contains("m0\tmi\tk\tmlast"));
}

#[test]
fn test_double_exponential_header() {
    let dir = TempDir::new().unwrap();
    let rows: Vec<(f64, f64)> = (0..60)
        .map(|i| {
            let hours = 4.0 * i as f64;
            let mass = 60.0 * (-0.006 * hours).exp() - 20.0 * (0.004 * hours).exp() + 210.0;
            (hours * 60.0, mass)
        })
        .collect();
    let log = write_mass_log(dir.path(), "slow.txt", &rows);

    dryfit()
        .args(["-m", "4", "--no-plot"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("m0\tmi\tmlast\n250.0\t"))
        .stdout(predicate::str::contains(
            "Total evaporated mass at final state: 40.0g (19.0%)",
        ));
}

#[test]
fn test_range_and_plot_output() {
    let dir = TempDir::new().unwrap();
    let log = short_log(&dir);
    let plot = dir.path().join("curve.svg");
    let export = dir.path().join("fit.json");

    dryfit()
        .args(["-m", "2", "-r", "0:4"])
        .arg("--plot")
        .arg(&plot)
        .arg("--export")
        .arg(&export)
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("selecting fit points with range: 0:4"))
        .stdout(predicate::str::contains("plot written to"));

    let svg = std::fs::read_to_string(&plot).unwrap();
    assert!(svg.contains("<svg"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(json["model"], 2);
    assert_eq!(json["report"]["model"], "single_fixed");
    assert_eq!(json["fit_range"], serde_json::json!([0.0, 4.0]));
    assert_eq!(json["n_samples"], 5);
    assert_eq!(json["n_fitted"], 4);
}

#[test]
fn test_default_plot_next_to_input() {
    let dir = TempDir::new().unwrap();
    let log = short_log(&dir);

    dryfit().arg(&log).assert().success();
    assert!(dir.path().join("board.txt.fit.svg").exists());
}

#[test]
fn test_ascii_plot() {
    let dir = TempDir::new().unwrap();
    let log = short_log(&dir);

    dryfit()
        .args(["--no-plot", "--ascii"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("Plot: t=[0.000, 53.000] h"));
}

#[test]
fn test_malformed_line_fails() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("bad.txt");
    std::fs::write(&log, "0 250\n60 oops\n").unwrap();

    dryfit()
        .arg("--no-plot")
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed data line 2"));
}

#[test]
fn test_bad_range_fails() {
    let dir = TempDir::new().unwrap();
    let log = short_log(&dir);

    dryfit()
        .args(["-r", "4-10", "-m", "2", "--no-plot"])
        .arg(&log)
        .assert()
        .failure()
        .stdout(predicate::str::starts_with(
            "model: 2\nselecting fit points with range: 4-10\n",
        ))
        .stderr(predicate::str::contains("Malformed fit range"));
}

#[test]
fn test_missing_file_fails() {
    dryfit()
        .args(["--no-plot", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.txt"));
}

#[test]
fn test_usage_errors() {
    dryfit().assert().failure();
    dryfit().arg("--help").assert().success();
    dryfit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(dryfit::VERSION));
}
