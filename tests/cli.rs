#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const NIGHT_STAFF: &str = "code,name,category,weekend,units,night_eligible\n\
                           N1,Night One,night_predominant,,main,true\n\
                           N2,Night Two,night_predominant,,main,true\n\
                           N3,Night Three,night_predominant,,main,true\n";

fn write_config(dir: &Path) -> String {
    let path = dir.join("coverage.json");
    fs::write(
        &path,
        r#"{ "coverage": [ { "unit": "main", "shift": "N", "days": ["daily"], "min": 1, "max": 1 } ] }"#,
    )
    .unwrap();
    path.display().to_string()
}

fn cli() -> Command {
    Command::cargo_bin("labroster-cli").unwrap()
}

#[test]
fn generate_then_validate() {
    let dir = tempdir().unwrap();
    let staff = dir.path().join("staff.csv");
    fs::write(&staff, NIGHT_STAFF).unwrap();
    let config = write_config(dir.path());
    let out = dir.path().join("roster.json");
    let sheet = dir.path().join("roster.csv");

    cli()
        .args(["generate", "--year", "2026", "--month", "2"])
        .arg("--staff")
        .arg(&staff)
        .args(["--config", config.as_str()])
        .arg("--out")
        .arg(&out)
        .arg("--out-csv")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: 3 staff x 28 days"));

    let csv = fs::read_to_string(&sheet).unwrap();
    assert!(csv.starts_with("DATE,DAY,NO,N1,N2,N3\n2026-02-01,Sunday,1,N,DO,DO\n"));
    assert_eq!(csv.lines().count(), 29);

    cli()
        .arg("validate")
        .arg("--roster")
        .arg(&out)
        .arg("--staff")
        .arg(&staff)
        .args(["--config", config.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no violations"));
}

#[test]
fn deficiencies_exit_with_code_two() {
    let dir = tempdir().unwrap();
    let staff = dir.path().join("staff.csv");
    fs::write(&staff, "code,name,category\nN1,Night One,night_predominant\n").unwrap();
    let config = write_config(dir.path());
    let report = dir.path().join("deficiencies.csv");

    cli()
        .current_dir(dir.path())
        .args(["generate", "--year", "2026", "--month", "3"])
        .arg("--staff")
        .arg(&staff)
        .args(["--config", config.as_str()])
        .arg("--deficiencies")
        .arg(&report)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("coverage deficiency"));

    let report = fs::read_to_string(&report).unwrap();
    assert!(report.starts_with("date,unit,shift,required,assigned\n"));
    assert!(report.contains("2026-03-03,main,N,1,0"));
    assert!(dir.path().join("roster.json").exists());
}

#[test]
fn notes_are_printed_even_when_coverage_falls_short() {
    let dir = tempdir().unwrap();
    let staff = dir.path().join("staff.csv");
    fs::write(&staff, "code,name,category\nN1,Night One,night_predominant\n").unwrap();
    let leave = dir.path().join("leave.csv");
    fs::write(&leave, "code,start,end\nGHOST,2026-03-05,2026-03-06\n").unwrap();
    let config = write_config(dir.path());

    cli()
        .current_dir(dir.path())
        .args(["generate", "--year", "2026", "--month", "3"])
        .arg("--staff")
        .arg(&staff)
        .arg("--leave")
        .arg(&leave)
        .args(["--config", config.as_str()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("note: leave record for unknown staff: GHOST"));
}

#[test]
fn validate_refuses_a_truncated_roster() {
    let dir = tempdir().unwrap();
    let staff = dir.path().join("staff.csv");
    fs::write(&staff, "code,name,category\nA1,Someone,general\nB1,Other,general\n").unwrap();
    let roster = dir.path().join("roster.json");
    fs::write(
        &roster,
        r#"{
            "matrix": { "staff": ["A1", "B1"], "dates": ["2026-02-02", "2026-02-03"], "cells": [{ "kind": "absent" }] },
            "deficiencies": [], "violations": [], "diagnostics": [],
            "summary": { "shift_distribution": {}, "night_counts": {}, "preference_hits": 0, "relaxed_assignments": 0 }
        }"#,
    )
    .unwrap();

    cli()
        .arg("validate")
        .arg("--roster")
        .arg(&roster)
        .arg("--staff")
        .arg(&staff)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 2 staff x 2 days"));
}

#[test]
fn help_describes_the_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("planning de service"))
        .stdout(predicate::str::contains("Générer le planning d'un mois"));
}

#[test]
fn lists_sample_staff() {
    let staff = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/staff.csv");
    cli()
        .arg("staff")
        .arg("--staff")
        .arg(staff)
        .assert()
        .success()
        .stdout(predicate::str::contains("NJAM | Lab Manager | strict_oh | main | nights: no"))
        .stdout(predicate::str::contains("GOD | Head of Chemistry | night_predominant"));
}
