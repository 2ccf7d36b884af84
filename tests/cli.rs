use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;

const FIXTURE: &str = "crates/cbam-engine/tests/fixtures/q1_2026_entries.csv";

fn cbam(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cbam"))
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("APP_LOG_LEVEL", "error")
        .env_remove("RUST_LOG")
        .env_remove("CBAM_REFERENCE_DATA")
        .env_remove("CBAM_CERTIFICATE_PRICE_EUR")
        .output()
        .expect("cbam binary runs")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "cbam failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn fixture_path() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(FIXTURE)
        .display()
        .to_string()
}

#[test]
fn benchmark_resolves_declared_route() {
    let output = cbam(&["benchmark", "72083900", "--route", "scrap_eaf_route", "--year", "2027"]);
    let body = json_stdout(&output);

    assert_eq!(body["benchmark"]["route"], "scrap_eaf_route");
    assert_eq!(body["benchmark"]["value"], 0.283);
    assert_eq!(body["benchmark"]["year"], 2027);
    assert_eq!(body["benchmark"]["route_source"]["kind"], "declared");
}

#[test]
fn benchmark_for_unclassified_code_fails() {
    let output = cbam(&["benchmark", "99999999"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("application error"), "{stderr}");
}

#[test]
fn single_eori_prints_one_result_and_many_print_a_batch() {
    let single = json_stdout(&cbam(&["eori", "de1234567890", "--member-state", "DE"]));
    assert_eq!(single["normalized"], "DE1234567890");
    assert_eq!(single["valid"], true);

    let batch = json_stdout(&cbam(&["eori", "NL123456789012", "US123"]));
    assert_eq!(batch["total"], 2);
    assert_eq!(batch["valid"], 1);
    assert_eq!(batch["invalid"], 1);
}

#[test]
fn batch_eori_honours_member_state_and_strict() {
    let ids = ["NL123456782", "NL123456789", "DE1234567890"];

    let scoped = json_stdout(&cbam(&["eori", ids[0], ids[1], ids[2], "--member-state", "NL"]));
    assert_eq!(scoped["valid"], 2);
    assert_eq!(scoped["results"][2]["valid"], false);

    let strict = json_stdout(&cbam(&[
        "eori",
        ids[0],
        ids[1],
        ids[2],
        "--member-state",
        "NL",
        "--strict",
    ]));
    assert_eq!(strict["valid"], 1);
    assert_eq!(strict["invalid"], 2);
    assert_eq!(strict["results"][1]["valid"], false);
}

#[test]
fn project_uses_configured_price_by_default() {
    let body = json_stdout(&cbam(&[
        "project",
        "--benchmark-value",
        "1.37",
        "--quantity",
        "100",
        "--total-emissions",
        "120",
        "--start-year",
        "2033",
        "--end-year",
        "2034",
    ]));

    let years = body.as_array().expect("array of years");
    assert_eq!(years.len(), 2);
    assert_eq!(years[1]["year"], 2034);
    assert_eq!(years[1]["certificates_required"], 120);
    assert_eq!(years[1]["estimated_cost_eur"], 9600.0);
}

#[test]
fn validate_reports_certificate_balance_for_a_batch_file() {
    let fixture = fixture_path();
    let body = json_stdout(&cbam(&[
        "validate",
        "--entries",
        &fixture,
        "--year",
        "2026",
        "--quarter",
        "1",
        "--member-state",
        "NL",
        "--declarant",
        "NL123456789012",
        "--surrendered",
        "101",
        "--as-of",
        "2026-04-10",
    ]));

    assert_eq!(body["entry_count"], 3);
    assert_eq!(body["certificates"]["required"], 101);
    assert_eq!(body["certificates"]["shortfall"], 0);
    assert_eq!(body["can_submit"], true);
}

#[test]
fn lint_attaches_certificates_to_valid_entries() {
    let fixture = fixture_path();
    let body = json_stdout(&cbam(&["lint", "--entries", &fixture, "--certificates"]));

    let entries = body.as_array().expect("array of entries");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["reference"], "imp-101");
    assert_eq!(entries[0]["validation"]["valid"], true);
    assert_eq!(
        entries[0]["certificates"]["chargeable"]["certificates_required"],
        76
    );
}
