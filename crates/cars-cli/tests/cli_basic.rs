//! Basic CLI E2E tests.
//!
//! Tests invoke the built `cars` binary against the JSON fixtures and
//! verify its outputs. Every run points `--config` at a temp file so the
//! user's real config is never touched.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(config_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let config = config_dir.path().join("config.toml");
    let output = Command::new(env!("CARGO_BIN_EXE_cars"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(config_dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let mut full = args.to_vec();
    full.push("--json");
    let (stdout, stderr, code) = run_cli(config_dir, &full);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn data() -> String {
    fixture("sample_dataset.json").display().to_string()
}

#[test]
fn test_train_reports_rejected_records() {
    let dir = TempDir::new().unwrap();
    let out = run_json(&dir, &["train", "--data", &data()]);

    let report = &out["report"];
    assert_eq!(report["accepted_contexts"], 3);
    assert_eq!(report["accepted_interactions"], 5);
    assert_eq!(report["rejected"].as_array().unwrap().len(), 1);
    assert_eq!(report["rejected"][0]["error"]["kind"], "unknown_context");
    assert_eq!(out["statistics"]["total_habits"], 5);
}

#[test]
fn test_train_text_output() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["train", "--data", &data()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("habits:"));
    assert!(stdout.contains("office_noon"));
}

#[test]
fn test_recommend_by_context_id() {
    let dir = TempDir::new().unwrap();
    let out = run_json(
        &dir,
        &[
            "recommend",
            "--data",
            &data(),
            "--context",
            "home_evening",
            "--items",
            "movie1,movie2",
            "-k",
            "1",
        ],
    );
    let results = out.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["item_id"], "movie1");
    assert_eq!(results[0]["dominant"], "direct");
}

#[test]
fn test_recommend_for_adhoc_context() {
    let dir = TempDir::new().unwrap();
    let out = run_json(
        &dir,
        &[
            "recommend",
            "--data",
            &data(),
            "--feature",
            "time=evening",
            "--feature",
            "location=home",
        ],
    );
    let results = out.as_array().unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0]["item_id"], "movie1");
}

#[test]
fn test_recommend_unknown_context_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(
        &dir,
        &["recommend", "--data", &data(), "--context", "nowhere"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown context"));
}

#[test]
fn test_stats_top() {
    let dir = TempDir::new().unwrap();
    let out = run_json(&dir, &["stats", "--data", &data(), "--top", "2"]);
    assert_eq!(out["total_habits"], 5);
    assert_eq!(out["top_habits"].as_array().unwrap().len(), 2);
    assert_eq!(out["distinct_contexts"], 3);
}

#[test]
fn test_transfer_partial_overlap() {
    let dir = TempDir::new().unwrap();
    let out = run_json(
        &dir,
        &[
            "transfer",
            "--data",
            &data(),
            "--source",
            "home_evening",
            "--target",
            "home_morning",
        ],
    );
    let similarity = out["overlap"]["similarity"].as_f64().unwrap();
    assert!((similarity - 0.5).abs() < 1e-9);
    let first = &out["results"][0];
    assert_eq!(first["item_id"], "movie1");
    let score = first["transfer_score"].as_f64().unwrap();
    assert!(score > 0.0 && score < first["source_strength"].as_f64().unwrap());
}

#[test]
fn test_similar_contexts_ranked() {
    let dir = TempDir::new().unwrap();
    let out = run_json(&dir, &["similar", "--data", &data(), "--context", "home_evening"]);
    let ranked = out.as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["context_id"], "home_morning");
    assert!((ranked[0]["similarity"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    assert_eq!(ranked[1]["context_id"], "commute_morning");
    assert_eq!(ranked[1]["similarity"].as_f64().unwrap(), 0.0);
}

#[test]
fn test_rules_for_context() {
    let dir = TempDir::new().unwrap();
    let out = run_json(
        &dir,
        &["rules", "--data", &data(), "--context", "commute_morning"],
    );
    let rules = out.as_array().unwrap();
    assert!(rules
        .iter()
        .any(|r| r["consequent"] == "news" && r["confidence"].as_f64().unwrap() > 0.6));
}

#[test]
fn test_evaluate_held_out() {
    let dir = TempDir::new().unwrap();
    let test = fixture("held_out.json").display().to_string();
    let out = run_json(
        &dir,
        &["evaluate", "--data", &data(), "--test", &test, "-k", "1"],
    );
    assert_eq!(out["contexts_evaluated"], 2);
    assert_eq!(out["skipped_contexts"], 1);
    assert_eq!(out["hit_rate"].as_f64().unwrap(), 1.0);
}

#[test]
fn test_config_set_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["config", "set", "ranking.direct_weight", "0.7"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&dir, &["config", "get", "ranking.direct_weight"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "0.7");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_rejects_invalid_blend() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "set", "ranking.direct_weight", "0.1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("direct_weight"));
}

#[test]
fn test_config_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "get", "habit.gamma"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_reset_and_list() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["config", "set", "habit.alpha", "0.3"]);
    let (_, _, code) = run_cli(&dir, &["config", "reset"]);
    assert_eq!(code, 0);

    let out = run_json(&dir, &["config", "list"]);
    assert_eq!(out["habit"]["alpha"], 0.5);
    assert_eq!(out["rules"]["max_antecedent_len"], 2);
}
