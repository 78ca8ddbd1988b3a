use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REPORT: &str = "\
CIBIL Score
7 4 2
Score Date: 05/03/2024
Total Accounts: 2
HDFC Bank
Credit Card
Status: Active
Credit Limit: 1,00,000
Current Balance: 40,000
CREDILA
Education Loan
Closed
";

fn cibil() -> Command {
    Command::cargo_bin("cibil").unwrap()
}

fn write_report(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, REPORT).unwrap();
    path
}

#[test]
fn analyze_text_report_as_json() {
    let dir = TempDir::new().unwrap();
    let report = write_report(&dir, "report.txt");
    let config = dir.path().join("config.json");

    cibil().arg("-c").arg(&config).args(["config", "init"]).assert().success();
    assert!(config.exists());

    let assert = cibil().arg("-c").arg(&config).arg("analyze").arg(&report).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["score"]["value"], 742);
    assert_eq!(json["score_date"]["value"], "2024-03-05");
    assert_eq!(json["counts"]["card_count"], 1);
    assert_eq!(json["counts"]["loan_count"], 1);
}

#[test]
fn analyze_text_format_with_insights() {
    let dir = TempDir::new().unwrap();
    let report = write_report(&dir, "report.txt");

    cibil()
        .args(["analyze", "--format", "text", "--insights"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 742"))
        .stdout(predicate::str::contains("2. CREDILA - Education Loan - Closed"))
        .stdout(predicate::str::contains("High utilization (>30%)"));
}

#[test]
fn analyze_missing_file_fails() {
    cibil()
        .args(["analyze", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn analyze_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.docx");
    std::fs::write(&path, REPORT).unwrap();

    cibil()
        .arg("analyze")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    write_report(&dir, "a.txt");
    write_report(&dir, "b.txt");
    let out = dir.path().join("out");

    cibil()
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.lines().nth(1).unwrap().contains(",success,742,"));
}

#[test]
fn ask_dry_run_prints_prompt() {
    let dir = TempDir::new().unwrap();
    let report = write_report(&dir, "report.txt");

    cibil()
        .arg("ask")
        .arg(&report)
        .args(["--prompt", "How can I improve my score?", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 742"))
        .stdout(predicate::str::contains("Question: How can I improve my score?"));
}

#[test]
fn ask_without_key_fails() {
    let dir = TempDir::new().unwrap();
    let report = write_report(&dir, "report.txt");

    cibil()
        .env_remove("CIBIL_ADVISORY_API_KEY")
        .arg("ask")
        .arg(&report)
        .args(["--prompt", "Why?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key"));
}

#[test]
fn config_set_and_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    cibil()
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "extraction.dedup_window", "120"])
        .assert()
        .success();

    cibil()
        .arg("-c")
        .arg(&config)
        .args(["config", "get", "extraction.dedup_window"])
        .assert()
        .success()
        .stdout(predicate::str::diff("120\n"));

    cibil()
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}
