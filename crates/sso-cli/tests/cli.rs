use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn report(id: &str, permittee: &str, water: &str, footer: &str) -> String {
    format!(
        "SSO Event - Information\n\
         Permit Number AL0049859\n\
         Permittee: {permittee}\n\
         Assigned SSO ID SSO-{id}\n\
         Date/Time SSO Event Started: Date Time 03/14/2024 07:30 AM\n\
         Date/Time SSO Event Stopped: Date Time 03/14/2024 11:15 AM\n\
         Estimated Volume Discharged (in gallons) 2,500\n\
         Latitude/Longitude of discharge 30.6035, -87.9036\n\
         Provide the first named creek or river that receives the flow.\n\
         {water}\n\
         {footer}\n"
    )
}

/// Input directory with three reports (two sharing a creek) and one empty file.
fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(input.join("2024")).unwrap();
    fs::write(
        input.join("a.txt"),
        report("101", "City of Foley", "Cypress Creek", "3/15/2024 10:22:11 AM"),
    )
    .unwrap();
    fs::write(
        input.join("2024").join("b.txt"),
        report("102", "Mobile Area Water and Sewer System", "Cypress Creek", ""),
    )
    .unwrap();
    fs::write(input.join("c.txt"), report("103", "City of Daphne", "Unique Bayou", "")).unwrap();
    fs::write(input.join("empty.txt"), "").unwrap();
    fs::write(dir.path().join("config.json"), "{}").unwrap();
    dir
}

fn sso(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sso").unwrap();
    cmd.arg("--config").arg(dir.join("config.json"));
    cmd
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("sso")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn parse_writes_csv_dataset() {
    let dir = fixture();
    let output = dir.path().join("out").join("sso.csv");

    sso(dir.path())
        .arg("parse")
        .arg(dir.path().join("in"))
        .arg("-o")
        .arg(&output)
        .arg("--no-ocr")
        .arg("-j")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 records"))
        .stdout(predicate::str::contains("empty.txt"));

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("report_id,org_id,org_name,facility,county,began_at"));
    assert!(lines[0].ends_with("cause_category,location_desc,source_file"));
    assert_eq!(lines.len(), 4);
    assert!(csv.contains("SSO-101,AL0049859,Utilities of Foley"));
    assert!(csv.contains("Cypress Creek - Foley"));
    assert!(csv.contains("Cypress Creek - MAWSS"));
    assert!(csv.contains(",Unique Bayou,"));
    assert!(csv.contains("2024/b.txt"));
}

#[test]
fn parse_writes_json_and_status() {
    let dir = fixture();
    let output = dir.path().join("sso.json");
    let status = dir.path().join("status.json");

    sso(dir.path())
        .arg("parse")
        .arg(dir.path().join("in"))
        .arg("-o")
        .arg(&output)
        .arg("--format")
        .arg("json")
        .arg("--status")
        .arg(&status)
        .arg("--no-ocr")
        .assert()
        .success();

    let records: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 3);
    let foley = records
        .iter()
        .find(|r| r["report_id"] == "SSO-101")
        .unwrap();
    assert_eq!(foley["org_name"], "Utilities of Foley");
    assert_eq!(foley["raw"]["permittee"], "City of Foley");

    let status: serde_json::Value = serde_json::from_str(&fs::read_to_string(&status).unwrap()).unwrap();
    assert_eq!(status["summary"]["scanned"], 4);
    assert_eq!(status["summary"]["kept"], 3);
    assert_eq!(status["summary"]["waterways_disambiguated"], 1);
    assert_eq!(status["summary"]["skipped"][0]["reason"], "text_acquisition_failed");
    assert_eq!(status["summary"]["skipped"][0]["document"], "empty.txt");
}

#[test]
fn parse_rejects_missing_directory() {
    let dir = fixture();
    sso(dir.path())
        .arg("parse")
        .arg(dir.path().join("nope"))
        .arg("-o")
        .arg(dir.path().join("x.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input directory not found"));
}

#[test]
fn inspect_prints_fields_and_record() {
    let dir = fixture();
    sso(dir.path())
        .arg("inspect")
        .arg(dir.path().join("in").join("a.txt"))
        .arg("--no-ocr")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"report_id\": \"SSO-101\""))
        .stdout(predicate::str::contains("\"permittee\": \"City of Foley\""))
        .stdout(predicate::str::contains("\"origin\": \"TextLayer\""));
}

#[test]
fn config_set_and_get_round_trip() {
    let dir = fixture();
    sso(dir.path())
        .args(["config", "set", "acquisition.min_text_length", "80"])
        .assert()
        .success();
    sso(dir.path())
        .args(["config", "get", "acquisition.min_text_length"])
        .assert()
        .success()
        .stdout(predicate::str::contains("80"));
    sso(dir.path())
        .args(["config", "set", "acquisition.no_such_key", "1"])
        .assert()
        .failure();
}
