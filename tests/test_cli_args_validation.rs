use assert_cmd::Command;
use predicates::prelude::*;

mod helpers;
use helpers::TrailFixture;

#[test]
fn test_missing_filter_prints_usage() {
    let mut cmd = Command::cargo_bin("auditwatch").unwrap();

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_bad_event_id_prints_usage() {
    let mut cmd = Command::cargo_bin("auditwatch").unwrap();
    cmd.args(["/etc", "-e", "open", "--device", "/nonexistent/auditpipe"]);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("invalid event id"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_bad_process_prints_usage() {
    let mut cmd = Command::cargo_bin("auditwatch").unwrap();
    cmd.args(["/etc", "-p", "99999999999"]);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("invalid process"));
}

#[test]
fn test_unopenable_device_fails() {
    let mut cmd = Command::cargo_bin("auditwatch").unwrap();
    cmd.args(["-q", "/etc", "--device", "/nonexistent/auditpipe"]);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("/nonexistent/auditpipe"));
}

#[test]
fn test_list_prints_database_without_opening_device() {
    let fixture = TrailFixture::new(&[]);

    let mut cmd = Command::cargo_bin("auditwatch").unwrap();
    cmd.arg("-l")
        .arg("--event-db")
        .arg(fixture.event_db())
        .args(["--device", "/nonexistent/auditpipe"]);

    cmd.assert()
        .success()
        .stdout("0:AUE_NULL\n5:AUE_OPEN_RC\n72:AUE_OPEN_R\n");
}

#[test]
fn test_list_with_missing_database_prints_nothing() {
    let mut cmd = Command::cargo_bin("auditwatch").unwrap();
    cmd.args(["-l", "--event-db", "/nonexistent/audit_event"]);

    cmd.assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_settings_file_fails() {
    let fixture = TrailFixture::new(&[]);
    let settings = fixture.temp_dir.path().join("auditwatch.toml");
    std::fs::write(&settings, "log_level = \"loud\"\n").unwrap();

    let mut cmd = Command::cargo_bin("auditwatch").unwrap();
    cmd.arg("/etc").arg("-c").arg(&settings);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("auditwatch.toml"));
}
