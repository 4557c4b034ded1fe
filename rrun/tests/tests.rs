use predicates::prelude::PredicateBooleanExt;

#[test]
fn test_exit_code_is_passed_through() {
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["sh", "-c", "exit 3"])
        .assert()
        .code(3);
}

#[test]
fn test_successful_command_exits_zero() {
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["echo", "hello"])
        .assert()
        .success();
}

#[test]
fn test_head_prints_captured_stdout() {
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["--head", "2", "sh", "-c", "seq 1 5"])
        .assert()
        .success()
        .stdout(predicates::str::contains("1\n2\n").and(predicates::str::contains("3").not()));
}

#[test]
fn test_tail_prints_captured_stdout() {
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["--tail", "1", "sh", "-c", "seq 1 5"])
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn test_head_rejects_non_positive_count() {
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["--head", "0", "echo", "hello"])
        .assert()
        .code(1);
}

#[test]
fn test_timeout_maps_to_exit_255() {
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["--timeout", "200ms", "sleep", "5"])
        .assert()
        .code(255);
}

#[test]
fn test_error_marker_is_reported_on_stderr() {
    // classification errors are logged even at the default verbosity
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["sh", "-c", "echo '[ERROR] boom'"])
        .assert()
        .success()
        .stderr(predicates::str::contains("boom"));
}

#[test]
fn test_quiet_suppresses_error_reporting() {
    assert_cmd::Command::cargo_bin("rrun")
        .unwrap()
        .args(["-q", "sh", "-c", "echo '[ERROR] boom'"])
        .assert()
        .success()
        .stderr(predicates::str::contains("boom").not());
}
