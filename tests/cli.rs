#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A fake utility: `sh -c <script> -p <config>` sees the config as `$1`.
fn utility(script: &str) -> String {
    shell_words::join(["sh", "-c", script])
}

fn syncflow(args: &[&str], script: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_syncflow"))
        .args(args)
        .arg("--utility")
        .arg(utility(script))
        .env_remove("RUST_LOG")
        .env_remove("SYNCFLOW_UTILITY")
        .output()
        .unwrap()
}

fn write_single(dir: &Path, name: &str, course: u64) {
    fs::write(
        dir.join(name),
        format!(r#"{{"token": "t", "base_url": "https://canvas.example.edu", "course_id": {course}}}"#),
    )
    .unwrap();
}

#[test]
fn batch_with_one_failure_exits_one_and_reports_two_of_three() {
    let dir = TempDir::new().unwrap();
    write_single(dir.path(), "a.json", 1);
    write_single(dir.path(), "b-bad.json", 2);
    write_single(dir.path(), "c.json", 3);

    let output = syncflow(
        &["-d", dir.path().to_str().unwrap()],
        r#"case "$1" in *bad*) echo 'KeyError: course' ;; *) echo 'Get 5 files!'; echo 'Start to download 5 file(s)!' ;; esac"#,
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Done: 2/3 configurations synced, 10 file(s) downloaded"),
        "{stderr}"
    );
    assert!(stderr.contains("Is the Canvas API token valid?"), "{stderr}");
}

#[test]
fn all_successful_configs_exit_zero() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("course.json");
    fs::write(
        &config,
        r#"{"token": "t", "canvasURL": "https://canvas.example.edu", "courseIDs": [1, 2]}"#,
    )
    .unwrap();

    let output = syncflow(&["-p", config.to_str().unwrap()], "true");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn config_without_token_never_reaches_the_utility() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("course.json");
    fs::write(&config, r#"{"base_url": "https://canvas.example.edu", "course_id": 1}"#).unwrap();
    let marker = dir.path().join("invoked");

    let output = syncflow(
        &["-p", config.to_str().unwrap()],
        &format!("touch '{}'", marker.display()),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(!marker.exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required field 'token'"), "{stderr}");
}

#[test]
fn timeout_fails_the_course_and_moves_on() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("slow.json");
    fs::write(
        &config,
        r#"{"token": "t", "canvasURL": "https://canvas.example.edu", "courseIDs": [1]}"#,
    )
    .unwrap();

    let started = Instant::now();
    let output = syncflow(
        &["-p", config.to_str().unwrap(), "-t", "1"],
        "echo 'Get 3 files!'; exec sleep 30",
    );

    assert!(started.elapsed() < Duration::from_secs(20));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timed out"), "{stderr}");
}

#[test]
fn missing_config_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let output = syncflow(&["-p", dir.path().join("nope.json").to_str().unwrap()], "true");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration file not found"), "{stderr}");
}

#[test]
fn config_and_dir_are_mutually_exclusive() {
    let output = syncflow(&["-p", "a.json", "-d", "b"], "true");
    assert_eq!(output.status.code(), Some(2));
}
