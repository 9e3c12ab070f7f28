#![allow(dead_code)]

use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Command isolated in its own HOME so neither the user config nor the
/// local storage slots leak into a test.
pub fn rmt(name: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("rmoldtracker");
    cmd.env("HOME", test_home(name))
        .env_remove("RMOLDTRACKER_API")
        .env_remove("RUST_LOG");
    cmd
}

pub fn test_home(name: &str) -> PathBuf {
    env::temp_dir().join(format!("{}_rmoldtracker_home", name))
}

/// Create a clean DB path in the system temp directory and a fresh HOME
pub fn setup_test_db(name: &str) -> String {
    let home = test_home(name);
    let _ = fs::remove_dir_all(&home);
    fs::create_dir_all(&home).expect("create test home");

    let db_path = env::temp_dir().join(format!("{}_rmoldtracker.sqlite", name));
    let _ = fs::remove_file(&db_path);
    db_path.to_string_lossy().to_string()
}

/// Fresh DB, already initialized
pub fn init_db(name: &str) -> String {
    let db_path = setup_test_db(name);
    rmt(name)
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success();
    db_path
}

/// Absolute output path for export tests (old file removed)
pub fn temp_out(name: &str, ext: &str) -> String {
    let path = env::temp_dir().join(format!("{}_rmoldtracker.{}", name, ext));
    let _ = fs::remove_file(&path);
    path.to_string_lossy().to_string()
}

/// Record a completed change with the given downtime.
pub fn add_completed(name: &str, db_path: &str, line: &str, prev: &str, new: &str, minutes: &str) {
    rmt(name)
        .args([
            "--db",
            db_path,
            "add",
            line,
            "--prev",
            prev,
            "--new",
            new,
            "--supervisor",
            "Marta",
            "--minutes",
            minutes,
        ])
        .assert()
        .success();
}
