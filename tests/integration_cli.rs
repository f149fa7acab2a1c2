// SheetScript - A sandboxed formula scripting runtime for character sheets
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! End-to-end CLI integration tests.

use std::path::Path;
use std::process::{Command, Output};

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sheetscript"))
}

fn run(args: &[&str]) -> Output {
    cargo_bin()
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn write_sheet(dir: &Path) -> String {
    let path = dir.join("conan.json");
    std::fs::write(
        &path,
        r#"{
            "id": "conan",
            "name": "Conan",
            "attributes": [
                { "id": "str", "name": "Strength", "formula": "18" },
                { "id": "str_mod", "formula": "floor(($str.value - 10) / 2)" }
            ]
        }"#,
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

/// Test --help flag.
#[test]
fn test_help_flag() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("sheetscript"));
    assert!(text.contains("--eval"));
    assert!(text.contains("--sheet"));
    assert!(text.contains("--watch"));
}

/// Test --version flag.
#[test]
fn test_version_flag() {
    let output = run(&["--version"]);

    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("sheetscript"));
    assert!(text.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_eval_expression() {
    let output = run(&["-e", "Math.max(1, 2) * 3"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "6");
}

#[test]
fn test_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("double.js");
    std::fs::write(&script, "function f(x) { return x * 2; }\nf(21)\n").unwrap();

    let output = run(&[script.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "Evaluation failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout(&output), "42");
}

#[test]
fn test_missing_script_is_usage_error() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unreadable_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.js");

    let output = run(&[missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_failures_degrade_without_raw() {
    let output = run(&["-e", "missing + 1"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");

    let output = run(&["-e", "missing + 1", "--number"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "0");
}

#[test]
fn test_raw_reports_errors() {
    let output = run(&["-e", "let a = 1;\na = a + missing;", "--raw"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("R211"));
    assert!(stderr.contains("missing is not defined"));
}

#[test]
fn test_raw_prints_values() {
    let output = run(&["-e", "[1, 2].join('+')", "--raw"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "1+2");
}

#[test]
fn test_sheet_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path());

    let output = run(&["-e", "$str_mod.value + 1", "--sheet", &sheet]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "5");
}

#[test]
fn test_self_attribute() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path());

    let output = run(&["-e", "self.name", "--sheet", &sheet, "--self", "str"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Strength");

    let output = run(&["-e", "self.name", "--sheet", &sheet, "--self", "dex"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_self_requires_sheet() {
    let output = run(&["-e", "self", "--self", "str"]);
    assert!(!output.status.success());
}

#[test]
fn test_step_budget_flag() {
    let script = "let i = 0; while (i < 100) { i++; } i";

    let output = run(&["-e", script, "--raw"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "100");

    let output = run(&["-e", script, "--raw", "--max-steps", "20"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("MaxStepsExceeded"));
}

#[test]
fn test_cache_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("world.json");
    let cache_arg = cache.to_str().unwrap();

    let output = run(&["-e", "6 * 7", "--cache", cache_arg]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "42");

    let json = std::fs::read_to_string(&cache).unwrap();
    assert!(json.contains("\"version\": 1"));
    assert!(json.contains("6 * 7"));

    // A second run answers from the cache file.
    let output = run(&["-e", "6 * 7", "--cache", cache_arg, "--verbose"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "42");
    assert!(String::from_utf8_lossy(&output.stderr).contains("cache hit"));
}

#[test]
fn test_corrupt_cache_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("world.json");
    std::fs::write(&cache, "not json").unwrap();

    let output = run(&["-e", "1 + 1", "--cache", cache.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));
}
