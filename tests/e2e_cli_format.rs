//! End-to-end formatting through the `format` subcommand and a real
//! `prettier` executable.
//!
//! Run with `cargo test --features e2e`. Tests return early when no
//! prettier is installed.
#![cfg(feature = "e2e")]

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn prettier_available() -> bool {
    let found = which::which("prettier").is_ok();
    if !found {
        eprintln!("prettier not found on PATH; skipping");
    }
    found
}

fn server_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_prettier-ls"))
}

#[test]
fn formats_a_javascript_file() {
    if !prettier_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("index.js");
    fs::write(&file, "const a = {b:1}\n").unwrap();

    let output = server_binary()
        .arg("format")
        .arg(&file)
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "const a = { b: 1 };\n");
}

#[test]
fn project_config_is_honored() {
    if !prettier_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".prettierrc"), "{ \"semi\": false }\n").unwrap();
    let file = dir.path().join("index.js");
    fs::write(&file, "const a = 1;\n").unwrap();

    let output = server_binary()
        .arg("format")
        .arg(&file)
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "const a = 1\n");
}

#[test]
fn stdin_text_is_formatted_with_the_file_path_for_context() {
    if !prettier_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("style.css");

    let mut child = server_binary()
        .arg("format")
        .arg(&file)
        .arg("--stdin")
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"a{color:red}")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "a {\n  color: red;\n}\n"
    );
}

#[test]
fn syntax_errors_leave_the_text_unchanged_and_fail() {
    if !prettier_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.js");
    fs::write(&file, "const = ;\n").unwrap();

    let output = server_binary()
        .arg("format")
        .arg(&file)
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "const = ;\n");
}

#[test]
fn ignored_files_are_printed_as_is() {
    if !prettier_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".prettierignore"), "vendor.js\n").unwrap();
    let file = dir.path().join("vendor.js");
    fs::write(&file, "const a = {b:1}\n").unwrap();

    let output = server_binary()
        .arg("format")
        .arg(&file)
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "const a = {b:1}\n");
}
