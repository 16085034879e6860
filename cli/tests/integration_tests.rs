//! Integration tests for the conversion CLI.
//!
//! Each test works in its own temporary directory so converted files never
//! land in the source tree.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const SIMPLE_IGO: &str = "package p\n\nfunc f()\n\treturn 1\n";
const SIMPLE_GO: &str = "package p\n\nfunc f() {\n\treturn 1\n}\n";

fn indigo() -> Command {
    Command::cargo_bin("indigo").unwrap()
}

#[test]
fn compile_converts_indented_to_curly() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.igo");
    fs::write(&source, SIMPLE_IGO).unwrap();

    indigo().arg("compile").arg(&source).assert().success();

    let converted = fs::read_to_string(dir.path().join("main.go")).unwrap();
    assert_eq!(converted, SIMPLE_GO);
}

#[test]
fn parse_converts_curly_to_indented() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.go");
    fs::write(&source, SIMPLE_GO).unwrap();

    indigo().arg("parse").arg(&source).assert().success();

    let converted = fs::read_to_string(dir.path().join("main.igo")).unwrap();
    assert_eq!(converted, SIMPLE_IGO);
}

#[test]
fn round_trip_restores_the_original_bytes() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.igo");
    fs::write(&source, SIMPLE_IGO).unwrap();

    indigo().arg("compile").arg(&source).assert().success();
    indigo()
        .arg("parse")
        .arg(dir.path().join("main.go"))
        .assert()
        .success();

    let back = fs::read_to_string(&source).unwrap();
    assert_eq!(back, SIMPLE_IGO);
}

#[test]
fn directories_are_walked_recursively() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("a.igo"), SIMPLE_IGO).unwrap();
    fs::write(dir.path().join("nested/b.igo"), SIMPLE_IGO).unwrap();
    // files of the other syntax are not picked up
    fs::write(dir.path().join("c.go"), SIMPLE_GO).unwrap();

    indigo().arg("compile").arg(dir.path()).assert().success();

    assert!(dir.path().join("a.go").exists());
    assert!(dir.path().join("nested/b.go").exists());
    assert!(!dir.path().join("c.igo").exists());
}

#[test]
fn dest_flag_redirects_output() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let source = dir.path().join("main.igo");
    fs::write(&source, SIMPLE_IGO).unwrap();

    indigo()
        .arg("compile")
        .arg("--dest")
        .arg(&out)
        .arg(&source)
        .assert()
        .success();

    assert!(out.join("main.go").exists());
    assert!(!dir.path().join("main.go").exists());
}

#[test]
fn comments_flag_controls_comment_passthrough() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.igo");
    fs::write(&source, "package p\n\n# kept\nfunc f()\n\treturn 1\n").unwrap();

    indigo().arg("compile").arg(&source).assert().success();
    let with_comments = fs::read_to_string(dir.path().join("main.go")).unwrap();
    assert!(with_comments.contains("// kept"));

    indigo()
        .arg("compile")
        .arg("--comments=false")
        .arg(&source)
        .assert()
        .success();
    let without_comments = fs::read_to_string(dir.path().join("main.go")).unwrap();
    assert!(!without_comments.contains("kept"));
}

#[test]
fn scan_errors_report_position_and_fail() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.igo");
    fs::write(&source, "package p\n\nfunc f()\n\tx := \"abc\n").unwrap();

    indigo()
        .arg("compile")
        .arg(&source)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("main.igo:4:7"))
        .stderr(predicate::str::contains("unterminated string literal"));
}

#[test]
fn parse_errors_fail_with_diagnostics() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.go");
    fs::write(&source, "package p\n\nfunc 1() {\n}\n").unwrap();

    indigo()
        .arg("parse")
        .arg(&source)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected identifier"));
}

#[test]
fn empty_file_converts_to_empty_output() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.igo");
    fs::write(&source, "").unwrap();

    indigo().arg("compile").arg(&source).assert().success();
    let converted = fs::read_to_string(dir.path().join("main.go")).unwrap();
    assert_eq!(converted, "");
}

#[test]
fn build_is_reserved() {
    indigo()
        .arg("build")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not implemented"));
}

#[test]
fn missing_paths_is_a_usage_error() {
    indigo().arg("parse").assert().code(2);
}
