#![cfg(feature = "cli")]
use assert_cmd::Command;
use insta::assert_snapshot;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

/// Copy fixtures into a scratch directory, keeping their file names so
/// cross-document references still line up.
fn stage(stems: &[&str]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    let paths = stems
        .iter()
        .map(|stem| {
            let schema = fs::read_to_string(format!("tests/fixtures/jsonschema/{stem}.json")).unwrap();
            let path = dir.path().join(format!("{stem}.json"));
            fs::write(&path, schema).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

fn jsonschema2go() -> Command {
    Command::cargo_bin("jsonschema2go").unwrap()
}

fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

fn run_fixture(name: &str, stems: &[&str]) {
    let (_dir, paths) = stage(stems);

    let assert = jsonschema2go().args(&paths).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert_snapshot!(name, output);
}

#[rstest]
#[case("person")]
#[case("union_and_formats")]
#[case("order_with_definitions")]
#[case("task_enums")]
#[case("recursive_category")]
#[case("tags")]
fn cli_fixtures(#[case] stem: &str) {
    run_fixture(stem, &[stem]);
}

#[test]
fn cross_document_references() {
    run_fixture("cross_document", &["invoice", "customer"]);
}

#[test]
fn output_file_and_package() {
    let (dir, paths) = stage(&["person"]);
    let output_path = dir.path().join("person.go");

    jsonschema2go()
        .arg("-p")
        .arg("models")
        .arg("-o")
        .arg(&output_path)
        .arg("-i")
        .arg(&paths[0])
        .assert()
        .success()
        .stdout("");

    let output = fs::read_to_string(&output_path).unwrap();
    assert!(output.starts_with("// Code generated by jsonschema2go. DO NOT EDIT.\n\npackage models\n"));
    assert!(output.contains("type Person struct {"));
}

#[test]
fn output_is_deterministic() {
    let (_dir, paths) = stage(&["order_with_definitions", "task_enums", "recursive_category"]);
    let first = jsonschema2go().args(&paths).output().unwrap();
    let second = jsonschema2go().args(&paths).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn root_name_flag_names_untitled_roots() {
    let (_dir, paths) = stage(&["tags"]);
    let assert = jsonschema2go()
        .arg("--root-name")
        .arg("labels")
        .args(&paths)
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("type Labels []string"), "{output}");
}

#[test]
fn syntax_errors_report_line_and_character() {
    let (_dir, paths) = stage(&["broken_syntax"]);
    let assert = jsonschema2go().args(&paths).assert().failure().code(1).stdout("");
    let stderr = stderr_of(&assert);
    assert!(stderr.contains("syntax error at line 3, character 3"), "{stderr}");
}

#[test]
fn shape_errors_report_path_line_and_character() {
    let (_dir, paths) = stage(&["wrong_keyword_type"]);
    let assert = jsonschema2go().args(&paths).assert().failure().code(1).stdout("");
    let stderr = stderr_of(&assert);
    assert!(stderr.contains("required at line 7, character 20"), "{stderr}");
    assert!(stderr.contains("expected a sequence"), "{stderr}");
}

#[rstest]
#[case("missing_reference", "\"#/definitions/user\"")]
#[case("undeclared_required", "required property \"email\"")]
fn fatal_errors_write_nothing(#[case] stem: &str, #[case] message: &str) {
    let (dir, paths) = stage(&[stem]);
    let output_path = dir.path().join("out.go");

    let assert = jsonschema2go()
        .arg("-o")
        .arg(&output_path)
        .args(&paths)
        .assert()
        .failure()
        .code(1);
    let stderr = stderr_of(&assert);
    assert!(stderr.contains(message), "{stderr}");

    assert!(!output_path.exists());
}

#[test]
fn missing_inputs_fail() {
    let assert = jsonschema2go().assert().failure();
    assert!(stderr_of(&assert).contains("no input JSON Schema files"));

    let assert = jsonschema2go().arg("does-not-exist.json").assert().failure();
    assert!(stderr_of(&assert).contains("failed to read does-not-exist.json"));
}
