//! The four file operations against real files in a temporary directory.

use grug_ast::{
    apply_file_ast, dump_file_ast, dump_file_to_json, generate_file_from_json, parse, ErrorKind,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;

const M60: &str = include_str!("fixtures/m60.grug");

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_dump_compact_and_pretty() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "m60.grug", M60);
    let compact = dir.path().join("compact.json");
    let pretty = dir.path().join("pretty.json");

    dump_file_ast(&source, &compact).unwrap();
    dump_file_to_json(&source, &pretty).unwrap();

    assert_eq!(fs::read_to_string(&compact).unwrap().lines().count(), 1);
    assert!(fs::read_to_string(&pretty).unwrap().lines().count() > 1);
    assert_eq!(read_json(&compact), read_json(&pretty));
    assert_eq!(read_json(&compact)["entity"]["name"], "gun");
}

#[test]
fn test_rpm_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "m60.grug", M60);
    let json = dir.path().join("dump.json");

    dump_file_ast(&source, &json).unwrap();
    let mut data = read_json(&json);
    let rpm: i32 = data["entity"]["fields"][2]["value"]["value"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    data["entity"]["fields"][2]["value"]["value"] = Value::from((rpm * 2).to_string());
    fs::write(&json, data.to_string()).unwrap();

    assert!(apply_file_ast(&json, &source).unwrap());

    dump_file_ast(&source, &json).unwrap();
    assert_eq!(read_json(&json)["entity"]["fields"][2]["value"]["value"], "600");
    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        M60.replace("= 300,", "= 600,")
    );
}

#[test]
fn test_unchanged_apply_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "m60.grug", M60);
    let json = dir.path().join("dump.json");
    dump_file_to_json(&source, &json).unwrap();

    let before = fs::metadata(&source).unwrap().modified().unwrap();
    assert!(!apply_file_ast(&json, &source).unwrap());
    assert_eq!(fs::metadata(&source).unwrap().modified().unwrap(), before);
    assert_eq!(fs::read_to_string(&source).unwrap(), M60);
}

#[test]
fn test_failed_apply_leaves_target_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "m60.grug", M60);
    let json = dir.path().join("dump.json");
    dump_file_ast(&source, &json).unwrap();

    let mut data = read_json(&json);
    data["entity"]["fields"][0]
        .as_object_mut()
        .unwrap()
        .remove("type");
    fs::write(&json, data.to_string()).unwrap();

    let diagnostic = apply_file_ast(&json, &source).unwrap_err();
    assert_eq!(diagnostic.kind, ErrorKind::Decode);
    assert_eq!(diagnostic.path, json);
    assert!(!diagnostic.message.is_empty());
    assert!(!diagnostic.has_changed);
    assert_eq!(fs::read_to_string(&source).unwrap(), M60);

    let shown = diagnostic.to_string();
    assert!(shown.starts_with(&format!("{}:", json.display())));
    assert!(shown.contains("(detected by "));
}

#[test]
fn test_generate_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "m60.grug", M60);
    let json = dir.path().join("dump.json");
    let output = dir.path().join("m60-gun.grug");

    dump_file_ast(&source, &json).unwrap();
    generate_file_from_json(&json, &output).unwrap();

    let generated = fs::read_to_string(&output).unwrap();
    assert!(!generated.contains('#'));
    assert_eq!(parse(&generated).unwrap(), parse(M60).unwrap());
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.grug");
    let json = dir.path().join("dump.json");

    let diagnostic = dump_file_ast(&missing, &json).unwrap_err();
    assert_eq!(diagnostic.kind, ErrorKind::Io);
    assert_eq!(diagnostic.path, missing);
    assert_eq!(diagnostic.line, 0);
    assert!(!json.exists());
}

#[test]
fn test_syntax_error_reports_source_path_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "bad.grug", "entity gun {\n\tdamage: i32 = ,\n}\n");
    let json = dir.path().join("dump.json");

    let diagnostic = dump_file_ast(&source, &json).unwrap_err();
    assert_eq!(diagnostic.kind, ErrorKind::Syntax);
    assert_eq!(diagnostic.path, source);
    assert_eq!(diagnostic.line, 2);
    assert!(!json.exists());
}
