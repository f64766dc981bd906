//! Integration tests for gridcast CLI

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn run_gridcast(args: &[&str]) -> (String, String, bool) {
    let mut cmd_args = vec!["run", "-q", "-p", "gridcast", "--"];
    cmd_args.extend(args);

    let output = Command::new("cargo")
        .args(&cmd_args)
        .current_dir(env!("CARGO_MANIFEST_DIR").to_string() + "/..")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

const TABLE: &str = r#"{
    "id": "people",
    "caption": "People",
    "footer": "3 people",
    "columns": [
        {"title": "Name", "property": "name", "sortable": true},
        {"title": "Age", "property": "age", "sortable": true},
        {"title": "City", "property": "city"}
    ],
    "rows": [
        {"name": "Cy", "age": 30, "city": "Oslo"},
        {"name": "Al", "age": 50, "city": "Rome"},
        {"name": "Bo", "age": 40, "city": "Lima", "securedForUser": true}
    ]
}"#;

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help() {
    let (stdout, _, success) = run_gridcast(&["--help"]);

    assert!(success);
    assert!(stdout.contains("gridcast"));
    assert!(stdout.contains("--format"));
    assert!(stdout.contains("--customization"));
    assert!(stdout.contains("--sort-column"));
}

#[test]
fn test_cli_version() {
    let (stdout, _, success) = run_gridcast(&["--version"]);

    assert!(success);
    assert!(stdout.contains("gridcast"));
}

#[test]
fn test_csv_sorted_descending() {
    let dir = TempDir::new().unwrap();
    let table = write_fixture(&dir, "table.json", TABLE);

    let (stdout, _, success) = run_gridcast(&[
        &table,
        "--format",
        "csv",
        "--sort-column",
        "1",
        "--descending",
    ]);

    assert!(success);
    assert_eq!(
        stdout,
        "\"People\"\n\"Name\",\"Age\",\"City\"\n\"Al\",\"50\",\"Rome\"\n\
         \"\",\"\",\"\"\n\"Cy\",\"30\",\"Oslo\"\n\"3 people\"\n"
    );
}

#[test]
fn test_customization_payload() {
    let dir = TempDir::new().unwrap();
    let table = write_fixture(&dir, "table.json", TABLE);
    let payload = write_fixture(
        &dir,
        "payload.json",
        r#"{
            "people-12": {
                "columnConfigurations": [
                    {"cotsTitle": "City", "displayOrder": 0, "customTitle": "Town"},
                    {"cotsTitle": "Name", "displayOrder": 1},
                    {"cotsTitle": "Age", "displayOrder": 2, "hidden": true}
                ],
                "defaultTableSortProperty": "name"
            }
        }"#,
    );

    let (stdout, _, success) = run_gridcast(&[&table, "-f", "csv", "--customization", &payload]);

    assert!(success);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines[1], "\"Town\",\"Name\"");
    assert_eq!(lines[2], "\"Rome\",\"Al\"");
    assert_eq!(lines[4], "\"Oslo\",\"Cy\"");
}

#[test]
fn test_html_output_to_file() {
    let dir = TempDir::new().unwrap();
    let table = write_fixture(&dir, "table.json", TABLE);
    let out = dir.path().join("people.html");
    let out_str = out.to_string_lossy().to_string();

    let (_, _, success) = run_gridcast(&[&table, "--output", &out_str]);

    assert!(success);
    let html = fs::read_to_string(Path::new(&out)).unwrap();
    assert!(html.starts_with("<table id=\"people\">"));
    assert!(html.contains("<caption>People</caption>"));
    assert!(html.contains("<tfoot>"));
}

#[test]
fn test_xlsx_output_is_a_workbook() {
    let dir = TempDir::new().unwrap();
    let table = write_fixture(&dir, "table.json", TABLE);
    let out = dir.path().join("people.xlsx");
    let out_str = out.to_string_lossy().to_string();

    let (_, _, success) = run_gridcast(&[&table, "--format", "xlsx", "-o", &out_str]);

    assert!(success);
    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let table = write_fixture(&dir, "table.json", TABLE);
    let config = write_fixture(
        &dir,
        "config.json",
        r#"{"media": "csv", "include_header": false, "secured_mask": "n/a", "csv_delimiter": 59}"#,
    );

    let (stdout, _, success) = run_gridcast(&[&table, "--config", &config]);

    assert!(success);
    assert!(!stdout.contains("\"Name\""));
    assert!(stdout.contains("\"n/a\";\"n/a\";\"n/a\""));
}

#[test]
fn test_missing_table_fails() {
    let (_, stderr, success) = run_gridcast(&["/nonexistent/table.json"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("cannot read"));
}

#[test]
fn test_unknown_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    let table = write_fixture(&dir, "table.json", TABLE);

    let (_, _, success) = run_gridcast(&[&table, "--format", "pdf"]);

    assert!(!success);
}
