//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;

const FLAVORS_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="list">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="flavor" type="xs:string" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_xml-output-parser"))
}

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("Fixture path is not UTF-8")
}

// ============================================================================
// Validate Command Tests
// ============================================================================

#[test]
fn test_cli_validate_valid_document() {
    let dir = TempDir::new().unwrap();
    let schema = write_fixture(&dir, "flavors.xsd", FLAVORS_XSD);
    let doc = write_fixture(&dir, "doc.xml", "<list><flavor>Mint</flavor></list>");

    let output = Command::new(bin())
        .args(["validate", "--schema", arg(&schema), arg(&doc)])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "validate should succeed");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "valid");
}

#[test]
fn test_cli_validate_invalid_document() {
    let dir = TempDir::new().unwrap();
    let schema = write_fixture(&dir, "flavors.xsd", FLAVORS_XSD);
    let doc = write_fixture(&dir, "doc.xml", "<list><color>Red</color></list>");

    let output = Command::new(bin())
        .args(["validate", "--schema", arg(&schema), arg(&doc)])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("XML does not conform to the provided XSD"));
    assert!(stdout.contains("Element 'color': This element is not expected. Expected is ( flavor ). (line: 1, column: 7)"));
}

#[test]
fn test_cli_validate_json_output() {
    let dir = TempDir::new().unwrap();
    let schema = write_fixture(&dir, "flavors.xsd", FLAVORS_XSD);
    let doc = write_fixture(&dir, "doc.xml", "<list/>");

    let output = Command::new(bin())
        .args(["validate", "--json", "--schema", arg(&schema), arg(&doc)])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let diagnostics: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    assert_eq!(
        diagnostics,
        serde_json::json!([{
            "message": "Element 'list': Missing child element(s). Expected is ( flavor ).",
            "line": 1,
            "column": 1
        }])
    );
}

#[test]
fn test_cli_validate_malformed_document() {
    let dir = TempDir::new().unwrap();
    let schema = write_fixture(&dir, "flavors.xsd", FLAVORS_XSD);
    let doc = write_fixture(&dir, "doc.xml", "<list><flavor></list>");

    let output = Command::new(bin())
        .args(["validate", "--schema", arg(&schema), arg(&doc)])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("XML error"));
}

#[test]
fn test_cli_validate_missing_schema() {
    let dir = TempDir::new().unwrap();
    let doc = write_fixture(&dir, "doc.xml", "<list/>");
    let missing = dir.path().join("missing.xsd");

    let output = Command::new(bin())
        .args(["validate", "--schema", arg(&missing), arg(&doc)])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: I/O error"));
}

// ============================================================================
// Instructions and Parse Command Tests
// ============================================================================

#[test]
fn test_cli_instructions() {
    let dir = TempDir::new().unwrap();
    let schema = write_fixture(&dir, "flavors.xsd", FLAVORS_XSD);

    let output = Command::new(bin())
        .args(["instructions", "--schema", arg(&schema)])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Your output must be formatted as an XML string"));
    assert!(stdout.contains(FLAVORS_XSD));
}

#[test]
fn test_cli_parse_from_stdin() {
    let dir = TempDir::new().unwrap();
    let schema = write_fixture(&dir, "flavors.xsd", FLAVORS_XSD);
    let text = "Here it is:\n```xml\n<list><flavor>Mint</flavor></list>\n```\n";

    let mut child = Command::new(bin())
        .args(["parse", "--schema", arg(&schema), "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(text.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), text);
}

#[test]
fn test_cli_parse_rejects_invalid_output() {
    let dir = TempDir::new().unwrap();
    let schema = write_fixture(&dir, "flavors.xsd", FLAVORS_XSD);
    let input = write_fixture(&dir, "output.txt", "```\n<list><color/></list>\n```");

    let output = Command::new(bin())
        .args(["parse", "--schema", arg(&schema), arg(&input)])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Failed to parse. Text: \"<list><color/></list>\""));
}
