//! Integration test that writes run-report.schema.json
//!
//! Run with: cargo test -p apicontract-core --test generate_schema

use apicontract_core::report::generate_schema;

#[test]
fn write_schema_file() {
    let schema = generate_schema();

    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("run-report.schema.json");
    std::fs::write(&schema_path, &schema).expect("failed to write schema file");

    // Verify the file is valid JSON
    let content = std::fs::read_to_string(&schema_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(
        parsed.get("title").and_then(|v| v.as_str()),
        Some("RunReport")
    );
    assert!(content.contains("\"outcomes\""));
}
