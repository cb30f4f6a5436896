//! Request pipeline tests
//!
//! Drives `compare_payloads` / `compare_inputs` the way the CLI does: raw
//! bytes or files in, a serialized report out.

use std::io::Write;
use std::path::Path;

use avro_compat::ingest::{compare_inputs, NEW_LABEL, OLD_LABEL};
use avro_compat::{compare_payloads, CompatConfig, CompatibilityMode, IssueType, SchemaInput};
use serde_json::json;
use tempfile::NamedTempFile;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn lenient() -> CompatConfig {
    let mut config = CompatConfig::default();
    config.validation.strict_avro = false;
    config
}

const USER_V1: &[u8] = br#"{"type": "record", "name": "User", "fields": [{"name": "id", "type": "long"}]}"#;
const USER_V2: &[u8] = br#"{"type": "record", "name": "User", "fields": [
    {"name": "id", "type": "long"},
    {"name": "email", "type": "string"}
]}"#;

// =============================================================================
// Fixture files
// =============================================================================

#[test]
fn test_compatible_fixture_pair() {
    let old = fixture("user_v1.avsc");
    let new = fixture("user_v2_compatible.avsc");
    let config = CompatConfig::default();

    let comparison = compare_inputs(
        "backward",
        SchemaInput::File(&old),
        SchemaInput::File(&new),
        &config,
    )
    .unwrap();
    assert_eq!(comparison.mode, CompatibilityMode::Backward);
    assert!(comparison.report.compatible);
    assert_ne!(comparison.old.fingerprint, comparison.new.fingerprint);
    assert_eq!(comparison.old.label, OLD_LABEL);

    // The added enum symbol cannot be read by the old schema.
    let comparison = compare_inputs("full", SchemaInput::File(&old), SchemaInput::File(&new), &config).unwrap();
    assert_eq!(comparison.report.total_errors, Some(1));
    let issue = &comparison.report.errors[0];
    assert_eq!(issue.issue_type, IssueType::EnumSymbolRemoved);
    assert_eq!(issue.path, "User.status");
    assert!(issue.description.contains("SUSPENDED"));
}

#[test]
fn test_breaking_fixture_pair() {
    let old = fixture("user_v1.avsc");
    let new = fixture("user_v2_breaking.avsc");

    let comparison = compare_inputs(
        "backward",
        SchemaInput::File(&old),
        SchemaInput::File(&new),
        &CompatConfig::default(),
    )
    .unwrap();
    let report = comparison.report;
    assert!(!report.compatible);
    assert!(!report.is_rejection());

    let found: Vec<_> = report
        .errors
        .iter()
        .map(|e| (e.path.as_str(), e.issue_type))
        .collect();
    assert_eq!(
        found,
        vec![
            ("User.id", IssueType::TypeMismatch),
            ("User.status", IssueType::EnumSymbolRemoved),
            ("User.createdAt", IssueType::LogicalTypeChanged),
            ("User.email", IssueType::MissingDefault),
        ]
    );
    assert_eq!(report.total_errors, Some(4));
}

// =============================================================================
// Report shape
// =============================================================================

#[test]
fn test_report_serialization() {
    let config = CompatConfig::default();

    let report = compare_payloads(USER_V1, USER_V1, "full", &config).unwrap();
    assert_eq!(serde_json::to_value(&report).unwrap(), json!({"compatible": true}));

    let report = compare_payloads(USER_V1, USER_V2, "backward", &config).unwrap();
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "compatible": false,
            "totalErrors": 1,
            "errors": [{
                "path": "User.email",
                "issueType": "MISSING_DEFAULT",
                "writerType": "absent",
                "readerType": "string",
                "description": "New field was added without default value."
            }]
        })
    );
}

#[test]
fn test_full_mode_orders_backward_before_forward() {
    let old = br#"{"type": "record", "name": "R", "fields": [
        {"name": "a", "type": "string"}
    ]}"#;
    let new = br#"{"type": "record", "name": "R", "fields": [
        {"name": "b", "type": "string"}
    ]}"#;

    let report = compare_payloads(old, new, "full", &CompatConfig::default()).unwrap();
    let types: Vec<_> = report.errors.iter().map(|e| (e.path.as_str(), e.issue_type)).collect();
    assert_eq!(
        types,
        vec![
            ("R.b", IssueType::MissingDefault),
            ("R.a", IssueType::RemovedField),
        ]
    );
}

// =============================================================================
// Guards
// =============================================================================

#[test]
fn test_invalid_mode_is_checked_first() {
    let report = compare_payloads(b"not json", b"{", "sideways", &CompatConfig::default()).unwrap();
    assert!(!report.compatible);
    assert!(report.is_rejection());
    assert_eq!(report.total_errors, Some(1));

    let issue = &report.errors[0];
    assert_eq!(issue.issue_type, IssueType::InvalidMode);
    assert_eq!(issue.path, "mode");
    assert_eq!(issue.writer_type, "sideways");
}

#[test]
fn test_mode_is_case_insensitive() {
    let report = compare_payloads(USER_V1, USER_V1, "  FULL ", &CompatConfig::default()).unwrap();
    assert!(report.compatible);
}

#[test]
fn test_oversized_payload() {
    let mut config = CompatConfig::default();
    config.limits.max_schema_bytes = 16;

    let report = compare_payloads(USER_V1, br#""int""#, "backward", &config).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].issue_type, IssueType::FileTooLarge);
    assert_eq!(report.errors[0].path, OLD_LABEL);
}

#[test]
fn test_invalid_json() {
    let report = compare_payloads(USER_V1, br#"{"type": "record",}"#, "backward", &CompatConfig::default()).unwrap();
    assert_eq!(report.errors.len(), 1);
    let issue = &report.errors[0];
    assert_eq!(issue.issue_type, IssueType::InvalidSchemaJson);
    assert_eq!(issue.path, NEW_LABEL);
    assert!(issue.description.starts_with("Invalid JSON: "));
    assert!(issue.description.contains("line 1"));
}

#[test]
fn test_invalid_utf8() {
    let report = compare_payloads(&[0xc3, 0x28], USER_V1, "backward", &CompatConfig::default()).unwrap();
    assert_eq!(report.errors[0].issue_type, IssueType::InvalidSchemaJson);
    assert_eq!(report.errors[0].description, "Schema file must be UTF-8 encoded.");
}

#[test]
fn test_invalid_avro_schema() {
    let missing_fields = br#"{"type": "record", "name": "User"}"#;
    let report = compare_payloads(USER_V1, missing_fields, "backward", &CompatConfig::default()).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].issue_type, IssueType::InvalidAvroSchema);
    assert_eq!(report.errors[0].path, NEW_LABEL);

    let report = compare_payloads(b"42", USER_V1, "backward", &lenient()).unwrap();
    assert_eq!(report.errors[0].issue_type, IssueType::InvalidAvroSchema);
    assert_eq!(report.errors[0].writer_type, "number");
}

#[test]
fn test_unknown_reference_passes_lenient_validation() {
    let old = br#"{"type": "record", "name": "Order", "fields": [{"name": "customer", "type": "Customer"}]}"#;
    let new = br#"{"type": "record", "name": "Order", "fields": [{"name": "customer", "type": "string"}]}"#;

    let report = compare_payloads(old, new, "backward", &lenient()).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].issue_type, IssueType::UnknownWriterType);
    assert_eq!(report.errors[0].path, "Order.customer");
}

#[test]
fn test_duplicate_names_rejected_when_configured() {
    let schema = br#"["null",
        {"type": "enum", "name": "Kind", "symbols": ["A"]},
        {"type": "fixed", "name": "Kind", "size": 4}
    ]"#;

    let mut config = lenient();
    assert!(compare_payloads(schema, schema, "backward", &config).unwrap().compatible);

    config.validation.reject_duplicate_names = true;
    let report = compare_payloads(schema, schema, "backward", &config).unwrap();
    assert_eq!(report.errors[0].issue_type, IssueType::InvalidAvroSchema);
    assert!(report.errors[0].description.contains("Kind"));
}

// =============================================================================
// File inputs
// =============================================================================

#[test]
fn test_schema_files_from_disk() {
    let mut old = NamedTempFile::new().unwrap();
    old.write_all(USER_V1).unwrap();
    let mut new = NamedTempFile::new().unwrap();
    new.write_all(USER_V2).unwrap();

    let comparison = compare_inputs(
        "forward",
        SchemaInput::File(old.path()),
        SchemaInput::File(new.path()),
        &CompatConfig::default(),
    )
    .unwrap();
    assert!(comparison.report.compatible);
}

#[test]
fn test_oversized_file_is_rejected_before_reading() {
    let mut big = NamedTempFile::new().unwrap();
    big.write_all(&vec![b' '; 64]).unwrap();
    big.write_all(USER_V1).unwrap();

    let mut config = CompatConfig::default();
    config.limits.max_schema_bytes = 64;

    let err = compare_inputs(
        "backward",
        SchemaInput::File(big.path()),
        SchemaInput::Bytes(USER_V1),
        &config,
    )
    .unwrap_err();
    let issue = err.to_issue().unwrap();
    assert_eq!(issue.issue_type, IssueType::FileTooLarge);
    assert_eq!(issue.reader_type, "<= 64 bytes");
}

#[test]
fn test_missing_file_is_invalid_upload() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.avsc");

    let err = compare_inputs(
        "backward",
        SchemaInput::Bytes(USER_V1),
        SchemaInput::File(&missing),
        &CompatConfig::default(),
    )
    .unwrap_err();
    assert!(err.is_guard_failure());
    let issue = err.to_issue().unwrap();
    assert_eq!(issue.issue_type, IssueType::InvalidUpload);
    assert_eq!(issue.path, NEW_LABEL);
}
