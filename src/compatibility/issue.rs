//! Issue and report model emitted at the checker boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CompatError;

/// Classification of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// A writer-side named-type reference could not be resolved
    UnknownWriterType,
    /// A reader-side named-type reference could not be resolved
    UnknownReaderType,
    /// `logicalType` differs, including presence vs. absence
    LogicalTypeChanged,
    /// Disallowed promotion, kind mismatch, name mismatch or fixed size mismatch
    TypeMismatch,
    /// Backward pass: reader field added without a default
    MissingDefault,
    /// Forward pass: writer dropped a field the reader needs and has no default for
    RemovedField,
    /// Writer enum symbols missing from the reader enum
    EnumSymbolRemoved,
    /// No compatible counterpart branch in a union
    UnionMismatch,
    /// Resolved node is not a recognized Avro kind
    UnsupportedType,
    /// Nesting exceeded the configured comparison depth
    MaxDepthExceeded,
    InvalidMode,
    InvalidUpload,
    InvalidSchemaJson,
    FileTooLarge,
    InvalidAvroSchema,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::UnknownWriterType => "UNKNOWN_WRITER_TYPE",
            IssueType::UnknownReaderType => "UNKNOWN_READER_TYPE",
            IssueType::LogicalTypeChanged => "LOGICAL_TYPE_CHANGED",
            IssueType::TypeMismatch => "TYPE_MISMATCH",
            IssueType::MissingDefault => "MISSING_DEFAULT",
            IssueType::RemovedField => "REMOVED_FIELD",
            IssueType::EnumSymbolRemoved => "ENUM_SYMBOL_REMOVED",
            IssueType::UnionMismatch => "UNION_MISMATCH",
            IssueType::UnsupportedType => "UNSUPPORTED_TYPE",
            IssueType::MaxDepthExceeded => "MAX_DEPTH_EXCEEDED",
            IssueType::InvalidMode => "INVALID_MODE",
            IssueType::InvalidUpload => "INVALID_UPLOAD",
            IssueType::InvalidSchemaJson => "INVALID_SCHEMA_JSON",
            IssueType::FileTooLarge => "FILE_TOO_LARGE",
            IssueType::InvalidAvroSchema => "INVALID_AVRO_SCHEMA",
        }
    }

    /// Issues raised before the comparator runs.
    pub fn is_guard_failure(&self) -> bool {
        matches!(
            self,
            IssueType::InvalidMode
                | IssueType::InvalidUpload
                | IssueType::InvalidSchemaJson
                | IssueType::FileTooLarge
                | IssueType::InvalidAvroSchema
        )
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incompatibility, addressed by its path in the writer schema.
///
/// Paths start at the root name, append `.field` for record fields,
/// `.items` / `.values` for containers and `[i]` for a writer union branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityIssue {
    pub path: String,
    pub issue_type: IssueType,
    pub writer_type: String,
    pub reader_type: String,
    pub description: String,
}

impl CompatibilityIssue {
    pub fn new(
        path: impl Into<String>,
        issue_type: IssueType,
        writer_type: impl Into<String>,
        reader_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            issue_type,
            writer_type: writer_type.into(),
            reader_type: reader_type.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for CompatibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: writer '{}', reader '{}': {}",
            self.issue_type, self.path, self.writer_type, self.reader_type, self.description
        )
    }
}

/// The serialized outcome of a request.
///
/// Compatible requests serialize as `{"compatible": true}`; everything else
/// carries `totalErrors` and the ordered `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    pub compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_errors: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CompatibilityIssue>,
}

impl CompatibilityReport {
    pub fn from_issues(errors: Vec<CompatibilityIssue>) -> Self {
        if errors.is_empty() {
            return Self {
                compatible: true,
                total_errors: None,
                errors,
            };
        }
        Self {
            compatible: false,
            total_errors: Some(errors.len()),
            errors,
        }
    }

    /// Single-issue report for a request rejected at the boundary.
    pub fn from_error(err: &CompatError) -> Option<Self> {
        err.to_issue().map(|issue| Self::from_issues(vec![issue]))
    }

    /// Whether the report was produced by a boundary guard failure.
    pub fn is_rejection(&self) -> bool {
        self.errors.iter().any(|e| e.issue_type.is_guard_failure())
    }

    pub fn issues_of(&self, issue_type: IssueType) -> impl Iterator<Item = &CompatibilityIssue> {
        self.errors.iter().filter(move |e| e.issue_type == issue_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compatible_report_shape() {
        let report = CompatibilityReport::from_issues(Vec::new());
        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"compatible": true}));
    }

    #[test]
    fn test_incompatible_report_shape() {
        let report = CompatibilityReport::from_issues(vec![CompatibilityIssue::new(
            "User.email",
            IssueType::MissingDefault,
            "absent",
            "string",
            "New field was added without default value.",
        )]);
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
    fn test_report_round_trips_compatible_form() {
        let report: CompatibilityReport = serde_json::from_value(json!({"compatible": true})).unwrap();
        assert!(report.compatible);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_rejection_report() {
        let err = CompatError::InvalidUtf8 { label: "NewSchema".to_string() };
        let report = CompatibilityReport::from_error(&err).unwrap();
        assert!(!report.compatible);
        assert!(report.is_rejection());
        assert_eq!(report.issues_of(IssueType::InvalidSchemaJson).count(), 1);
    }

    #[test]
    fn test_issue_type_names_match_serde() {
        for ty in [IssueType::UnknownWriterType, IssueType::EnumSymbolRemoved, IssueType::InvalidSchemaJson] {
            assert_eq!(serde_json::to_value(ty).unwrap(), json!(ty.as_str()));
        }
    }
}
