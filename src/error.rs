//! Error types for the compatibility checker
//!
//! Incompatibilities between two schemas are data, not errors; they are
//! returned as [`CompatibilityIssue`]s. The errors here are guard failures at
//! the input boundary (bad mode, unreadable or malformed input) plus the
//! usual I/O and configuration failures of the surrounding tooling.

use thiserror::Error;

use crate::compatibility::{CompatibilityIssue, IssueType};
use crate::mode::CompatibilityMode;

/// Result type for checker operations
pub type Result<T> = std::result::Result<T, CompatError>;

/// Checker errors
#[derive(Error, Debug)]
pub enum CompatError {
    #[error("mode must be one of: backward, forward, full (got {given:?})")]
    InvalidMode { given: String },

    #[error("{label}: schema is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { label: String, size: u64, limit: u64 },

    #[error("{label}: failed to read schema file: {source}")]
    Unreadable {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{label}: schema file must be UTF-8 encoded")]
    InvalidUtf8 { label: String },

    #[error("{label}: invalid JSON: {message} (line {line}, column {column})")]
    InvalidJson {
        label: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{label}: invalid Avro schema: {message}")]
    InvalidAvroSchema {
        label: String,
        found: String,
        expected: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CompatError {
    /// Wrap a `serde_json` parse failure for the document `label`.
    pub fn invalid_json(label: impl Into<String>, err: &serde_json::Error) -> Self {
        let rendered = err.to_string();
        let message = rendered
            .rsplit_once(" at line ")
            .map_or(rendered.as_str(), |(msg, _)| msg)
            .to_string();
        CompatError::InvalidJson {
            label: label.into(),
            message,
            line: err.line(),
            column: err.column(),
        }
    }

    /// The issue type a guard failure is reported as, or `None` for errors
    /// that never reach a report.
    pub fn issue_type(&self) -> Option<IssueType> {
        match self {
            CompatError::InvalidMode { .. } => Some(IssueType::InvalidMode),
            CompatError::FileTooLarge { .. } => Some(IssueType::FileTooLarge),
            CompatError::Unreadable { .. } => Some(IssueType::InvalidUpload),
            CompatError::InvalidUtf8 { .. } | CompatError::InvalidJson { .. } => {
                Some(IssueType::InvalidSchemaJson)
            }
            CompatError::InvalidAvroSchema { .. } => Some(IssueType::InvalidAvroSchema),
            CompatError::Config(_)
            | CompatError::Io(_)
            | CompatError::Json(_)
            | CompatError::TomlSerialize(_) => None,
        }
    }

    /// Whether this error rejects the request before the comparator runs.
    pub fn is_guard_failure(&self) -> bool {
        self.issue_type().is_some()
    }

    /// Render a guard failure as the single issue of a rejected request.
    pub fn to_issue(&self) -> Option<CompatibilityIssue> {
        let issue_type = self.issue_type()?;
        let issue = match self {
            CompatError::InvalidMode { given } => CompatibilityIssue::new(
                "mode",
                issue_type,
                given.as_str(),
                CompatibilityMode::VALID.join("|"),
                "mode must be one of: backward, forward, full",
            ),
            CompatError::FileTooLarge { label, size, limit } => CompatibilityIssue::new(
                label.as_str(),
                issue_type,
                format!("{} bytes", size),
                format!("<= {} bytes", limit),
                format!("Schema file exceeds the maximum size of {} bytes.", limit),
            ),
            CompatError::Unreadable { label, source } => CompatibilityIssue::new(
                label.as_str(),
                issue_type,
                "file",
                "readable-file",
                format!("Failed to read schema file: {}", source),
            ),
            CompatError::InvalidUtf8 { label } => CompatibilityIssue::new(
                label.as_str(),
                issue_type,
                "file",
                "valid-json",
                "Schema file must be UTF-8 encoded.",
            ),
            CompatError::InvalidJson {
                label,
                message,
                line,
                column,
            } => CompatibilityIssue::new(
                label.as_str(),
                issue_type,
                "file",
                "valid-json",
                format!("Invalid JSON: {} (line {}, column {}).", message, line, column),
            ),
            CompatError::InvalidAvroSchema {
                label,
                found,
                expected,
                message,
            } => CompatibilityIssue::new(
                label.as_str(),
                issue_type,
                found.as_str(),
                expected.as_str(),
                message.as_str(),
            ),
            CompatError::Config(_)
            | CompatError::Io(_)
            | CompatError::Json(_)
            | CompatError::TomlSerialize(_) => return None,
        };
        Some(issue)
    }
}
