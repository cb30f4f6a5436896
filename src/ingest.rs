//! Input boundary: turning raw schema payloads into validated documents.
//!
//! Every guard here runs before the comparator and fails the whole request
//! with a single issue: size limit, UTF-8 decoding, JSON parsing, then Avro
//! well-formedness. The order mirrors the request pipeline: the mode is
//! checked first, then both documents are loaded, then both are validated.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::compatibility::{CompatibilityChecker, CompatibilityReport};
use crate::config::CompatConfig;
use crate::error::{CompatError, Result};
use crate::fingerprint::Fingerprint;
use crate::mode::CompatibilityMode;
use crate::schema::{NameRegistry, SchemaTree};

/// Label of the old (previously published) schema in boundary issues.
pub const OLD_LABEL: &str = "OldSchema";
/// Label of the new (candidate) schema in boundary issues.
pub const NEW_LABEL: &str = "NewSchema";

/// Where a schema payload comes from.
#[derive(Debug, Clone, Copy)]
pub enum SchemaInput<'a> {
    Bytes(&'a [u8]),
    File(&'a Path),
}

impl SchemaInput<'_> {
    /// Read and parse the payload as JSON.
    pub fn load(&self, label: &str, max_bytes: u64) -> Result<Value> {
        match self {
            SchemaInput::Bytes(bytes) => parse_json_bytes(bytes, label, max_bytes),
            SchemaInput::File(path) => load_schema_file(path, label, max_bytes),
        }
    }
}

/// A parsed, validated schema document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub label: String,
    pub value: Value,
    pub tree: SchemaTree,
    pub fingerprint: Fingerprint,
}

impl SchemaDocument {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        let tree = SchemaTree::from_value(&value);
        let fingerprint = Fingerprint::of(&value);
        Self {
            label: label.into(),
            value,
            tree,
            fingerprint,
        }
    }

    /// Fail when a fullname is defined more than once.
    pub fn ensure_unique_names(&self) -> Result<()> {
        let registry = NameRegistry::build(&self.tree);
        if registry.duplicates().is_empty() {
            return Ok(());
        }
        Err(CompatError::InvalidAvroSchema {
            label: self.label.clone(),
            found: "duplicate-named-types".to_string(),
            expected: "unique-named-types".to_string(),
            message: format!(
                "Named types are defined more than once: {}",
                registry.duplicates().join(", ")
            ),
        })
    }
}

/// Decode `payload` as UTF-8 JSON, rejecting anything over `max_bytes`.
pub fn parse_json_bytes(payload: &[u8], label: &str, max_bytes: u64) -> Result<Value> {
    let size = payload.len() as u64;
    if size > max_bytes {
        return Err(CompatError::FileTooLarge {
            label: label.to_string(),
            size,
            limit: max_bytes,
        });
    }

    let text = std::str::from_utf8(payload).map_err(|_| CompatError::InvalidUtf8 {
        label: label.to_string(),
    })?;

    serde_json::from_str(text).map_err(|e| CompatError::invalid_json(label, &e))
}

/// Read a schema file, checking its length before reading the content.
pub fn load_schema_file(path: &Path, label: &str, max_bytes: u64) -> Result<Value> {
    let unreadable = |source| CompatError::Unreadable {
        label: label.to_string(),
        source,
    };

    let size = std::fs::metadata(path).map_err(unreadable)?.len();
    if size > max_bytes {
        return Err(CompatError::FileTooLarge {
            label: label.to_string(),
            size,
            limit: max_bytes,
        });
    }

    let payload = std::fs::read(path).map_err(unreadable)?;
    debug!(label, path = %path.display(), bytes = payload.len(), "Read schema file");
    parse_json_bytes(&payload, label, max_bytes)
}

/// Confirm `schema` is a legal Avro schema.
///
/// Strict validation runs the full `apache-avro` parser. The fallback only
/// requires a JSON object or a union array at the top level.
pub fn validate_avro_schema(schema: &Value, label: &str, strict: bool) -> Result<()> {
    if strict {
        return apache_avro::Schema::parse(schema)
            .map(|_| ())
            .map_err(|e| CompatError::InvalidAvroSchema {
                label: label.to_string(),
                found: "unknown".to_string(),
                expected: "valid-avro-schema".to_string(),
                message: e.to_string(),
            });
    }

    match schema {
        Value::Object(_) | Value::Array(_) => Ok(()),
        other => Err(CompatError::InvalidAvroSchema {
            label: label.to_string(),
            found: json_kind(other).to_string(),
            expected: "object-or-union".to_string(),
            message: "Top-level Avro schema must be an object or union array.".to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A completed comparison and the documents it ran on.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub mode: CompatibilityMode,
    pub old: SchemaDocument,
    pub new: SchemaDocument,
    pub report: CompatibilityReport,
}

/// Run the full pipeline: parse the mode, load and validate both documents,
/// then check compatibility. The first guard failure is returned as an error.
pub fn compare_inputs(
    mode: &str,
    old: SchemaInput<'_>,
    new: SchemaInput<'_>,
    config: &CompatConfig,
) -> Result<Comparison> {
    let mode: CompatibilityMode = mode.parse()?;
    let max_bytes = config.limits.max_schema_bytes;

    let old_value = old.load(OLD_LABEL, max_bytes)?;
    let new_value = new.load(NEW_LABEL, max_bytes)?;

    let strict = config.validation.strict_avro;
    validate_avro_schema(&old_value, OLD_LABEL, strict)?;
    validate_avro_schema(&new_value, NEW_LABEL, strict)?;

    let old = SchemaDocument::new(OLD_LABEL, old_value);
    let new = SchemaDocument::new(NEW_LABEL, new_value);
    if config.validation.reject_duplicate_names {
        old.ensure_unique_names()?;
        new.ensure_unique_names()?;
    }

    let report = CompatibilityChecker::from_config(config).report(&old.tree, &new.tree, mode);
    info!(
        %mode,
        old = old.fingerprint.short(),
        new = new.fingerprint.short(),
        compatible = report.compatible,
        "Compared schema versions"
    );

    Ok(Comparison {
        mode,
        old,
        new,
        report,
    })
}

/// Compare two raw payloads and always produce a report: guard failures
/// become single-issue reports. Only errors outside the request pipeline
/// are returned as `Err`.
pub fn compare_payloads(
    old: &[u8],
    new: &[u8],
    mode: &str,
    config: &CompatConfig,
) -> Result<CompatibilityReport> {
    match compare_inputs(mode, SchemaInput::Bytes(old), SchemaInput::Bytes(new), config) {
        Ok(comparison) => Ok(comparison.report),
        Err(err) => CompatibilityReport::from_error(&err).ok_or(err),
    }
}
