//! Avro Schema Compatibility Checker
//!
//! Decides whether two versions of an Avro schema are safely interchangeable
//! under a declared evolution policy, and lists every incompatibility found,
//! each addressed by its path in the schema. This is the check a schema
//! registry runs before accepting a new version.
//!
//! ## Modes
//!
//! - **backward**: the new schema can read data written with the old one
//! - **forward**: the old schema can read data written with the new one
//! - **full**: both
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──► ingest (size, UTF-8, JSON, Avro validation)
//!        ──► SchemaTree (arena of closed node variants)
//!        ──► NameRegistry (fullnames, aliases, reference resolution)
//!        ──► Comparator (one per direction) ──► CompatibilityIssue*
//!        ──► CompatibilityReport
//! ```
//!
//! ## Example
//!
//! ```
//! use avro_compat::{check_compatibility, CompatibilityMode, IssueType};
//! use serde_json::json;
//!
//! let old = json!({"type": "record", "name": "User", "fields": [
//!     {"name": "id", "type": "long"}
//! ]});
//! let new = json!({"type": "record", "name": "User", "fields": [
//!     {"name": "id", "type": "long"},
//!     {"name": "email", "type": "string"}
//! ]});
//!
//! let issues = check_compatibility(&old, &new, CompatibilityMode::Backward);
//! assert_eq!(issues[0].issue_type, IssueType::MissingDefault);
//! assert_eq!(issues[0].path, "User.email");
//! ```

pub mod compatibility;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod ingest;
pub mod mode;
pub mod rules;
pub mod schema;

pub use compatibility::{
    check_compatibility, CompatibilityChecker, CompatibilityIssue, CompatibilityReport, IssueType,
};
pub use config::CompatConfig;
pub use error::{CompatError, Result};
pub use fingerprint::Fingerprint;
pub use ingest::{compare_inputs, compare_payloads, SchemaDocument, SchemaInput};
pub use mode::{CompatibilityMode, Direction};
pub use schema::{NameRegistry, SchemaTree};
