//! Content fingerprints for schema documents

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of a schema document's canonical JSON (object keys sorted,
/// no insignificant whitespace). Two documents that differ only in key order
/// or formatting share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(value: &Value) -> Self {
        let canonical = canonicalize(value).to_string();
        let hash = Sha256::digest(canonical.as_bytes());
        Self(format!("{:x}", hash))
    }

    /// Full lowercase hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines and terminal output
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&obj[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"type": "record", "name": "A", "fields": []}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"fields":[],"name":"A","type":"record"}"#).unwrap();
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_different_content() {
        let a = serde_json::json!({"type": "fixed", "name": "F", "size": 4});
        let b = serde_json::json!({"type": "fixed", "name": "F", "size": 8});
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_display_and_short_form() {
        let fp = Fingerprint::of(&serde_json::json!("string"));
        assert_eq!(fp.as_str().len(), 64);
        assert_eq!(fp.short().len(), 12);
        assert!(fp.to_string().starts_with("sha256:"));
        assert!(fp.as_str().starts_with(fp.short()));
    }
}
