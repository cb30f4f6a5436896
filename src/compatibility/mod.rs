//! Schema compatibility checking
//!
//! Decides whether two versions of an Avro schema can be exchanged under a
//! [`CompatibilityMode`]. `backward` runs one comparator pass with the old
//! schema as writer, `forward` runs one with the new schema as writer, and
//! `full` runs both and concatenates their issues in that order.

mod comparator;
mod issue;

use serde_json::Value;
use tracing::info;

use crate::config::CompatConfig;
use crate::mode::{CompatibilityMode, Direction};
use crate::schema::{NameRegistry, SchemaTree};

pub use comparator::{Comparator, ROOT_PATH};
pub use issue::{CompatibilityIssue, CompatibilityReport, IssueType};

/// Default bound on comparison nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Compatibility checker for pairs of schema versions
#[derive(Debug, Clone)]
pub struct CompatibilityChecker {
    max_depth: usize,
}

impl CompatibilityChecker {
    /// Create a new compatibility checker
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Use the limits from a loaded configuration
    pub fn from_config(config: &CompatConfig) -> Self {
        Self::new().with_max_depth(config.limits.max_depth)
    }

    /// Bound how deep the comparator may recurse before giving up on a branch
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check `new` against `old` under `mode` and return every issue found.
    pub fn check(
        &self,
        old: &SchemaTree,
        new: &SchemaTree,
        mode: CompatibilityMode,
    ) -> Vec<CompatibilityIssue> {
        let old_names = NameRegistry::build(old);
        let new_names = NameRegistry::build(new);

        let mut issues = Vec::new();
        for &direction in mode.directions() {
            let (writer, reader) = match direction {
                Direction::Backward => (&old_names, &new_names),
                Direction::Forward => (&new_names, &old_names),
            };
            let found = Comparator::new(writer, reader, direction, self.max_depth).run();
            info!(%mode, %direction, issues = found.len(), "Compatibility pass complete");
            issues.extend(found);
        }
        issues
    }

    /// Run a single direction with explicit writer and reader trees.
    pub fn check_direction(
        &self,
        writer: &SchemaTree,
        reader: &SchemaTree,
        direction: Direction,
    ) -> Vec<CompatibilityIssue> {
        let writer_names = NameRegistry::build(writer);
        let reader_names = NameRegistry::build(reader);
        Comparator::new(&writer_names, &reader_names, direction, self.max_depth).run()
    }

    /// Same as [`check`](Self::check), wrapped in a report.
    pub fn report(
        &self,
        old: &SchemaTree,
        new: &SchemaTree,
        mode: CompatibilityMode,
    ) -> CompatibilityReport {
        CompatibilityReport::from_issues(self.check(old, new, mode))
    }
}

impl Default for CompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Check two already-parsed JSON schemas with default limits.
pub fn check_compatibility(
    old_schema: &Value,
    new_schema: &Value,
    mode: CompatibilityMode,
) -> Vec<CompatibilityIssue> {
    let old = SchemaTree::from_value(old_schema);
    let new = SchemaTree::from_value(new_schema);
    CompatibilityChecker::new().check(&old, &new, mode)
}
