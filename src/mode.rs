//! Compatibility modes and comparison directions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompatError;

/// Evolution policy requested for a pair of schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityMode {
    /// New readers can read data written with the old schema
    #[default]
    Backward,
    /// Old readers can read data written with the new schema
    Forward,
    /// Both of the above
    Full,
}

/// One comparator pass: which schema plays the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Writer is the old schema, reader is the new schema
    Backward,
    /// Writer is the new schema, reader is the old schema
    Forward,
}

impl CompatibilityMode {
    /// Accepted spellings, for error messages and help text.
    pub const VALID: [&'static str; 3] = ["backward", "forward", "full"];

    /// The directions a mode needs, in the order they are run.
    pub fn directions(&self) -> &'static [Direction] {
        match self {
            CompatibilityMode::Backward => &[Direction::Backward],
            CompatibilityMode::Forward => &[Direction::Forward],
            CompatibilityMode::Full => &[Direction::Backward, Direction::Forward],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityMode::Backward => "backward",
            CompatibilityMode::Forward => "forward",
            CompatibilityMode::Full => "full",
        }
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Backward => "backward",
            Direction::Forward => "forward",
        }
    }
}

impl FromStr for CompatibilityMode {
    type Err = CompatError;

    /// Trims and lowercases before matching.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backward" => Ok(CompatibilityMode::Backward),
            "forward" => Ok(CompatibilityMode::Forward),
            "full" => Ok(CompatibilityMode::Full),
            _ => Err(CompatError::InvalidMode { given: s.to_string() }),
        }
    }
}

impl fmt::Display for CompatibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
