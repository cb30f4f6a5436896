//! Configuration management for the compatibility checker
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (avro-compat.toml)
//! - Environment variables (AVRO_COMPAT__*)
//!
//! ## Example config file (avro-compat.toml):
//! ```toml
//! [limits]
//! max_schema_bytes = 1048576
//! max_depth = 256
//!
//! [validation]
//! strict_avro = true
//! reject_duplicate_names = false
//!
//! [output]
//! format = "pretty"
//! default_mode = "backward"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::compatibility::DEFAULT_MAX_DEPTH;
use crate::error::Result;
use crate::mode::CompatibilityMode;

/// Default upload limit: 1 MiB.
pub const DEFAULT_MAX_SCHEMA_BYTES: u64 = 1024 * 1024;

/// Main configuration for the checker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Input and recursion limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Schema validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted schema document, in bytes
    #[serde(default = "default_max_schema_bytes")]
    pub max_schema_bytes: u64,

    /// Deepest nesting the comparator will follow
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Validate inputs with the full Avro parser instead of the minimal
    /// object-or-union check
    #[serde(default = "default_true")]
    pub strict_avro: bool,

    /// Reject schemas that define the same fullname twice
    #[serde(default)]
    pub reject_duplicate_names: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON output format (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,

    /// Mode used when none is given on the command line
    #[serde(default)]
    pub default_mode: CompatibilityMode,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_max_schema_bytes() -> u64 {
    DEFAULT_MAX_SCHEMA_BYTES
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_true() -> bool {
    true
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_schema_bytes: default_max_schema_bytes(),
            max_depth: default_max_depth(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_avro: true,
            reject_duplicate_names: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pretty,
            default_mode: CompatibilityMode::Backward,
        }
    }
}

impl CompatConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "avro-compat.toml",
            ".avro-compat.toml",
            "config/avro-compat.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "avro-compat") {
            let xdg_config = config_dir.config_dir().join("avro-compat.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // AVRO_COMPAT__LIMITS__MAX_DEPTH=64
        builder = builder.add_source(
            Environment::with_prefix("AVRO_COMPAT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialize a JSON value according to `output.format`
    pub fn render_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = match self.output.format {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Compact => serde_json::to_string(value)?,
        };
        Ok(rendered)
    }
}
