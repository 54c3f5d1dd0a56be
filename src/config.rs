//! Configuration file support for daygraph
//!
//! Reads from daygraph.toml (or the file named by DAYGRAPH_CONFIG).
//! Every field has a default so an empty file, or no file at all, yields
//! a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Share settings
    #[serde(default)]
    pub share: ShareConfig,

    /// Consolidation pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Preview server settings
    #[serde(default)]
    pub preview: PreviewConfig,
}

/// Where the dated files live
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShareConfig {
    /// Root of the share mount or local mirror
    /// Default: "."
    #[serde(default = "default_root")]
    pub root: String,

    /// Folder under the root that holds the dated CSV files
    #[serde(default)]
    pub folder: String,
}

/// Pipeline tuning knobs
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineConfig {
    /// Maximum rows read per file, from the start of the file
    /// Default: 50,000
    #[serde(default = "default_row_cap")]
    pub row_cap: usize,

    /// Numeric column forced to the front of the variable order
    /// Default: "Power"
    #[serde(default = "default_priority_variable")]
    pub priority_variable: String,

    /// Whether excluded files (bad date token, failed load) are logged
    /// Default: warn
    #[serde(default)]
    pub skip_policy: SkipPolicy,

    /// What to do when a loaded table is missing an expected variable
    /// Default: exclude (drop that date, keep going)
    #[serde(default)]
    pub schema_policy: SchemaPolicy,
}

/// Preview server settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PreviewConfig {
    /// Port for `daygraph serve`
    /// Default: 8722
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Whether deterministic exclusions are surfaced to the operator
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkipPolicy {
    #[default]
    Warn,
    Silent,
}

/// Handling for tables that lack a column the variable list expects
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Drop the offending date's contribution and log a warning
    #[default]
    Exclude,
    /// Treat the mismatch as fatal
    Abort,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_row_cap() -> usize {
    50_000
}

fn default_priority_variable() -> String {
    "Power".to_string()
}

fn default_port() -> u16 {
    8722
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            folder: String::new(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            row_cap: default_row_cap(),
            priority_variable: default_priority_variable(),
            skip_policy: SkipPolicy::default(),
            schema_policy: SchemaPolicy::default(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration, looking at DAYGRAPH_CONFIG first, then
    /// ./daygraph.toml. A missing file yields the default configuration;
    /// an unreadable or invalid file is an error.
    pub fn load() -> Result<Self, String> {
        let path = match std::env::var("DAYGRAPH_CONFIG") {
            Ok(p) => PathBuf::from(p),
            Err(_) => PathBuf::from("daygraph.toml"),
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        toml::from_str(&contents).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
    }

    /// Share root, honoring the DAYGRAPH_SHARE_ROOT override
    pub fn share_root(&self) -> String {
        std::env::var("DAYGRAPH_SHARE_ROOT").unwrap_or_else(|_| self.share.root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.row_cap, 50_000);
        assert_eq!(config.pipeline.priority_variable, "Power");
        assert_eq!(config.pipeline.skip_policy, SkipPolicy::Warn);
        assert_eq!(config.pipeline.schema_policy, SchemaPolicy::Exclude);
        assert_eq!(config.preview.port, 8722);
        assert_eq!(config.share.root, ".");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[share]
root = "/mnt/nas"
folder = "DBG_EREPORT_20250701"

[pipeline]
row_cap = 1000
priority_variable = "Voltage"
skip_policy = "silent"
schema_policy = "abort"

[preview]
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.share.root, "/mnt/nas");
        assert_eq!(config.share.folder, "DBG_EREPORT_20250701");
        assert_eq!(config.pipeline.row_cap, 1000);
        assert_eq!(config.pipeline.priority_variable, "Voltage");
        assert_eq!(config.pipeline.skip_policy, SkipPolicy::Silent);
        assert_eq!(config.pipeline.schema_policy, SchemaPolicy::Abort);
        assert_eq!(config.preview.port, 9000);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let toml = r#"
[pipeline]
row_cap = 42
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.pipeline.row_cap, 42);
        assert_eq!(config.pipeline.priority_variable, "Power");
        assert_eq!(config.preview.port, 8722);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_from(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.pipeline.row_cap, 50_000);
    }
}
