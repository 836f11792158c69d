//! Configuration structures for the report pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ConfigError;
use crate::models::report::PatternSpec;

/// Pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = r"HOLD \d+";

/// Scan folder used when `DOCUMENT_PATH` is empty.
pub const DEFAULT_DOCUMENT_DIR: &str = "Documents";

/// File name looked up in the base directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration for the patrep pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrepConfig {
    /// Regular expressions to search for, in report order.
    #[serde(rename = "PATTERNS", alias = "patterns")]
    pub patterns: Vec<String>,

    /// Scan folder, relative to the base directory.
    #[serde(rename = "DOCUMENT_PATH", alias = "document_path")]
    pub document_path: String,

    /// Include every extracted line as an extra "Text Blocks" sheet.
    #[serde(rename = "EXPORT_ALL_TEXT", alias = "export_all_text")]
    pub export_all_text: bool,

    /// Report file format.
    #[serde(rename = "OUTPUT_FORMAT", alias = "output_format")]
    pub output_format: OutputFormat,
}

impl Default for PatrepConfig {
    fn default() -> Self {
        Self {
            patterns: vec![DEFAULT_PATTERN.to_string()],
            document_path: String::new(),
            export_all_text: false,
            output_format: OutputFormat::Xlsx,
        }
    }
}

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Single Excel workbook with one sheet per table.
    #[default]
    Xlsx,
    /// One CSV file per table.
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xlsx => write!(f, "xlsx"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl PatrepConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration, falling back to defaults when the file is missing
    /// or cannot be decoded.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            warn!("Configuration file not found: {}", path.display());
            info!("Using default factory configuration instead.");
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => {
                info!("Configuration loaded from {}", path.display());
                config
            }
            Err(e) => {
                error!("Error loading configuration: {}", e);
                info!("Using default factory configuration instead.");
                Self::default()
            }
        }
    }

    /// Serialize configuration to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Numbered pattern specs in configured order.
    pub fn pattern_specs(&self) -> Vec<PatternSpec> {
        PatternSpec::from_expressions(self.patterns.iter().cloned())
    }

    /// Folder to scan for documents, resolved against `base_dir`.
    pub fn scan_dir(&self, base_dir: &Path) -> PathBuf {
        if self.document_path.trim().is_empty() {
            base_dir.join(DEFAULT_DOCUMENT_DIR)
        } else {
            base_dir.join(&self.document_path)
        }
    }
}
