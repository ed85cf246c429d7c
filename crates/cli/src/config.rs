//! CLI configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use testbridge_core::{Framework, Indent, QuoteStyle, StyleOptions};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "testbridge.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Style(#[from] testbridge_core::Error),
}

/// testbridge configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Framework defaults for `convert`
    pub frameworks: FrameworkConfig,

    /// Emitted code style
    pub code_style: CodeStyleConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Source used when `--from` is omitted and detection finds nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_source: Option<Framework>,

    /// Target used when `--to` is omitted
    pub default_target: Framework,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            default_source: None,
            default_target: Framework::Playwright,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeStyleConfig {
    /// `"tabs"` or a space count such as `"2"`
    pub indentation: String,

    /// `"single"` or `"double"`
    pub quote_style: String,

    /// Emit the target's import line
    pub emit_header: bool,
}

impl Default for CodeStyleConfig {
    fn default() -> Self {
        Self {
            indentation: "4".to_string(),
            quote_style: QuoteStyle::Single.to_string(),
            emit_header: true,
        }
    }
}

impl CodeStyleConfig {
    /// Resolve into engine style options.
    pub fn style_options(&self) -> Result<StyleOptions, ConfigError> {
        let indent: Indent = self.indentation.parse()?;
        let quote: QuoteStyle = self.quote_style.parse()?;
        Ok(StyleOptions {
            indent,
            quote,
            emit_header: self.emit_header,
        })
    }
}

impl Config {
    /// Load configuration from file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }
}
