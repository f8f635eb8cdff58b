//! Rendering configuration, loadable from TOML

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read render config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse render config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Options controlling pretty-printed output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Spaces per depth level
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Write childless, textless elements as `<tag/>` rather than `<tag></tag>`
    #[serde(default = "default_self_close")]
    pub self_close_empty: bool,
}

fn default_indent() -> usize {
    4
}

fn default_self_close() -> bool {
    true
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            self_close_empty: default_self_close(),
        }
    }
}

impl RenderOptions {
    /// Load options from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let options: RenderOptions = toml::from_str(content)?;
        debug!(
            indent = options.indent,
            self_close_empty = options.self_close_empty,
            "Render options loaded"
        );
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
