//! Configuration Module
//!
//! Handles loading the binary's chain configuration from environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cache::Encoding;

/// Dialect of the backing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Properties,
    Json,
}

impl Format {
    /// Guesses the dialect from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "properties" | "props" => Ok(Format::Properties),
            "json" => Ok(Format::Json),
            other => Err(format!("unsupported format: {}", other)),
        }
    }
}

/// Chain configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Backing file for the file-backed layer
    pub file: Option<PathBuf>,
    /// Dialect of the backing file
    pub format: Format,
    /// Encoding of the backing file
    pub encoding: Encoding,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CONFIG_CHAIN_FILE` - Backing file path (default: none)
    /// - `CONFIG_CHAIN_FORMAT` - `properties` or `json` (default: from the file
    ///   extension, else properties)
    /// - `CONFIG_CHAIN_ENCODING` - `utf-8` or `latin1` (default: utf-8)
    pub fn from_env() -> Self {
        let file: Option<PathBuf> = env::var("CONFIG_CHAIN_FILE").ok().map(PathBuf::from);
        let format = env::var("CONFIG_CHAIN_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .or_else(|| file.as_deref().and_then(Format::from_path))
            .unwrap_or_default();
        let encoding = env::var("CONFIG_CHAIN_ENCODING")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            file,
            format,
            encoding,
        }
    }
}
