//! Error types for the cache chain
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache layers and the config space.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A layer had to consult its write-through layer but none is configured,
    /// or a file-backed layer was queried before being warmed.
    #[error("Layer '{layer}' is not initialized: {reason}")]
    Initialization { layer: String, reason: String },

    /// A file-backed layer could not open or decode its source
    #[error("Failed to warm layer '{layer}': {source}")]
    Warming {
        layer: String,
        #[source]
        source: io::Error,
    },

    /// A required configuration key resolved nowhere in the chain
    #[error("Missing required key: {0}")]
    MissingRequired(String),

    /// A value could not be formatted for storage
    #[error("Format error: {0}")]
    Format(#[from] serde_json::Error),
}

impl CacheError {
    /// Shorthand for the missing write-through case.
    pub(crate) fn unlinked(layer: &str) -> Self {
        CacheError::Initialization {
            layer: layer.to_string(),
            reason: "no write-through layer configured".to_string(),
        }
    }

    /// Shorthand for a file-backed layer used before `warm`.
    pub(crate) fn not_warmed(layer: &str) -> Self {
        CacheError::Initialization {
            layer: layer.to_string(),
            reason: "layer has not been warmed".to_string(),
        }
    }

    /// Returns true for the initialization (wiring) error.
    pub fn is_initialization(&self) -> bool {
        matches!(self, CacheError::Initialization { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache chain.
pub type Result<T> = std::result::Result<T, CacheError>;
