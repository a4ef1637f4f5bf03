//! VM configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "memory_size": 243, "max_instructions": 50000, "heatmap_enabled": true }
//! ```

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::vm::MemorySize;

/// Default maximum call stack depth.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10;
/// Default instruction limit (infinite loop guard).
pub const DEFAULT_MAX_INSTRUCTIONS: u64 = 10_000;
/// Default number of history snapshots kept.
pub const DEFAULT_MAX_HISTORY: usize = 1_000;

/// Machine and debugger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Memory words: 27, 81 or 243.
    pub memory_size: MemorySize,
    /// Maximum nesting of CALL.
    pub max_call_depth: usize,
    /// Steps allowed before the run is stopped.
    pub max_instructions: u64,
    /// History snapshots kept for stepping back.
    pub max_history: usize,
    pub history_enabled: bool,
    /// Count loads and stores per address.
    pub heatmap_enabled: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_size: MemorySize::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            max_history: DEFAULT_MAX_HISTORY,
            history_enabled: true,
            heatmap_enabled: false,
        }
    }
}

impl VmConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Errors that can occur while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
