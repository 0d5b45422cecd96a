//! Configuration for an extraction.
//!
//! Every component reads its limits from here; defaults match what the Go
//! toolchain and typical binaries need.

use crate::error::{Result, ScanError};
use crate::io::IOLimits;
use serde::{Deserialize, Serialize};

/// Master configuration for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Input limits.
    pub io: IOLimits,
    /// Build information search and decoding limits.
    pub build_info: BuildInfoConfig,
    /// Symbol normalization options.
    pub symbols: SymbolConfig,
}

impl ScanConfig {
    /// Loads a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScanError::Config(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScanError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildInfoConfig {
    /// Bytes of each candidate region searched for the magic (default: 65536).
    pub search_window: usize,
    /// Longest string read through a pointer-form header (default: 1048576).
    pub max_string_len: usize,
}

impl Default for BuildInfoConfig {
    fn default() -> Self {
        Self {
            search_window: 65536,
            max_string_len: 1048576, // 1MB
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    /// Sort symbols by package, then name, instead of table order.
    pub sorted: bool,
}
