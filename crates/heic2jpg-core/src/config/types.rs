//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Batch run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory scanned for source images (not recursive)
    pub source_dir: PathBuf,

    /// Directory the converted files are written to
    pub target_dir: PathBuf,

    /// Number of files converted at once; 1 keeps listing order
    pub workers: usize,

    /// Exit with a failure status when any file fails
    pub strict: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./"),
            target_dir: PathBuf::from("./jpgs/"),
            workers: 1,
            strict: false,
        }
    }
}

/// Source/target format settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Extension a file must carry to be considered (case-insensitive)
    pub source_extension: String,

    /// Extension appended to the original file name for the output
    pub target_extension: String,

    /// Number of leading bytes inspected by the content sniffer
    pub sniff_bytes: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            source_extension: "heic".to_string(),
            target_extension: "jpg".to_string(),
            sniff_bytes: 512,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
