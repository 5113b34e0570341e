//! Core data types reported by the conversion pipeline.
//!
//! One [`FileOutcome`] is produced for every file the batch driver looks at,
//! and a [`BatchSummary`] closes the run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Converted and written to the target directory
    Converted,
    /// Did not pass the content sniffer
    Skipped,
    /// Passed the sniffer but conversion failed
    Failed,
}

/// The result of processing one directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Path of the source file
    pub source: PathBuf,

    /// Path of the output file, when a conversion was attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,

    pub status: FileStatus,

    /// Exclusion reason for skipped files, error text for failed ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Image width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Image height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Size of the metadata block carried into the output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_bytes: Option<usize>,
}

impl FileOutcome {
    pub fn converted(source: PathBuf, target: PathBuf, report: &ConversionReport) -> Self {
        Self {
            source,
            target: Some(target),
            status: FileStatus::Converted,
            reason: None,
            width: Some(report.width),
            height: Some(report.height),
            metadata_bytes: Some(report.metadata_bytes),
        }
    }

    pub fn skipped(source: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            source,
            target: None,
            status: FileStatus::Skipped,
            reason: Some(reason.into()),
            width: None,
            height: None,
            metadata_bytes: None,
        }
    }

    pub fn failed(source: PathBuf, target: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            source,
            target,
            status: FileStatus::Failed,
            reason: Some(reason.into()),
            width: None,
            height: None,
            metadata_bytes: None,
        }
    }
}

/// Details of a successful single-file conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub width: u32,
    pub height: u32,
    /// Length of the embedded metadata block (0 when absent)
    pub metadata_bytes: usize,
}

/// Totals for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub converted: u64,
    pub skipped: u64,
    pub failed: u64,

    /// Directory-level problems (listing, target creation)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    /// Wall-clock duration of the run
    #[serde(default)]
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Fold one outcome into the totals.
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome.status {
            FileStatus::Converted => self.converted += 1,
            FileStatus::Skipped => self.skipped += 1,
            FileStatus::Failed => self.failed += 1,
        }
    }

    /// Number of entries looked at.
    pub fn total(&self) -> u64 {
        self.converted + self.skipped + self.failed
    }

    /// True when no file failed and no directory-level error occurred.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }
}
