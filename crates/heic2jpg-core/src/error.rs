//! Error types for the HEIC to JPEG conversion pipeline.
//!
//! Errors are organized by stage so a failed file can be reported with the
//! path and the step that broke (read, metadata, decode, encode).

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-file and per-directory pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Opening, reading or creating a file failed
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source codec could not read the embedded metadata block
    #[error("Metadata extraction failed for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// The source file passed the sniff gate but does not decode
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Writing the JPEG stream failed
    #[error("Encode error for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    /// The source directory could not be listed
    #[error("Failed to read directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the metadata-preserving JPEG encoder.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A write to the destination stream failed
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The JPEG encoder rejected the pixel data
    #[error("jpeg encoder: {0}")]
    Codec(String),

    /// The APP1 length field is a u16 that also counts itself
    #[error("metadata block of {len} bytes exceeds the {max} byte APP1 limit")]
    MetadataTooLarge { len: usize, max: usize },
}

impl From<image::ImageError> for EncodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => EncodeError::Io(e),
            other => EncodeError::Codec(other.to_string()),
        }
    }
}

/// Failure reported by a [`SourceCodec`](crate::pipeline::SourceCodec) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
