//! heic2jpg Core - HEIC to JPEG conversion that keeps EXIF metadata.
//!
//! Each qualifying file in a directory is decoded, re-encoded as JPEG and
//! written next to its siblings in a target directory. The EXIF block of the
//! source is embedded byte-for-byte as an APP1 segment right after SOI.
//!
//! # Architecture
//!
//! ```text
//! Directory → Sniff (extension + magic bytes) → Read → Extract EXIF → Decode
//!           → SOI + APP1 + JPEG encoder output (minus its SOI) → <name>.jpg
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use heic2jpg_core::{BatchConverter, Config, HeifCodec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), heic2jpg_core::ConfigError> {
//!     let config = Config::load()?;
//!     let batch = BatchConverter::new(&config, Arc::new(HeifCodec::new()));
//!
//!     let summary = batch
//!         .run(&config.source_dir(), &config.target_dir(), |outcome| {
//!             println!("{:?}: {:?}", outcome.source, outcome.status);
//!         })
//!         .await;
//!     println!("{} converted", summary.converted);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{CodecError, ConfigError, EncodeError, PipelineError, PipelineResult};
#[cfg(feature = "heif")]
pub use pipeline::HeifCodec;
pub use pipeline::{
    BatchConverter, ContentSniffer, Converter, MetadataEncoder, SkipWriter, SourceCodec,
};
pub use types::{BatchSummary, ConversionReport, FileOutcome, FileStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
