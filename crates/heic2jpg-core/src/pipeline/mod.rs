//! HEIC to JPEG conversion pipeline components.
//!
//! - **sniff**: Gate files on extension and leading content bytes
//! - **codec**: Source-format decoder/metadata extractor seam
//! - **metadata**: Reframe HEIF EXIF items as JPEG APP1 payloads
//! - **encode**: JPEG encoding with the metadata block spliced in after SOI
//! - **convert**: Single-file conversion
//! - **discovery**: List the files of the source directory
//! - **batch**: Drive a whole directory through the pipeline

pub mod batch;
pub mod codec;
pub mod convert;
pub mod discovery;
pub mod encode;
pub mod metadata;
pub mod sniff;

// Re-exports for convenient access
pub use batch::BatchConverter;
#[cfg(feature = "heif")]
pub use codec::HeifCodec;
pub use codec::SourceCodec;
pub use convert::Converter;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use encode::{MetadataEncoder, SkipWriter};
pub use metadata::ExifSummary;
pub use sniff::{detect_content_type, ContentSniffer, ExclusionReason, SniffResult};
