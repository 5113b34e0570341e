//! Content sniffing: decide whether a file is a convertible HEIC image.
//!
//! The gate checks the extension first (no I/O), then classifies the first
//! few hundred bytes with a magic-byte detector. The generic
//! `application/octet-stream` result is accepted as well, since plenty of
//! real HEIC files use brands the detector does not know; decoding confirms
//! those later.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::config::ConversionConfig;

pub const MIME_HEIC: &str = "image/heic";
pub const MIME_HEIF: &str = "image/heif";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";
pub const MIME_TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// MIME types that let a file through the gate.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = [MIME_HEIC, MIME_HEIF, MIME_OCTET_STREAM];

/// Classification of a candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SniffResult {
    Qualifies { mime: &'static str },
    Excluded(ExclusionReason),
}

impl SniffResult {
    pub fn qualifies(&self) -> bool {
        matches!(self, SniffResult::Qualifies { .. })
    }
}

/// Why a file did not pass the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Name too short or extension does not match
    Extension,
    /// Content was detected as something else
    ContentType(&'static str),
    /// The file could not be opened or read
    Unreadable(String),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Extension => write!(f, "extension does not match"),
            ExclusionReason::ContentType(mime) => write!(f, "content detected as {mime}"),
            ExclusionReason::Unreadable(err) => write!(f, "unreadable: {err}"),
        }
    }
}

/// Gates files on extension and leading content bytes.
pub struct ContentSniffer {
    extension: String,
    sniff_bytes: usize,
}

impl ContentSniffer {
    /// Create a sniffer for the configured source extension.
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            extension: config.source_extension.clone(),
            sniff_bytes: config.sniff_bytes,
        }
    }

    /// True if the file should be handed to the conversion pipeline.
    pub fn qualifies(&self, path: &Path) -> bool {
        self.sniff(path).qualifies()
    }

    /// Classify a file. I/O errors become [`ExclusionReason::Unreadable`].
    pub fn sniff(&self, path: &Path) -> SniffResult {
        if !self.has_source_extension(path) {
            return SniffResult::Excluded(ExclusionReason::Extension);
        }

        let prefix = match read_prefix(path, self.sniff_bytes) {
            Ok(prefix) => prefix,
            Err(e) => {
                tracing::debug!("Sniff failed for {:?}: {}", path, e);
                return SniffResult::Excluded(ExclusionReason::Unreadable(e.to_string()));
            }
        };

        let mime = detect_content_type(&prefix);
        if ACCEPTED_MIME_TYPES.contains(&mime) {
            SniffResult::Qualifies { mime }
        } else {
            tracing::debug!("Excluding {:?}: detected {}", path, mime);
            SniffResult::Excluded(ExclusionReason::ContentType(mime))
        }
    }

    /// Extension check. The file name must have room for at least one
    /// character, a dot and the extension.
    fn has_source_extension(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.len() < self.extension.len() + 2 {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

/// Read up to `limit` bytes from the start of a file. Short files are fine.
fn read_prefix(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut prefix = Vec::new();
    file.take(limit as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

/// Classify a byte prefix by its magic bytes.
///
/// Always returns a MIME type: `application/octet-stream` when nothing
/// matches and the data looks binary, `text/plain; charset=utf-8` when it
/// contains no binary control bytes.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    if let Some(mime) = iso_bmff_type(data) {
        return mime;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return "image/webp";
    }

    if data.starts_with(b"BM") {
        return "image/bmp";
    }

    // TIFF: II (little-endian) or MM (big-endian) followed by version 42
    if data.starts_with(&[b'I', b'I', 0x2A, 0x00]) || data.starts_with(&[b'M', b'M', 0x00, 0x2A]) {
        return "image/tiff";
    }

    if data.starts_with(b"%PDF-") {
        return "application/pdf";
    }

    if data.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }

    if data.starts_with(&[0x1F, 0x8B, 0x08]) {
        return "application/x-gzip";
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        MIME_OCTET_STREAM
    } else {
        MIME_TEXT_PLAIN
    }
}

/// ISO base media files carry an `ftyp` box at offset 4 with a major brand.
fn iso_bmff_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return None;
    }
    let brand = &data[8..12];
    match brand {
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" => Some(MIME_HEIC),
        b"mif1" | b"msf1" | b"heif" => Some(MIME_HEIF),
        b"avif" | b"avis" => Some("image/avif"),
        b"isom" | b"iso2" | b"mp41" | b"mp42" | b"avc1" | b"M4V " => Some("video/mp4"),
        b"qt  " => Some("video/quicktime"),
        _ => None,
    }
}

/// Control bytes that never appear in text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
