//! JPEG encoding with an EXIF APP1 segment right after SOI.
//!
//! The `image` JPEG encoder always starts its output with its own SOI marker
//! and has no hook for inserting an application segment. So we write SOI and
//! the APP1 segment ourselves, then route the encoder through a
//! [`SkipWriter`] that swallows its SOI.
//!
//! Resulting layout:
//!
//! ```text
//! FF D8 | FF E1 <len: u16 BE = 2 + n> <n metadata bytes> | encoder output minus FF D8
//! ```

use std::io::{self, Write};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};

use crate::error::EncodeError;

/// JPEG start-of-image marker.
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// Every JPEG marker begins with this byte.
pub const MARKER_PREFIX: u8 = 0xFF;

/// APP1, the segment type EXIF lives in.
pub const APP1: u8 = 0xE1;

/// Largest metadata block whose length still fits the u16 length field.
pub const MAX_METADATA_LEN: usize = u16::MAX as usize - 2;

/// Writer adapter that drops the first `skip` bytes written through it.
///
/// Skipped bytes are still reported as written, so callers using
/// `write_all` see normal progress. The remaining count only goes down.
#[derive(Debug)]
pub struct SkipWriter<W> {
    inner: W,
    remaining: usize,
}

impl<W: Write> SkipWriter<W> {
    pub fn new(inner: W, skip: usize) -> Self {
        Self {
            inner,
            remaining: skip,
        }
    }

    /// Bytes still to be dropped.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for SkipWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return self.inner.write(buf);
        }

        if buf.len() < self.remaining {
            self.remaining -= buf.len();
            return Ok(buf.len());
        }

        let skip = self.remaining;
        let written = self.inner.write(&buf[skip..])?;
        self.remaining = 0;
        Ok(skip + written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write SOI followed by the APP1 segment (when metadata is non-empty).
pub fn write_prologue<W: Write>(dest: &mut W, metadata: Option<&[u8]>) -> Result<(), EncodeError> {
    let metadata = metadata.filter(|m| !m.is_empty());
    if let Some(block) = metadata {
        check_metadata_len(block)?;
    }

    dest.write_all(&SOI)?;

    if let Some(block) = metadata {
        let segment_len = (2 + block.len()) as u16;
        let [hi, lo] = segment_len.to_be_bytes();
        dest.write_all(&[MARKER_PREFIX, APP1, hi, lo])?;
        dest.write_all(block)?;
    }

    Ok(())
}

fn check_metadata_len(block: &[u8]) -> Result<(), EncodeError> {
    if block.len() > MAX_METADATA_LEN {
        return Err(EncodeError::MetadataTooLarge {
            len: block.len(),
            max: MAX_METADATA_LEN,
        });
    }
    Ok(())
}

/// Encodes pixel buffers as JPEG with a caller-supplied metadata block.
pub struct MetadataEncoder;

impl MetadataEncoder {
    /// Encode `image` as JPEG into `dest`, embedding `metadata` as APP1.
    ///
    /// Nothing is written if the metadata block is too large. Any other
    /// failure may leave a partial stream in `dest`.
    pub fn encode<W: Write>(
        image: &DynamicImage,
        metadata: Option<&[u8]>,
        dest: &mut W,
    ) -> Result<(), EncodeError> {
        write_prologue(dest, metadata)?;

        let rgb = image.to_rgb8();
        let mut skipper = SkipWriter::new(&mut *dest, SOI.len());
        JpegEncoder::new(&mut skipper).encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )?;
        skipper.flush()?;
        Ok(())
    }
}
