//! Single-file conversion - wires the codec and encoder together.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{PipelineError, PipelineResult};
use crate::types::ConversionReport;

use super::codec::SourceCodec;
use super::encode::MetadataEncoder;
use super::metadata::ExifSummary;

/// Converts one source file into one target file.
pub struct Converter {
    codec: Arc<dyn SourceCodec>,
}

impl Converter {
    pub fn new(codec: Arc<dyn SourceCodec>) -> Self {
        Self { codec }
    }

    /// Convert `source` into a JPEG at `target`, carrying the metadata block.
    ///
    /// The target is created (or truncated) only after the source decoded,
    /// but it is not removed if encoding fails partway.
    pub fn convert(&self, source: &Path, target: &Path) -> PipelineResult<ConversionReport> {
        let start = Instant::now();
        tracing::debug!("Converting: {:?} -> {:?}", source, target);

        let data = read_source(source)?;
        tracing::trace!("  Read {} bytes: {:?}", data.len(), start.elapsed());

        let metadata_start = Instant::now();
        let metadata = self
            .codec
            .extract_metadata(&data)
            .map_err(|e| PipelineError::Metadata {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?
            .filter(|block| !block.is_empty());
        tracing::trace!("  Metadata: {:?}", metadata_start.elapsed());
        log_metadata(source, metadata.as_deref());

        let decode_start = Instant::now();
        let image = self.codec.decode(&data).map_err(|e| PipelineError::Decode {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        drop(data);
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let encode_start = Instant::now();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(target)
            .map_err(|e| PipelineError::Io {
                path: target.to_path_buf(),
                source: e,
            })?;
        let mut writer = BufWriter::new(file);
        MetadataEncoder::encode(&image, metadata.as_deref(), &mut writer)
            .and_then(|()| writer.flush().map_err(Into::into))
            .map_err(|e| PipelineError::Encode {
                path: target.to_path_buf(),
                source: e,
            })?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        let report = ConversionReport {
            width: image.width(),
            height: image.height(),
            metadata_bytes: metadata.as_ref().map_or(0, Vec::len),
        };
        tracing::debug!(
            "Converted {:?} in {:?} ({}x{}, {} metadata bytes)",
            source,
            start.elapsed(),
            report.width,
            report.height,
            report.metadata_bytes
        );
        Ok(report)
    }
}

fn read_source(path: &Path) -> PipelineResult<Vec<u8>> {
    let io_err = |e: std::io::Error| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).map_err(io_err)?;
    Ok(data)
}

fn log_metadata(source: &Path, metadata: Option<&[u8]>) {
    let Some(block) = metadata else {
        tracing::debug!("  No metadata block in {:?}", source);
        return;
    };
    match ExifSummary::from_app1(block) {
        Some(summary) => tracing::debug!(
            "  EXIF: make={:?} model={:?} captured={:?} orientation={:?}",
            summary.camera_make,
            summary.camera_model,
            summary.captured_at,
            summary.orientation
        ),
        None => tracing::debug!("  Metadata block ({} bytes) is not parseable EXIF", block.len()),
    }
}
