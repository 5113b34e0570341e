//! Source-format codec seam.
//!
//! The pipeline never parses HEIC itself. It hands the raw file bytes to a
//! [`SourceCodec`], which extracts the EXIF block and decodes the primary
//! image. [`HeifCodec`] is the libheif-backed implementation.

use image::{DynamicImage, RgbImage};

use crate::error::CodecError;

/// Decoder and metadata extractor for the source container format.
///
/// Both methods receive the complete file contents, so each starts reading
/// from the beginning regardless of what the other did.
pub trait SourceCodec: Send + Sync {
    /// Extract the metadata block to embed in the output, ready to be used
    /// as a JPEG APP1 payload. `Ok(None)` means the file carries none.
    fn extract_metadata(&self, data: &[u8]) -> Result<Option<Vec<u8>>, CodecError>;

    /// Decode the primary image into a pixel buffer.
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError>;
}

#[cfg(feature = "heif")]
pub use heif::HeifCodec;

/// Copy an interleaved 8-bit RGB plane into an image, dropping row padding.
///
/// `stride` is the distance in bytes between row starts and may exceed
/// `width * 3`. The last row only needs `width * 3` bytes.
#[cfg_attr(not(feature = "heif"), allow(dead_code))]
pub(crate) fn interleaved_rgb_to_image(
    width: u32,
    height: u32,
    stride: usize,
    data: &[u8],
) -> Result<DynamicImage, CodecError> {
    let row_len = width as usize * 3;
    if stride == 0 || stride < row_len {
        return Err(CodecError::new(format!(
            "plane stride {stride} is shorter than a {width} pixel row"
        )));
    }

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        let row = row
            .get(..row_len)
            .ok_or_else(|| CodecError::new("decoded row shorter than image width"))?;
        pixels.extend_from_slice(row);
    }

    RgbImage::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| CodecError::new("decoded plane does not match image dimensions"))
}

#[cfg(feature = "heif")]
mod heif {
    use image::DynamicImage;
    use libheif_rs::{ColorSpace, DecodingOptions, HeifContext, ItemId, LibHeif, RgbChroma};

    use super::{interleaved_rgb_to_image, SourceCodec};
    use crate::error::CodecError;
    use crate::pipeline::metadata::heif_exif_to_app1;

    /// HEIC/HEIF codec backed by libheif.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct HeifCodec;

    impl HeifCodec {
        pub fn new() -> Self {
            Self
        }
    }

    fn codec_err(e: libheif_rs::HeifError) -> CodecError {
        CodecError::new(e.to_string())
    }

    /// Keep the stored pixel orientation. The EXIF block is copied unchanged,
    /// Orientation tag included, so applying `irot`/`imir` here would rotate
    /// the image twice on display.
    pub(super) fn decoding_options() -> Result<DecodingOptions, CodecError> {
        let mut options = DecodingOptions::new()
            .ok_or_else(|| CodecError::new("failed to allocate libheif decoding options"))?;
        options.set_ignore_transformations(true);
        Ok(options)
    }

    impl SourceCodec for HeifCodec {
        fn extract_metadata(&self, data: &[u8]) -> Result<Option<Vec<u8>>, CodecError> {
            let ctx = HeifContext::read_from_bytes(data).map_err(codec_err)?;
            let handle = ctx.primary_image_handle().map_err(codec_err)?;

            let mut ids: Vec<ItemId> = vec![0; 1];
            let count = handle.metadata_block_ids(&mut ids, b"Exif");
            if count == 0 {
                return Ok(None);
            }

            let raw = handle.metadata(ids[0]).map_err(codec_err)?;
            heif_exif_to_app1(&raw)
                .map(Some)
                .ok_or_else(|| CodecError::new("malformed Exif item (bad TIFF header offset)"))
        }

        fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
            let lib = LibHeif::new();
            let ctx = HeifContext::read_from_bytes(data).map_err(codec_err)?;
            let handle = ctx.primary_image_handle().map_err(codec_err)?;
            let image = lib
                .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), Some(decoding_options()?))
                .map_err(codec_err)?;

            let planes = image.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| CodecError::new("decoded image has no interleaved RGB plane"))?;
            interleaved_rgb_to_image(plane.width, plane.height, plane.stride, plane.data)
        }
    }
}
