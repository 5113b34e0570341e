//! EXIF block handling between the HEIF and JPEG containers.
//!
//! A HEIF `Exif` item starts with a 4-byte big-endian offset to the TIFF
//! header. JPEG APP1 wants `Exif\0\0` followed directly by the TIFF data, so
//! the item is reframed once here and then carried through untouched.

use exif::{In, Reader, Tag, Value};

/// Identifier that opens an EXIF APP1 payload.
pub const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Turn a HEIF `Exif` item into a JPEG APP1 payload.
///
/// Returns `None` when the offset points outside the item or the data at the
/// offset is not a TIFF header.
pub fn heif_exif_to_app1(item: &[u8]) -> Option<Vec<u8>> {
    let offset_bytes: [u8; 4] = item.get(..4)?.try_into().ok()?;
    let offset = u32::from_be_bytes(offset_bytes) as usize;
    let body = &item[4..];

    let mut tiff = body.get(offset..)?;
    // Some writers use offset 0 and keep the identifier in the body
    if let Some(rest) = tiff.strip_prefix(&EXIF_HEADER[..]) {
        tiff = rest;
    }
    if !is_tiff_header(tiff) {
        return None;
    }

    let mut payload = Vec::with_capacity(EXIF_HEADER.len() + tiff.len());
    payload.extend_from_slice(EXIF_HEADER);
    payload.extend_from_slice(tiff);
    Some(payload)
}

fn is_tiff_header(data: &[u8]) -> bool {
    data.starts_with(&[b'I', b'I', 0x2A, 0x00]) || data.starts_with(&[b'M', b'M', 0x00, 0x2A])
}

/// A few EXIF fields read back for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifSummary {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub captured_at: Option<String>,
    /// Image orientation (1-8 per EXIF spec)
    pub orientation: Option<u32>,
}

impl ExifSummary {
    /// Parse an APP1 payload (`Exif\0\0` + TIFF).
    ///
    /// Returns `None` if the block is not parseable EXIF. The block itself is
    /// still embedded as-is; this is only used for logging.
    pub fn from_app1(block: &[u8]) -> Option<Self> {
        let tiff = block.strip_prefix(&EXIF_HEADER[..])?;
        let exif = Reader::new().read_raw(tiff.to_vec()).ok()?;

        Some(Self {
            camera_make: get_string(&exif, Tag::Make),
            camera_model: get_string(&exif, Tag::Model),
            captured_at: get_datetime(&exif),
            orientation: get_u32(&exif, Tag::Orientation),
        })
    }
}

fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY)
        .map(|f| f.display_value().to_string().trim_matches('"').to_string())
}

fn get_u32(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Short(v) => v.first().map(|&x| x as u32),
            Value::Long(v) => v.first().copied(),
            _ => None,
        })
}

/// Prefer DateTimeOriginal over DateTime.
fn get_datetime(exif: &exif::Exif) -> Option<String> {
    exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))
        .map(|f| f.display_value().to_string().trim_matches('"').to_string())
}

/// Minimal little-endian TIFF with one IFD0 entry: Orientation = 6.
#[cfg(test)]
pub(crate) fn sample_tiff() -> Vec<u8> {
    let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&[0x06, 0x00, 0x00, 0x00]);
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no IFD1
    tiff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heif_item(offset: u32, body: &[u8]) -> Vec<u8> {
        let mut item = offset.to_be_bytes().to_vec();
        item.extend_from_slice(body);
        item
    }

    #[test]
    fn test_item_with_exif_identifier() {
        let mut body = EXIF_HEADER.to_vec();
        body.extend_from_slice(&sample_tiff());
        let app1 = heif_exif_to_app1(&heif_item(6, &body)).unwrap();

        assert_eq!(app1, body);
    }

    #[test]
    fn test_item_with_bare_tiff() {
        let app1 = heif_exif_to_app1(&heif_item(0, &sample_tiff())).unwrap();

        assert!(app1.starts_with(EXIF_HEADER));
        assert_eq!(&app1[6..], sample_tiff().as_slice());
    }

    #[test]
    fn test_item_offset_zero_keeping_identifier() {
        let mut body = EXIF_HEADER.to_vec();
        body.extend_from_slice(&sample_tiff());
        let app1 = heif_exif_to_app1(&heif_item(0, &body)).unwrap();

        assert_eq!(app1, body);
    }

    #[test]
    fn test_malformed_items() {
        assert_eq!(heif_exif_to_app1(&[0x00, 0x00]), None);
        assert_eq!(heif_exif_to_app1(&heif_item(100, &sample_tiff())), None);
        assert_eq!(heif_exif_to_app1(&heif_item(0, b"not a tiff header")), None);
    }

    #[test]
    fn test_summary_reads_orientation() {
        let mut block = EXIF_HEADER.to_vec();
        block.extend_from_slice(&sample_tiff());

        let summary = ExifSummary::from_app1(&block).unwrap();
        assert_eq!(summary.orientation, Some(6));
        assert_eq!(summary.camera_make, None);
    }

    #[test]
    fn test_summary_rejects_non_exif() {
        assert!(ExifSummary::from_app1(b"garbage").is_none());
        assert!(ExifSummary::from_app1(b"Exif\0\0garbage").is_none());
    }
}
