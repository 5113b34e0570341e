//! End-to-end batch conversion against a fake HEIC codec.
//!
//! Fake files carry a real `ftyp heic` header so they pass the sniffer, then
//! a tiny payload: width (u16 BE), height (u16 BE), metadata length (u32 BE)
//! and the metadata bytes.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use heic2jpg_core::{BatchConverter, CodecError, Config, FileOutcome, FileStatus, SourceCodec};
use image::{DynamicImage, Rgb, RgbImage};

const HEADER: &[u8; 16] = b"\0\0\0\x10ftypheic\0\0\0\0";

#[derive(Default)]
struct FakeHeicCodec {
    decodes: AtomicUsize,
}

impl FakeHeicCodec {
    fn parse<'a>(&self, data: &'a [u8]) -> Result<(u32, u32, &'a [u8]), CodecError> {
        let body = data
            .strip_prefix(&HEADER[..])
            .ok_or_else(|| CodecError::new("not a HEIF file"))?;
        if body.len() < 8 {
            return Err(CodecError::new("truncated payload"));
        }
        let width = u16::from_be_bytes([body[0], body[1]]) as u32;
        let height = u16::from_be_bytes([body[2], body[3]]) as u32;
        let len = u32::from_be_bytes([body[4], body[5], body[6], body[7]]) as usize;
        let metadata = body
            .get(8..8 + len)
            .ok_or_else(|| CodecError::new("truncated metadata"))?;
        Ok((width, height, metadata))
    }
}

impl SourceCodec for FakeHeicCodec {
    fn extract_metadata(&self, data: &[u8]) -> Result<Option<Vec<u8>>, CodecError> {
        let (_, _, metadata) = self.parse(data)?;
        Ok((!metadata.is_empty()).then(|| metadata.to_vec()))
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        let (width, height, _) = self.parse(data)?;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([200, 100, 50]),
        )))
    }
}

fn fake_heic(width: u16, height: u16, metadata: &[u8]) -> Vec<u8> {
    let mut data = HEADER.to_vec();
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&(metadata.len() as u32).to_be_bytes());
    data.extend_from_slice(metadata);
    data
}

/// `Exif\0\0` + a little-endian TIFF with Orientation = 6, padded to 200 bytes.
fn exif_block_200() -> Vec<u8> {
    let mut block = b"Exif\0\0".to_vec();
    block.extend_from_slice(&[b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
    block.extend_from_slice(&1u16.to_le_bytes());
    block.extend_from_slice(&0x0112u16.to_le_bytes());
    block.extend_from_slice(&3u16.to_le_bytes());
    block.extend_from_slice(&1u32.to_le_bytes());
    block.extend_from_slice(&[0x06, 0x00, 0x00, 0x00]);
    block.extend_from_slice(&0u32.to_le_bytes());
    block.resize(200, 0);
    block
}

fn name_of(outcome: &FileOutcome) -> String {
    outcome
        .source
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

async fn run(codec: Arc<FakeHeicCodec>, src: &Path, target: &Path) -> Vec<FileOutcome> {
    let batch = BatchConverter::new(&Config::default(), codec);
    let mut outcomes = Vec::new();
    let summary = batch.run(src, target, |o| outcomes.push(o.clone())).await;
    assert_eq!(summary.total(), outcomes.len() as u64);
    outcomes
}

#[tokio::test]
async fn converts_directory_and_preserves_metadata() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("jpgs");
    let block = exif_block_200();

    std::fs::write(src.path().join("a.heic"), fake_heic(16, 8, &[])).unwrap();
    std::fs::write(src.path().join("b.HEIC"), fake_heic(8, 8, &block)).unwrap();
    std::fs::write(src.path().join("c.txt"), fake_heic(8, 8, &[])).unwrap();
    std::fs::write(src.path().join("d.heic"), "just some notes, not a photo\n").unwrap();
    std::fs::create_dir(src.path().join("sub.heic")).unwrap();

    assert!(!target.exists());
    let codec = Arc::new(FakeHeicCodec::default());
    let outcomes = run(Arc::clone(&codec), src.path(), &target).await;

    let statuses: Vec<_> = outcomes.iter().map(|o| (name_of(o), o.status)).collect();
    assert_eq!(
        statuses,
        vec![
            ("a.heic".to_string(), FileStatus::Converted),
            ("b.HEIC".to_string(), FileStatus::Converted),
            ("c.txt".to_string(), FileStatus::Skipped),
            ("d.heic".to_string(), FileStatus::Skipped),
        ]
    );
    // c.txt and d.heic never reach the decoder
    assert_eq!(codec.decodes.load(Ordering::SeqCst), 2);

    let mut produced: Vec<_> = std::fs::read_dir(&target)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    produced.sort();
    assert_eq!(produced, vec!["a.heic.jpg", "b.HEIC.jpg"]);

    // a.heic.jpg: SOI followed straight by the encoder's own segments
    let a = std::fs::read(target.join("a.heic.jpg")).unwrap();
    assert_eq!(&a[..2], &[0xFFu8, 0xD8]);
    assert_ne!(&a[2..4], &[0xFFu8, 0xE1]);

    // b.HEIC.jpg: SOI, APP1 with length 202, then the exact block
    let b = std::fs::read(target.join("b.HEIC.jpg")).unwrap();
    assert_eq!(&b[..4], &[0xFFu8, 0xD8, 0xFF, 0xE1]);
    assert_eq!(u16::from_be_bytes([b[4], b[5]]), 202);
    assert_eq!(&b[6..206], block.as_slice());

    let exif = exif::Reader::new()
        .read_from_container(&mut std::io::Cursor::new(&b))
        .unwrap();
    assert_eq!(exif.buf(), &block[6..]);
    let orientation = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0));
    assert_eq!(orientation, Some(6));

    let decoded = image::load_from_memory(&b).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 8));

    let converted_b = outcomes.iter().find(|o| name_of(o) == "b.HEIC").unwrap();
    assert_eq!(converted_b.metadata_bytes, Some(200));
    assert_eq!(converted_b.target.as_deref(), Some(target.join("b.HEIC.jpg").as_path()));
}

#[tokio::test]
async fn decode_failure_does_not_stop_batch() {
    let src = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    // Binary junk passes the sniffer through the octet-stream fallback
    std::fs::write(src.path().join("a.heic"), [0x00u8, 0x13, 0x37, 0x00, 0xFE]).unwrap();
    std::fs::write(src.path().join("b.heic"), fake_heic(4, 4, &[])).unwrap();

    let outcomes = run(Arc::new(FakeHeicCodec::default()), src.path(), target.path()).await;

    assert_eq!(outcomes[0].status, FileStatus::Failed);
    assert!(outcomes[0]
        .reason
        .as_deref()
        .unwrap()
        .contains("not a HEIF file"));
    assert_eq!(outcomes[1].status, FileStatus::Converted);
    assert!(target.path().join("b.heic.jpg").is_file());
}

#[tokio::test]
async fn unwritable_target_fails_each_file_but_completes() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    // A regular file where the target directory should be
    let target = out.path().join("jpgs");
    std::fs::write(&target, b"occupied").unwrap();

    std::fs::write(src.path().join("a.heic"), fake_heic(4, 4, &[])).unwrap();
    std::fs::write(src.path().join("b.heic"), fake_heic(4, 4, &[])).unwrap();

    let batch = BatchConverter::new(&Config::default(), Arc::new(FakeHeicCodec::default()));
    let summary = batch.run(src.path(), &target, |_| {}).await;

    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.failed, 2);
    assert!(!summary.is_clean());
}
