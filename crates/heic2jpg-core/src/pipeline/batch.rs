//! Batch driver: convert every qualifying file in a directory.
//!
//! Files are gated by the [`ContentSniffer`] and converted on the blocking
//! pool, at most `workers` at a time. Outcomes come back over a bounded
//! channel. With a single worker each file finishes (and is reported) before
//! the next one starts, so outcomes follow listing order.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{BatchSummary, FileOutcome};

use super::codec::SourceCodec;
use super::convert::Converter;
use super::discovery::{target_path, DiscoveredFile, FileDiscovery};
use super::sniff::{ContentSniffer, SniffResult};

/// Runs the sniff-then-convert loop over a source directory.
pub struct BatchConverter {
    sniffer: Arc<ContentSniffer>,
    converter: Arc<Converter>,
    target_extension: Arc<str>,
    workers: usize,
}

impl BatchConverter {
    /// Create a batch converter from configuration and a source codec.
    pub fn new(config: &Config, codec: Arc<dyn SourceCodec>) -> Self {
        Self {
            sniffer: Arc::new(ContentSniffer::new(&config.conversion)),
            converter: Arc::new(Converter::new(codec)),
            target_extension: Arc::from(config.conversion.target_extension.as_str()),
            workers: config.batch.workers.max(1),
        }
    }

    /// Override the number of concurrent conversions.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Convert every qualifying file in `source_dir` into `target_dir`.
    ///
    /// `on_outcome` is called once per directory entry, including skipped
    /// ones. Per-file failures never stop the run. Directory-level problems
    /// are logged and recorded in [`BatchSummary::errors`].
    pub async fn run<F>(&self, source_dir: &Path, target_dir: &Path, mut on_outcome: F) -> BatchSummary
    where
        F: FnMut(&FileOutcome),
    {
        let start = Instant::now();
        let mut summary = BatchSummary::default();

        // Keep going without it; each write will then fail on its own.
        if let Err(e) = ensure_target_dir(target_dir) {
            tracing::error!("{}", e);
            summary.errors.push(e.to_string());
        }

        let files = match FileDiscovery::list(source_dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("{}", e);
                summary.errors.push(e.to_string());
                summary.elapsed = start.elapsed();
                return summary;
            }
        };
        tracing::info!(
            "Found {} file(s) ({:.1} MB) in {:?}",
            files.len(),
            FileDiscovery::total_size(&files) as f64 / 1_000_000.0,
            source_dir
        );

        let (tx, mut rx) = mpsc::channel::<FileOutcome>(self.workers * 2);
        let producer = tokio::spawn(dispatch(
            files,
            tx,
            Arc::new(Semaphore::new(self.workers)),
            Arc::clone(&self.sniffer),
            Arc::clone(&self.converter),
            target_dir.to_path_buf(),
            Arc::clone(&self.target_extension),
        ));

        while let Some(outcome) = rx.recv().await {
            summary.record(&outcome);
            on_outcome(&outcome);
        }
        if let Err(e) = producer.await {
            tracing::error!("Batch dispatcher failed: {}", e);
            summary.errors.push(format!("batch dispatcher failed: {e}"));
        }

        summary.elapsed = start.elapsed();
        tracing::debug!(
            "Batch finished in {:?}: {} converted, {} skipped, {} failed",
            summary.elapsed,
            summary.converted,
            summary.skipped,
            summary.failed
        );
        summary
    }
}

/// Hand files to the blocking pool, bounded by the semaphore.
async fn dispatch(
    files: Vec<DiscoveredFile>,
    tx: mpsc::Sender<FileOutcome>,
    semaphore: Arc<Semaphore>,
    sniffer: Arc<ContentSniffer>,
    converter: Arc<Converter>,
    target_dir: PathBuf,
    extension: Arc<str>,
) {
    for file in files {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let tx = tx.clone();
        let sniffer = Arc::clone(&sniffer);
        let converter = Arc::clone(&converter);
        let target_dir = target_dir.clone();
        let extension = Arc::clone(&extension);

        tokio::task::spawn_blocking(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                process_entry(&sniffer, &converter, &file, &target_dir, &extension)
            }))
            .unwrap_or_else(|_| {
                tracing::error!("Conversion panicked: {:?}", file.path);
                FileOutcome::failed(file.path.clone(), None, "conversion panicked")
            });
            // Send before releasing the permit so a single worker keeps order.
            let _ = tx.blocking_send(outcome);
            drop(permit);
        });
    }
}

/// Sniff one entry and convert it if it qualifies.
fn process_entry(
    sniffer: &ContentSniffer,
    converter: &Converter,
    file: &DiscoveredFile,
    target_dir: &Path,
    extension: &str,
) -> FileOutcome {
    if let SniffResult::Excluded(reason) = sniffer.sniff(&file.path) {
        tracing::debug!("Skipping {:?}: {}", file.path, reason);
        return FileOutcome::skipped(file.path.clone(), reason.to_string());
    }

    let target = target_path(target_dir, &file.name, extension);
    match converter.convert(&file.path, &target) {
        Ok(report) => FileOutcome::converted(file.path.clone(), target, &report),
        Err(e) => {
            tracing::warn!("Conversion failed for {:?}: {}", file.path, e);
            FileOutcome::failed(file.path.clone(), Some(target), e.to_string())
        }
    }
}

/// Create the target directory (and parents) if it is missing.
fn ensure_target_dir(dir: &Path) -> PipelineResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    tracing::info!("Target directory {:?} does not exist, creating", dir);
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::types::FileStatus;
    use image::{DynamicImage, RgbImage};

    /// Decodes anything into a 2x2 image; panics on files starting with "boom".
    struct TinyCodec;

    impl SourceCodec for TinyCodec {
        fn extract_metadata(&self, _: &[u8]) -> Result<Option<Vec<u8>>, CodecError> {
            Ok(None)
        }

        fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
            if data.starts_with(b"boom") {
                panic!("decoder bug");
            }
            Ok(DynamicImage::ImageRgb8(RgbImage::new(2, 2)))
        }
    }

    fn batch() -> BatchConverter {
        BatchConverter::new(&Config::default(), Arc::new(TinyCodec))
    }

    #[test]
    fn test_workers_never_zero() {
        assert_eq!(batch().with_workers(0).workers(), 1);
        assert_eq!(batch().with_workers(4).workers(), 4);
    }

    #[tokio::test]
    async fn test_creates_missing_target_dir() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("nested").join("jpgs");
        std::fs::write(src.path().join("a.heic"), [0u8, 1, 2, 3]).unwrap();

        let summary = batch().run(src.path(), &target, |_| {}).await;

        assert!(summary.is_clean());
        assert_eq!(summary.converted, 1);
        assert!(target.join("a.heic.jpg").is_file());
    }

    #[tokio::test]
    async fn test_missing_source_dir_is_recorded() {
        let out = tempfile::tempdir().unwrap();
        let mut seen = 0;

        let summary = batch()
            .run(&out.path().join("missing"), out.path(), |_| seen += 1)
            .await;

        assert_eq!(seen, 0);
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_source_that_is_a_file_is_not_clean() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let file = src.path().join("not_a_dir.heic");
        std::fs::write(&file, [0u8, 1, 2, 3]).unwrap();

        let summary = batch().run(&file, out.path(), |_| {}).await;

        assert_eq!(summary.total(), 0);
        assert_eq!(summary.errors.len(), 1);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_panicking_decode_fails_only_that_file() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.heic"), b"boom\0\0\0").unwrap();
        std::fs::write(src.path().join("b.heic"), [0u8, 1, 2, 3]).unwrap();

        let mut outcomes = Vec::new();
        let summary = batch()
            .run(src.path(), out.path(), |o| outcomes.push(o.clone()))
            .await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.converted, 1);
        assert_eq!(outcomes[0].status, FileStatus::Failed);
        assert_eq!(outcomes[1].status, FileStatus::Converted);
    }

    #[tokio::test]
    async fn test_single_worker_reports_in_listing_order() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        for name in ["e.heic", "a.heic", "notes.txt", "c.heic", "b.heic"] {
            std::fs::write(src.path().join(name), [0u8, 9, 9, 9]).unwrap();
        }

        let mut names = Vec::new();
        batch()
            .run(src.path(), out.path(), |o| {
                names.push(o.source.file_name().unwrap().to_string_lossy().into_owned())
            })
            .await;

        assert_eq!(names, vec!["a.heic", "b.heic", "c.heic", "e.heic", "notes.txt"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_workers_report_every_file() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        for i in 0..12 {
            std::fs::write(src.path().join(format!("img{i:02}.heic")), [0u8, 1, 2, 3]).unwrap();
        }

        let summary = batch()
            .with_workers(4)
            .run(src.path(), out.path(), |_| {})
            .await;

        assert_eq!(summary.converted, 12);
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 12);
    }
}
