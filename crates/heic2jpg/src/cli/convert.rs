//! The default command: convert a directory of HEIC files to JPEG.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use console::style;
use heic2jpg_core::{BatchConverter, BatchSummary, Config, FileOutcome, FileStatus, HeifCodec};
use indicatif::{ProgressBar, ProgressStyle};

/// Arguments for a conversion run.
#[derive(Args, Debug, Default)]
pub struct ConvertArgs {
    /// Directory to read HEIC files from [default: from config, "./"]
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Directory to write JPEG files to [default: from config, "./jpgs/"]
    #[arg(short, long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Number of files converted in parallel
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Exit with status 1 if any file or directory failed
    #[arg(long)]
    pub strict: bool,

    /// Print one JSON outcome per line instead of status lines
    #[arg(long)]
    pub json: bool,
}

impl ConvertArgs {
    /// Fold CLI overrides into the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.batch.source_dir = source.clone();
        }
        if let Some(target) = &self.target {
            config.batch.target_dir = target.clone();
        }
        if let Some(jobs) = self.jobs {
            config.batch.workers = jobs.max(1);
        }
        if self.strict {
            config.batch.strict = true;
        }
    }
}

/// Execute a conversion run.
pub async fn execute(args: ConvertArgs, mut config: Config) -> anyhow::Result<ExitCode> {
    args.apply(&mut config);
    let source_dir = config.source_dir();
    let target_dir = config.target_dir();

    let batch = BatchConverter::new(&config, Arc::new(HeifCodec::new()));
    tracing::info!(
        "Converting {:?} -> {:?} with {} worker(s)",
        source_dir,
        target_dir,
        batch.workers()
    );
    let progress = create_spinner();

    let mut emit_error = None;
    let summary = batch
        .run(&source_dir, &target_dir, |outcome| {
            progress.inc(1);
            if let Some(name) = outcome.source.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
            if emit_error.is_some() {
                return;
            }
            if let Err(e) = progress.suspend(|| report_outcome(outcome, args.json)) {
                emit_error = Some(e);
            }
        })
        .await;
    progress.finish_and_clear();

    if let Some(e) = emit_error {
        return Err(e);
    }

    print_summary(&summary);

    if should_fail(&summary, config.batch.strict) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Print the status line for one outcome to stdout.
fn report_outcome(outcome: &FileOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }

    match outcome.status {
        FileStatus::Converted => {
            let target = outcome
                .target
                .as_deref()
                .map(|t| t.display().to_string())
                .unwrap_or_default();
            let dims = match (outcome.width, outcome.height) {
                (Some(w), Some(h)) => format!("{w}x{h}"),
                _ => String::from("?"),
            };
            let exif = match outcome.metadata_bytes {
                Some(n) if n > 0 => format!(", EXIF {n} bytes"),
                _ => String::from(", no EXIF"),
            };
            println!(
                "{} {} -> {} ({dims}{exif})",
                style("✓").green(),
                outcome.source.display(),
                target
            );
        }
        FileStatus::Failed => {
            println!(
                "{} {}: {}",
                style("✗").red(),
                outcome.source.display(),
                outcome.reason.as_deref().unwrap_or("unknown error")
            );
        }
        FileStatus::Skipped => {
            tracing::debug!(
                "Skipped {:?}: {}",
                outcome.source,
                outcome.reason.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}

fn should_fail(summary: &BatchSummary, strict: bool) -> bool {
    strict && !summary.is_clean()
}

/// Spinner for runs where the file count isn't known up front.
fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} file(s) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_message("scanning...");
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(summary: &BatchSummary) {
    let elapsed = summary.elapsed.as_secs_f64();
    let rate = if elapsed > 0.0 {
        summary.converted as f64 / elapsed
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Converted:    {:>8}", summary.converted);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total());
    eprintln!("    Duration:     {:>7.1}s", elapsed);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");

    for error in &summary.errors {
        eprintln!("  {} {}", style("error:").red().bold(), error);
    }
}
