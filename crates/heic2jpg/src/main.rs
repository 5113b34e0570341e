//! heic2jpg CLI - batch-convert HEIC images to JPEG, keeping EXIF metadata.
//!
//! Every `*.heic` file directly inside the source directory that really is a
//! HEIC image gets written to the target directory as `<name>.heic.jpg`.
//! One failed file never stops the batch.
//!
//! # Usage
//!
//! ```bash
//! # Convert ./ into ./jpgs/
//! heic2jpg
//!
//! # Pick directories explicitly
//! heic2jpg -s ~/Pictures/iphone -t ~/Pictures/jpgs
//!
//! # Machine-readable outcomes, non-zero exit if anything failed
//! heic2jpg -s photos --json --strict
//!
//! # View configuration
//! heic2jpg config show
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// heic2jpg - convert HEIC images to JPEG while preserving EXIF metadata.
#[derive(Parser, Debug)]
#[command(name = "heic2jpg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    convert: cli::convert::ConvertArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands. Without one, the source directory is converted.
#[derive(Subcommand, Debug)]
enum Commands {
    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match heic2jpg_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `heic2jpg config path`."
            );
            heic2jpg_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("heic2jpg v{}", heic2jpg_core::VERSION);

    match cli.command {
        Some(Commands::Config(args)) => {
            cli::config::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
        None => cli::convert::execute(cli.convert, config).await,
    }
}
