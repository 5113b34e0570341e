//! `heic2jpg config`: inspect or create the TOML file holding the default
//! source/target directories, worker count and sniffing options.

use std::path::Path;

use clap::{Args, Subcommand};
use heic2jpg_core::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the settings a conversion run would use, as TOML
    Show,

    /// Print where heic2jpg looks for its config file
    Path,

    /// Write a config file with the built-in defaults
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    let path = Config::default_path();
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", render_with_origin(&config, &path)?);
        }
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Init { force } => write_defaults(&path, force)?,
    }
    Ok(())
}

/// TOML for `config`, headed by a comment naming where it came from.
fn render_with_origin(config: &Config, path: &Path) -> anyhow::Result<String> {
    let origin = if path.exists() {
        format!("# loaded from {}", path.display())
    } else {
        format!("# built-in defaults ({} not found)", path.display())
    };
    Ok(format!("{origin}\n{}", config.to_toml()?))
}

fn write_defaults(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to replace it with defaults",
            path.display()
        );
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;

    tracing::info!("Wrote default config to {:?}", path);
    println!("Created {}", path.display());
    Ok(())
}
