use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use marky::{DocumentIdentity, ExportBundle, MarkyConfig};

/// Inspect Marky storage keys, export files and configuration.
#[derive(Debug, Parser)]
#[command(name = "marky", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the canonical storage key and every alias key for a URL.
    Keys { url: String },
    /// Print per-color statistics for an export file.
    Stats { file: PathBuf },
    /// Validate a YAML configuration file.
    CheckConfig { file: PathBuf },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Keys { url } => {
            let keys = DocumentIdentity::from_location(&url)?.key_set();
            println!("canonical: {}", keys.canonical());
            for alias in keys.aliases() {
                println!("alias:     {alias}");
            }
        }
        Command::Stats { file } => {
            let bundle = ExportBundle::from_json(&fs::read_to_string(&file)?)?;
            if !bundle.title.is_empty() {
                println!("{}", bundle.title);
            }
            if !bundle.url.is_empty() {
                println!("{}", bundle.url);
            }
            print!("{}", bundle.stats());
        }
        Command::CheckConfig { file } => {
            let config = MarkyConfig::from_file(&file)?;
            println!(
                "{} is valid (storage: {}, quiet period: {} ms)",
                file.display(),
                config.storage.backend,
                config.restore.quiet_period_ms
            );
        }
    }
    Ok(())
}
