//! CLI for the distrodl ISO downloader.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use distrodl_core::catalog::Catalog;
use distrodl_core::config;
use std::path::{Path, PathBuf};

use commands::{
    run_cancel, run_catalog_add, run_checksum, run_download, run_editions, run_list, run_pause,
    run_resume, run_validate, NewEdition,
};

/// Exit code when a downloaded or checked file does not match its checksum.
pub const EXIT_CORRUPT: i32 = 2;
/// Exit code when the user cancelled a download.
pub const EXIT_CANCELLED: i32 = 130;

/// Top-level CLI for the distrodl ISO downloader.
#[derive(Debug, Parser)]
#[command(name = "distrodl")]
#[command(about = "Download Linux distribution images and verify their SHA-256", long_about = None)]
pub struct Cli {
    /// Catalog JSON file (overrides `catalog_path` from config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the distributions in the catalog.
    List,

    /// List the editions of one distribution, in catalog order.
    Editions {
        /// Distribution name as it appears in the catalog.
        distribution: String,
    },

    /// Check the catalog file and report every problem found.
    Validate,

    /// Download an edition, resuming a previous partial download if present, then verify it.
    Download {
        /// Distribution name.
        distribution: String,
        /// Edition name.
        edition: String,
        /// Directory to save into (default: `download_dir` from config, else current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Pause the running download.
    Pause,

    /// Resume the paused download.
    Resume,

    /// Cancel the running download and delete its partial file.
    Cancel,

    /// Compute SHA-256 of a file, optionally comparing it to an expected digest.
    Checksum {
        /// Path to the file.
        path: PathBuf,
        /// Expected digest (hex, any case).
        #[arg(long, value_name = "SHA256")]
        expected: Option<String>,
    },

    /// Add or replace an edition in the catalog file.
    CatalogAdd {
        /// Distribution name (created if missing).
        #[arg(long)]
        distribution: String,
        /// Description; required when the distribution is new.
        #[arg(long)]
        description: Option<String>,
        /// Edition name.
        #[arg(long)]
        edition: String,
        /// File name the image is saved under.
        #[arg(long)]
        filename: String,
        /// Direct http(s) download URL.
        #[arg(long)]
        url: String,
        /// SHA-256 of the image (64 hex characters).
        #[arg(long)]
        checksum: String,
    },
}

impl CliCommand {
    /// Parse arguments, run the command and return the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let catalog_path = cli.catalog.clone().unwrap_or_else(|| cfg.catalog_path());

        let code = match cli.command {
            CliCommand::List => {
                run_list(&load_catalog(&catalog_path)?);
                0
            }
            CliCommand::Editions { distribution } => {
                run_editions(&load_catalog(&catalog_path)?, &distribution)?;
                0
            }
            CliCommand::Validate => run_validate(&catalog_path)?,
            CliCommand::Download {
                distribution,
                edition,
                dir,
            } => {
                let catalog = load_catalog(&catalog_path)?;
                run_download(&cfg, &catalog, &distribution, &edition, dir.as_deref()).await?
            }
            CliCommand::Pause => {
                run_pause().await?;
                0
            }
            CliCommand::Resume => {
                run_resume().await?;
                0
            }
            CliCommand::Cancel => {
                run_cancel().await?;
                0
            }
            CliCommand::Checksum { path, expected } => {
                run_checksum(&path, expected.as_deref())?
            }
            CliCommand::CatalogAdd {
                distribution,
                description,
                edition,
                filename,
                url,
                checksum,
            } => {
                let new = NewEdition {
                    distribution,
                    description,
                    edition,
                    filename,
                    url,
                    checksum,
                };
                run_catalog_add(&catalog_path, new)?;
                0
            }
        };

        Ok(code)
    }
}

/// Load the catalog, printing entry-level problems; only an unusable file is an error.
fn load_catalog(path: &Path) -> Result<Catalog> {
    let load = Catalog::load(path)?;
    for issue in &load.issues {
        eprintln!("{}", issue);
    }
    Ok(load.catalog)
}

#[cfg(test)]
mod tests;
