//! CLI for the exren download renamer.

mod commands;
mod socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use exren_core::config;
use std::path::PathBuf;

use commands::{run_cache, run_get, run_get_all, run_ingest, run_resolve, run_serve};

/// Top-level CLI for the exren download renamer.
#[derive(Debug, Parser)]
#[command(name = "exren")]
#[command(about = "exren: rename exam-archive downloads from scraped metadata", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the daemon: socket listener plus periodic cache sweep.
    Serve {
        /// Save downloads here (default: config `download_dir`, else the current directory).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Send scraped page metadata (JSON) to the daemon.
    Ingest {
        /// JSON file: {"pageUrl"?, "courseCode"?, "resources": {url: {courseCode?, examDate?}}}.
        file: PathBuf,

        /// Page the metadata was scraped from (overrides `pageUrl` in the file).
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,
    },

    /// Download one document, renamed when its metadata is known.
    Get {
        /// Document URL.
        url: String,

        #[arg(long, value_name = "CODE")]
        course_code: Option<String>,

        /// Exam date as YYYY-MM-DD.
        #[arg(long, value_name = "DATE")]
        exam_date: Option<String>,
    },

    /// Download every item of a batch file ({"items": [...]}).
    GetAll {
        file: PathBuf,
    },

    /// Print the filename a download of URL would be saved under.
    Resolve {
        url: String,

        /// Page the download was started from.
        #[arg(long, value_name = "URL")]
        referrer: Option<String>,

        /// Name the download would get otherwise (default: derived from the URL).
        #[arg(long, value_name = "NAME")]
        suggested: Option<String>,
    },

    /// List the persisted metadata cache.
    Cache,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve { download_dir } => run_serve(&cfg, download_dir).await?,
            CliCommand::Ingest { file, page_url } => {
                run_ingest(&cfg, &file, page_url.as_deref()).await?
            }
            CliCommand::Get {
                url,
                course_code,
                exam_date,
            } => run_get(&cfg, &url, course_code.as_deref(), exam_date.as_deref()).await?,
            CliCommand::GetAll { file } => run_get_all(&cfg, &file).await?,
            CliCommand::Resolve {
                url,
                referrer,
                suggested,
            } => run_resolve(&cfg, &url, referrer.as_deref(), suggested.as_deref()).await?,
            CliCommand::Cache => run_cache().await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
