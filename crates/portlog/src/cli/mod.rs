pub mod inspect;
pub mod process;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use portlog_core::PipelineConfig;

#[derive(Parser)]
#[command(
    name = "portlog",
    about = "Extract laytime events from Statement of Facts documents",
    version
)]
pub struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(long, global = true, env = "PORTLOG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a report with optional charter party and additional document
    Process {
        /// Statement of Facts (PDF, DOCX or TXT)
        sof: PathBuf,
        /// Charter party document
        #[arg(long)]
        cp: Option<PathBuf>,
        /// Any additional supporting document
        #[arg(long)]
        additional: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Also write combined output under this directory
        #[arg(long = "dump-dir")]
        dump_dir: Option<PathBuf>,
        /// Use keyword-classified lines instead of parsed events
        #[arg(long)]
        classify: bool,
        /// Leave the start of single-time lines unset
        #[arg(long = "no-chain")]
        no_chain: bool,
        /// Attach entity annotations to parsed events
        #[arg(long)]
        entities: bool,
    },
    /// Print the normalized lines of a document
    Lines {
        /// Document to read
        file: PathBuf,
    },
    /// Print the events parsed from a document as JSON
    Events {
        /// Document to read
        file: PathBuf,
    },
}

/// Configuration from `--config` (or defaults), then `PORTLOG_*` overrides.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}
