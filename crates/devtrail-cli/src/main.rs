//! Devtrail CLI - replicate git commit history into analysis stores
//!
//! Provides:
//! - Extraction of recent commits from every repository under a root
//! - Import of the extracted set into PostgreSQL, Neo4j and Elasticsearch
//! - Cross-store consistency validation
//! - Commit pattern analysis of the extracted set

mod commands;
mod helpers;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use devtrail_core::{Settings, StatMode};
use devtrail_store::Backend;
use std::path::PathBuf;

use commands::{cmd_analyze, cmd_extract, cmd_import, cmd_run, cmd_validate};

#[derive(Parser)]
#[command(name = "devtrail")]
#[command(about = "Replicate git commit activity into relational, graph and search stores", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./devtrail.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by `extract` and `run`
#[derive(Args, Debug, Default)]
pub struct WindowArgs {
    /// Directory containing the repositories to scan
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Only commits from the last N days
    #[arg(short, long)]
    pub since_days: Option<u32>,

    /// Interchange file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl WindowArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(root) = &self.root {
            settings.extract.root = root.clone();
        }
        if let Some(days) = self.since_days {
            settings.extract.since_days = days;
        }
        if let Some(output) = &self.output {
            settings.extract.output = output.clone();
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Target {
    Postgres,
    Neo4j,
    Elasticsearch,
    All,
}

impl Target {
    pub fn backends(self) -> Vec<Backend> {
        match self {
            Target::Postgres => vec![Backend::Postgres],
            Target::Neo4j => vec![Backend::Neo4j],
            Target::Elasticsearch => vec![Backend::Elasticsearch],
            Target::All => Backend::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extracts recent commits into the interchange file
    Extract {
        #[command(flatten)]
        window: WindowArgs,

        /// Repository directory names to skip (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Number of threads for parallel extraction (default: number of CPU cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Line statistics mode: exact or glyph
        #[arg(long)]
        stat_mode: Option<StatMode>,
    },

    /// Imports the interchange file into one or all backends
    Import {
        #[arg(value_enum)]
        target: Target,

        /// Interchange file to read (default: extract.output)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Compares what the three backends hold
    Validate {
        /// Exit with an error when the backends disagree
        #[arg(long)]
        strict: bool,
    },

    /// Reports commit patterns found in the interchange file
    Analyze {
        /// Interchange file to read (default: extract.output)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Rows shown per table
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Extract, import into every backend, then validate
    Run {
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logger
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&cli.log_level)
    ).init();

    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { window, exclude, threads, stat_mode } => {
            window.apply(&mut settings);
            settings.extract.exclude.extend(exclude);
            if let Some(mode) = stat_mode {
                settings.extract.stat_mode = mode;
            }
            cmd_extract(&settings, threads)?;
        }
        Commands::Import { target, input } => {
            let input = input.unwrap_or_else(|| settings.extract.output.clone());
            cmd_import(&settings, target, &input).await?;
        }
        Commands::Validate { strict } => {
            cmd_validate(&settings, strict).await?;
        }
        Commands::Analyze { input, limit } => {
            let input = input.unwrap_or_else(|| settings.extract.output.clone());
            cmd_analyze(&input, limit)?;
        }
        Commands::Run { window } => {
            window.apply(&mut settings);
            cmd_run(&settings).await?;
        }
    }

    Ok(())
}
