//! CLI for the GRD replay downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use grd_core::config;
use std::path::PathBuf;

use commands::{run_config_path, run_download};

/// Top-level CLI for the GRD replay downloader.
#[derive(Debug, Parser)]
#[command(name = "grd")]
#[command(about = "GRD: GenTool replay downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download replays uploaded within the last N hours.
    Run {
        /// How many hours back from now (GMT) the window reaches. Must be positive.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..), value_name = "N")]
        hours: u64,

        /// Directory replays are written to (created if missing).
        #[arg(long, default_value = "replays", value_name = "DIR")]
        output_dir: PathBuf,
    },

    /// Print the resolved config file location.
    ConfigPath,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run { hours, output_dir } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_download(&cfg, hours, &output_dir).await?;
            }
            CliCommand::ConfigPath => run_config_path()?,
        }

        Ok(())
    }
}
