//! sheetkit CLI - render table specifications into XLSX artifacts.

mod generate;
mod logger;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::generate::{SpecGenerateOptions, generate_batch, inspect_request};

#[derive(Parser)]
#[command(name = "sheetkit")]
#[command(author, version, about = "Render table specifications into XLSX workbooks")]
struct Cli {
    /// Log engine diagnostics to stderr (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one XLSX artifact per request file
    Generate {
        /// Request bodies (`{"sheetsData": [...], "excelConfigs": {...}}`)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory receiving `generated-file-<uuid>.xlsx` artifacts
        #[arg(short, long, default_value = "temp")]
        out_dir: PathBuf,

        /// Public base URL used to build download links
        #[arg(short, long, default_value = "http://localhost:3000")]
        base_url: String,

        /// Maximum number of requests rendered concurrently
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Print the laid-out cell grid of a request without encoding it
    Inspect {
        /// Request body file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose).context("Failed to install logger")?;

    match cli.command {
        Commands::Generate {
            inputs,
            out_dir,
            base_url,
            jobs,
        } => {
            let options = SpecGenerateOptions {
                path_dir_out: out_dir,
                base_url,
                num_workers_max: jobs,
            };
            let n_failed = generate_batch(&inputs, &options)?;
            if n_failed > 0 {
                anyhow::bail!("{n_failed} of {} requests failed", inputs.len());
            }
            Ok(())
        }
        Commands::Inspect { input } => inspect_request(&input),
    }
}
