#![forbid(unsafe_code)]
//! docs command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docs::commands::{
    execute_annotations, execute_comments, execute_parse, AnnotationsOptions, CommentsOptions, ParseOptions,
};
use docs::registry::DEFAULT_FILETYPE;
use docs::Config;

#[derive(Parser)]
#[command(name = "docs")]
#[command(about = "Extract structured documentation from source comments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (JSON or YAML); defaults to .docs.config.{json,yml,yaml}
    #[arg(short, long, global = true, env = "DOCS_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse files and output their documentation as JSON
    Parse {
        /// Files to parse
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Blank lines that end a code span
        #[arg(long)]
        blank_lines: Option<usize>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// List registered annotations
    Annotations {
        /// Apply this filetype's overrides
        #[arg(long, default_value = DEFAULT_FILETYPE)]
        filetype: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the comment grammar used for a filetype
    Comments {
        /// Filetype (every configured language when omitted)
        #[arg(long)]
        filetype: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Parse {
            files,
            output,
            blank_lines,
            pretty,
        } => {
            let options = ParseOptions {
                files,
                output,
                blank_lines,
                pretty,
            };
            execute_parse(options, config)?;
        }

        Commands::Annotations { filetype, json } => {
            execute_annotations(AnnotationsOptions { filetype, json })?;
        }

        Commands::Comments { filetype } => {
            execute_comments(CommentsOptions { filetype }, config)?;
        }
    }

    Ok(())
}
