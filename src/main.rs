//! # docchat CLI
//!
//! Retrieval-augmented question answering over a single PDF document.
//!
//! ## Usage
//!
//! ```bash
//! docchat --config ./docchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat build` | Extract pages, chunk, embed, and write the index bundle |
//! | `docchat search "<query>"` | Print ranked evidence chunks for a query |
//! | `docchat ask "<question>"` | Answer one question grounded in the document |
//! | `docchat chat` | Interactive question-answering loop |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docchat::{build, config, progress::ProgressMode, qa, retrieve};

/// docchat — ask questions about a single PDF, grounded in its own text.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file holding the document path, chunking, embedding, retrieval, and
/// answer-model settings.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "Retrieval-augmented question answering over a single OCR'd PDF",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./docchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the index bundle from the configured PDF.
    ///
    /// Extracts page text (cached after the first run), chunks it, embeds
    /// every chunk, and writes the four-artifact bundle. Rebuilding replaces
    /// the previous bundle wholesale.
    Build {
        /// Ignore the page cache — re-extract the PDF from scratch.
        #[arg(long)]
        force: bool,

        /// Progress reporting on stderr: auto, off, human, or json.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Print ranked evidence chunks for a query, without the answer model.
    Search {
        /// The search query string.
        query: String,

        /// Number of results to return (defaults to retrieval.top_k).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a single question grounded in the document, then exit.
    Ask {
        /// The question to answer.
        question: String,

        /// Number of evidence chunks to retrieve (defaults to retrieval.top_k).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Interactive question-answering loop (exits on Ctrl-D).
    Chat,
}

fn parse_progress(mode: &str) -> anyhow::Result<ProgressMode> {
    match mode {
        "auto" => Ok(ProgressMode::default_for_tty()),
        "off" => Ok(ProgressMode::Off),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        other => anyhow::bail!(
            "Unknown progress mode: '{}'. Use auto, off, human, or json.",
            other
        ),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build { force, progress } => {
            let reporter = parse_progress(&progress)?.reporter();
            build::run_build(&cfg, force, reporter.as_ref())?;
        }
        Commands::Search { query, top_k } => {
            retrieve::run_search(&cfg, &query, top_k)?;
        }
        Commands::Ask { question, top_k } => {
            qa::run_ask(&cfg, &question, top_k)?;
        }
        Commands::Chat => {
            qa::run_chat(&cfg)?;
        }
    }

    Ok(())
}
