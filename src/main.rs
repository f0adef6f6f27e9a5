mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use notemind_core::config::{Config, resolve_config_path};

/// Chunk, index and retrieve personal notes for grounded LLM prompts.
#[derive(Debug, Parser)]
#[command(name = "notemind", version, about)]
struct Cli {
    /// Config file (falls back to `NOTEMIND_CONFIG`, then `config/default.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Split a note file and print its chunks as JSON lines.
    Chunk {
        file: PathBuf,
        #[arg(long)]
        max_chunk_size: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
        /// Do not prefer paragraph breaks.
        #[arg(long)]
        no_paragraphs: bool,
        /// Do not prefer sentence breaks.
        #[arg(long)]
        no_sentences: bool,
    },
    /// Render a JSON array of retrieved fragments as a prompt context block.
    Context {
        fragments: PathBuf,
        /// Drop fragments scoring at or below this value first.
        #[arg(long)]
        min_score: Option<f32>,
    },
    /// Index note files and print the stored chunk records as JSON lines.
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Index note files, then print the context retrieved for a question.
    Ask {
        question: String,
        #[arg(long = "notes", required = true, num_args = 1..)]
        notes: Vec<PathBuf>,
        #[arg(long, default_value = "local")]
        user: String,
        /// Earlier conversation messages, oldest first.
        #[arg(long = "history")]
        history: Vec<String>,
    },
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Chunk {
            file,
            max_chunk_size,
            overlap,
            no_paragraphs,
            no_sentences,
        } => {
            if let Some(n) = max_chunk_size {
                config.chunking.max_chunk_size = n;
            }
            if let Some(n) = overlap {
                config.chunking.overlap_size = n;
            }
            config.chunking.preserve_paragraphs &= !no_paragraphs;
            config.chunking.preserve_sentences &= !no_sentences;
            commands::chunk(&config, &file, &mut out).await
        }
        Command::Context {
            fragments,
            min_score,
        } => commands::context(&fragments, min_score, &mut out),
        Command::Ingest { files, user } => commands::ingest(&config, &files, &user, &mut out).await,
        Command::Ask {
            question,
            notes,
            user,
            mut history,
        } => {
            history.push(question);
            commands::ask(&config, &notes, &user, &history, &mut out).await
        }
    }
}
