//! # docchat CLI
//!
//! Every invocation builds an in-memory document library from the `--file`
//! arguments, then searches it, answers questions over it, or reports on it.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat chunks <file>` | Show how a file is split into chunks |
//! | `docchat search "<query>" -f <file>...` | Ranked chunks for a query |
//! | `docchat ask "<question>" -f <file>...` | One grounded answer with sources |
//! | `docchat chat -f <file>...` | Interactive conversation over stdin |
//! | `docchat status -f <file>...` | Document, chunk and storage counts |
//! | `docchat serve [-f <file>...]` | HTTP API: upload, delete, search, conversations |
//!
//! ## Examples
//!
//! ```bash
//! docchat search "cats sleep" -f notes/animals.txt -f guide.docx
//! OPENAI_API_KEY=... docchat --config ./config/docchat.toml ask "When do cats sleep?" -f notes/animals.txt
//! docchat serve --bind 127.0.0.1:7331 -f notes/animals.txt
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use docchat::chat::{self, ChatContext};
use docchat::config::{self, Config};
use docchat::conversation::ConversationStore;
use docchat::extract::{self, ExtractError};
use docchat::generate;
use docchat::ingest;
use docchat::server;
use docchat::status;
use docchat_core::chunk::chunk_text;
use docchat_core::store::memory::InMemoryStore;
use docchat_core::DocumentLibrary;

const DEFAULT_CONFIG_PATH: &str = "./config/docchat.toml";

/// docchat: ask questions about your documents.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "docchat: a document-grounded chat assistant",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docchat.toml`; built-in defaults are used if
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `DOCCHAT_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chunks a file is split into.
    Chunks {
        file: PathBuf,

        /// Declared MIME type; guessed from the extension if omitted.
        #[arg(long)]
        mime: Option<String>,

        /// Override `chunking.max_chunk_chars`.
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Rank chunks of the given files against a query.
    Search {
        query: String,

        /// Document to index (repeatable).
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Answer one question grounded in the given files.
    Ask {
        question: String,

        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Print the stored user and assistant messages as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Chat interactively; one question per line, `exit` to quit.
    Chat {
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,
    },

    /// Show what is indexed.
    Status {
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP API over a library that lives as long as the process.
    Serve {
        /// Documents to preload (repeatable).
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Override `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("DOCCHAT_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => config::load_config(p),
        None => config::load_or_default(Path::new(DEFAULT_CONFIG_PATH)),
    }
}

fn mime_for(path: &Path, declared: Option<&str>) -> Result<String> {
    if let Some(m) = declared {
        return Ok(m.to_string());
    }
    extract::mime_type_for_path(path)
        .map(str::to_string)
        .with_context(|| format!("Cannot tell the file type of {}; pass --mime", path.display()))
}

/// Ingest every file, skipping (and reporting) the ones that are rejected.
async fn build_library(files: &[PathBuf], cfg: &Config) -> Result<DocumentLibrary<InMemoryStore>> {
    let library = DocumentLibrary::open(InMemoryStore::new()).await?;

    for path in files {
        let outcome = match mime_for(path, None) {
            Ok(mime) => ingest::ingest_file(&library, path, &mime, cfg).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            warn!(file = %path.display(), "skipping file");
            eprintln!("Skipping {}: {:#}", path.display(), e);
        }
    }

    Ok(library)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Chunks {
            file,
            mime,
            max_chars,
        } => {
            let mime = mime_for(&file, mime.as_deref())?;
            let text = match extract::extract_file(&file, &mime) {
                Ok(text) => text,
                Err(e @ ExtractError::UnsupportedFormat(_)) => {
                    bail!("Rejected {}: {}", file.display(), e)
                }
                Err(e) => return Err(e).context(format!("Failed to process {}", file.display())),
            };
            let max = max_chars.unwrap_or(cfg.chunking.max_chunk_chars);
            if max == 0 {
                bail!("--max-chars must be > 0");
            }
            let chunks = chunk_text(&text, max);
            if chunks.is_empty() {
                println!("No chunks (document has no text).");
            }
            for (i, chunk) in chunks.iter().enumerate() {
                println!("--- chunk {} ({} chars) ---", i, chunk.chars().count());
                println!("{}", chunk);
            }
        }

        Commands::Search {
            query,
            files,
            limit,
        } => {
            let library = build_library(&files, &cfg).await?;
            let limit = limit.unwrap_or(cfg.retrieval.limit);
            let results = library.search(&query, limit);

            if results.is_empty() {
                println!("No results.");
            }
            for (i, r) in results.iter().enumerate() {
                println!(
                    "{}. [{:.4}] {} (chunk {})",
                    i + 1,
                    r.score,
                    r.document.name,
                    r.chunk_index
                );
                println!("   {}", r.chunk());
            }
        }

        Commands::Ask {
            question,
            files,
            json,
        } => {
            let library = build_library(&files, &cfg).await?;
            let generator = generate::create_generator(&cfg.generation)?;
            let conversations = ConversationStore::new();
            let conversation = conversations.create(&question);
            let ctx = ChatContext {
                library: &library,
                conversations: &conversations,
                generator: generator.as_ref(),
                config: &cfg,
            };

            let exchange = chat::send_message(&ctx, conversation.id, &question).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&exchange)?);
            } else {
                println!("{}", exchange.assistant_message.content);
                if !exchange.assistant_message.sources.is_empty() {
                    println!();
                    println!("Sources: {}", exchange.assistant_message.sources.join(", "));
                }
            }
        }

        Commands::Chat { files } => {
            let library = build_library(&files, &cfg).await?;
            let generator = generate::create_generator(&cfg.generation)?;
            let conversations = ConversationStore::new();
            let conversation = conversations.create("New conversation");
            let ctx = ChatContext {
                library: &library,
                conversations: &conversations,
                generator: generator.as_ref(),
                config: &cfg,
            };

            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            loop {
                print!("> ");
                std::io::stdout().flush()?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }

                match chat::send_message(&ctx, conversation.id, line).await {
                    Ok(exchange) => {
                        println!("{}", exchange.assistant_message.content);
                        if !exchange.assistant_message.sources.is_empty() {
                            println!("  (sources: {})", exchange.assistant_message.sources.join(", "));
                        }
                    }
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
        }

        Commands::Status { files, json } => {
            let library = build_library(&files, &cfg).await?;
            let conversations = ConversationStore::new();
            let report = status::collect_status(&library, &conversations, &cfg).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                status::print_status(&report);
            }
        }

        Commands::Serve { files, bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            let library = build_library(&files, &cfg).await?;
            server::run_server(&cfg, library).await?;
        }
    }

    Ok(())
}
