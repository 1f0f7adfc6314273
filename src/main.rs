//! # docqa CLI (`dqa`)
//!
//! The `dqa` binary answers questions about local documents using
//! retrieval-augmented generation: documents are chunked and embedded into
//! an in-memory vector index, the most relevant passages are retrieved per
//! question, and a chat model generates the grounded answer.
//!
//! ## Usage
//!
//! ```bash
//! dqa <command> [--data-dir <path>]
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dqa ask "<question>" --doc <path>` | One-shot question against documents |
//! | `dqa repl --doc <path>` | Interactive question loop |
//! | `dqa sessions list` | List saved conversation sessions |
//! | `dqa sessions show <name>` | Print a saved conversation |
//! | `dqa config show` | Print the active configuration |
//! | `dqa config set <key> <value>` | Change and persist a setting |
//!
//! ## Examples
//!
//! ```bash
//! # Ask one question about a PDF
//! dqa ask "계약 기간이 어떻게 되나요?" --doc contract.pdf
//!
//! # Load every supported file under docs/ and keep the conversation
//! dqa repl --doc docs/ --session onboarding
//!
//! # Continue a saved conversation with a second document
//! dqa ask "What changed in v2?" --doc handbook-v2.pdf --session onboarding
//!
//! # Switch models
//! dqa config set model mixtral-8x7b-32768
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use docqa::cache::VectorCache;
use docqa::chat::GroqChat;
use docqa::config::Config;
use docqa::embedding::HttpEmbedder;
use docqa::engine::QueryEngine;
use docqa::models::{Role, Turn};
use docqa::paths::StoragePaths;
use docqa::reader;
use docqa::repl;
use docqa::session::SessionStore;

/// docqa — retrieval-augmented document Q&A for the terminal.
///
/// All durable state (configuration, sessions, vector cache) lives under
/// one storage root, `~/.docqa` by default.
#[derive(Parser)]
#[command(
    name = "dqa",
    about = "docqa — ask questions about your documents from the terminal",
    version,
    long_about = "docqa ingests PDF, DOCX, and plain-text documents, indexes them with \
    embeddings, and answers questions grounded in the retrieved passages. Conversations \
    can be kept as named sessions and continued across runs."
)]
struct Cli {
    /// Storage root for config, sessions, and the vector cache.
    ///
    /// Defaults to `~/.docqa`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the answer.
    ///
    /// Loads the given documents (directories are scanned for supported
    /// files), retrieves the passages most relevant to the question, and
    /// prints the model's grounded answer. With `--session`, the exchange
    /// is appended to the named conversation.
    Ask {
        /// The question to answer.
        question: String,

        /// Document file or directory to load. Repeatable.
        #[arg(long = "doc", short = 'd')]
        docs: Vec<PathBuf>,

        /// Named conversation to continue and persist.
        #[arg(long, short = 's')]
        session: Option<String>,

        /// Override and persist the chat model for this and future runs.
        #[arg(long, short = 'm')]
        model: Option<String>,

        /// Override and persist the sampling temperature (0–1).
        #[arg(long, short = 't')]
        temperature: Option<f32>,

        /// Skip the vector cache and re-embed every document.
        #[arg(long)]
        no_cache: bool,
    },

    /// Start an interactive question loop.
    ///
    /// Documents can be loaded up front with `--doc` or later with the
    /// `!doc` command. With `--session`, the conversation is persisted
    /// after every exchange.
    Repl {
        /// Document file or directory to load. Repeatable.
        #[arg(long = "doc", short = 'd')]
        docs: Vec<PathBuf>,

        /// Named conversation to load and keep persisting.
        #[arg(long, short = 's')]
        session: Option<String>,

        /// Override and persist the chat model.
        #[arg(long, short = 'm')]
        model: Option<String>,

        /// Override and persist the sampling temperature (0–1).
        #[arg(long, short = 't')]
        temperature: Option<f32>,

        /// Skip the vector cache and re-embed every document.
        #[arg(long)]
        no_cache: bool,
    },

    /// Inspect saved conversation sessions.
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },

    /// Inspect or change the configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Session management subcommands.
#[derive(Subcommand)]
enum SessionsAction {
    /// List saved sessions with their save time and message count.
    List,
    /// Print the full conversation saved under a name.
    Show {
        /// Session name.
        name: String,
    },
}

/// Configuration subcommands.
#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active configuration as JSON.
    Show,
    /// Set one configuration value and persist it.
    ///
    /// Keys: api_key, model, temperature, chunk_size, chunk_overlap,
    /// top_k, embedding.base_url, embedding.model.
    Set {
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = StoragePaths::resolve(cli.data_dir.clone())?;
    paths.ensure()?;
    let mut config = Config::load_or_init(&paths.config_file())?;

    match cli.command {
        Commands::Ask {
            question,
            docs,
            session,
            model,
            temperature,
            no_cache,
        } => {
            apply_overrides(&mut config, &paths, model, temperature)?;
            run_ask(&config, &paths, &question, &docs, session.as_deref(), no_cache).await?;
        }
        Commands::Repl {
            docs,
            session,
            model,
            temperature,
            no_cache,
        } => {
            apply_overrides(&mut config, &paths, model, temperature)?;
            let mut engine = build_engine(&config, &paths, no_cache)?;

            let inputs = reader::expand_inputs(&docs)?;
            if !inputs.is_empty() {
                let report = engine.load_documents(&inputs).await;
                report.print_summary();
                println!();
            }

            let sessions = SessionStore::new(paths.sessions_dir());
            repl::run_repl(&mut engine, &mut config, &paths, &sessions, session.as_deref())
                .await?;
        }
        Commands::Sessions { action } => match action {
            SessionsAction::List => {
                run_sessions_list(&paths)?;
            }
            SessionsAction::Show { name } => {
                run_sessions_show(&paths, &name)?;
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Set { key, value } => {
                config.set(&key, &value)?;
                config.save(&paths.config_file())?;
                println!("{} = {}", key, value);
            }
        },
    }

    Ok(())
}

/// Persist `--model` / `--temperature` overrides before any service
/// binding is constructed.
fn apply_overrides(
    config: &mut Config,
    paths: &StoragePaths,
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<()> {
    let mut changed = false;
    if let Some(model) = model {
        config.set("model", &model)?;
        changed = true;
    }
    if let Some(temperature) = temperature {
        config.set("temperature", &temperature.to_string())?;
        changed = true;
    }
    if changed {
        config.save(&paths.config_file())?;
    }
    Ok(())
}

fn build_engine(config: &Config, paths: &StoragePaths, no_cache: bool) -> Result<QueryEngine> {
    let embedder = HttpEmbedder::new(&config.embedding)?;
    let chat = GroqChat::new(config)?;
    let cache = if no_cache {
        None
    } else {
        Some(VectorCache::new(paths.vectors_dir()))
    };

    Ok(QueryEngine::new(
        Box::new(embedder),
        Box::new(chat),
        config.chunk_params(),
        config.top_k,
        cache,
    ))
}

async fn run_ask(
    config: &Config,
    paths: &StoragePaths,
    question: &str,
    docs: &[PathBuf],
    session: Option<&str>,
    no_cache: bool,
) -> Result<()> {
    let mut engine = build_engine(config, paths, no_cache)?;

    let inputs = reader::expand_inputs(docs)?;
    if !inputs.is_empty() {
        let report = engine.load_documents(&inputs).await;
        report.print_summary();
        println!();
    }

    let sessions = SessionStore::new(paths.sessions_dir());
    let mut history = match session {
        Some(name) if sessions.exists(name) => sessions.load(name)?,
        _ => Vec::new(),
    };

    let response = engine.answer(question, &history).await?;
    println!("{}", response);

    if let Some(name) = session {
        history.push(Turn::user(question));
        history.push(Turn::assistant(response));
        sessions.save(name, &history)?;
    }

    Ok(())
}

fn run_sessions_list(paths: &StoragePaths) -> Result<()> {
    let sessions = SessionStore::new(paths.sessions_dir()).list()?;

    if sessions.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }

    println!("{:<24} {:<12} {:>8}", "NAME", "SAVED", "MESSAGES");
    for session in sessions {
        println!(
            "{:<24} {:<12} {:>8}",
            session.name,
            session.saved_at.format("%Y-%m-%d"),
            session.message_count
        );
    }
    Ok(())
}

fn run_sessions_show(paths: &StoragePaths, name: &str) -> Result<()> {
    let turns = SessionStore::new(paths.sessions_dir()).load(name)?;

    println!("Session: {}\n", name);
    for turn in turns {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Assistant => "AI",
        };
        println!("{}: {}\n", speaker, turn.content);
    }
    Ok(())
}
