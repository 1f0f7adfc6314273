//! Interactive REPL.
//!
//! Reads questions line by line, answers them against the loaded
//! documents, and keeps the conversation history in memory — persisting it
//! after every exchange when a session name is active. Lines starting with
//! `!` are commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `!clear` | Reset the in-memory conversation history |
//! | `!history` | Print the current conversation |
//! | `!files` | Print the loaded-document registry |
//! | `!doc <path>` | Load another document (or directory) |
//! | `!model <name>` | Switch the chat model and rebind the client |
//!
//! `exit`, `quit`, or `종료` (or EOF) ends the loop.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use crate::chat::GroqChat;
use crate::config::Config;
use crate::engine::QueryEngine;
use crate::models::{Role, Turn};
use crate::paths::StoragePaths;
use crate::reader;
use crate::session::SessionStore;

pub async fn run_repl(
    engine: &mut QueryEngine,
    config: &mut Config,
    paths: &StoragePaths,
    sessions: &SessionStore,
    session_name: Option<&str>,
) -> Result<()> {
    let mut history: Vec<Turn> = match session_name {
        Some(name) if sessions.exists(name) => {
            let turns = sessions.load(name)?;
            println!("Session '{}' loaded ({} messages).", name, turns.len());
            turns
        }
        _ => Vec::new(),
    };

    let interactive = atty::is(atty::Stream::Stdin);
    if interactive {
        println!("docqa REPL — ask about the loaded documents.");
        println!("Commands: !clear !history !files !doc <path> !model <name>. Exit: exit/quit/종료.");
        println!();
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit") || line == "종료" {
            break;
        }
        if let Some(command) = line.strip_prefix('!') {
            if let Err(e) = handle_command(command, engine, config, paths, &mut history).await {
                eprintln!("Error: {:#}", e);
            }
            continue;
        }

        match engine.answer(line, &history).await {
            Ok(response) => {
                println!("\n{}\n", response);

                history.push(Turn::user(line));
                history.push(Turn::assistant(response));

                if let Some(name) = session_name {
                    // Keep the in-memory history even when the save fails.
                    if let Err(e) = sessions.save(name, &history) {
                        eprintln!("Warning: could not save session '{}': {:#}", name, e);
                    }
                }
            }
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    if interactive {
        println!("Bye.");
    }
    Ok(())
}

async fn handle_command(
    command: &str,
    engine: &mut QueryEngine,
    config: &mut Config,
    paths: &StoragePaths,
    history: &mut Vec<Turn>,
) -> Result<()> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match (name, arg) {
        ("clear", _) => {
            history.clear();
            println!("Conversation history cleared.");
        }
        ("history", _) => {
            if history.is_empty() {
                println!("No conversation history.");
            } else {
                for turn in history.iter() {
                    let speaker = match turn.role {
                        Role::User => "User",
                        Role::Assistant => "AI",
                    };
                    println!("{}: {}\n", speaker, turn.content);
                }
            }
        }
        ("files", _) => {
            if engine.loaded_files().is_empty() {
                println!("No documents loaded.");
            } else {
                for file in engine.loaded_files() {
                    println!("  {}", file);
                }
                println!("  {} chunks indexed", engine.chunk_count());
            }
        }
        ("doc", Some(path)) => {
            let inputs = reader::expand_inputs(&[PathBuf::from(path)])?;
            let report = engine.load_documents(&inputs).await;
            report.print_summary();
        }
        ("model", Some(model)) => {
            config.set("model", model)?;
            config.save(&paths.config_file())?;
            engine.rebind_chat(Box::new(GroqChat::new(config)?));
            println!("Model switched to {}.", model);
        }
        _ => {
            println!("Unknown command: !{}", command);
            println!("Available: !clear, !history, !files, !doc <path>, !model <name>");
        }
    }

    Ok(())
}
