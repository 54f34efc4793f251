use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};

use scribe::config::Config;
use scribe::engine::OpenAIEngine;
use scribe::journal::{JournalSession, JournalWriter, Prompter};
use scribe::memory::{MemoryError, MemoryStore};
use scribe::secrets;
use scribe::session::{ConversationSession, TurnOutcome};

#[derive(Parser, Debug)]
#[command(name = "scribe", version, about = "Conversational assistant with persisted memory")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive conversation loop
    Chat {
        /// Start with an empty memory buffer, ignoring persisted history
        #[arg(long)]
        fresh: bool,
    },
    /// Run the guided journaling interview
    Journal,
    /// Inspect or clear the persisted conversation memory
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Print the persisted memory buffer
    Show,
    /// Delete the persisted memory file
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Verbosity is a CLI parameter, not process-wide mutable state;
    // RUST_LOG still wins when set.
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path = cli
        .config
        .unwrap_or_else(|| scribe::scribe_home().join("config.yaml"));
    let config = Config::load(&config_path)?;

    match cli.command {
        Command::Chat { fresh } => run_chat(&config, fresh).await,
        Command::Journal => run_journal(&config).await,
        Command::History { action } => match action {
            HistoryAction::Show => show_history(&config).await,
            HistoryAction::Clear { yes } => clear_history(&config, yes).await,
        },
    }
}

fn build_engine(config: &Config) -> anyhow::Result<OpenAIEngine> {
    let api_key = secrets::resolve_api_key(config.engine.api_key_file.as_deref())?;
    OpenAIEngine::from_config(&config.engine, api_key).context("construct reasoning engine")
}

// ── Chat ─────────────────────────────────────────────────────

async fn run_chat(config: &Config, fresh: bool) -> anyhow::Result<()> {
    let engine = Box::new(build_engine(config)?);
    let store = MemoryStore::new(&config.memory_file);

    let mut session = if fresh {
        ConversationSession::start_fresh(engine, store, &config.clear_token)
    } else {
        match ConversationSession::start(engine, store, &config.clear_token).await {
            Ok(session) => session,
            Err(MemoryError::Corrupt { line, .. }) => {
                anyhow::bail!(
                    "persisted memory at {} is corrupt (line {line}); \
                     fix or remove it, or restart with --fresh",
                    config.memory_file.display()
                );
            }
            Err(e) => return Err(e).context("load conversation memory"),
        }
    };

    println!(
        "Chatting with {} turns of memory. Empty input exits; {} clears.",
        session.buffer().len(),
        config.clear_token
    );

    loop {
        let input: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
            .context("read operator input")?;

        match session.handle_input(&input).await {
            Ok(TurnOutcome::Reply(reply)) => println!("Bot: {reply}"),
            Ok(TurnOutcome::EngineFailed(msg)) => println!("Bot: [error] {msg}"),
            Ok(TurnOutcome::Cleared) => println!("Bot: memory cleared."),
            Ok(TurnOutcome::ClearRefused(reply)) => {
                println!("Bot: I'd rather keep our memory — {reply}")
            }
            Ok(TurnOutcome::Terminated) => break,
            // Persistence failures end the turn, not the session.
            Err(e) => println!("Bot: [error] {e}"),
        }
    }

    Ok(())
}

// ── Journal ──────────────────────────────────────────────────

struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask(&mut self, question: &str) -> anyhow::Result<String> {
        println!("Question: {question}");
        let answer: String = Input::new()
            .with_prompt("Answer")
            .allow_empty(true)
            .interact_text()
            .context("read operator answer")?;
        Ok(answer)
    }
}

async fn run_journal(config: &Config) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let session = JournalSession::new(&engine, config.journal.clone());

    let mut prompter = ConsolePrompter;
    let (record, summary) = session.run(&mut prompter).await?;

    if record.is_empty() {
        println!("No questions were generated; nothing to journal.");
        return Ok(());
    }

    println!("\n{summary}\n");

    let writer = JournalWriter::new(&config.journal_file);
    writer.append(&record, &summary).await?;
    println!("Journal entry saved to {}.", config.journal_file.display());
    Ok(())
}

// ── History ──────────────────────────────────────────────────

async fn show_history(config: &Config) -> anyhow::Result<()> {
    let store = MemoryStore::new(&config.memory_file);
    match store.load_strict().await {
        Ok(buffer) => {
            for turn in &buffer {
                println!("{}", turn.key);
                println!("{}", turn.value);
            }
            println!("({} turns)", buffer.len());
            Ok(())
        }
        Err(MemoryError::NotFound(_)) => {
            println!("No chat history found.");
            Ok(())
        }
        Err(e) => Err(e).context("load conversation memory"),
    }
}

async fn clear_history(config: &Config, yes: bool) -> anyhow::Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete persisted memory at {}?",
                config.memory_file.display()
            ))
            .default(false)
            .interact()
            .context("read confirmation")?;
        if !confirmed {
            println!("Left untouched.");
            return Ok(());
        }
    }

    let store = MemoryStore::new(&config.memory_file);
    store.clear().await.context("clear conversation memory")?;
    println!("Chat history cleared.");
    Ok(())
}
