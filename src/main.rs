use anyhow::{Context, Result};
use chatdeck::api::{ChatBackend, HttpBackend};
use chatdeck::config::{Config, API_URL_ENV};
use chatdeck::format::conversation_line;
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatdeck")]
#[command(version)]
#[command(about = "Terminal chat client for streaming conversation backends", long_about = None)]
struct Cli {
    /// Base URL of the chat API
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all conversations
    List,
    /// Write a default config file
    Init,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Interactive mode owns the terminal, so logs go to a file.
fn init_file_logging(config: &Config) -> Result<()> {
    if let Some(parent) = config.log_file.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;

    // A second init only happens in tests; ignore it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

async fn list_conversations(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(config)?;
    let conversations = backend
        .list_conversations()
        .await
        .with_context(|| format!("Failed to load conversations from {}", config.api_base_url))?;

    if conversations.is_empty() {
        println!("📭 No conversations yet. Run 'chatdeck' to start chatting!");
        return Ok(());
    }

    let now = chrono::Utc::now();
    println!("📋 Your conversations:\n");
    for conversation in &conversations {
        println!("{}", conversation_line(conversation, now));
    }
    Ok(())
}

fn init_config(path: PathBuf) -> Result<()> {
    if path.exists() {
        println!("⚠️  Config already exists at {}", path.display());
        return Ok(());
    }
    Config::default().save(&path)?;
    println!("✨ Wrote default config to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?.with_api_url(cli.api_url);

    match cli.command {
        None => {
            init_file_logging(&config)?;
            tracing::info!(api = %config.api_base_url, "starting interactive client");
            let backend = HttpBackend::new(&config)?;
            chatdeck::app::run(backend, &config).await
        }
        Some(Commands::List) => {
            init_stderr_logging();
            list_conversations(&config).await
        }
        Some(Commands::Init) => {
            init_stderr_logging();
            init_config(cli.config.unwrap_or_else(Config::default_path))
        }
    }
}
