mod api;
mod driver;

use std::time::Duration;

use chat::{ChatSession, Endpoints, History, SessionConfig};
use clap::{Parser, Subcommand};
use time::{OffsetDateTime, UtcOffset};
use tokio::io::AsyncBufReadExt;

use crate::driver::Driver;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing access token; pass --token or set WELLNESS_TOKEN")]
    MissingToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Api(#[from] frames::ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

#[derive(Parser, Debug)]
#[command(name = "wellness-chat", about = "Terminal client for the wellness chat service")]
struct Cli {
    #[arg(long, env = "WELLNESS_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "WELLNESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the day-grouped chat history and wellness stats.
    History,
    /// Interactive chat; `/quit` or end of input leaves.
    Chat,
    /// Send one message and print the reply.
    Send {
        text: String,
        #[arg(long, default_value_t = 15)]
        wait_secs: u64,
    },
}

// Single-threaded so the local offset can be read and session callbacks stay serialized.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let token = cli.token.filter(|t| !t.trim().is_empty()).ok_or(CliError::MissingToken)?;
    let endpoints = Endpoints::new(cli.base_url);

    match cli.command {
        Command::History => run_history(&endpoints, &token, offset).await,
        Command::Chat => run_chat(&endpoints, &token, offset).await,
        Command::Send { text, wait_secs } => run_send(&endpoints, &token, offset, &text, wait_secs).await,
    }
}

async fn load_history(endpoints: &Endpoints, token: &str, offset: UtcOffset) -> Result<History, CliError> {
    let http = reqwest::Client::new();
    let chats = api::fetch_history(&http, endpoints, token).await?;
    Ok(History::from_user_chats(chats, offset, OffsetDateTime::now_utc()))
}

async fn run_history(endpoints: &Endpoints, token: &str, offset: UtcOffset) -> Result<(), CliError> {
    let history = load_history(endpoints, token, offset).await?;
    let mut session = ChatSession::new(SessionConfig::default(), driver::seed());
    session.load_history(history);

    if let Some(user) = session.user() {
        println!("{}", user.greeting());
    }
    println!("{}", driver::stats_line(session.stats()));

    let today = OffsetDateTime::now_utc().to_offset(offset).date();
    for group in session.grouped(today, offset) {
        println!();
        println!("-- {} --", group.label());
        for message in &group.messages {
            println!("{}", driver::format_line(message, offset));
        }
    }
    Ok(())
}

/// Start a session: history (best effort), then connect.
async fn start_driver(endpoints: &Endpoints, token: &str, offset: UtcOffset) -> Driver {
    let mut session = ChatSession::new(SessionConfig::default(), driver::seed());
    match load_history(endpoints, token, offset).await {
        Ok(history) => session.load_history(history),
        Err(CliError::Api(e)) if e.is_unauthorized() => {
            tracing::warn!("access token rejected by history endpoint");
            session.token_missing();
        }
        Err(e) => {
            tracing::warn!(error = %e, "chat history fetch failed");
            session.history_failed();
        }
    }
    Driver::new(session, endpoints.socket_url(token), offset)
}

async fn run_chat(endpoints: &Endpoints, token: &str, offset: UtcOffset) -> Result<(), CliError> {
    let mut driver = start_driver(endpoints, token, offset).await;
    driver.connect().await;
    println!("{}", driver.status_line());

    let input = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    driver.run_interactive(input).await?;
    Ok(())
}

async fn run_send(
    endpoints: &Endpoints,
    token: &str,
    offset: UtcOffset,
    text: &str,
    wait_secs: u64,
) -> Result<(), CliError> {
    let mut driver = start_driver(endpoints, token, offset).await;
    driver.skip_printed();
    driver.connect().await;

    let limit = Duration::from_secs(wait_secs);
    let reply = driver.send_and_wait(text, limit).await;
    driver.print_new();
    driver.shutdown().await;

    if reply.is_none() {
        return Err(CliError::Timeout(limit));
    }
    Ok(())
}
