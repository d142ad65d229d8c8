//! Lain - a Wired-themed Telegram companion
//!
//! Each user walks through a small scripted conversation: a greeting, an
//! optional quiz, and a handful of content commands backed by public APIs.

mod config;
mod content;
mod runtime;
mod session;
mod state_machine;
mod telegram;

use config::BotConfig;
use content::{ContentProvider, HttpContentProvider, LoggingProvider};
use runtime::{ReplySink, RuntimeSettings, SessionManager};
use secrecy::ExposeSecret;
use session::{InMemorySessionStore, SessionStore};
use std::sync::Arc;
use teloxide::Bot;
use telegram::TelegramSink;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lain_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration; a missing token stops the process here
    let config = BotConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    tracing::info!(
        quiz_mode = ?config.quiz_mode,
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        session_idle_secs = config.session_idle.num_seconds(),
        "Configuration loaded"
    );

    // Content providers
    let http = HttpContentProvider::new(config.endpoints.clone(), config.fetch_timeout)?;
    let content: Arc<dyn ContentProvider> = Arc::new(LoggingProvider::new(Arc::new(http)));

    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let bot = Bot::new(config.token.expose_secret());
    let sink: Arc<dyn ReplySink> = Arc::new(TelegramSink::new(bot.clone()));

    let manager = Arc::new(SessionManager::new(
        store,
        content,
        sink,
        RuntimeSettings {
            quiz_mode: config.quiz_mode,
            fetch_timeout: config.fetch_timeout,
            idle_timeout: config.session_idle,
        },
    ));

    let shutdown = CancellationToken::new();
    let sweeper = manager.spawn_sweeper(config.sweep_interval, shutdown.clone());

    telegram::run_polling(bot, manager.clone()).await;

    shutdown.cancel();
    sweeper.await?;

    tracing::info!(
        active_sessions = manager.runtime_count().await,
        "Lain has left the Wired"
    );
    Ok(())
}
