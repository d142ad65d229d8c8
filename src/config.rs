//! Startup configuration from the environment

use crate::content::Endpoints;
use crate::state_machine::QuizMode;
use chrono::TimeDelta;
use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
/// Upper bound for every duration setting (one year)
const MAX_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELEGRAM_TOKEN is not set")]
    MissingToken,
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything the bot needs to start
#[derive(Debug)]
pub struct BotConfig {
    pub token: SecretString,
    pub quiz_mode: QuizMode,
    pub fetch_timeout: Duration,
    pub session_idle: TimeDelta,
    pub sweep_interval: Duration,
    pub endpoints: Endpoints,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELEGRAM_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let quiz_mode = match lookup("LAIN_QUIZ_MODE") {
            Some(raw) => raw.parse::<QuizMode>().map_err(|reason| ConfigError::Invalid {
                name: "LAIN_QUIZ_MODE",
                reason,
            })?,
            None => QuizMode::default(),
        };

        let fetch_timeout = Duration::from_secs(seconds(
            &lookup,
            "LAIN_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);
        let sweep_interval = Duration::from_secs(seconds(
            &lookup,
            "LAIN_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?);

        let idle_secs = seconds(&lookup, "LAIN_SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)?;
        let session_idle = i64::try_from(idle_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| ConfigError::Invalid {
                name: "LAIN_SESSION_IDLE_SECS",
                reason: format!("{idle_secs} is out of range"),
            })?;

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            anime: lookup("LAIN_ANIME_URL").unwrap_or(defaults.anime),
            quote: lookup("LAIN_QUOTE_URL").unwrap_or(defaults.quote),
            numbers: lookup("LAIN_NUMBERS_URL").unwrap_or(defaults.numbers),
            philosophy: lookup("LAIN_PHILOSOPHY_URL").unwrap_or(defaults.philosophy),
        };

        Ok(Self {
            token: SecretString::from(token),
            quiz_mode,
            fetch_timeout,
            session_idle,
            sweep_interval,
            endpoints,
        })
    }
}

/// Positive number of seconds up to `MAX_SECS`, or `default` when unset
fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) if secs > MAX_SECS => Err(ConfigError::Invalid {
            name,
            reason: format!("{secs} exceeds the maximum of {MAX_SECS}"),
        }),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: format!("'{raw}' is not a number of seconds: {e}"),
        }),
    }
}
