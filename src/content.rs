//! Content provider abstraction
//!
//! One interface over the external sources of anime titles, quotes and
//! number trivia. Providers only report success or failure; turning a
//! failure into an apology is the state machine's job.

mod error;
mod http;

pub use error::{FetchError, FetchErrorKind};
pub use http::{Endpoints, HttpContentProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A quote with attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

/// Content asked for by a content command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRequest {
    Anime,
    Quote,
    NumberFact { number: u32 },
}

impl ContentRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ContentRequest::Anime => "anime",
            ContentRequest::Quote => "quote",
            ContentRequest::NumberFact { .. } => "number_fact",
        }
    }
}

/// Successfully fetched content, one variant per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedContent {
    Anime { title: String },
    Quote(Quote),
    NumberFact { text: String },
}

/// Common interface for content sources
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Title of a random anime
    async fn random_anime(&self) -> Result<String, FetchError>;

    /// A random quote with its author
    async fn random_quote(&self) -> Result<Quote, FetchError>;

    /// A trivia sentence about `number`
    async fn number_fact(&self, number: u32) -> Result<String, FetchError>;

    /// A quote suitable for the "who said this?" question
    async fn philosophical_quote(&self) -> Result<Quote, FetchError>;

    /// Fetch whatever `request` asks for
    async fn fetch(&self, request: &ContentRequest) -> Result<FetchedContent, FetchError> {
        match request {
            ContentRequest::Anime => self
                .random_anime()
                .await
                .map(|title| FetchedContent::Anime { title }),
            ContentRequest::Quote => self.random_quote().await.map(FetchedContent::Quote),
            ContentRequest::NumberFact { number } => self
                .number_fact(*number)
                .await
                .map(|text| FetchedContent::NumberFact { text }),
        }
    }
}

#[async_trait]
impl<T: ContentProvider + ?Sized> ContentProvider for Arc<T> {
    async fn random_anime(&self) -> Result<String, FetchError> {
        (**self).random_anime().await
    }

    async fn random_quote(&self) -> Result<Quote, FetchError> {
        (**self).random_quote().await
    }

    async fn number_fact(&self, number: u32) -> Result<String, FetchError> {
        (**self).number_fact(number).await
    }

    async fn philosophical_quote(&self) -> Result<Quote, FetchError> {
        (**self).philosophical_quote().await
    }
}

/// Logging wrapper for content providers
pub struct LoggingProvider {
    inner: Arc<dyn ContentProvider>,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn ContentProvider>) -> Self {
        Self { inner }
    }

    fn log<T>(source: &str, started: std::time::Instant, result: &Result<T, FetchError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    source,
                    duration_ms = %duration.as_millis(),
                    "Content fetch completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    source,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Content fetch failed"
                );
            }
        }
    }
}

#[async_trait]
impl ContentProvider for LoggingProvider {
    async fn random_anime(&self) -> Result<String, FetchError> {
        let start = std::time::Instant::now();
        let result = self.inner.random_anime().await;
        Self::log("anime", start, &result);
        result
    }

    async fn random_quote(&self) -> Result<Quote, FetchError> {
        let start = std::time::Instant::now();
        let result = self.inner.random_quote().await;
        Self::log("quote", start, &result);
        result
    }

    async fn number_fact(&self, number: u32) -> Result<String, FetchError> {
        let start = std::time::Instant::now();
        let result = self.inner.number_fact(number).await;
        Self::log("number_fact", start, &result);
        result
    }

    async fn philosophical_quote(&self) -> Result<Quote, FetchError> {
        let start = std::time::Instant::now();
        let result = self.inner.philosophical_quote().await;
        Self::log("philosophical_quote", start, &result);
        result
    }
}
