//! HTTP-backed content provider

use super::{ContentProvider, FetchError, Quote};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Base URLs of the public APIs content is fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub anime: String,
    pub quote: String,
    /// The number is appended as a trailing path segment
    pub numbers: String,
    pub philosophy: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            anime: "https://api.jikan.moe/v4/random/anime".to_string(),
            quote: "https://api.quotable.io/random".to_string(),
            numbers: "http://numbersapi.com".to_string(),
            philosophy: "https://zenquotes.io/api/random".to_string(),
        }
    }
}

/// Content provider talking to the public HTTP APIs
pub struct HttpContentProvider {
    client: Client,
    endpoints: Endpoints,
}

impl HttpContentProvider {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoints })
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::status(format!("HTTP {status} from {url}")));
        }

        Ok(body)
    }
}

#[async_trait]
impl ContentProvider for HttpContentProvider {
    async fn random_anime(&self) -> Result<String, FetchError> {
        let body = self.get_body(&self.endpoints.anime).await?;
        parse_anime(&body)
    }

    async fn random_quote(&self) -> Result<Quote, FetchError> {
        let body = self.get_body(&self.endpoints.quote).await?;
        parse_quote(&body)
    }

    async fn number_fact(&self, number: u32) -> Result<String, FetchError> {
        let url = format!("{}/{number}", self.endpoints.numbers.trim_end_matches('/'));
        let body = self.get_body(&url).await?;
        parse_number_fact(&body)
    }

    async fn philosophical_quote(&self) -> Result<Quote, FetchError> {
        let body = self.get_body(&self.endpoints.philosophy).await?;
        parse_philosophical(&body)
    }
}

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct AnimeEnvelope {
    data: AnimeData,
}

#[derive(Debug, Deserialize)]
struct AnimeData {
    title: String,
}

#[derive(Debug, Deserialize)]
struct QuotableQuote {
    content: String,
    author: String,
}

const ZENQUOTES_PLACEHOLDER_AUTHOR: &str = "zenquotes.io";

#[derive(Debug, Deserialize)]
struct ZenQuote {
    q: String,
    a: String,
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T, FetchError> {
    serde_json::from_str(body)
        .map_err(|e| FetchError::shape(format!("Unexpected {what} response: {e}")))
}

fn non_empty(value: String, field: &str) -> Result<String, FetchError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FetchError::shape(format!("Empty {field} in response")))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_anime(body: &str) -> Result<String, FetchError> {
    let envelope: AnimeEnvelope = decode(body, "anime")?;
    non_empty(envelope.data.title, "title")
}

fn parse_quote(body: &str) -> Result<Quote, FetchError> {
    let quote: QuotableQuote = decode(body, "quote")?;
    Ok(Quote {
        text: non_empty(quote.content, "content")?,
        author: non_empty(quote.author, "author")?,
    })
}

fn parse_number_fact(body: &str) -> Result<String, FetchError> {
    non_empty(body.to_string(), "fact")
}

fn parse_philosophical(body: &str) -> Result<Quote, FetchError> {
    let quotes: Vec<ZenQuote> = decode(body, "philosophical quote")?;
    let first = quotes
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::shape("No quotes in response"))?;

    let author = non_empty(first.a, "author")?;
    // Rate-limited callers get a 200 with a notice signed by the service
    if author.eq_ignore_ascii_case(ZENQUOTES_PLACEHOLDER_AUTHOR) {
        return Err(FetchError::shape("Placeholder quote from a rate-limited source"));
    }

    Ok(Quote {
        text: non_empty(first.q, "quote")?,
        author,
    })
}
