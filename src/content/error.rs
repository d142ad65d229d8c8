//! Content fetch error types

use thiserror::Error;

/// Content fetch error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Status, message)
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Shape, message)
    }

    pub(crate) fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else {
            Self::network(format!("Request failed: {e}"))
        }
    }
}

/// Why a fetch failed; every kind degrades to the same apology for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The provider did not answer within the fetch deadline
    Timeout,
    /// Connection or transport failure
    Network,
    /// Non-success HTTP status
    Status,
    /// The response body lacked the expected fields
    Shape,
}

impl FetchErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Status => "status",
            Self::Shape => "shape",
        }
    }
}
