//! Effects produced by state transitions

use crate::content::ContentRequest;

/// Quick-reply keyboard attached to a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
    /// Hide the keyboard once the user taps a button
    pub one_time: bool,
}

impl Keyboard {
    pub fn one_time(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|label| (*label).to_string()).collect())
                .collect(),
            one_time: true,
        }
    }
}

/// Outgoing message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a message to the user
    Reply(Reply),

    /// Fetch content for a content command; the result comes back as
    /// `Event::ContentFetched`
    FetchContent(ContentRequest),

    /// Fetch a quote for the philosophical quiz; the result comes back as
    /// `Event::PhilosophicalQuoteFetched`
    FetchPhilosophicalQuote,

    /// Write the session back to the store
    PersistSession,

    /// Remove the session from the store
    EndSession,
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply(Reply::text(text))
    }

    pub fn reply_with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Effect::Reply(Reply::text(text).with_keyboard(keyboard))
    }
}
