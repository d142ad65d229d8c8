//! Events that can occur in a conversation

use super::input::{Command, TextInput};
use crate::content::{FetchedContent, Quote};

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Command(Command),
    Text(TextInput),

    // Content events, produced by the runtime after executing a fetch effect.
    // `None` means the provider failed or timed out.
    ContentFetched { content: Option<FetchedContent> },
    PhilosophicalQuoteFetched { quote: Option<Quote> },
}

impl Event {
    /// Build the event for an inbound message
    pub fn from_inbound(text: &str, is_command: bool) -> Self {
        if is_command {
            Event::Command(Command::parse(text))
        } else {
            Event::Text(TextInput::new(text))
        }
    }

    /// Events that only ever read the session and must not create or touch it
    pub fn is_read_only(&self) -> bool {
        matches!(self, Event::Command(Command::Help | Command::Unknown(_)))
    }
}
