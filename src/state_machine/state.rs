//! Conversation state types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest value either arithmetic operand can take (inclusive)
pub const OPERAND_MAX: u32 = 1000;

/// Stable opaque identifier of the user a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Quiz
// ============================================================================

/// Which reference-answer rule applies to a quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    Arithmetic,
    Philosophical,
}

/// A quiz waiting for an answer, together with its reference answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Quiz {
    /// Solve `x + y`
    Arithmetic { x: u32, y: u32 },
    /// Pick the numbered option naming the quote's author
    Philosophical {
        quote: String,
        correct_author: String,
        /// Option label the user must send back, e.g. `"1"`
        correct_option: String,
    },
}

impl Quiz {
    pub fn kind(&self) -> QuizKind {
        match self {
            Quiz::Arithmetic { .. } => QuizKind::Arithmetic,
            Quiz::Philosophical { .. } => QuizKind::Philosophical,
        }
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Node of the conversation state machine.
///
/// The quiz payload lives inside `AwaitingAnswer`, so operands and reference
/// answers exist exactly while a quiz of the matching kind is open. Accepting
/// or declining the quiz happens in `Welcome`; there is no separate
/// quiz-choice node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Greeted, waiting for yes/no on the quiz offer
    #[default]
    Welcome,

    /// A quiz has been asked and the user owes an answer
    AwaitingAnswer { quiz: Quiz },

    /// A philosophical question was requested; the question and its answer
    /// arrive with the fetched quote
    AwaitingPhilosophicalAnswer,

    /// Quiz solved, waiting for yes/no on the closing quote
    Correct,

    /// User declined or cancelled (terminal)
    Cancelled,

    /// Conversation ended normally (terminal)
    Goodbye,

    /// Free-form chat mode
    Chatting,

    /// Anime recommendation requested (terminal)
    AnimeRequested,

    /// Random quote requested (terminal)
    QuoteRequested,

    /// Number trivia requested (terminal)
    FactRequested,
}

impl ConvState {
    /// Terminal states expect no further input without a new `/start`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConvState::Cancelled
                | ConvState::Goodbye
                | ConvState::AnimeRequested
                | ConvState::QuoteRequested
                | ConvState::FactRequested
        )
    }

    /// The open quiz, if any
    pub fn quiz(&self) -> Option<&Quiz> {
        match self {
            ConvState::AwaitingAnswer { quiz } => Some(quiz),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Welcome => "welcome",
            ConvState::AwaitingAnswer { .. } => "awaiting_answer",
            ConvState::AwaitingPhilosophicalAnswer => "awaiting_philosophical_answer",
            ConvState::Correct => "correct",
            ConvState::Cancelled => "cancelled",
            ConvState::Goodbye => "goodbye",
            ConvState::Chatting => "chatting",
            ConvState::AnimeRequested => "anime_requested",
            ConvState::QuoteRequested => "quote_requested",
            ConvState::FactRequested => "fact_requested",
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// How the quiz kind is chosen when a user accepts the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizMode {
    #[default]
    Arithmetic,
    Philosophical,
    /// Coin flip between the two kinds on every accepted quiz
    Mixed,
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arithmetic" => Ok(QuizMode::Arithmetic),
            "philosophical" => Ok(QuizMode::Philosophical),
            "mixed" => Ok(QuizMode::Mixed),
            other => Err(format!(
                "unknown quiz mode '{other}' (expected arithmetic, philosophical or mixed)"
            )),
        }
    }
}

/// Context for one user's conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub user_id: UserId,
    pub quiz_mode: QuizMode,
}

impl ConvContext {
    pub fn new(user_id: UserId, quiz_mode: QuizMode) -> Self {
        Self { user_id, quiz_mode }
    }
}
