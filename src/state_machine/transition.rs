//! Pure state transition function
//!
//! Global commands are matched before any state-specific input, so they work
//! from every state; issuing one mid-quiz abandons the quiz without ceremony.
//! Quiz retries never re-enter a handler: a wrong answer loops back into
//! `AwaitingAnswer` with a fresh payload, and a philosophical retry goes
//! through a fetch effect whose result arrives as a new event.

use super::effect::Effect;
use super::event::Event;
use super::input::{Command, InputClass, TextInput};
use super::script;
use super::state::{ConvContext, ConvState, Quiz, QuizKind, QuizMode, OPERAND_MAX};
use crate::content::{ContentRequest, FetchedContent, Quote};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{}", script::QUESTION_PENDING)]
    QuestionPending,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Text to show the user when this error ends their turn
    pub fn reply_text(&self) -> String {
        match self {
            TransitionError::QuestionPending => self.to_string(),
            TransitionError::InvalidTransition(_) => script::INTERNAL_ERROR.to_string(),
        }
    }
}

/// Pure transition function
///
/// Given the same state, event and RNG state, this always produces the same
/// result; it performs no I/O.
pub fn transition<R: Rng>(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
    rng: &mut R,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Global commands (checked first, reachable from every state)
        // ============================================================
        (_, Event::Command(command)) => Ok(global_command(state, command, rng)),

        // ============================================================
        // Welcome: accept or decline the quiz
        // ============================================================
        (ConvState::Welcome, Event::Text(input)) => {
            if input.class == InputClass::Affirmative {
                Ok(start_quiz(context.quiz_mode, rng))
            } else {
                Ok(TransitionResult::new(ConvState::Cancelled)
                    .with_effect(Effect::EndSession)
                    .with_effect(Effect::reply(script::QUIZ_DECLINED)))
            }
        }

        // ============================================================
        // Answer checking
        // ============================================================
        (
            ConvState::AwaitingAnswer {
                quiz: Quiz::Arithmetic { x, y },
            },
            Event::Text(input),
        ) => {
            let expected = i64::from(*x) + i64::from(*y);
            if input.class == InputClass::Integer(expected) {
                Ok(solved(QuizKind::Arithmetic))
            } else {
                // Wrong number and non-numeric text both get a fresh pair
                Ok(arithmetic_quiz(script::ARITHMETIC_INCORRECT, rng))
            }
        }

        (
            ConvState::AwaitingAnswer {
                quiz: Quiz::Philosophical { correct_option, .. },
            },
            Event::Text(input),
        ) => {
            if is_correct_option(&input, correct_option) {
                Ok(solved(QuizKind::Philosophical))
            } else {
                Ok(
                    TransitionResult::new(ConvState::AwaitingPhilosophicalAnswer)
                        .with_effect(Effect::PersistSession)
                        .with_effect(Effect::reply(script::PHILOSOPHICAL_INCORRECT))
                        .with_effect(Effect::FetchPhilosophicalQuote),
                )
            }
        }

        // ============================================================
        // Philosophical question preparation
        // ============================================================
        (
            ConvState::AwaitingPhilosophicalAnswer,
            Event::PhilosophicalQuoteFetched { quote: Some(quote) },
        ) => Ok(philosophical_quiz(quote, rng)),

        // No quote available: fall back to arithmetic so the quiz kind is
        // never left undecided
        (ConvState::AwaitingPhilosophicalAnswer, Event::PhilosophicalQuoteFetched { quote: None }) => {
            Ok(arithmetic_quiz(script::PHILOSOPHICAL_UNAVAILABLE, rng))
        }

        (ConvState::AwaitingPhilosophicalAnswer, Event::Text(_)) => {
            Err(TransitionError::QuestionPending)
        }

        // ============================================================
        // Closing
        // ============================================================
        (ConvState::Correct, Event::Text(input)) => {
            let farewell = if input.class == InputClass::Affirmative {
                script::CLOSING_QUOTE
            } else {
                script::PLAIN_GOODBYE
            };
            Ok(TransitionResult::new(ConvState::Goodbye)
                .with_effect(Effect::EndSession)
                .with_effect(Effect::reply(farewell)))
        }

        (ConvState::Chatting, Event::Text(_)) => Ok(TransitionResult::new(ConvState::Chatting)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply(script::CHAT_REFLECTION))),

        // ============================================================
        // Content delivery
        // ============================================================
        (ConvState::AnimeRequested, Event::ContentFetched { content }) => match content {
            Some(FetchedContent::Anime { title }) => Ok(deliver(
                ConvState::AnimeRequested,
                script::anime_pitch(&title),
            )),
            None => Ok(deliver(ConvState::AnimeRequested, script::ANIME_UNAVAILABLE)),
            Some(other) => Err(mismatched_content(state, &other)),
        },

        (ConvState::QuoteRequested, Event::ContentFetched { content }) => match content {
            Some(FetchedContent::Quote(quote)) => Ok(deliver(
                ConvState::QuoteRequested,
                script::quote_line(&quote.text, &quote.author),
            )),
            None => Ok(deliver(ConvState::QuoteRequested, script::QUOTE_UNAVAILABLE)),
            Some(other) => Err(mismatched_content(state, &other)),
        },

        (ConvState::FactRequested, Event::ContentFetched { content }) => match content {
            Some(FetchedContent::NumberFact { text }) => {
                Ok(deliver(ConvState::FactRequested, text))
            }
            None => Ok(deliver(ConvState::FactRequested, script::FACT_UNAVAILABLE)),
            Some(other) => Err(mismatched_content(state, &other)),
        },

        // Terminal sessions are normally removed at the end of their turn
        (terminal, Event::Text(_)) if terminal.is_terminal() => {
            Ok(TransitionResult::new(terminal.clone())
                .with_effect(Effect::EndSession)
                .with_effect(Effect::reply(script::SESSION_OVER)))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn global_command<R: Rng>(state: &ConvState, command: Command, rng: &mut R) -> TransitionResult {
    match command {
        Command::Start => TransitionResult::new(ConvState::Welcome)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply_with_keyboard(
                script::GREETING,
                script::greeting_keyboard(),
            )),

        // Help is static text; the session is left exactly as it was
        Command::Help => {
            TransitionResult::new(state.clone()).with_effect(Effect::reply(script::HELP))
        }

        Command::Unknown(name) => TransitionResult::new(state.clone())
            .with_effect(Effect::reply(script::unknown_command(&name))),

        Command::Cancel => TransitionResult::new(ConvState::Cancelled)
            .with_effect(Effect::EndSession)
            .with_effect(Effect::reply(script::CANCELLED)),

        Command::Chat => TransitionResult::new(ConvState::Chatting)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply(script::CHAT_PROMPT)),

        Command::Anime => TransitionResult::new(ConvState::AnimeRequested)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::FetchContent(ContentRequest::Anime)),

        Command::Quote => TransitionResult::new(ConvState::QuoteRequested)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::FetchContent(ContentRequest::Quote)),

        Command::Fact => TransitionResult::new(ConvState::FactRequested)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::FetchContent(ContentRequest::NumberFact {
                number: rng.gen_range(1..=100),
            })),

        Command::Focus => TransitionResult::new(ConvState::Goodbye)
            .with_effect(Effect::EndSession)
            .with_effect(Effect::reply(script::FOCUS)),

        Command::Surprise => TransitionResult::new(ConvState::Goodbye)
            .with_effect(Effect::EndSession)
            .with_effect(Effect::reply(script::SURPRISE)),

        Command::PhilosophicalQuestion => {
            TransitionResult::new(ConvState::AwaitingPhilosophicalAnswer)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::FetchPhilosophicalQuote)
        }
    }
}

fn start_quiz<R: Rng>(mode: QuizMode, rng: &mut R) -> TransitionResult {
    let kind = match mode {
        QuizMode::Arithmetic => QuizKind::Arithmetic,
        QuizMode::Philosophical => QuizKind::Philosophical,
        QuizMode::Mixed => {
            if rng.gen_bool(0.5) {
                QuizKind::Arithmetic
            } else {
                QuizKind::Philosophical
            }
        }
    };

    match kind {
        QuizKind::Arithmetic => arithmetic_quiz(script::QUIZ_ACCEPTED, rng),
        QuizKind::Philosophical => TransitionResult::new(ConvState::AwaitingPhilosophicalAnswer)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply(script::QUIZ_ACCEPTED))
            .with_effect(Effect::FetchPhilosophicalQuote),
    }
}

/// Open an arithmetic quiz with a freshly drawn pair, after a lead-in line
fn arithmetic_quiz<R: Rng>(lead_in: &str, rng: &mut R) -> TransitionResult {
    let x = rng.gen_range(0..=OPERAND_MAX);
    let y = rng.gen_range(0..=OPERAND_MAX);

    TransitionResult::new(ConvState::AwaitingAnswer {
        quiz: Quiz::Arithmetic { x, y },
    })
    .with_effects([
        Effect::PersistSession,
        Effect::reply(lead_in),
        Effect::reply(script::arithmetic_question(x, y)),
    ])
}

/// Turn a fetched quote into a two-option question, correct answer in a
/// random slot
fn philosophical_quiz<R: Rng>(quote: Quote, rng: &mut R) -> TransitionResult {
    let candidates: Vec<&str> = script::DECOY_AUTHORS
        .iter()
        .copied()
        .filter(|decoy| !decoy.eq_ignore_ascii_case(quote.author.trim()))
        .collect();
    let decoy = candidates.choose(rng).copied().unwrap_or("Anonymous");

    let (options, correct_option) = if rng.gen_bool(0.5) {
        ([quote.author.as_str(), decoy], "1")
    } else {
        ([decoy, quote.author.as_str()], "2")
    };
    let question = script::philosophical_question(&quote.text, options);

    TransitionResult::new(ConvState::AwaitingAnswer {
        quiz: Quiz::Philosophical {
            quote: quote.text,
            correct_author: quote.author,
            correct_option: correct_option.to_string(),
        },
    })
    .with_effect(Effect::PersistSession)
    .with_effect(Effect::reply_with_keyboard(question, script::options_keyboard()))
}

fn is_correct_option(input: &TextInput, correct_option: &str) -> bool {
    input.trimmed() == correct_option
}

fn solved(kind: QuizKind) -> TransitionResult {
    let praise = match kind {
        QuizKind::Arithmetic => script::ARITHMETIC_CORRECT,
        QuizKind::Philosophical => script::PHILOSOPHICAL_CORRECT,
    };

    TransitionResult::new(ConvState::Correct).with_effects([
        Effect::PersistSession,
        Effect::reply(praise),
        Effect::reply_with_keyboard(script::QUOTE_OFFER, script::yes_no_keyboard()),
    ])
}

/// Reply with fetched content (or its apology) and close the session
fn deliver(state: ConvState, text: impl Into<String>) -> TransitionResult {
    TransitionResult::new(state)
        .with_effect(Effect::EndSession)
        .with_effect(Effect::reply(text))
}

fn mismatched_content(state: &ConvState, content: &FetchedContent) -> TransitionError {
    TransitionError::InvalidTransition(format!(
        "Content {content:?} does not answer the request pending in {state:?}"
    ))
}
