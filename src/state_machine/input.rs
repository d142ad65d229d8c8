//! Typed classification of inbound user messages
//!
//! Every message is classified once per turn; the transition table consumes
//! the classification instead of re-parsing the raw text in each branch.

/// Commands understood in every state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    Chat,
    Anime,
    Quote,
    Fact,
    /// `/allah`: flavor text about focus
    Focus,
    /// `/bo`: flavor text about surprises
    Surprise,
    /// Skip the greeting and go straight to a philosophical question
    PhilosophicalQuestion,
    Unknown(String),
}

impl Command {
    /// Parse a command message such as `/start` or `/quote@LainBot extra`.
    pub fn parse(text: &str) -> Self {
        let name = text
            .trim()
            .trim_start_matches('/')
            .split_whitespace()
            .next()
            .and_then(|word| word.split('@').next())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "cancel" => Command::Cancel,
            "chat" => Command::Chat,
            "anime" => Command::Anime,
            "quote" => Command::Quote,
            "fact" => Command::Fact,
            "allah" => Command::Focus,
            "bo" => Command::Surprise,
            "philosophical_question" => Command::PhilosophicalQuestion,
            _ => Command::Unknown(name),
        }
    }
}

/// What a free-text message looks like to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    /// `yes` / `y`, any case
    Affirmative,
    /// `no` / `n`, any case
    Negative,
    Integer(i64),
    Text,
}

/// A free-text message with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub raw: String,
    pub class: InputClass,
}

impl TextInput {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let class = classify(&raw);
        Self { raw, class }
    }

    /// The text with surrounding whitespace removed
    pub fn trimmed(&self) -> &str {
        self.raw.trim()
    }
}

/// Yes/no must match the whole message; only numbers tolerate padding
fn classify(raw: &str) -> InputClass {
    if raw.eq_ignore_ascii_case("yes") || raw.eq_ignore_ascii_case("y") {
        InputClass::Affirmative
    } else if raw.eq_ignore_ascii_case("no") || raw.eq_ignore_ascii_case("n") {
        InputClass::Negative
    } else if let Ok(n) = raw.trim().parse::<i64>() {
        InputClass::Integer(n)
    } else {
        InputClass::Text
    }
}
