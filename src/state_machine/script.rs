//! Reply wording
//!
//! Everything Lain says lives here so the transition table only decides
//! *which* line to send.

use super::effect::Keyboard;

pub const GREETING: &str =
    "Hello, I'm Lain. Do you want to answer a question or chat? (Yes/No) Or use /help for guidance.";

pub fn greeting_keyboard() -> Keyboard {
    Keyboard::one_time(&[
        &["Yes", "No"],
        &["/chat", "/anime", "/fact", "/quote", "/allah", "/bo"],
    ])
}

pub fn yes_no_keyboard() -> Keyboard {
    Keyboard::one_time(&[&["Yes", "No"]])
}

pub fn options_keyboard() -> Keyboard {
    Keyboard::one_time(&[&["1", "2"]])
}

pub const HELP: &str = "Greetings from Lain! I can assist with a variety of tasks, from answering questions to chatting and providing interesting content. Here's a guide to what I can do:

/start - Initiate a conversation and get started with our interactions.
/help - Display this help message with all available commands.
/cancel - Terminate the current interaction and return to the main menu.
/chat - Engage in a casual conversation about various topics.
/anime - Receive anime recommendations or learn interesting facts.
/quote - Get an inspiring or motivational quote.
/fact - Discover a fascinating fact about a number.
/allah - Receive a thoughtful message related to the concept of focus.
/bo - Get a response related to surprises and connections.
/philosophical_question - Jump straight to a philosophical question.";

// ============================================================================
// Quiz
// ============================================================================

pub const QUIZ_ACCEPTED: &str =
    "Just like in the Wired, sometimes the simplest questions hold the deepest meanings.";

pub const QUIZ_DECLINED: &str =
    "If you change your mind, just remember... I'm always here, in the Wired.";

pub fn arithmetic_question(x: u32, y: u32) -> String {
    format!("Can you calculate {x} + {y}?")
}

pub const ARITHMETIC_CORRECT: &str = "That's correct! Good job.\n\nSometimes, we need to explore multiple perspectives to gain clarity.";

pub const ARITHMETIC_INCORRECT: &str = "That's incorrect. Please try again.";

pub fn philosophical_question(quote: &str, options: [&str; 2]) -> String {
    format!(
        "Here's a philosophical quote:\n\n\"{quote}\"\n\nWho said this?\n1. {}\n2. {}\nReply with '1' or '2'.",
        options[0], options[1]
    )
}

pub const PHILOSOPHICAL_CORRECT: &str = "That's correct! Well done.\n\nSometimes, our perceptions shape our understanding of reality.";

pub const PHILOSOPHICAL_INCORRECT: &str = "That's incorrect. Try again.";

pub const PHILOSOPHICAL_UNAVAILABLE: &str =
    "I couldn't fetch a philosophical quote at the moment. Let's try some numbers instead.";

/// Decoy authors for the philosophical question
pub const DECOY_AUTHORS: &[&str] = &[
    "Friedrich Nietzsche",
    "Simone de Beauvoir",
    "Marcus Aurelius",
    "Lao Tzu",
    "Albert Camus",
    "Hannah Arendt",
    "Soren Kierkegaard",
    "Confucius",
];

pub const QUESTION_PENDING: &str = "Hold on, a question is still on its way from the Wired.";

// ============================================================================
// Closing
// ============================================================================

pub const QUOTE_OFFER: &str =
    "Before you go, do you want to hear a quote from 'Serial Experiments Lain'? (Yes/No)";

pub const CLOSING_QUOTE: &str = "In the Wired, the physical and digital worlds are intertwined. 'No matter where you go, everyone is connected.'\n\nGoodbye, and remember... 'Close the world, open the next.'";

pub const PLAIN_GOODBYE: &str = "Goodbye. 'We are all connected in the Wired.'";

pub const CANCELLED: &str =
    "The conversation has been canceled. If you want to start again, just type /start.";

pub const SESSION_OVER: &str =
    "Our conversation has already ended. Type /start whenever you want to talk again.";

// ============================================================================
// Content
// ============================================================================

pub const CHAT_PROMPT: &str = "What would you like to talk about? I'm here to discuss various topics, from anime to technology and beyond.";

pub const CHAT_REFLECTION: &str = "Interesting... in the Wired, every thought connects to another. Tell me more, or try /anime, /quote or /fact.";

pub fn anime_pitch(title: &str) -> String {
    format!("How about watching '{title}'? It's an interesting anime you might enjoy!")
}

pub const ANIME_UNAVAILABLE: &str = "I'm having trouble fetching recommendations right now.";

pub fn quote_line(text: &str, author: &str) -> String {
    format!("{text} — {author}")
}

pub const QUOTE_UNAVAILABLE: &str = "I'm having trouble fetching a quote right now.";

pub const FACT_UNAVAILABLE: &str = "I'm having trouble fetching a fact right now.";

pub const FOCUS: &str = "Focus is the bridge between dreams and reality. Sometimes, we must let go of distractions to achieve clarity.";

pub const SURPRISE: &str = "In the Wired, surprises are common. Embrace the unexpected and stay open to new connections.";

pub fn unknown_command(name: &str) -> String {
    format!("I don't know the command '/{name}'. Use /help to see what I can do.")
}

pub const INTERNAL_ERROR: &str =
    "Something glitched in the Wired. Please type /start to begin again.";
