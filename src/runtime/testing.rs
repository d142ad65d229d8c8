//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::content::{ContentProvider, FetchError, Quote};
use crate::session::{InMemorySessionStore, SessionStore};
use crate::state_machine::{ConvState, Reply, UserId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Content Provider
// ============================================================================

/// Mock content provider with canned answers; anything not configured fails
#[derive(Default)]
pub struct MockContentProvider {
    anime: Option<String>,
    quote: Option<Quote>,
    fact: Option<String>,
    philosophical: Mutex<VecDeque<Quote>>,
    /// Artificial latency applied to every call
    delay: Option<Duration>,
    /// Record of calls made, by source name
    pub calls: Mutex<Vec<String>>,
}

impl MockContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anime(mut self, title: impl Into<String>) -> Self {
        self.anime = Some(title.into());
        self
    }

    pub fn with_quote(mut self, text: &str, author: &str) -> Self {
        self.quote = Some(Quote {
            text: text.to_string(),
            author: author.to_string(),
        });
        self
    }

    pub fn with_fact(mut self, text: impl Into<String>) -> Self {
        self.fact = Some(text.into());
        self
    }

    /// Queue a philosophical quote; each call consumes one
    pub fn queue_philosophical(self, text: &str, author: &str) -> Self {
        self.philosophical.lock().unwrap().push_back(Quote {
            text: text.to_string(),
            author: author.to_string(),
        });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn call(&self, source: &str) {
        self.calls.lock().unwrap().push(source.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn unavailable<T>(value: Option<T>, source: &str) -> Result<T, FetchError> {
        value.ok_or_else(|| FetchError::status(format!("No mock {source} configured")))
    }
}

#[async_trait]
impl ContentProvider for MockContentProvider {
    async fn random_anime(&self) -> Result<String, FetchError> {
        self.call("anime").await;
        Self::unavailable(self.anime.clone(), "anime")
    }

    async fn random_quote(&self) -> Result<Quote, FetchError> {
        self.call("quote").await;
        Self::unavailable(self.quote.clone(), "quote")
    }

    async fn number_fact(&self, number: u32) -> Result<String, FetchError> {
        self.call(&format!("number_fact:{number}")).await;
        Self::unavailable(self.fact.clone(), "fact")
    }

    async fn philosophical_quote(&self) -> Result<Quote, FetchError> {
        self.call("philosophical_quote").await;
        let next = self.philosophical.lock().unwrap().pop_front();
        Self::unavailable(next, "philosophical quote")
    }
}

// ============================================================================
// Recording Reply Sink
// ============================================================================

/// Sink that records every reply instead of delivering it
#[derive(Default)]
pub struct RecordingSink {
    replies: Mutex<Vec<(UserId, Reply)>>,
    /// When set, every delivery fails (after being recorded)
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    pub fn all(&self) -> Vec<(UserId, Reply)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn texts_for(&self, user_id: UserId) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, reply)| reply.text.clone())
            .collect()
    }

    /// Wait until `user_id` has received at least `count` replies
    pub async fn wait_for(&self, user_id: UserId, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.texts_for(user_id).len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send_reply(&self, user_id: UserId, reply: &Reply) -> Result<(), String> {
        self.replies.lock().unwrap().push((user_id, reply.clone()));
        if self.failing.load(Ordering::SeqCst) {
            Err("mock delivery failure".to_string())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Test Runtime Helper
// ============================================================================

use crate::runtime::SessionRuntime;
use crate::state_machine::{ConvContext, Event, QuizMode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

pub const TEST_USER: UserId = UserId(1001);

/// Helper for driving one user's runtime end to end
pub struct TestRuntime {
    pub store: Arc<InMemorySessionStore>,
    pub content: Arc<MockContentProvider>,
    pub sink: Arc<RecordingSink>,
    pub event_tx: mpsc::Sender<Event>,
    _runtime_handle: tokio::task::JoinHandle<()>,
}

impl TestRuntime {
    /// Create a simple test runtime with instant mocks
    pub fn new() -> TestRuntimeBuilder {
        TestRuntimeBuilder::new()
    }

    /// Send a message the way the chat adapter would
    pub async fn send(&self, text: &str) {
        let inbound = crate::runtime::Inbound::new(TEST_USER, text);
        self.event_tx
            .send(Event::from_inbound(&inbound.text, inbound.is_command))
            .await
            .expect("Failed to send message");
    }

    /// Send a message and wait until the reply count reaches `expected_total`
    pub async fn exchange(&self, text: &str, expected_total: usize) -> Vec<String> {
        self.send(text).await;
        assert!(
            self.sink
                .wait_for(TEST_USER, expected_total, Duration::from_secs(2))
                .await,
            "Timed out waiting for replies to {text:?}; got {:?}",
            self.replies()
        );
        self.replies()
    }

    pub fn replies(&self) -> Vec<String> {
        self.sink.texts_for(TEST_USER)
    }

    /// Current stored state, `None` once the session has ended
    pub async fn state(&self) -> Option<ConvState> {
        self.store
            .get(TEST_USER)
            .await
            .unwrap()
            .map(|session| session.state)
    }

    /// Force the stored session into `state`
    pub async fn set_state(&self, state: ConvState) {
        let mut session = self
            .store
            .get_or_create(TEST_USER, chrono::Utc::now())
            .await
            .unwrap();
        session.state = state;
        self.store.update(TEST_USER, &session).await.unwrap();
    }
}

pub struct TestRuntimeBuilder {
    quiz_mode: QuizMode,
    content: Option<MockContentProvider>,
    sink: Option<RecordingSink>,
    fetch_timeout: Duration,
    seed: u64,
}

impl TestRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            quiz_mode: QuizMode::Arithmetic,
            content: None,
            sink: None,
            fetch_timeout: Duration::from_secs(1),
            seed: 7,
        }
    }

    pub fn quiz_mode(mut self, mode: QuizMode) -> Self {
        self.quiz_mode = mode;
        self
    }

    pub fn content(mut self, content: MockContentProvider) -> Self {
        self.content = Some(content);
        self
    }

    pub fn sink(mut self, sink: RecordingSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn build(self) -> TestRuntime {
        let store = Arc::new(InMemorySessionStore::new());
        let content = Arc::new(self.content.unwrap_or_default());
        let sink = Arc::new(self.sink.unwrap_or_default());

        let (event_tx, event_rx) = mpsc::channel(32);
        let runtime = SessionRuntime::new(
            ConvContext::new(TEST_USER, self.quiz_mode),
            store.clone(),
            content.clone(),
            sink.clone(),
            self.fetch_timeout,
        )
        .with_rng(StdRng::seed_from_u64(self.seed));

        let handle = tokio::spawn(async move {
            runtime.run(event_rx).await;
        });

        TestRuntime {
            store,
            content,
            sink,
            event_tx,
            _runtime_handle: handle,
        }
    }
}

impl Default for TestRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Inbound, RuntimeError, RuntimeSettings, SessionManager};
    use crate::state_machine::{script, Quiz};
    use chrono::{TimeDelta, Utc};
    use tokio_util::sync::CancellationToken;

    fn settings() -> RuntimeSettings {
        RuntimeSettings {
            quiz_mode: QuizMode::Arithmetic,
            fetch_timeout: Duration::from_secs(1),
            idle_timeout: TimeDelta::minutes(30),
        }
    }

    #[tokio::test]
    async fn test_start_then_decline() {
        let rt = TestRuntime::new().build();

        let replies = rt.exchange("/start", 1).await;
        assert_eq!(replies, vec![script::GREETING]);
        assert_eq!(rt.state().await, Some(ConvState::Welcome));

        let replies = rt.exchange("No", 2).await;
        assert_eq!(replies[1], script::QUIZ_DECLINED);
        // Cancelled is terminal, so the session is gone
        assert_eq!(rt.state().await, None);
    }

    #[tokio::test]
    async fn test_greeting_carries_keyboard() {
        let rt = TestRuntime::new().build();
        rt.exchange("/start", 1).await;

        let (_, reply) = &rt.sink.all()[0];
        let keyboard = reply.keyboard.as_ref().expect("greeting keyboard");
        assert!(keyboard.one_time);
        assert_eq!(keyboard.rows[0], vec!["Yes", "No"]);
    }

    #[tokio::test]
    async fn test_correct_sum_then_closing_quote() {
        let rt = TestRuntime::new().build();
        rt.set_state(ConvState::AwaitingAnswer {
            quiz: Quiz::Arithmetic { x: 17, y: 42 },
        })
        .await;

        let replies = rt.exchange("59", 2).await;
        assert_eq!(replies[0], script::ARITHMETIC_CORRECT);
        assert_eq!(replies[1], script::QUOTE_OFFER);
        assert_eq!(rt.state().await, Some(ConvState::Correct));

        let replies = rt.exchange("yes", 3).await;
        assert_eq!(replies[2], script::CLOSING_QUOTE);
        assert_eq!(rt.state().await, None);
    }

    #[tokio::test]
    async fn test_yes_then_non_numeric_regenerates_pair() {
        let rt = TestRuntime::new().build();
        rt.exchange("/start", 1).await;

        let replies = rt.exchange("Y", 3).await;
        assert_eq!(replies[1], script::QUIZ_ACCEPTED);
        let first = rt.store.get(TEST_USER).await.unwrap().unwrap();
        let (x, y) = first.pending_operands().expect("operands after yes");
        assert_eq!(replies[2], script::arithmetic_question(x, y));

        let replies = rt.exchange("abc", 5).await;
        assert_eq!(replies[3], script::ARITHMETIC_INCORRECT);
        let second = rt.store.get(TEST_USER).await.unwrap().unwrap();
        let (x2, y2) = second.pending_operands().expect("fresh operands");
        assert_eq!(replies[4], script::arithmetic_question(x2, y2));
        assert!(x2 <= 1000 && y2 <= 1000);

        // The replaced pair's sum no longer solves the quiz
        if x + y != x2 + y2 {
            let replies = rt.exchange(&(x + y).to_string(), 7).await;
            assert_eq!(replies[5], script::ARITHMETIC_INCORRECT);
            let third = rt.store.get(TEST_USER).await.unwrap().unwrap();
            assert!(third.pending_operands().is_some());
        }
    }

    #[tokio::test]
    async fn test_help_does_not_create_or_touch_session() {
        let rt = TestRuntime::new().build();

        let replies = rt.exchange("/help", 1).await;
        assert_eq!(replies[0], script::HELP);
        assert_eq!(rt.state().await, None);

        rt.set_state(ConvState::AwaitingAnswer {
            quiz: Quiz::Arithmetic { x: 1, y: 2 },
        })
        .await;
        let before = rt.store.get(TEST_USER).await.unwrap().unwrap();
        rt.exchange("/help", 2).await;
        let after = rt.store.get(TEST_USER).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_anime_recommendation() {
        let rt = TestRuntime::new()
            .content(MockContentProvider::new().with_anime("Serial Experiments Lain"))
            .build();

        let replies = rt.exchange("/anime", 1).await;
        assert_eq!(replies[0], script::anime_pitch("Serial Experiments Lain"));
        assert_eq!(rt.state().await, None);
    }

    #[tokio::test]
    async fn test_quote_fetch_timeout_apologizes() {
        let rt = TestRuntime::new()
            .content(
                MockContentProvider::new()
                    .with_quote("Too late.", "Nobody")
                    .with_delay(Duration::from_millis(500)),
            )
            .fetch_timeout(Duration::from_millis(20))
            .build();

        let replies = rt.exchange("/quote", 1).await;
        assert_eq!(replies[0], script::QUOTE_UNAVAILABLE);
        assert!(!replies[0].is_empty());
        assert_eq!(rt.state().await, None);
    }

    #[tokio::test]
    async fn test_fact_for_small_number() {
        let rt = TestRuntime::new()
            .content(MockContentProvider::new().with_fact("7 is the number of wonders."))
            .build();

        let replies = rt.exchange("/fact", 1).await;
        assert_eq!(replies[0], "7 is the number of wonders.");

        let calls = rt.content.recorded_calls();
        let number: u32 = calls[0]
            .strip_prefix("number_fact:")
            .and_then(|n| n.parse().ok())
            .expect("number fact call");
        assert!((1..=100).contains(&number));
    }

    #[tokio::test]
    async fn test_philosophical_question_round_trip() {
        let rt = TestRuntime::new()
            .content(
                MockContentProvider::new()
                    .queue_philosophical("Know thyself.", "Socrates")
                    .queue_philosophical("Man is condemned to be free.", "Jean-Paul Sartre"),
            )
            .build();

        let replies = rt.exchange("/philosophical_question", 1).await;
        assert!(replies[0].contains("Know thyself."));
        let session = rt.store.get(TEST_USER).await.unwrap().unwrap();
        let correct = session.correct_option().expect("option").to_string();
        assert_eq!(session.correct_author(), Some("Socrates"));

        // Wrong option: a new question is fetched
        let wrong = if correct == "1" { "2" } else { "1" };
        let replies = rt.exchange(wrong, 3).await;
        assert_eq!(replies[1], script::PHILOSOPHICAL_INCORRECT);
        assert!(replies[2].contains("Man is condemned to be free."));

        let session = rt.store.get(TEST_USER).await.unwrap().unwrap();
        let correct = session.correct_option().expect("option").to_string();
        let replies = rt.exchange(&correct, 5).await;
        assert_eq!(replies[3], script::PHILOSOPHICAL_CORRECT);
        assert_eq!(rt.state().await, Some(ConvState::Correct));
    }

    #[tokio::test]
    async fn test_empty_philosophical_source_falls_back() {
        let rt = TestRuntime::new()
            .quiz_mode(QuizMode::Philosophical)
            .build();
        rt.exchange("/start", 1).await;

        let replies = rt.exchange("yes", 4).await;
        assert_eq!(replies[1], script::QUIZ_ACCEPTED);
        assert_eq!(replies[2], script::PHILOSOPHICAL_UNAVAILABLE);
        let session = rt.store.get(TEST_USER).await.unwrap().unwrap();
        assert!(session.pending_operands().is_some());
    }

    #[tokio::test]
    async fn test_cancel_mid_quiz() {
        let rt = TestRuntime::new().build();
        rt.set_state(ConvState::AwaitingAnswer {
            quiz: Quiz::Arithmetic { x: 3, y: 4 },
        })
        .await;

        let replies = rt.exchange("/cancel", 1).await;
        assert_eq!(replies[0], script::CANCELLED);
        assert_eq!(rt.state().await, None);
    }

    #[tokio::test]
    async fn test_stray_text_after_restart_gets_farewell() {
        let rt = TestRuntime::new().build();

        // No session yet: a lazily created Welcome session declines
        let replies = rt.exchange("hello there", 1).await;
        assert_eq!(replies[0], script::QUIZ_DECLINED);
        assert_eq!(rt.state().await, None);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_runtime() {
        let rt = TestRuntime::new().sink(RecordingSink::failing()).build();

        rt.exchange("/start", 1).await;
        assert_eq!(rt.state().await, Some(ConvState::Welcome));

        rt.exchange("/chat", 2).await;
        assert_eq!(rt.state().await, Some(ConvState::Chatting));
    }

    #[tokio::test]
    async fn test_chatting_reflects() {
        let rt = TestRuntime::new().build();
        rt.exchange("/chat", 1).await;

        let replies = rt.exchange("tell me about the Wired", 2).await;
        assert_eq!(replies[1], script::CHAT_REFLECTION);
        assert_eq!(rt.state().await, Some(ConvState::Chatting));
    }

    // ------------------------------------------------------------------------
    // Manager
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_manager_keeps_per_user_order() {
        let sink = Arc::new(RecordingSink::new());
        let manager = SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(MockContentProvider::new()),
            sink.clone(),
            settings(),
        );

        let user = UserId(5);
        manager.dispatch(Inbound::new(user, "/start")).await.unwrap();
        manager.dispatch(Inbound::new(user, "no")).await.unwrap();
        manager.dispatch(Inbound::new(user, "/help")).await.unwrap();

        assert!(sink.wait_for(user, 3, Duration::from_secs(2)).await);
        assert_eq!(
            sink.texts_for(user),
            vec![script::GREETING, script::QUIZ_DECLINED, script::HELP]
        );
        assert_eq!(manager.runtime_count().await, 1);
    }

    #[tokio::test]
    async fn test_slow_fetch_does_not_block_other_users() {
        let sink = Arc::new(RecordingSink::new());
        let manager = SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(
                MockContentProvider::new()
                    .with_anime("Lain")
                    .with_delay(Duration::from_millis(300)),
            ),
            sink.clone(),
            settings(),
        );

        let slow = UserId(1);
        let fast = UserId(2);
        manager.dispatch(Inbound::new(slow, "/anime")).await.unwrap();
        manager.dispatch(Inbound::new(fast, "/start")).await.unwrap();

        assert!(sink.wait_for(fast, 1, Duration::from_secs(1)).await);
        assert!(sink.texts_for(slow).is_empty());

        assert!(sink.wait_for(slow, 1, Duration::from_secs(2)).await);
        let order: Vec<UserId> = sink.all().into_iter().map(|(user, _)| user).collect();
        assert_eq!(order, vec![fast, slow]);
    }

    #[tokio::test]
    async fn test_evict_idle_stops_runtimes_and_sessions() {
        let store = Arc::new(InMemorySessionStore::new());
        let sink = Arc::new(RecordingSink::new());
        let manager = SessionManager::new(
            store.clone(),
            Arc::new(MockContentProvider::new()),
            sink.clone(),
            settings(),
        );

        let user = UserId(8);
        manager.dispatch(Inbound::new(user, "/start")).await.unwrap();
        assert!(sink.wait_for(user, 1, Duration::from_secs(1)).await);
        assert_eq!(store.len().await, 1);

        // Nothing is idle yet
        assert_eq!(manager.evict_idle(Utc::now()).await.unwrap(), 0);
        assert_eq!(manager.runtime_count().await, 1);

        let later = Utc::now() + TimeDelta::minutes(31);
        assert_eq!(manager.evict_idle(later).await.unwrap(), 1);
        assert_eq!(manager.runtime_count().await, 0);
        assert_eq!(store.len().await, 0);

        // A new message starts a fresh runtime
        manager.dispatch(Inbound::new(user, "/start")).await.unwrap();
        assert!(sink.wait_for(user, 2, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_evict_idle_rejects_unrepresentable_cutoff() {
        let idle_timeout = TimeDelta::try_seconds(9_000_000_000_000).unwrap();
        let sink = Arc::new(RecordingSink::new());
        let manager = SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(MockContentProvider::new()),
            sink.clone(),
            RuntimeSettings {
                idle_timeout,
                ..settings()
            },
        );

        let user = UserId(12);
        manager.dispatch(Inbound::new(user, "/start")).await.unwrap();
        assert!(sink.wait_for(user, 1, Duration::from_secs(1)).await);

        assert!(matches!(
            manager.evict_idle(Utc::now()).await,
            Err(RuntimeError::IdleCutoff(9_000_000_000_000))
        ));
        assert_eq!(manager.runtime_count().await, 1);

        // The manager keeps serving after a failed sweep
        manager.dispatch(Inbound::new(user, "/help")).await.unwrap();
        assert!(sink.wait_for(user, 2, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let manager = Arc::new(SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(MockContentProvider::new()),
            Arc::new(RecordingSink::new()),
            settings(),
        ));

        let cancel = CancellationToken::new();
        let sweeper = manager.spawn_sweeper(Duration::from_millis(10), cancel.clone());
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), sweeper)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }

    #[test]
    fn test_inbound_detects_commands() {
        assert!(Inbound::new(UserId(1), "/start").is_command);
        assert!(Inbound::new(UserId(1), "  /help").is_command);
        assert!(!Inbound::new(UserId(1), "yes").is_command);
    }
}
