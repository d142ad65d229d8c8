//! Per-user session runtime executor

use super::traits::ReplySink;
use super::RuntimeError;

use crate::content::{ContentProvider, FetchError};
use crate::session::{Session, SessionStore};
use crate::state_machine::{
    script, transition, ConvContext, Effect, Event, Reply, TransitionError,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runtime for one user's conversation, generic over storage, content and
/// delivery so tests can swap in mocks
pub struct SessionRuntime<S, C, K>
where
    S: SessionStore + ?Sized + 'static,
    C: ContentProvider + ?Sized + 'static,
    K: ReplySink + ?Sized + 'static,
{
    context: ConvContext,
    store: Arc<S>,
    content: Arc<C>,
    sink: Arc<K>,
    /// Upper bound for a single content fetch
    fetch_timeout: Duration,
    rng: StdRng,
}

impl<S, C, K> SessionRuntime<S, C, K>
where
    S: SessionStore + ?Sized + 'static,
    C: ContentProvider + ?Sized + 'static,
    K: ReplySink + ?Sized + 'static,
{
    pub fn new(
        context: ConvContext,
        store: Arc<S>,
        content: Arc<C>,
        sink: Arc<K>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            context,
            store,
            content,
            sink,
            fetch_timeout,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source (for reproducible quizzes)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub async fn run(mut self, mut event_rx: mpsc::Receiver<Event>) {
        let user_id = self.context.user_id;
        tracing::info!(%user_id, "Starting session runtime");

        // Messages are handled strictly one at a time, in arrival order
        while let Some(event) = event_rx.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::error!(%user_id, error = %e, "Error handling event");
                self.send(Reply::text(script::INTERNAL_ERROR)).await;
            }
        }

        tracing::info!(%user_id, "Session runtime stopped");
    }

    pub(crate) async fn process_event(&mut self, event: Event) -> Result<(), RuntimeError> {
        let user_id = self.context.user_id;
        let now = Utc::now();

        // Read-only commands work on a throwaway copy so they can never
        // create or refresh a session
        let mut session = if event.is_read_only() {
            self.store
                .get(user_id)
                .await?
                .unwrap_or_else(|| Session::new(user_id, now))
        } else {
            let mut session = self.store.get_or_create(user_id, now).await?;
            session.touch(now);
            session
        };

        // Fetch results re-enter here as events - no recursion
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(
                &session.state,
                &self.context,
                current_event,
                &mut self.rng,
            ) {
                Ok(r) => r,
                Err(e) => {
                    if let TransitionError::InvalidTransition(detail) = &e {
                        tracing::error!(%user_id, state = session.state.name(), %detail, "Invalid transition");
                    } else {
                        tracing::debug!(%user_id, error = %e, "Input rejected");
                    }
                    self.send(Reply::text(e.reply_text())).await;
                    return Ok(());
                }
            };

            let from = session.state.name();
            session.state = result.new_state;
            if from != session.state.name() {
                tracing::debug!(
                    %user_id,
                    from,
                    to = session.state.name(),
                    quiz = ?session.pending_quiz_kind(),
                    "State transition"
                );
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect, &session).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Run one effect; fetch effects yield the event carrying their result.
    ///
    /// Nothing here aborts the turn: delivery and store failures are logged
    /// and the remaining effects still run.
    async fn execute_effect(&self, effect: Effect, session: &Session) -> Option<Event> {
        let user_id = self.context.user_id;

        match effect {
            Effect::Reply(reply) => {
                self.send(reply).await;
                None
            }

            Effect::FetchContent(request) => {
                let result = self.with_deadline(self.content.fetch(&request)).await;
                if let Err(e) = &result {
                    tracing::warn!(%user_id, request = request.name(), kind = e.kind.as_str(), error = %e, "Content unavailable");
                }
                Some(Event::ContentFetched {
                    content: result.ok(),
                })
            }

            Effect::FetchPhilosophicalQuote => {
                let result = self
                    .with_deadline(self.content.philosophical_quote())
                    .await;
                if let Err(e) = &result {
                    tracing::warn!(%user_id, kind = e.kind.as_str(), error = %e, "Philosophical quote unavailable");
                }
                Some(Event::PhilosophicalQuoteFetched {
                    quote: result.ok(),
                })
            }

            Effect::PersistSession => {
                if let Err(e) = self.store.update(user_id, session).await {
                    tracing::error!(%user_id, error = %e, "Failed to persist session");
                }
                None
            }

            Effect::EndSession => {
                if let Err(e) = self.store.delete(user_id).await {
                    tracing::error!(%user_id, error = %e, "Failed to end session");
                } else {
                    tracing::info!(%user_id, state = session.state.name(), "Session ended");
                }
                None
            }
        }
    }

    async fn with_deadline<T>(
        &self,
        fetch: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::timeout(format!(
                "No response within {}ms",
                self.fetch_timeout.as_millis()
            ))),
        }
    }

    async fn send(&self, reply: Reply) {
        let user_id = self.context.user_id;
        if let Err(e) = self.sink.send_reply(user_id, &reply).await {
            tracing::warn!(%user_id, error = %e, "Failed to deliver reply");
        }
    }
}
