//! Runtime for executing conversations
//!
//! Each user gets a `SessionRuntime` task fed by its own channel, so one
//! user's turns run in arrival order while different users run concurrently.
//! `SessionManager` routes inbound messages to those tasks and sweeps idle
//! ones.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::content::ContentProvider;
use crate::session::{SessionError, SessionStore};
use crate::state_machine::{ConvContext, Event, QuizMode, UserId};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Manager as wired up in production, over trait objects
pub type ProductionManager = SessionManager<dyn SessionStore, dyn ContentProvider, dyn ReplySink>;

/// Capacity of each user's inbound queue
const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Session runtime for user {0} is not accepting messages")]
    RuntimeGone(UserId),
    #[error("Idle timeout of {0}s reaches past the earliest representable time")]
    IdleCutoff(i64),
}

/// A message from a user, as handed over by the chat adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: UserId,
    pub text: String,
    pub is_command: bool,
}

impl Inbound {
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        let text = text.into();
        let is_command = text.trim_start().starts_with('/');
        Self {
            user_id,
            text,
            is_command,
        }
    }
}

/// Knobs shared by every session runtime
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub quiz_mode: QuizMode,
    pub fetch_timeout: Duration,
    /// Sessions idle for longer than this are evicted by the sweeper
    pub idle_timeout: TimeDelta,
}

/// Handle to interact with a running session runtime
struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    /// Unix millis of the last dispatch to this runtime
    last_seen: AtomicI64,
}

/// Manager for all session runtimes
pub struct SessionManager<S, C, K>
where
    S: SessionStore + ?Sized + 'static,
    C: ContentProvider + ?Sized + 'static,
    K: ReplySink + ?Sized + 'static,
{
    store: Arc<S>,
    content: Arc<C>,
    sink: Arc<K>,
    settings: RuntimeSettings,
    runtimes: RwLock<HashMap<UserId, SessionHandle>>,
}

impl<S, C, K> SessionManager<S, C, K>
where
    S: SessionStore + ?Sized + 'static,
    C: ContentProvider + ?Sized + 'static,
    K: ReplySink + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, content: Arc<C>, sink: Arc<K>, settings: RuntimeSettings) -> Self {
        Self {
            store,
            content,
            sink,
            settings,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Route an inbound message to its user's runtime, starting one if needed
    pub async fn dispatch(&self, inbound: Inbound) -> Result<(), RuntimeError> {
        let user_id = inbound.user_id;
        let event = Event::from_inbound(&inbound.text, inbound.is_command);
        let now = Utc::now();

        let event_tx = self.sender_for(user_id, now).await;
        match event_tx.send(event).await {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(event)) => {
                // The task died without being evicted; start over once
                tracing::warn!(%user_id, "Session runtime stopped unexpectedly, restarting");
                self.runtimes.write().await.remove(&user_id);
                let event_tx = self.sender_for(user_id, now).await;
                event_tx
                    .send(event)
                    .await
                    .map_err(|_| RuntimeError::RuntimeGone(user_id))
            }
        }
    }

    async fn sender_for(&self, user_id: UserId, now: DateTime<Utc>) -> mpsc::Sender<Event> {
        // Check if already running
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&user_id) {
                handle
                    .last_seen
                    .store(now.timestamp_millis(), Ordering::Relaxed);
                return handle.event_tx.clone();
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // A concurrent dispatch may have started it between the two locks
        let handle = runtimes
            .entry(user_id)
            .or_insert_with(|| self.spawn_runtime(user_id));
        handle
            .last_seen
            .store(now.timestamp_millis(), Ordering::Relaxed);
        handle.event_tx.clone()
    }

    fn spawn_runtime(&self, user_id: UserId) -> SessionHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let runtime = SessionRuntime::new(
            ConvContext::new(user_id, self.settings.quiz_mode),
            self.store.clone(),
            self.content.clone(),
            self.sink.clone(),
            self.settings.fetch_timeout,
        );

        tokio::spawn(async move {
            runtime.run(event_rx).await;
            tracing::debug!(%user_id, "Session runtime finished");
        });

        SessionHandle {
            event_tx,
            last_seen: AtomicI64::new(0),
        }
    }

    /// Drop sessions and runtimes idle for longer than the idle timeout.
    ///
    /// Dropping a handle closes its channel; the runtime drains what is
    /// already queued and then exits. Returns the number of runtimes stopped.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> Result<usize, RuntimeError> {
        let cutoff = now
            .checked_sub_signed(self.settings.idle_timeout)
            .ok_or(RuntimeError::IdleCutoff(self.settings.idle_timeout.num_seconds()))?;

        let evicted_sessions = self.store.evict_idle(cutoff).await?;

        let cutoff_ms = cutoff.timestamp_millis();
        let mut runtimes = self.runtimes.write().await;
        let before = runtimes.len();
        runtimes.retain(|_, handle| handle.last_seen.load(Ordering::Relaxed) >= cutoff_ms);
        let stopped = before - runtimes.len();

        if !evicted_sessions.is_empty() || stopped > 0 {
            tracing::info!(
                sessions = evicted_sessions.len(),
                runtimes = stopped,
                "Evicted idle sessions"
            );
        }

        Ok(stopped)
    }

    /// Number of live session runtimes
    pub async fn runtime_count(&self) -> usize {
        self.runtimes.read().await.len()
    }

    /// Start the background task that evicts idle sessions every `interval`
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = manager.evict_idle(Utc::now()).await {
                            tracing::error!(error = %e, "Idle sweep failed");
                        }
                    }
                }
            }

            tracing::info!("Idle sweeper stopped");
        })
    }
}
