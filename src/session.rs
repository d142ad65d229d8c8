//! Per-user session records and their store

use crate::state_machine::{ConvState, Quiz, QuizKind, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// One user's conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub state: ConvState,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            state: ConvState::default(),
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    /// Operands of the open arithmetic quiz
    #[allow(dead_code)] // API completeness
    pub fn pending_operands(&self) -> Option<(u32, u32)> {
        match self.state.quiz() {
            Some(Quiz::Arithmetic { x, y }) => Some((*x, *y)),
            _ => None,
        }
    }

    pub fn pending_quiz_kind(&self) -> Option<QuizKind> {
        self.state.quiz().map(Quiz::kind)
    }

    #[allow(dead_code)] // API completeness
    pub fn correct_option(&self) -> Option<&str> {
        match self.state.quiz() {
            Some(Quiz::Philosophical { correct_option, .. }) => Some(correct_option),
            _ => None,
        }
    }

    #[allow(dead_code)] // API completeness
    pub fn correct_author(&self) -> Option<&str> {
        match self.state.quiz() {
            Some(Quiz::Philosophical { correct_author, .. }) => Some(correct_author),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No session for user {0}")]
    UnknownUser(UserId),
    #[error("Session for user {session} written under user {key}")]
    UserMismatch { key: UserId, session: UserId },
}

/// Storage for sessions, keyed by user
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session without creating it
    async fn get(&self, user_id: UserId) -> Result<Option<Session>, SessionError>;

    /// Fetch the session, creating a fresh `Welcome` one if absent
    async fn get_or_create(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError>;

    /// Replace an existing session
    async fn update(&self, user_id: UserId, session: &Session) -> Result<(), SessionError>;

    /// Remove a session; removing an absent one is not an error
    async fn delete(&self, user_id: UserId) -> Result<(), SessionError>;

    /// Remove every session idle since before `cutoff`, returning their users
    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserId>, SessionError>;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, user_id: UserId) -> Result<Option<Session>, SessionError> {
        (**self).get(user_id).await
    }

    async fn get_or_create(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        (**self).get_or_create(user_id, now).await
    }

    async fn update(&self, user_id: UserId, session: &Session) -> Result<(), SessionError> {
        (**self).update(user_id, session).await
    }

    async fn delete(&self, user_id: UserId) -> Result<(), SessionError> {
        (**self).delete(user_id).await
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserId>, SessionError> {
        (**self).evict_idle(cutoff).await
    }
}

/// Process-local session store; sessions do not survive a restart
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)] // API completeness
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().await.get(&user_id).cloned())
    }

    async fn get_or_create(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id).or_insert_with(|| {
            tracing::debug!(%user_id, "Creating session");
            Session::new(user_id, now)
        });
        Ok(session.clone())
    }

    async fn update(&self, user_id: UserId, session: &Session) -> Result<(), SessionError> {
        if session.user_id != user_id {
            return Err(SessionError::UserMismatch {
                key: user_id,
                session: session.user_id,
            });
        }

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&user_id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(SessionError::UnknownUser(user_id)),
        }
    }

    async fn delete(&self, user_id: UserId) -> Result<(), SessionError> {
        self.sessions.write().await.remove(&user_id);
        Ok(())
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserId>, SessionError> {
        let mut sessions = self.sessions.write().await;
        let idle: Vec<UserId> = sessions
            .values()
            .filter(|s| s.last_active_at < cutoff)
            .map(|s| s.user_id)
            .collect();
        for user_id in &idle {
            sessions.remove(user_id);
        }
        Ok(idle)
    }
}
