//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.
//! Session storage and content fetching have their own seams in
//! `crate::session` and `crate::content`; only outbound delivery lives here.

use crate::state_machine::{Reply, UserId};
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound channel to the chat platform
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver one reply; failures are reported but never retried
    async fn send_reply(&self, user_id: UserId, reply: &Reply) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ReplySink + ?Sized> ReplySink for Arc<T> {
    async fn send_reply(&self, user_id: UserId, reply: &Reply) -> Result<(), String> {
        (**self).send_reply(user_id, reply).await
    }
}
