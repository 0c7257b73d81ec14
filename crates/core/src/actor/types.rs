//! Message contract, handler type and counters for the command actor.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A message the actor can route.
///
/// Each message reports an action tag; the actor dispatches on the tag to
/// the handler registered for it.
pub trait Message: Send + 'static {
    type Action: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn action(&self) -> Self::Action;
}

/// Async handler for one action. Receives the message and the actor's
/// shutdown token.
pub type Handler<M> =
    Arc<dyn Fn(M, CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`Handler`].
pub fn handler<M, F, Fut>(f: F) -> Handler<M>
where
    M: Message,
    F: Fn(M, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |message, cancel| Box::pin(f(message, cancel)))
}

/// Errors returned to senders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
    /// The actor has been stopped and no longer accepts messages.
    #[error("actor {0} is stopped")]
    Stopped(String),
}

/// Point-in-time actor counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStats {
    /// Messages whose handler returned `Ok`.
    pub processed: u64,
    /// Messages whose handler returned an error or panicked.
    pub failed: u64,
    /// Messages dropped because no handler was registered.
    pub unhandled: u64,
    /// Messages currently waiting in the mailbox.
    pub queued: usize,
    /// Mailbox capacity.
    pub capacity: usize,
}

/// Lock-free counters shared between the actor handle and its worker.
#[derive(Debug, Default)]
pub(crate) struct AtomicActorStats {
    pub processed: AtomicU64,
    pub failed: AtomicU64,
    pub unhandled: AtomicU64,
}

impl AtomicActorStats {
    pub fn snapshot(&self, queued: usize, capacity: usize) -> ActorStats {
        ActorStats {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            queued,
            capacity,
        }
    }
}
