//! Actor handle and worker loop.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::types::{ActorError, ActorStats, AtomicActorStats, Handler, Message};

/// Handlers keyed by action tag.
pub type HandlerMap<M> = HashMap<<M as Message>::Action, Handler<M>>;

/// Single-worker actor with a bounded mailbox.
///
/// Messages are processed one at a time in arrival order. Dropping the
/// handle stops the worker.
pub struct Actor<M: Message> {
    name: String,
    sender: mpsc::Sender<M>,
    handlers: Arc<RwLock<HandlerMap<M>>>,
    shutdown: CancellationToken,
    stats: Arc<AtomicActorStats>,
}

impl<M: Message> Actor<M> {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(name: impl Into<String>, capacity: usize, handlers: HandlerMap<M>) -> Self {
        let name = name.into();
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handlers = Arc::new(RwLock::new(handlers));
        let shutdown = CancellationToken::new();
        let stats = Arc::new(AtomicActorStats::default());

        tokio::spawn(run_worker(
            name.clone(),
            receiver,
            Arc::clone(&handlers),
            shutdown.clone(),
            Arc::clone(&stats),
        ));

        info!("Actor {} started (mailbox capacity {})", name, capacity.max(1));

        Self {
            name,
            sender,
            handlers,
            shutdown,
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace the handler for an action.
    pub async fn register(&self, action: M::Action, handler: Handler<M>) {
        self.handlers.write().await.insert(action, handler);
    }

    /// Enqueue a message.
    ///
    /// Tries a non-blocking enqueue first; if the mailbox is full, waits for
    /// room instead of dropping the message.
    pub async fn send(&self, message: M) -> Result<(), ActorError> {
        if self.shutdown.is_cancelled() {
            return Err(self.stopped());
        }

        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                debug!("Actor {} mailbox full, waiting for capacity", self.name);
                tokio::select! {
                    result = self.sender.send(message) => result.map_err(|_| self.stopped()),
                    _ = self.shutdown.cancelled() => Err(self.stopped()),
                }
            }
            Err(TrySendError::Closed(_)) => Err(self.stopped()),
        }
    }

    /// Stop the worker. Messages still queued are dropped.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Stopping actor {}", self.name);
            self.shutdown.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn stats(&self) -> ActorStats {
        let capacity = self.sender.max_capacity();
        let queued = capacity.saturating_sub(self.sender.capacity());
        self.stats.snapshot(queued, capacity)
    }

    fn stopped(&self) -> ActorError {
        ActorError::Stopped(self.name.clone())
    }
}

impl<M: Message> Drop for Actor<M> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_worker<M: Message>(
    name: String,
    mut receiver: mpsc::Receiver<M>,
    handlers: Arc<RwLock<HandlerMap<M>>>,
    shutdown: CancellationToken,
    stats: Arc<AtomicActorStats>,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            message = receiver.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let action = message.action();
        let handler = handlers.read().await.get(&action).cloned();

        let Some(handler) = handler else {
            stats.unhandled.fetch_add(1, Ordering::Relaxed);
            debug!("Actor {}: no handler for {:?}, dropping message", name, action);
            continue;
        };

        match AssertUnwindSafe(handler(message, shutdown.clone()))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {
                stats.processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!("Actor {}: handler for {:?} failed: {:#}", name, action, e);
            }
            Err(_) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!("Actor {}: handler for {:?} panicked", name, action);
            }
        }
    }

    receiver.close();
    let mut dropped = 0usize;
    while receiver.try_recv().is_ok() {
        dropped += 1;
    }
    info!("Actor {} stopped ({} queued messages dropped)", name, dropped);
}
