//! Command actor: a single worker draining a bounded mailbox.
//!
//! All messages sent to an [`Actor`] are handled one at a time, in order,
//! by the handler registered for the message's action tag. This gives the
//! owner a single writer for whatever state the handlers touch.
//!
//! - `send` tries a non-blocking enqueue and falls back to waiting when the
//!   mailbox is full (backpressure, never a silent drop)
//! - messages without a handler are logged and dropped
//! - handler errors and panics are logged; the worker keeps going
//! - `stop` (or dropping the handle) ends the worker; queued messages are
//!   dropped, which closes any reply channels they carry

mod runtime;
mod types;

pub use runtime::{Actor, HandlerMap};
pub use types::{handler, ActorError, ActorStats, Handler, Message};
