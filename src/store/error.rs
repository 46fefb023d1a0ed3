//! Errors raised while talking to the store itself.
//!
//! Fetch failures are not here: they end up in the store's error slot and
//! never reach the caller (see [`crate::source::FetchError`]).

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The actor is gone; no request can be delivered.
    #[error("Store closed")]
    StoreClosed,

    /// The actor stopped before answering.
    #[error("Store dropped response channel")]
    StoreDropped,

    /// The request queue is at capacity.
    #[error("Store request queue is full")]
    QueueFull,

    /// The store is dormant and has no actor to serve the request.
    #[error("Store not started")]
    NotStarted,

    /// `init` was called outside a Tokio runtime.
    #[error("No async runtime available to start the store")]
    NoRuntime,

    /// A store task panicked or was cancelled unexpectedly.
    #[error("Store task failed: {0}")]
    TaskFailed(String),
}
