//! # Store Messages
//!
//! Requests sent from a [`PostsClient`](super::PostsClient) to the
//! [`PostsActor`](super::PostsActor). State is never read through messages: it
//! is published on a `watch` channel that readers borrow directly.

use tokio::sync::oneshot;

/// One-shot reply channel used by the actor.
pub type Response<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub enum StoreRequest {
    /// Issue one fetch. Replies with its sequence number when a responder is
    /// attached.
    Refresh { respond_to: Option<Response<u64>> },
    /// Reply once no fetch is in flight, with the applied revision.
    Settle { respond_to: Response<u64> },
    /// Abort in-flight fetches and stop the loop.
    Shutdown { respond_to: Response<()> },
}
