//! # Store Client
//!
//! The cloneable interface to a running [`PostsActor`](super::PostsActor).

use super::error::StoreError;
use super::message::StoreRequest;
use super::state::PostsState;
use crate::model::Post;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

/// A handle for requesting fetches and reading store state.
///
/// Holds the request sender plus a `watch` receiver, so reads are synchronous
/// and never go through the actor. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct PostsClient {
    sender: mpsc::Sender<StoreRequest>,
    state: watch::Receiver<PostsState>,
}

impl PostsClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>, state: watch::Receiver<PostsState>) -> Self {
        Self { sender, state }
    }

    /// Clone of the latest published state.
    pub fn state(&self) -> PostsState {
        self.state.borrow().clone()
    }

    /// First post with the given slug in the current snapshot.
    pub fn get_post(&self, slug: &str) -> Option<Post> {
        self.state.borrow().get_post(slug).cloned()
    }

    /// A receiver that observes every state change. Drop it to unsubscribe.
    pub fn subscribe(&self) -> watch::Receiver<PostsState> {
        let mut receiver = self.state.clone();
        receiver.mark_unchanged();
        receiver
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Issues a fetch and returns its sequence number without waiting for it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<u64, StoreError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Refresh {
                respond_to: Some(respond_to),
            })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)
    }

    /// Queues a fetch from synchronous code. Fails if the queue is full.
    pub fn request_refresh(&self) -> Result<(), StoreError> {
        self.sender
            .try_send(StoreRequest::Refresh { respond_to: None })
            .map_err(|e| match e {
                TrySendError::Full(_) => StoreError::QueueFull,
                TrySendError::Closed(_) => StoreError::StoreClosed,
            })
    }

    /// Waits until no fetch is in flight and returns the applied revision.
    #[instrument(skip(self))]
    pub async fn settle(&self) -> Result<u64, StoreError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Settle { respond_to })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)
    }

    /// Resolves once the applied revision reaches `revision`, either because
    /// that fetch was applied or because a newer one superseded it.
    pub async fn wait_for_revision(&self, revision: u64) -> Result<PostsState, StoreError> {
        let mut receiver = self.state.clone();
        let state = receiver
            .wait_for(|state| state.revision() >= revision)
            .await
            .map_err(|_| StoreError::StoreClosed)?
            .clone();
        Ok(state)
    }

    pub(crate) async fn shutdown(&self) -> Result<(), StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Shutdown { respond_to })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)
    }
}
