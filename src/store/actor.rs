//! # Store Actor
//!
//! The `PostsActor` is the only writer of a store's state. It runs in its own
//! Tokio task and processes [`StoreRequest`]s one at a time.

use super::client::PostsClient;
use super::message::{Response, StoreRequest};
use super::state::PostsState;
use crate::model::Post;
use crate::source::{FetchError, PostsSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

type FetchOutcome = (u64, Result<Vec<Post>, FetchError>);

/// The actor that owns a store's snapshot, loading flag and error slot.
///
/// # Concurrency Model
/// Fetches run on a `JoinSet` owned by the actor, so a slow request never
/// delays message handling. Their outcomes come back through the same loop
/// and are applied sequentially, which keeps every state write in one task.
/// Readers only ever see whole `PostsState` values published through `watch`.
///
/// # Sequencing
/// Each fetch is numbered when issued. An outcome is applied only when its
/// number is above the applied revision; an older outcome that loses the race
/// to a newer one is discarded. A fetch task that panics still resolves its
/// number, as a failure.
pub struct PostsActor {
    receiver: mpsc::Receiver<StoreRequest>,
    state: watch::Sender<PostsState>,
    in_flight: JoinSet<FetchOutcome>,
    seq_by_task: HashMap<task::Id, u64>,
    next_seq: u64,
    settle_waiters: Vec<Response<u64>>,
}

impl PostsActor {
    /// Creates the actor and its client.
    ///
    /// `buffer_size` bounds the request queue; when it is full, client calls
    /// wait for space.
    pub fn new(buffer_size: usize) -> (Self, PostsClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (state, state_receiver) = watch::channel(PostsState::default());
        let actor = Self {
            receiver,
            state,
            in_flight: JoinSet::new(),
            seq_by_task: HashMap::new(),
            next_seq: 0,
            settle_waiters: Vec::new(),
        };
        (actor, PostsClient::new(sender, state_receiver))
    }

    /// Runs the event loop until a `Shutdown` arrives or every client is gone.
    ///
    /// In-flight fetches are aborted on exit.
    pub async fn run(mut self, source: Arc<dyn PostsSource>) {
        info!("Store started");

        let mut shutdown: Option<Response<()>> = None;
        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(StoreRequest::Refresh { respond_to }) => {
                        let seq = self.spawn_fetch(&source);
                        if let Some(respond_to) = respond_to {
                            let _ = respond_to.send(seq);
                        }
                    }
                    Some(StoreRequest::Settle { respond_to }) => {
                        if self.in_flight.is_empty() {
                            let _ = respond_to.send(self.revision());
                        } else {
                            self.settle_waiters.push(respond_to);
                        }
                    }
                    Some(StoreRequest::Shutdown { respond_to }) => {
                        shutdown = Some(respond_to);
                        break;
                    }
                    None => break,
                },
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok((id, (seq, outcome))) => {
                            self.seq_by_task.remove(&id);
                            self.apply(seq, outcome);
                        }
                        Err(e) => match self.seq_by_task.remove(&e.id()) {
                            Some(seq) => {
                                error!(seq, error = %e, "Fetch task failed");
                                self.apply(seq, Err(FetchError::Task(e.to_string())));
                            }
                            None => warn!(error = %e, "Untracked fetch task failed"),
                        },
                    }
                    if self.in_flight.is_empty() {
                        self.release_settled();
                    }
                }
            }
        }

        let aborted = self.in_flight.len();
        self.in_flight.shutdown().await;
        self.seq_by_task.clear();
        self.release_settled();

        let state = self.state.borrow().clone();
        info!(
            revision = state.revision(),
            posts = state.posts().len(),
            aborted,
            "Shutdown"
        );
        if let Some(respond_to) = shutdown {
            let _ = respond_to.send(());
        }
    }

    /// Issues fetch number `next_seq + 1` on the actor's `JoinSet`.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn_fetch(&mut self, source: &Arc<dyn PostsSource>) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;

        self.state.send_if_modified(PostsState::begin_loading);

        let source = Arc::clone(source);
        let handle = self.in_flight.spawn(async move {
            let outcome = source.fetch_posts().await;
            if let Err(e) = &outcome {
                error!(seq, error = %e, status = ?e.status(), "Error fetching posts");
            }
            (seq, outcome)
        });
        self.seq_by_task.insert(handle.id(), seq);
        debug!(seq, in_flight = self.in_flight.len(), "Fetch issued");
        seq
    }

    fn apply(&mut self, seq: u64, outcome: Result<Vec<Post>, FetchError>) {
        let applied = self.revision();
        if seq <= applied {
            debug!(seq, applied, "Discarded superseded fetch");
            return;
        }

        match outcome {
            Ok(posts) => {
                let count = posts.len();
                self.state.send_modify(|state| state.apply_success(seq, posts));
                info!(revision = seq, posts = count, "Snapshot replaced");
            }
            Err(e) => {
                self.state
                    .send_modify(|state| state.apply_failure(seq, e.to_string()));
                debug!(revision = seq, "Kept previous snapshot");
            }
        }
    }

    fn revision(&self) -> u64 {
        self.state.borrow().revision()
    }

    fn release_settled(&mut self) {
        let revision = self.revision();
        for waiter in self.settle_waiters.drain(..) {
            let _ = waiter.send(revision);
        }
    }
}
