//! # Posts Store
//!
//! A live, server-synchronised cache of blog posts.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──(Interactive)──> init() ──> running ──> dispose()
//!   │                        ▲
//!   └──(Prerender)── dormant ┘ (explicit init)
//! ```
//!
//! `init` spawns the [`PostsActor`], queues the initial fetch and starts a
//! [`ReloadListener`](crate::reload::ReloadListener). It runs at most once per
//! store. `dispose` stops the listener and the actor; the last state stays
//! readable afterwards.
//!
//! ## Reading
//!
//! Reads are synchronous and lock-free from the caller's point of view:
//! [`PostsStore::state`], [`PostsStore::get_post`]. To react to changes, hold
//! a receiver from [`PostsStore::subscribe`].

pub mod actor;
pub mod client;
pub mod error;
pub mod message;
pub mod state;

pub use actor::*;
pub use client::*;
pub use error::*;
pub use message::*;
pub use state::*;

use crate::config::StoreConfig;
use crate::model::Post;
use crate::reload::{ListenerStats, ReloadListener, ReloadSource};
use crate::source::PostsSource;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Whether the store may start talking to the server on construction.
///
/// `Interactive` is a live client. `Prerender` is a one-shot rendering pass
/// that must not open connections; the store stays dormant there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Interactive when a Tokio runtime is reachable, prerender otherwise.
    #[default]
    Auto,
    Interactive,
    Prerender,
}

impl Environment {
    /// Resolves `Auto` against the current thread.
    pub fn resolve(self) -> Environment {
        match self {
            Environment::Auto => {
                if Handle::try_current().is_ok() {
                    Environment::Interactive
                } else {
                    Environment::Prerender
                }
            }
            other => other,
        }
    }

    pub fn is_interactive(self) -> bool {
        self.resolve() == Environment::Interactive
    }
}

struct Pending {
    actor: PostsActor,
    source: Arc<dyn PostsSource>,
    listener: ReloadListener,
    stop_listener: oneshot::Sender<()>,
}

enum Lifecycle {
    Dormant(Box<Pending>),
    Running {
        actor: JoinHandle<()>,
        listener: JoinHandle<ListenerStats>,
        stop_listener: oneshot::Sender<()>,
    },
    Disposed,
}

/// The posts store.
///
/// Built explicitly and handed to whoever renders posts, by reference or inside
/// an `Arc`. Each instance is independent.
pub struct PostsStore {
    client: PostsClient,
    environment: Environment,
    lifecycle: Mutex<Lifecycle>,
}

impl PostsStore {
    /// Creates the store, and starts it right away in an interactive
    /// environment.
    pub fn new(
        config: &StoreConfig,
        source: Arc<dyn PostsSource>,
        reload: Arc<dyn ReloadSource>,
    ) -> Self {
        let (actor, client) = PostsActor::new(config.channel_capacity.max(1));
        let (stop_listener, stopped) = oneshot::channel();
        let listener = ReloadListener::new(reload, client.clone())
            .with_token(config.reload_token.clone())
            .with_reconnect_delay(config.reconnect_delay())
            .with_shutdown(stopped);

        let environment = config.environment.resolve();
        let store = Self {
            client,
            environment,
            lifecycle: Mutex::new(Lifecycle::Dormant(Box::new(Pending {
                actor,
                source,
                listener,
                stop_listener,
            }))),
        };

        if environment == Environment::Interactive {
            if let Err(e) = store.init() {
                warn!(error = %e, "Store left dormant");
            }
        } else {
            info!(?environment, "Store dormant");
        }
        store
    }

    /// Starts the store: issues the initial fetch without waiting for it,
    /// spawns the actor and opens the reload connection.
    ///
    /// A second call, or a call after [`dispose`](Self::dispose), does nothing.
    pub fn init(&self) -> Result<(), StoreError> {
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        let mut lifecycle = self.lock();
        let pending = match std::mem::replace(&mut *lifecycle, Lifecycle::Disposed) {
            Lifecycle::Dormant(pending) => pending,
            other => {
                *lifecycle = other;
                return Ok(());
            }
        };
        let Pending {
            mut actor,
            source,
            listener,
            stop_listener,
        } = *pending;

        // Issued on the actor directly, ahead of anything already queued: the
        // initial fetch is always #1 and never waits for queue space.
        actor.spawn_fetch(&source);
        let actor = runtime.spawn(actor.run(source));
        let listener = runtime.spawn(listener.run());

        *lifecycle = Lifecycle::Running {
            actor,
            listener,
            stop_listener,
        };
        info!("Store initialized");
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock(), Lifecycle::Running { .. })
    }

    /// Fetches the collection again and waits until that attempt, or a newer
    /// one, has been applied. Fetch failures land in the error slot; only
    /// store communication errors are returned.
    pub async fn fetch_posts(&self) -> Result<(), StoreError> {
        if !self.is_running() {
            return Err(StoreError::NotStarted);
        }
        let seq = self.client.refresh().await?;
        self.client.wait_for_revision(seq).await?;
        Ok(())
    }

    /// Issues a fetch without waiting for it.
    pub async fn refresh(&self) -> Result<u64, StoreError> {
        if !self.is_running() {
            return Err(StoreError::NotStarted);
        }
        self.client.refresh().await
    }

    /// Waits until no fetch is in flight.
    pub async fn settle(&self) -> Result<u64, StoreError> {
        if !self.is_running() {
            return Err(StoreError::NotStarted);
        }
        self.client.settle().await
    }

    pub fn state(&self) -> PostsState {
        self.client.state()
    }

    pub fn posts(&self) -> Arc<[Post]> {
        self.client.state().snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.client.state().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.client.state().error().map(str::to_string)
    }

    /// First post with the given slug, if present in the current snapshot.
    pub fn get_post(&self, slug: &str) -> Option<Post> {
        self.client.get_post(slug)
    }

    pub fn subscribe(&self) -> watch::Receiver<PostsState> {
        self.client.subscribe()
    }

    /// A client handle sharing this store's actor.
    pub fn client(&self) -> PostsClient {
        self.client.clone()
    }

    /// Closes the reload connection, aborts in-flight fetches and stops the
    /// actor. Returns the listener counters when the store was running, and
    /// `None` when it never started or was already disposed.
    pub async fn dispose(&self) -> Result<Option<ListenerStats>, StoreError> {
        let previous = std::mem::replace(&mut *self.lock(), Lifecycle::Disposed);
        let Lifecycle::Running {
            actor,
            listener,
            stop_listener,
        } = previous
        else {
            return Ok(None);
        };

        // Fails when the listener already stopped on its own; its counters
        // are still waiting in the handle.
        let _ = stop_listener.send(());
        let stats = listener
            .await
            .map_err(|e| StoreError::TaskFailed(e.to_string()));

        match self.client.shutdown().await {
            Ok(()) | Err(StoreError::StoreClosed) | Err(StoreError::StoreDropped) => {}
            Err(e) => return Err(e),
        }
        actor
            .await
            .map_err(|e| StoreError::TaskFailed(e.to_string()))?;
        let stats = stats?;

        info!("Store disposed");
        Ok(Some(stats))
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PostsStore {
    fn drop(&mut self) {
        if let Lifecycle::Running {
            actor, listener, ..
        } = &*self.lock()
        {
            listener.abort();
            actor.abort();
        }
    }
}
