use crate::config::{ConfigError, StoreConfig};
use crate::reload::{ListenerStats, SseReloadSource};
use crate::source::HttpPostsSource;
use crate::store::{PostsStore, StoreError};
use std::sync::Arc;
use tracing::{error, info};

/// Production wiring for a [`PostsStore`].
///
/// `PostsSystem` is responsible for:
/// - **Transport**: one shared `reqwest::Client` for both endpoints
/// - **Dependency Wiring**: HTTP posts source and SSE reload source built from
///   the [`StoreConfig`]
/// - **Lifecycle Management**: starting the store and disposing it
///
/// # Example
///
/// ```ignore
/// let system = PostsSystem::start(StoreConfig::default())?;
///
/// let mut updates = system.store.subscribe();
/// updates.changed().await?;
/// println!("{} posts", updates.borrow().posts().len());
///
/// system.shutdown().await?;
/// ```
pub struct PostsSystem {
    /// The running store.
    pub store: Arc<PostsStore>,

    config: StoreConfig,
}

impl PostsSystem {
    /// Builds the sources and the store.
    ///
    /// Called inside a Tokio runtime with the default `auto` environment, the
    /// store starts immediately. Configuration errors are reported before any
    /// connection is made.
    pub fn start(config: StoreConfig) -> Result<Self, ConfigError> {
        let posts_url = config.posts_url()?;
        let reload_url = config.reload_url()?;

        let client = reqwest::Client::new();
        let source = HttpPostsSource::new(client.clone(), posts_url.clone())
            .with_timeout(config.request_timeout());
        let reload = SseReloadSource::new(client, reload_url.clone());

        info!(posts_url, reload_url, "Starting posts store");
        let store = PostsStore::new(&config, Arc::new(source), Arc::new(reload));

        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Closes the reload connection and stops the store.
    pub async fn shutdown(self) -> Result<Option<ListenerStats>, StoreError> {
        info!("Shutting down posts store...");
        match self.store.dispose().await {
            Ok(stats) => {
                info!(?stats, "Shutdown complete.");
                Ok(stats)
            }
            Err(e) => {
                error!(error = %e, "Store task failed");
                Err(e)
            }
        }
    }
}
