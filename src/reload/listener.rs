use super::{ReloadSource, RELOAD_TOKEN};
use crate::store::PostsClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Counters reported when a listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Connections successfully opened.
    pub connections: usize,
    /// Events received across all connections.
    pub events: usize,
    /// Refreshes issued because of a reload event.
    pub reloads: usize,
}

/// Follows the reload channel and asks the store to refetch on every
/// `reload` event.
///
/// When the stream ends or fails the listener sleeps for the reconnect delay
/// (or the server's `retry:` hint) and connects again. With reconnection
/// disabled it stops after the first connection ends. A shutdown signal
/// stops it at any point, connected or not.
pub struct ReloadListener {
    source: Arc<dyn ReloadSource>,
    client: PostsClient,
    token: String,
    reconnect_delay: Option<Duration>,
    shutdown: Option<oneshot::Receiver<()>>,
}

impl ReloadListener {
    pub fn new(source: Arc<dyn ReloadSource>, client: PostsClient) -> Self {
        Self {
            source,
            client,
            token: RELOAD_TOKEN.to_string(),
            reconnect_delay: None,
            shutdown: None,
        }
    }

    /// Payload to react to. Defaults to [`RELOAD_TOKEN`].
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// `None` disables reconnection.
    pub fn with_reconnect_delay(mut self, delay: Option<Duration>) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Stops the listener when a value is sent or the sender is dropped.
    pub fn with_shutdown(mut self, shutdown: oneshot::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Runs until the store goes away, the shutdown signal fires, or the
    /// connection ends when reconnection is disabled.
    pub async fn run(mut self) -> ListenerStats {
        let mut shutdown = self.shutdown.take();
        let mut stats = ListenerStats::default();
        let mut delay = self.reconnect_delay;

        loop {
            let connected = tokio::select! {
                _ = signalled(&mut shutdown) => return stopped(stats),
                connected = self.source.connect() => connected,
            };
            match connected {
                Ok(mut connection) => {
                    stats.connections += 1;
                    info!(connection = stats.connections, "Reload connection opened");
                    loop {
                        let next = tokio::select! {
                            _ = signalled(&mut shutdown) => return stopped(stats),
                            next = connection.next_event() => next,
                        };
                        match next {
                            Ok(Some(event)) => {
                                stats.events += 1;
                                if !event.is_message() || event.data != self.token {
                                    debug!(event = %event.event, data = %event.data, "Ignored event");
                                    continue;
                                }
                                match self.client.refresh().await {
                                    Ok(seq) => {
                                        stats.reloads += 1;
                                        info!(seq, "Reload requested");
                                    }
                                    Err(e) => {
                                        debug!(error = %e, "Store gone, stopping listener");
                                        return stats;
                                    }
                                }
                            }
                            Ok(None) => {
                                info!("Reload connection closed by server");
                                break;
                            }
                            Err(e) => {
                                warn!(error = %e, "Reload connection lost");
                                break;
                            }
                        }
                    }
                    if let (Some(_), Some(hint)) = (delay, connection.retry_hint()) {
                        delay = Some(hint);
                    }
                }
                Err(e) => warn!(error = %e, "Reload connection failed"),
            }

            let Some(wait) = delay else {
                return stopped(stats);
            };
            if self.client.is_closed() {
                return stats;
            }
            debug!(delay_ms = wait.as_millis() as u64, "Reconnecting");
            tokio::select! {
                _ = signalled(&mut shutdown) => return stopped(stats),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

/// Resolves once the shutdown signal fires. Never resolves without one.
async fn signalled(shutdown: &mut Option<oneshot::Receiver<()>>) {
    match shutdown {
        Some(receiver) => {
            let _ = receiver.await;
        }
        None => std::future::pending().await,
    }
}

fn stopped(stats: ListenerStats) -> ListenerStats {
    info!(?stats, "Reload listener stopped");
    stats
}
