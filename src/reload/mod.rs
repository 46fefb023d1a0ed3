//! # Reload Channel
//!
//! The server pushes a `text/event-stream` on `/api/reload` and emits a
//! `data: reload` event whenever post content changes on disk.
//!
//! - [`ReloadSource`] / [`ReloadConnection`] - the seam the store listens through.
//! - [`SseReloadSource`] - `reqwest` implementation.
//! - [`EventStreamDecoder`] - incremental event-stream framing.
//! - [`ReloadListener`] - the task that turns `reload` events into refreshes and
//!   reconnects when the stream drops.

pub mod decoder;
pub mod listener;
pub mod sse;

pub use decoder::*;
pub use listener::*;
pub use sse::*;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Payload that triggers a refetch.
pub const RELOAD_TOKEN: &str = "reload";

/// Event type assigned when the stream does not name one.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One dispatched server event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    /// `event:` field, or [`DEFAULT_EVENT_TYPE`].
    pub event: String,
    pub data: String,
    /// Last `id:` seen on the stream, if any.
    pub id: Option<String>,
}

impl ReloadEvent {
    /// An unnamed event carrying `data`, as produced by `data: <payload>`.
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event: DEFAULT_EVENT_TYPE.to_string(),
            data: data.into(),
            id: None,
        }
    }

    /// Only unnamed (`message`) events are delivered to the reload handler.
    pub fn is_message(&self) -> bool {
        self.event == DEFAULT_EVENT_TYPE
    }
}

/// Failures of the push connection. These are logged, never stored in the
/// error slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReloadError {
    #[error("Reload connection failed: {0}")]
    Connect(String),

    #[error("Reload endpoint returned status {0}")]
    Status(u16),

    #[error("Reload stream interrupted: {0}")]
    Stream(String),
}

/// Opens push connections.
#[async_trait]
pub trait ReloadSource: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn ReloadConnection>, ReloadError>;
}

/// An open push connection.
#[async_trait]
pub trait ReloadConnection: Send {
    /// Next dispatched event, `Ok(None)` once the server closes the stream.
    async fn next_event(&mut self) -> Result<Option<ReloadEvent>, ReloadError>;

    /// Reconnect delay requested by the server through a `retry:` field.
    fn retry_hint(&self) -> Option<Duration> {
        None
    }
}
