//! # Post Sources
//!
//! The store never talks to the network directly. It calls a [`PostsSource`],
//! which returns the full post collection or a [`FetchError`].
//!
//! - [`HttpPostsSource`] - production implementation backed by `reqwest`.
//! - [`crate::mock::MockPostsSource`] - expectation-driven double for tests.

pub mod http;

pub use http::*;

use crate::model::Post;
use async_trait::async_trait;
use thiserror::Error;

/// Message stored in the error slot for any non-success status.
pub const SERVER_FAILURE_MESSAGE: &str = "Failed to fetch posts";

/// Ways a single fetch attempt can fail.
///
/// The `Display` output of each variant is exactly what the store publishes
/// in its error slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not complete (connect, DNS, transport timeout).
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-success status. Only the status is kept,
    /// and it is not part of the user-facing message.
    #[error("Failed to fetch posts")]
    Server { status: u16 },

    /// The body was not a JSON array of posts.
    #[error("{0}")]
    Decode(String),

    /// The fetch task died before producing a result.
    #[error("{0}")]
    Task(String),
}

impl FetchError {
    /// Status code for server failures, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Server { status } => Some(*status),
            _ => None,
        }
    }
}

/// Anything that can produce a complete snapshot of posts.
///
/// Implementations must be cheap to call concurrently: the store issues a new
/// fetch for every reload signal without waiting for earlier ones.
#[async_trait]
pub trait PostsSource: Send + Sync + 'static {
    /// Fetches the whole collection. Never partial.
    async fn fetch_posts(&self) -> Result<Vec<Post>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_failure_message_hides_status() {
        let err = FetchError::Server { status: 503 };
        assert_eq!(err.to_string(), SERVER_FAILURE_MESSAGE);
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn network_and_decode_carry_their_text() {
        assert_eq!(
            FetchError::Network("connection refused".into()).to_string(),
            "connection refused"
        );
        assert_eq!(
            FetchError::Decode("expected value at line 1 column 1".into()).to_string(),
            "expected value at line 1 column 1"
        );
        assert_eq!(FetchError::Decode(String::new()).status(), None);
    }
}
