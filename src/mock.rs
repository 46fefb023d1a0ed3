//! # Mock Collaborators
//!
//! Test doubles for the two seams of the store.
//!
//! - [`MockPostsSource`] answers fetches from a queue of expectations, in order.
//!   An expectation can answer immediately or be [deferred](FetchExpectationBuilder::deferred)
//!   and resolved later, which is how overlapping fetches are staged.
//! - [`MockReloadSource`] hands out connections opened with
//!   [`MockReloadSource::open`]; events pushed into a [`MockReloadChannel`] are
//!   delivered to whoever connected. Dropping the channel ends the connection.
//!
//! # Example
//! ```ignore
//! let mock = MockPostsSource::new();
//! mock.expect_fetch().return_ok(vec![Post::new("a", "C")]);
//! mock.expect_fetch().return_status(500);
//!
//! let source = mock.source();
//! // ... drive the store ...
//! mock.verify(); // every expectation consumed
//! ```

use crate::model::Post;
use crate::reload::{ReloadConnection, ReloadError, ReloadEvent, ReloadSource};
use crate::source::{FetchError, PostsSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

type FetchResult = Result<Vec<Post>, FetchError>;

// =============================================================================
// POSTS SOURCE
// =============================================================================

enum Expectation {
    Respond(FetchResult),
    Deferred(oneshot::Receiver<FetchResult>),
}

/// A [`PostsSource`] driven by queued expectations.
#[derive(Clone, Default)]
pub struct MockPostsSource {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    calls: Arc<AtomicUsize>,
}

impl MockPostsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The source to hand to the store. Shares the expectation queue.
    pub fn source(&self) -> Arc<dyn PostsSource> {
        Arc::new(self.clone())
    }

    /// Queues the answer to the next fetch.
    pub fn expect_fetch(&self) -> FetchExpectationBuilder {
        FetchExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Number of fetches issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Panics if some expectation was never consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all fetch expectations were met. {} remaining", remaining);
        }
    }
}

#[async_trait]
impl PostsSource for MockPostsSource {
    async fn fetch_posts(&self) -> Result<Vec<Post>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.expectations.lock().unwrap().pop_front();
        match next {
            Some(Expectation::Respond(result)) => result,
            Some(Expectation::Deferred(receiver)) => receiver
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("deferred fetch dropped".into()))),
            None => Err(FetchError::Network("unexpected fetch".into())),
        }
    }
}

/// Builder for one fetch expectation.
pub struct FetchExpectationBuilder {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl FetchExpectationBuilder {
    pub fn return_ok(self, posts: Vec<Post>) {
        self.push(Expectation::Respond(Ok(posts)));
    }

    /// Simulates a non-success HTTP status.
    pub fn return_status(self, status: u16) {
        self.push(Expectation::Respond(Err(FetchError::Server { status })));
    }

    pub fn return_err(self, error: FetchError) {
        self.push(Expectation::Respond(Err(error)));
    }

    /// The fetch stays pending until the returned handle is resolved.
    pub fn deferred(self) -> DeferredFetch {
        let (sender, receiver) = oneshot::channel();
        self.push(Expectation::Deferred(receiver));
        DeferredFetch { sender }
    }

    fn push(self, expectation: Expectation) {
        self.expectations.lock().unwrap().push_back(expectation);
    }
}

/// A pending fetch answer.
pub struct DeferredFetch {
    sender: oneshot::Sender<FetchResult>,
}

impl DeferredFetch {
    pub fn resolve_ok(self, posts: Vec<Post>) {
        let _ = self.sender.send(Ok(posts));
    }

    pub fn resolve_status(self, status: u16) {
        let _ = self.sender.send(Err(FetchError::Server { status }));
    }

    pub fn resolve_err(self, error: FetchError) {
        let _ = self.sender.send(Err(error));
    }
}

// =============================================================================
// RELOAD SOURCE
// =============================================================================

type Frame = Result<ReloadEvent, ReloadError>;

/// A [`ReloadSource`] whose connections are opened by the test.
#[derive(Clone, Default)]
pub struct MockReloadSource {
    connections: Arc<Mutex<VecDeque<MockConnection>>>,
    connects: Arc<AtomicUsize>,
}

impl MockReloadSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Arc<dyn ReloadSource> {
        Arc::new(self.clone())
    }

    /// Queues a connection for the next `connect` and returns its sending end.
    pub fn open(&self) -> MockReloadChannel {
        self.open_with_retry(None)
    }

    /// Like [`open`](Self::open), with a server `retry:` hint.
    pub fn open_with_retry(&self, retry: Option<Duration>) -> MockReloadChannel {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.connections
            .lock()
            .unwrap()
            .push_back(MockConnection { receiver, retry });
        MockReloadChannel { sender }
    }

    /// Number of connection attempts, successful or not.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReloadSource for MockReloadSource {
    async fn connect(&self) -> Result<Box<dyn ReloadConnection>, ReloadError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.connections.lock().unwrap().pop_front();
        match next {
            Some(connection) => Ok(Box::new(connection)),
            None => Err(ReloadError::Connect("no mock connection queued".into())),
        }
    }
}

struct MockConnection {
    receiver: mpsc::UnboundedReceiver<Frame>,
    retry: Option<Duration>,
}

#[async_trait]
impl ReloadConnection for MockConnection {
    async fn next_event(&mut self) -> Result<Option<ReloadEvent>, ReloadError> {
        self.receiver.recv().await.transpose()
    }

    fn retry_hint(&self) -> Option<Duration> {
        self.retry
    }
}

/// The server side of a mock reload connection.
pub struct MockReloadChannel {
    sender: mpsc::UnboundedSender<Frame>,
}

impl MockReloadChannel {
    /// Pushes an unnamed event with the given data.
    pub fn send(&self, data: &str) {
        let _ = self.sender.send(Ok(ReloadEvent::message(data)));
    }

    pub fn send_event(&self, event: ReloadEvent) {
        let _ = self.sender.send(Ok(event));
    }

    /// Breaks the connection with an error.
    pub fn fail(&self, error: ReloadError) {
        let _ = self.sender.send(Err(error));
    }

    /// Ends the connection cleanly.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_expectations_are_consumed_in_order() {
        let mock = MockPostsSource::new();
        mock.expect_fetch().return_ok(vec![Post::new("a", "C")]);
        mock.expect_fetch().return_status(500);

        let source = mock.source();
        assert_eq!(source.fetch_posts().await.unwrap()[0].slug, "a");
        assert_eq!(
            source.fetch_posts().await,
            Err(FetchError::Server { status: 500 })
        );
        assert_eq!(mock.calls(), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn unexpected_fetch_is_a_network_error() {
        let mock = MockPostsSource::new();
        let result = mock.source().fetch_posts().await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn deferred_fetch_waits_for_resolution() {
        let mock = MockPostsSource::new();
        let gate = mock.expect_fetch().deferred();

        let source = mock.source();
        let pending = tokio::spawn(async move { source.fetch_posts().await });
        gate.resolve_ok(vec![Post::new("late", "")]);

        let posts = pending.await.unwrap().unwrap();
        assert_eq!(posts[0].slug, "late");
    }

    #[tokio::test]
    async fn reload_connection_delivers_then_ends() {
        let mock = MockReloadSource::new();
        let channel = mock.open();
        channel.send("ping");
        channel.fail(ReloadError::Stream("reset".into()));
        channel.close();

        let mut connection = mock.source().connect().await.unwrap();
        assert_eq!(
            connection.next_event().await,
            Ok(Some(ReloadEvent::message("ping")))
        );
        assert!(connection.next_event().await.is_err());
        assert_eq!(connection.next_event().await, Ok(None));

        assert!(mock.source().connect().await.is_err());
        assert_eq!(mock.connects(), 2);
    }

    #[test]
    #[should_panic(expected = "Not all fetch expectations were met")]
    fn verify_panics_on_leftovers() {
        let mock = MockPostsSource::new();
        mock.expect_fetch().return_ok(Vec::new());
        mock.verify();
    }
}
