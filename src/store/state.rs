use crate::model::Post;
use std::sync::Arc;

/// Where a store sits in its lifecycle.
///
/// `Uninitialized -> Loading -> {Ready, Errored}`. After the first applied fetch
/// the store moves between `Ready` and `Errored` on every later one; reload
/// fetches do not pass back through `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Uninitialized,
    Loading,
    Ready,
    Errored,
}

/// The observable state of a posts store.
///
/// A `PostsState` is a cheap, immutable view: the snapshot sits behind an
/// `Arc`, so cloning it never copies posts. Only the store's actor produces new
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct PostsState {
    posts: Arc<[Post]>,
    loading: bool,
    error: Option<String>,
    phase: StorePhase,
    revision: u64,
}

impl Default for PostsState {
    fn default() -> Self {
        Self {
            posts: Arc::from(Vec::<Post>::new()),
            loading: true,
            error: None,
            phase: StorePhase::Uninitialized,
            revision: 0,
        }
    }
}

impl PostsState {
    /// Current snapshot, in the order the server sent it.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Shared handle to the snapshot.
    pub fn snapshot(&self) -> Arc<[Post]> {
        Arc::clone(&self.posts)
    }

    /// True until the first fetch attempt has been applied.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the most recent applied failure. Cleared by a later success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> StorePhase {
        self.phase
    }

    /// Sequence number of the fetch whose outcome is applied, 0 before any.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// First post with the given slug.
    pub fn get_post(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.slug == slug)
    }

    pub(crate) fn begin_loading(&mut self) -> bool {
        if self.phase != StorePhase::Uninitialized {
            return false;
        }
        self.phase = StorePhase::Loading;
        true
    }

    pub(crate) fn apply_success(&mut self, revision: u64, posts: Vec<Post>) {
        self.posts = Arc::from(posts);
        self.error = None;
        self.finish(revision, StorePhase::Ready);
    }

    pub(crate) fn apply_failure(&mut self, revision: u64, message: String) {
        self.error = Some(message);
        self.finish(revision, StorePhase::Errored);
    }

    fn finish(&mut self, revision: u64, phase: StorePhase) {
        self.revision = revision;
        self.loading = false;
        self.phase = phase;
    }
}
