//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//!
//! The subscriber uses a compact format without module paths
//! (`with_target(false)`); events carry their context as fields instead.
//!
//! ## What Gets Traced
//!
//! - **Store Lifecycle**: started, initialized, dormant, disposed
//! - **Fetches**: issued (`debug`), snapshot replaced (`info`), superseded
//!   results discarded (`debug`), failures (`error`, with the status when the
//!   server answered)
//! - **Reload Channel**: connection opened/closed/lost, ignored events
//!   (`debug`), reloads requested
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle and snapshot changes
//! RUST_LOG=info posts-watch
//!
//! # Every issued fetch and ignored event
//! RUST_LOG=debug posts-watch
//!
//! # Only the store internals
//! RUST_LOG=posts_store::store=debug posts-watch
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**, a server restart followed by a content change:
//!
//! ```text
//! INFO Starting posts store posts_url="http://localhost:8080/api/posts" reload_url="http://localhost:8080/api/reload"
//! INFO Store initialized
//! INFO Store started
//! INFO Reload connection opened connection=1
//! INFO Snapshot replaced revision=1 posts=12
//! WARN Reload connection lost error=Reload stream interrupted: ...
//! INFO Reload connection opened connection=2
//! INFO Reload requested seq=2
//! INFO Snapshot replaced revision=2 posts=13
//! ```

/// Initializes the global subscriber, filtered by `RUST_LOG`.
///
/// Call once, from the binary. Library code only emits events.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
