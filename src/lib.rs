//! # Posts Store
//!
//! > **A live, server-synchronised cache of blog posts.**
//!
//! The store loads the post collection from `/api/posts`, listens on the
//! `/api/reload` event stream, and swaps in a fresh snapshot every time the
//! server announces a change. Any number of readers can look at the current
//! snapshot at any time.
//!
//! ## 🏗️ Design
//!
//! ### One Writer, Many Readers
//! A [`PostsActor`](store::PostsActor) runs in its own Tokio task and is the
//! only code that writes state. It publishes whole [`PostsState`](store::PostsState)
//! values on a `watch` channel; readers borrow the latest one without going
//! through the actor.
//!
//! ### Stale-but-Available
//! A failed refresh never blanks out content. The previous snapshot stays,
//! and the error slot explains what went wrong. The next successful fetch
//! clears it.
//!
//! ### Ordered Application
//! Fetches may overlap, for example when a reload arrives while the initial
//! fetch is still running. Each fetch is numbered, and an outcome is applied
//! only if nothing newer has been applied already.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`store`])
//! - **Role**: owns the snapshot, loading flag and error slot; lifecycle
//!   (`new`/`init`/`dispose`); reads and subscriptions.
//! - **Key items**: [`PostsStore`](store::PostsStore), [`PostsActor`](store::PostsActor),
//!   [`PostsClient`](store::PostsClient).
//!
//! ### 2. The Collaborators ([`source`], [`reload`])
//! - **Role**: async traits for "fetch all posts" and "follow the reload
//!   stream", with `reqwest` implementations.
//! - **Key items**: [`PostsSource`](source::PostsSource), [`ReloadSource`](reload::ReloadSource),
//!   [`ReloadListener`](reload::ReloadListener).
//!
//! ### 3. The Orchestrator ([`lifecycle`], [`config`])
//! - **Role**: builds a production store from a [`StoreConfig`](config::StoreConfig)
//!   and sets up tracing.
//! - **Key items**: [`PostsSystem`](lifecycle::PostsSystem), [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ### 4. The Data ([`model`])
//! - [`Post`](model::Post) and [`PostMetadata`](model::PostMetadata), exactly as
//!   served.
//!
//! ## 🧪 Testing
//!
//! The [`mock`] module provides expectation-driven doubles for both
//! collaborators, so a real store can be exercised without a server.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Follow a local blog server
//! RUST_LOG=info cargo run -- --base-url http://localhost:8080
//! ```

pub mod config;
pub mod lifecycle;
pub mod mock;
pub mod model;
pub mod reload;
pub mod source;
pub mod store;
