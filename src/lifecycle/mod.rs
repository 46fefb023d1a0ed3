//! # Store Lifecycle & Orchestration
//!
//! Wiring a store for production means building an HTTP client, the two
//! transport sources and the store itself from one [`StoreConfig`](crate::config::StoreConfig).
//! [`PostsSystem`] does that and owns the shutdown path.
//!
//! ## Shutdown
//!
//! 1. **Stop the listener** - the reload connection is closed and no further
//!    event is acted upon
//! 2. **Stop the actor** - a `Shutdown` request is sent; in-flight fetches are
//!    aborted
//! 3. **Await completion** - both tasks are joined; a panic surfaces as
//!    [`StoreError::TaskFailed`](crate::store::StoreError::TaskFailed)
//!
//! The last published state stays readable after shutdown.
//!
//! ## Observability
//!
//! [`setup_tracing`] initializes structured logging; see the [`tracing`](self::tracing)
//! module for what is traced.

pub mod posts_system;
pub mod tracing;

pub use posts_system::*;
pub use self::tracing::*;
