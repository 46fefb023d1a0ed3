//! Pure data structures (DTOs) for the `/api/posts` payload.

pub mod post;

pub use post::*;
