//! Server adapters
//!
//! Framework-specific HTTP surfaces over the library. Each adapter sits
//! behind its own feature flag.
//!
//! - **Axum**: [`axum::pricing_router`] serves the token-cost estimator
//!   (requires the `server-adapters` feature)

#[cfg(feature = "server-adapters")]
pub mod axum;
