//! Error handling types for redguard.
//!
//! Resolver lookups never fail, pricing gaps are reported inside the estimate,
//! and everything the adapter cannot complete surfaces as an [`LlmError`].

mod conversions;
pub mod helpers;
pub mod types;

pub use helpers::{FailureKind, describe_failure, extract_provider_message, failure_kind};
pub use types::*;
