//! Shared primitives and the crate error type.

/// Color primitives.
pub mod core;
/// Error type and result alias.
pub mod error;
