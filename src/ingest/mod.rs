//! Reading caregiving events from tracking-app exports.

/// CSV event source.
pub mod source;
/// Timestamp parsing.
pub mod timestamp;
