//! The bucketed time grid: coordinates, channels, events and the dense grid built from them.

/// Bucketed CSV artifact.
pub mod artifact;
/// Event to sparse occupancy mapping.
pub mod bucketize;
/// Dense grid construction.
pub mod builder;
/// Channel catalog and medication normalization.
pub mod channel;
/// Typed input events.
pub mod event;
/// Timestamp to grid coordinate mapping.
pub mod index;
