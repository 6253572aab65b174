//! User configuration.

/// Color values as written in configuration.
pub mod color;
/// The configuration document and its loaders.
pub mod file;
