//! Turning a bucket grid into pixels: geometry, painting and the annotated poster.

/// Straight/premultiplied RGBA8 blending helpers.
pub mod composite;
/// Grid to heatmap pixel painting.
pub mod compositor;
/// Age labels and hour captions.
pub mod labels;
/// Column and row geometry.
pub mod layout;
/// Annotated PNG output.
pub mod poster;
