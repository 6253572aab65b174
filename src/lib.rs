//! sleepgrid turns baby-tracker exports into calendar-aligned heatmaps.
//!
//! - Read sleep, feed and medication events from a CSV export ([`ingest`])
//! - Bucketize them onto a day × time-of-day grid ([`grid`])
//! - Lay the grid out by month of age and paint it ([`render`])
//! - Or do all of it at once with [`pipeline::run`]
#![forbid(unsafe_code)]

/// YAML/JSON configuration.
pub mod config;
mod foundation;
/// Bucketed time grid.
pub mod grid;
/// Event sources.
pub mod ingest;
/// End-to-end stages.
pub mod pipeline;
/// Layout, painting and poster output.
pub mod render;

pub use crate::config::file::SleepGridConfig;
pub use crate::foundation::core::Rgba8;
pub use crate::foundation::error::{SleepGridError, SleepGridResult};
pub use crate::grid::builder::{BucketGrid, BucketGridBuilder, BuildOutcome};
pub use crate::grid::channel::{Channel, ChannelSet};
pub use crate::grid::event::{Event, EventKind};
pub use crate::grid::index::{BucketKey, DayIndexer, GridParams};
pub use crate::render::compositor::{
    CompositorOpts, Heatmap, HeatmapCompositor, HeatmapPalette, PixelBuffer,
};
pub use crate::render::layout::{HeatmapLayout, LayoutParams, MonthPolicy};
pub use crate::render::poster::PosterOpts;
