//! Paints a [`BucketGrid`] onto an RGBA buffer using a [`HeatmapLayout`].
//!
//! Z-order, later layers overwriting earlier ones on the same pixel:
//!
//! 1. work-hours band across all columns
//! 2. month separator lines over the middle half of the rows
//! 3. sleep, filled across each day's columns
//! 4. feed, same span
//! 5. medications in channel order, on the `(row + col) % 2 == 0` checkerboard only
//! 6. midnight overlay, blended into the three rows around midnight
//!
//! Every layer is confined to a single row, so painting row by row gives the same pixels as
//! painting layer by layer. Rows are independent and may be painted in parallel.

use std::{collections::BTreeMap, ops::Range};

use rayon::prelude::*;

use crate::{
    foundation::{
        core::Rgba8,
        error::{SleepGridError, SleepGridResult},
    },
    grid::{
        builder::BucketGrid,
        channel::{Channel, OTHER_MEDICATION},
    },
    render::{
        composite::tint_rgb_in_place,
        labels::{SectionLabel, section_labels},
        layout::HeatmapLayout,
    },
};

/// Built-in medication colors, used when configuration does not name one.
pub const DEFAULT_MEDICATION_COLORS: &[(&str, Rgba8)] = &[
    ("Tylenol", Rgba8::new(0xFF, 0x00, 0x80, 0xFF)),
    ("Motrin", Rgba8::new(0xFF, 0x33, 0x33, 0xFF)),
    ("Pepcid", Rgba8::new(0xCC, 0xFF, 0x00, 0xFF)),
    ("Gas Relief Drops", Rgba8::new(0x99, 0x00, 0xFF, 0xFF)),
    ("Gripe Water", Rgba8::new(0xFF, 0xFF, 0x66, 0xFF)),
    ("Vitamin D", Rgba8::new(0xFF, 0xD7, 0x00, 0xFF)),
    ("Probiotics", Rgba8::new(0xFF, 0x66, 0xB2, 0xFF)),
    ("Other", Rgba8::WHITE),
];

/// Color for a medication nobody named a color for.
pub const FALLBACK_MEDICATION_COLOR: Rgba8 = Rgba8::WHITE;

/// Alpha of the work-hours band.
pub const WORK_HOURS_ALPHA: f32 = 0.15;

/// Strength of the midnight tint.
pub const MIDNIGHT_ALPHA: f32 = 0.35;

/// Colors used by the compositor.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapPalette {
    /// Sleep cells.
    pub sleep: Rgba8,
    /// Feed cells.
    pub feed: Rgba8,
    /// Month separator lines.
    pub separator: Rgba8,
    /// Work-hours band, painted with [`WORK_HOURS_ALPHA`].
    pub work_hours: Rgba8,
    /// Tint blended into the midnight rows.
    pub midnight: Rgba8,
    /// Strength of the midnight tint.
    pub midnight_alpha: f32,
    /// Per-medication overrides.
    pub medications: BTreeMap<String, Rgba8>,
}

impl Default for HeatmapPalette {
    fn default() -> Self {
        Self {
            sleep: Rgba8::new(0x3D, 0xD2, 0xE6, 0xFF),
            feed: Rgba8::new(0xD5, 0x62, 0x2F, 0xFF),
            separator: Rgba8::new(0x9B, 0x59, 0xB6, 0xFF),
            work_hours: Rgba8::new(0x9B, 0x59, 0xB6, 0xFF),
            midnight: Rgba8::WHITE,
            midnight_alpha: MIDNIGHT_ALPHA,
            medications: BTreeMap::new(),
        }
    }
}

impl HeatmapPalette {
    /// Color of `medication`: configured override, then built-in table, then neutral fallback.
    pub fn medication(&self, medication: &str) -> Rgba8 {
        if let Some(c) = self.medications.get(medication) {
            return *c;
        }
        DEFAULT_MEDICATION_COLORS
            .iter()
            .find(|(name, _)| *name == medication)
            .map_or(FALLBACK_MEDICATION_COLOR, |(_, c)| *c)
    }

    /// The work-hours band as painted.
    pub fn work_hours_fill(&self) -> Rgba8 {
        self.work_hours.with_alpha(WORK_HOURS_ALPHA)
    }
}

/// Straight-alpha RGBA8 image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> SleepGridResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| SleepGridError::evaluation("pixel buffer size overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Wrap raw RGBA8 bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> SleepGridResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(SleepGridError::evaluation(format!(
                "pixel buffer of {} bytes does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the byte buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at `(x, y)`; out of bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        if x >= self.width || y >= self.height {
            return Rgba8::TRANSPARENT;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        Rgba8::from_slice(&self.data[idx..idx + 4])
    }

    fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

/// A legend entry for the poster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
    /// Swatch color.
    pub color: Rgba8,
    /// Caption.
    pub label: String,
}

/// Compositor output: pixels plus everything a text renderer needs to annotate them.
#[derive(Clone, Debug)]
pub struct Heatmap {
    /// One row per bucket, `layout.total_cols()` columns.
    pub pixels: PixelBuffer,
    /// Section labels at heatmap columns.
    pub labels: Vec<SectionLabel>,
    /// Sleep, feeding and each non-`Other` medication with data in the displayed range.
    pub legend: Vec<LegendEntry>,
    /// Geometry the pixels were painted with.
    pub layout: HeatmapLayout,
    /// Palette the pixels were painted with.
    pub palette: HeatmapPalette,
}

/// Painting options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Paint rows with rayon.
    pub parallel: bool,
}

struct ChannelPaint {
    channel_idx: usize,
    color: Rgba8,
    checkerboard: bool,
}

/// Paints grids with a fixed layout and palette.
#[derive(Debug)]
pub struct HeatmapCompositor<'a> {
    layout: &'a HeatmapLayout,
    palette: &'a HeatmapPalette,
    opts: CompositorOpts,
}

impl<'a> HeatmapCompositor<'a> {
    /// Compositor painting into `layout` with `palette`.
    pub fn new(layout: &'a HeatmapLayout, palette: &'a HeatmapPalette, opts: CompositorOpts) -> Self {
        Self {
            layout,
            palette,
            opts,
        }
    }

    /// Paint `grid`, whose day 0 must be the layout's day 0.
    #[tracing::instrument(skip_all, fields(parallel = self.opts.parallel))]
    pub fn paint(&self, grid: &BucketGrid) -> SleepGridResult<Heatmap> {
        let layout = self.layout;
        let expected_bucket = layout.grid_params().bucket_minutes();
        if grid.bucket_minutes() != expected_bucket {
            return Err(SleepGridError::evaluation(format!(
                "grid uses {}-minute buckets but layout expects {expected_bucket}",
                grid.bucket_minutes()
            )));
        }
        if layout.displayed_days() > grid.total_days() {
            return Err(SleepGridError::evaluation(format!(
                "layout shows {} days but grid has {}",
                layout.displayed_days(),
                grid.total_days()
            )));
        }

        let layers = self.channel_layers(grid);
        let days: Vec<Range<usize>> = (0..layout.displayed_days())
            .map(|d| {
                let r = layout.day_columns(d);
                r.start as usize..r.end as usize
            })
            .collect();
        let separators: Vec<Range<usize>> = layout
            .separators()
            .map(|(_, r)| r.start as usize..r.end as usize)
            .collect();

        let mut pixels = PixelBuffer::new(layout.total_cols(), layout.rows())?;
        let stride = pixels.stride();
        let painter = RowPainter {
            layout,
            palette: self.palette,
            grid,
            layers: &layers,
            days: &days,
            separators: &separators,
        };
        if stride > 0 {
            if self.opts.parallel {
                pixels
                    .data
                    .par_chunks_mut(stride)
                    .enumerate()
                    .for_each(|(row, out)| painter.paint_row(row as u32, out));
            } else {
                pixels
                    .data
                    .chunks_mut(stride)
                    .enumerate()
                    .for_each(|(row, out)| painter.paint_row(row as u32, out));
            }
        }

        let labels = section_labels(layout);
        let legend = self.legend(grid);
        tracing::info!(
            width = pixels.width(),
            height = pixels.height(),
            labels = labels.len(),
            legend = legend.len(),
            "painted heatmap"
        );

        Ok(Heatmap {
            pixels,
            labels,
            legend,
            layout: layout.clone(),
            palette: self.palette.clone(),
        })
    }

    // Sleep, feed, then medications in channel order.
    fn channel_layers(&self, grid: &BucketGrid) -> Vec<ChannelPaint> {
        let channels = grid.channels();
        let mut layers = Vec::with_capacity(channels.len());
        if let Some(idx) = channels.position(&Channel::Asleep) {
            layers.push(ChannelPaint {
                channel_idx: idx,
                color: self.palette.sleep,
                checkerboard: false,
            });
        }
        if let Some(idx) = channels.position(&Channel::Feed) {
            layers.push(ChannelPaint {
                channel_idx: idx,
                color: self.palette.feed,
                checkerboard: false,
            });
        }
        for (idx, name) in channels.medication_channels() {
            layers.push(ChannelPaint {
                channel_idx: idx,
                color: self.palette.medication(name),
                checkerboard: true,
            });
        }
        layers
    }

    fn legend(&self, grid: &BucketGrid) -> Vec<LegendEntry> {
        let shown = Some(self.layout.displayed_days());
        let mut legend = vec![
            LegendEntry {
                color: self.palette.sleep,
                label: "Sleep".to_owned(),
            },
            LegendEntry {
                color: self.palette.feed,
                label: "Feeding".to_owned(),
            },
        ];
        legend.extend(
            grid.channels()
                .medication_channels()
                .filter(|(idx, name)| *name != OTHER_MEDICATION && grid.occupied(*idx, shown) > 0)
                .map(|(_, name)| LegendEntry {
                    color: self.palette.medication(name),
                    label: name.to_owned(),
                }),
        );
        legend
    }
}

struct RowPainter<'a> {
    layout: &'a HeatmapLayout,
    palette: &'a HeatmapPalette,
    grid: &'a BucketGrid,
    layers: &'a [ChannelPaint],
    days: &'a [Range<usize>],
    separators: &'a [Range<usize>],
}

impl RowPainter<'_> {
    fn paint_row(&self, row: u32, out: &mut [u8]) {
        let bands = self.layout.bands();

        if bands.work_rows().contains(&row) {
            fill(out, 0..out.len() / 4, self.palette.work_hours_fill());
        }

        if self.layout.separator_rows().contains(&row) {
            for cols in self.separators {
                fill(out, cols.clone(), self.palette.separator);
            }
        }

        for layer in self.layers {
            for (day, cols) in self.days.iter().enumerate() {
                if !self.grid.get(layer.channel_idx, day as u32, row) {
                    continue;
                }
                if layer.checkerboard {
                    for col in cols.clone() {
                        if (row as usize + col).is_multiple_of(2) {
                            put(out, col, layer.color);
                        }
                    }
                } else {
                    fill(out, cols.clone(), layer.color);
                }
            }
        }

        if bands.midnight_rows(self.layout.rows()).contains(&row) {
            tint_rgb_in_place(out, self.palette.midnight, self.palette.midnight_alpha);
        }
    }
}

fn put(row: &mut [u8], col: usize, color: Rgba8) {
    if let Some(px) = row.get_mut(col * 4..col * 4 + 4) {
        px.copy_from_slice(&color.to_array());
    }
}

fn fill(row: &mut [u8], cols: Range<usize>, color: Rgba8) {
    let px = color.to_array();
    let end = (cols.end * 4).min(row.len());
    let start = (cols.start * 4).min(end);
    for d in row[start..end].chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
