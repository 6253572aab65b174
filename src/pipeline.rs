//! End-to-end stages: events file to grid, grid to heatmap, heatmap to PNG.

use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::NaiveDate;

use crate::{
    config::file::SleepGridConfig,
    foundation::error::SleepGridResult,
    grid::{
        builder::{BucketGrid, BucketGridBuilder, BuildOutcome},
        index::GridParams,
    },
    ingest::source::{IngestReport, load_events},
    render::{
        compositor::{CompositorOpts, Heatmap, HeatmapCompositor, HeatmapPalette},
        labels::SectionLabel,
        layout::{HeatmapLayout, LayoutParams, MonthPolicy},
        poster::{PosterOpts, render_poster, save_png},
    },
};

/// A parsed events file.
#[derive(Clone, Debug)]
pub struct ParsedEvents {
    /// The grid and its day zero.
    pub outcome: BuildOutcome,
    /// Row accounting from the reader.
    pub report: IngestReport,
}

/// Read `input` and build the dense grid at resolution `params`.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn parse_events(
    input: &Path,
    cfg: &SleepGridConfig,
    params: GridParams,
) -> SleepGridResult<ParsedEvents> {
    let channels = cfg.channels();
    let loaded = load_events(input, &cfg.source(), &channels)?;
    let outcome = BucketGridBuilder::new(params, channels).build(&loaded.events)?;

    let stats = &outcome.stats;
    if stats.degenerate_intervals + stats.out_of_range_cells + stats.rerouted_events > 0 {
        tracing::info!(
            degenerate_intervals = stats.degenerate_intervals,
            out_of_range_cells = stats.out_of_range_cells,
            rerouted_events = stats.rerouted_events,
            "recovered while bucketizing"
        );
    }
    outcome.grid.summary().log();

    Ok(ParsedEvents {
        outcome,
        report: loaded.report,
    })
}

/// Everything the renderer needs besides the grid and palette.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderParams {
    /// Calendar date of day index 0, used for month boundaries.
    pub day_zero: NaiveDate,
    /// Month boundaries and truncation.
    pub policy: MonthPolicy,
    /// Hour the grid's days start at.
    pub day_start_hour: u32,
    /// Column widths.
    pub layout: LayoutParams,
    /// Painting options.
    pub compositor: CompositorOpts,
}

/// Lay out and paint `grid`.
#[tracing::instrument(skip_all, fields(day_zero = %params.day_zero, days = grid.total_days()))]
pub fn render_heatmap(
    grid: &BucketGrid,
    palette: &HeatmapPalette,
    params: &RenderParams,
) -> SleepGridResult<Heatmap> {
    let grid_params = GridParams::new(params.day_start_hour, grid.bucket_minutes())?;
    let layout = HeatmapLayout::compute(
        grid.total_days(),
        params.day_zero,
        params.policy,
        grid_params,
        params.layout,
    )?;
    HeatmapCompositor::new(&layout, palette, params.compositor).paint(grid)
}

/// Write the section labels as a JSON array of `{column, text}`.
pub fn write_labels_json(labels: &[SectionLabel], path: &Path) -> SleepGridResult<()> {
    create_parent_dir(path)?;
    let file = fs::File::create(path)
        .with_context(|| format!("create labels file '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), labels)
        .with_context(|| format!("write labels '{}'", path.display()))?;
    tracing::info!(path = %path.display(), labels = labels.len(), "saved labels");
    Ok(())
}

/// Where rendered output goes.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutput {
    /// Poster PNG.
    pub image: PathBuf,
    /// Optional labels sidecar.
    pub labels_json: Option<PathBuf>,
    /// Poster scale, margins and text.
    pub poster: PosterOpts,
}

/// Render `grid` to a poster PNG (and labels sidecar, if asked).
pub fn render_to_files(
    grid: &BucketGrid,
    palette: &HeatmapPalette,
    params: &RenderParams,
    output: &RenderOutput,
) -> SleepGridResult<Heatmap> {
    let heatmap = render_heatmap(grid, palette, params)?;
    let poster = render_poster(&heatmap, &output.poster)?;
    save_png(&poster, &output.image)?;
    if let Some(path) = &output.labels_json {
        write_labels_json(&heatmap.labels, path)?;
    }
    Ok(heatmap)
}

/// Options for [`run`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunOpts {
    /// Events CSV.
    pub input: PathBuf,
    /// Bucket width; must divide a day.
    pub bucket_minutes: u32,
    /// Also keep the bucketed artifact here.
    pub save_buckets: Option<PathBuf>,
    /// Layout and paint settings.
    pub render: RenderParams,
    /// Output paths and poster options.
    pub output: RenderOutput,
}

/// Parse, optionally save the grid, then render.
#[tracing::instrument(skip_all, fields(input = %opts.input.display()))]
pub fn run(cfg: &SleepGridConfig, opts: &RunOpts) -> SleepGridResult<(ParsedEvents, Heatmap)> {
    let params = GridParams::new(opts.render.day_start_hour, opts.bucket_minutes)?;
    let parsed = parse_events(&opts.input, cfg, params)?;

    let observed = parsed.outcome.day_zero.date();
    if observed != opts.render.day_zero {
        tracing::warn!(
            %observed,
            requested = %opts.render.day_zero,
            "day zero differs from the first event; month boundaries follow the requested date"
        );
    }

    if let Some(path) = &opts.save_buckets {
        crate::grid::artifact::save_csv(&parsed.outcome.grid, path)?;
    }

    let heatmap = render_to_files(
        &parsed.outcome.grid,
        &cfg.palette(),
        &opts.render,
        &opts.output,
    )?;
    Ok((parsed, heatmap))
}

fn create_parent_dir(path: &Path) -> SleepGridResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
