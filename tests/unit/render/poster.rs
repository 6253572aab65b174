use chrono::NaiveDate;

use super::*;
use crate::{
    grid::{
        builder::BucketGrid,
        channel::{Channel, ChannelSet},
        index::{BucketKey, GridParams},
    },
    render::{
        compositor::{CompositorOpts, HeatmapCompositor, HeatmapPalette},
        layout::{HeatmapLayout, LayoutParams, MonthPolicy},
    },
};

fn heatmap(days: u32) -> Heatmap {
    let params = GridParams::new(7, 60).unwrap();
    let mut grid = BucketGrid::empty(60, days, ChannelSet::default()).unwrap();
    grid.set(0, BucketKey::new(0, 0));
    let tylenol = grid
        .channels()
        .position(&Channel::Med("Tylenol".into()))
        .unwrap();
    grid.set(tylenol, BucketKey::new(0, 60));

    let layout = HeatmapLayout::compute(
        days,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        MonthPolicy::default(),
        params,
        LayoutParams::default(),
    )
    .unwrap();
    let palette = HeatmapPalette::default();
    HeatmapCompositor::new(&layout, &palette, CompositorOpts::default())
        .paint(&grid)
        .unwrap()
}

#[test]
fn base_size_adds_margins_and_legend() {
    let hm = heatmap(40);
    let opts = PosterOpts::default();
    // Sleep, Feeding, Tylenol.
    assert_eq!(hm.legend.len(), 3);
    assert_eq!(
        opts.base_size(&hm),
        (60 + hm.layout.total_cols(), 25 + 24 + 3 * 12 + 15)
    );
}

#[test]
fn svg_carries_labels_captions_and_legend() {
    let hm = heatmap(40);
    let svg = poster_svg(&hm, &PosterOpts::default());
    assert!(svg.contains(">Born</text>"));
    assert!(svg.contains(">1 mo</text>"));
    assert!(svg.contains(">7 am</text>"));
    assert!(svg.contains(">9 - 5</text>"));
    assert!(svg.contains(">midnight</text>"));
    assert!(svg.contains(">Feeding</text>"));
    assert!(svg.contains(">Tylenol</text>"));
    assert!(svg.contains("fill=\"#FF0080\""));
    assert!(!svg.contains(">Other</text>"));
}

#[test]
fn svg_text_is_escaped() {
    let mut hm = heatmap(2);
    hm.legend[0].label = "Sleep & <naps>".into();
    let svg = poster_svg(&hm, &PosterOpts::default());
    assert!(svg.contains("Sleep &amp; &lt;naps&gt;"));
}

#[test]
fn heatmap_is_placed_at_the_margins_and_scaled() {
    let hm = heatmap(2);
    let opts = PosterOpts {
        scale: 2,
        ..PosterOpts::default()
    };
    let poster = render_poster(&hm, &opts).unwrap();
    let (bw, bh) = opts.base_size(&hm);
    assert_eq!((poster.width(), poster.height()), (bw * 2, bh * 2));

    let sleep = HeatmapPalette::default().sleep;
    for (x, y) in [(120, 50), (121, 51), (131, 50)] {
        assert_eq!(poster.pixel(x, y), sleep, "({x}, {y})");
    }
    // Second day lane, first row: nothing painted.
    assert_eq!(poster.pixel(120 + 16, 50).a, 0);
}

#[test]
fn zero_scale_is_rejected() {
    let hm = heatmap(2);
    let zero = PosterOpts {
        scale: 0,
        ..PosterOpts::default()
    };
    assert!(matches!(
        render_poster(&hm, &zero),
        Err(SleepGridError::Validation(_))
    ));
}

#[test]
fn scale_is_lowered_to_fit_the_pixel_budget() {
    let hm = heatmap(2);
    let (bw, bh) = PosterOpts::default().base_size(&hm);
    let opts = PosterOpts {
        scale: 1000,
        max_pixels: u64::from(bw * bh) * 16,
        ..PosterOpts::default()
    };
    assert_eq!(opts.effective_scale(&hm).unwrap(), 4);

    let poster = render_poster(&hm, &opts).unwrap();
    assert_eq!((poster.width(), poster.height()), (bw * 4, bh * 4));
    let sleep = HeatmapPalette::default().sleep;
    assert_eq!(poster.pixel(60 * 4, 25 * 4), sleep);
}

#[test]
fn budget_below_one_base_poster_is_an_error() {
    let hm = heatmap(2);
    let opts = PosterOpts {
        scale: 1,
        max_pixels: 100,
        ..PosterOpts::default()
    };
    assert!(matches!(
        render_poster(&hm, &opts),
        Err(SleepGridError::Evaluation(_))
    ));
}

#[test]
fn two_years_render_at_the_default_scale() {
    let params = GridParams::default();
    let day_zero = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let days = 735;
    let mut grid = BucketGrid::empty(params.bucket_minutes(), days, ChannelSet::default()).unwrap();
    let feed = grid.channels().position(&Channel::Feed).unwrap();
    for day in 0..days {
        grid.set(feed, BucketKey::new(day, 12 * 60));
    }

    let layout = HeatmapLayout::compute(
        days,
        day_zero,
        MonthPolicy::default(),
        params,
        LayoutParams::default(),
    )
    .unwrap();
    assert_eq!(layout.boundaries().len(), 24);
    assert_eq!(layout.displayed_days(), 735);

    let hm = HeatmapCompositor::new(&layout, &HeatmapPalette::default(), CompositorOpts::default())
        .paint(&grid)
        .unwrap();
    let opts = PosterOpts::default();
    let (bw, bh) = opts.base_size(&hm);
    assert_eq!(bw, 60 + hm.layout.total_cols());
    assert_eq!(opts.effective_scale(&hm).unwrap(), 3);

    let poster = render_poster(&hm, &opts).unwrap();
    assert_eq!((poster.width(), poster.height()), (bw * 3, bh * 3));
    assert!(poster.width() > 16_384);
}

#[test]
fn png_is_written_with_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("heatmap.png");
    let img = PixelBuffer::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 0, 0]).unwrap();
    save_png(&img, &path).unwrap();

    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (2, 1));
    assert_eq!(back.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(back.get_pixel(1, 0).0[3], 0);
}
