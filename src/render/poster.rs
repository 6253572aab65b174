//! Final annotated image: heatmap plus age labels, hour captions and a legend.
//!
//! Annotations are emitted as an SVG document in unscaled heatmap pixels and rasterized with
//! resvg at `scale`. The heatmap is upscaled nearest-neighbour and composited on top, so grid
//! cells stay crisp.

use std::{fmt::Write as _, fs, path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    foundation::{
        core::Rgba8,
        error::{SleepGridError, SleepGridResult},
    },
    render::{
        composite::{demultiply, over, premultiply},
        compositor::{Heatmap, PixelBuffer},
        labels::hour_label,
    },
};

/// Default pixel budget for a poster: 1 GiB of RGBA.
pub const DEFAULT_MAX_PIXELS: u64 = 1 << 28;

const SECTION_FONT_SIZE: f32 = 7.0;
const AXIS_FONT_SIZE: f32 = 5.0;
const LEGEND_FONT_SIZE: f32 = 5.0;
const LEGEND_ROW_HEIGHT: u32 = 12;
const LEGEND_SQUARE: u32 = 8;

/// Poster geometry and text options.
#[derive(Clone, Debug, PartialEq)]
pub struct PosterOpts {
    /// Integer upscale applied to the whole poster.
    pub scale: u32,
    /// Space left of the heatmap for hour captions.
    pub left_margin: u32,
    /// Space above the heatmap for section labels.
    pub top_margin: u32,
    /// CSS font family for all text.
    pub font_family: String,
    /// Text color.
    pub text_color: Rgba8,
    /// Upper bound on output pixels. `scale` is lowered until the poster fits.
    pub max_pixels: u64,
}

impl Default for PosterOpts {
    fn default() -> Self {
        Self {
            scale: 3,
            left_margin: 60,
            top_margin: 25,
            font_family: "sans-serif".to_owned(),
            text_color: Rgba8::WHITE,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl PosterOpts {
    fn legend_height(&self, entries: usize) -> u32 {
        entries as u32 * LEGEND_ROW_HEIGHT + 15
    }

    /// Unscaled `(width, height)` of the poster for `heatmap`.
    pub fn base_size(&self, heatmap: &Heatmap) -> (u32, u32) {
        let layout = &heatmap.layout;
        (
            self.left_margin + layout.total_cols(),
            self.top_margin + layout.rows() + self.legend_height(heatmap.legend.len()),
        )
    }

    /// Largest scale `<= self.scale` whose output stays within `max_pixels`.
    pub fn effective_scale(&self, heatmap: &Heatmap) -> SleepGridResult<u32> {
        if self.scale == 0 {
            return Err(SleepGridError::validation("scale must be >= 1"));
        }
        let (w, h) = self.base_size(heatmap);
        let base = u64::from(w) * u64::from(h);
        let fits = |s: u32| base.saturating_mul(u64::from(s) * u64::from(s)) <= self.max_pixels;

        let mut scale = self.scale;
        while scale > 1 && !fits(scale) {
            scale -= 1;
        }
        if !fits(scale) {
            return Err(SleepGridError::evaluation(format!(
                "poster of {w}x{h} exceeds the {} pixel budget even at scale 1",
                self.max_pixels
            )));
        }
        if scale < self.scale {
            tracing::warn!(
                requested = self.scale,
                scale,
                max_pixels = self.max_pixels,
                "lowered poster scale to fit the pixel budget"
            );
        }
        Ok(scale)
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn fill_attrs(c: Rgba8) -> String {
    if c.a == 255 {
        format!("fill=\"{}\"", c.to_hex_rgb())
    } else {
        format!(
            "fill=\"{}\" fill-opacity=\"{:.3}\"",
            c.to_hex_rgb(),
            f32::from(c.a) / 255.0
        )
    }
}

/// Annotation layer as an SVG document, in unscaled poster pixels.
pub fn poster_svg(heatmap: &Heatmap, opts: &PosterOpts) -> String {
    let (w, h) = opts.base_size(heatmap);
    let layout = &heatmap.layout;
    let left = opts.left_margin as f32;
    let top = opts.top_margin as f32;
    let text_fill = fill_attrs(opts.text_color);
    let family = xml_escape(&opts.font_family);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = writeln!(
        svg,
        r#"<g font-family="{family}" font-weight="bold" {text_fill}>"#
    );

    for label in &heatmap.labels {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="{SECTION_FONT_SIZE}">{}</text>"#,
            left + label.column as f32,
            top - 8.0,
            xml_escape(&label.text)
        );
    }

    let axis_x = left - 5.0;
    let start_caption = hour_label(layout.grid_params().day_start_hour());
    let axis = |svg: &mut String, y: f32, baseline: &str, fill: &str, text: &str| {
        let _ = writeln!(
            svg,
            r#"<text x="{axis_x}" y="{y}" text-anchor="end" dominant-baseline="{baseline}" font-size="{AXIS_FONT_SIZE}" {fill}>{}</text>"#,
            xml_escape(text)
        );
    };
    axis(&mut svg, top, "hanging", &text_fill, &start_caption);
    let bands = layout.bands();
    let work = bands.work_rows();
    if !work.is_empty() {
        let center = (work.start + work.end) as f32 / 2.0;
        axis(
            &mut svg,
            top + center,
            "central",
            &fill_attrs(heatmap.palette.work_hours),
            "9 - 5",
        );
    }
    axis(
        &mut svg,
        top + bands.midnight as f32,
        "central",
        &text_fill,
        "midnight",
    );
    axis(
        &mut svg,
        top + layout.rows() as f32,
        "auto",
        &text_fill,
        &start_caption,
    );

    let legend_top = top + layout.rows() as f32 + 10.0;
    for (i, entry) in heatmap.legend.iter().enumerate() {
        let y = legend_top + (i as u32 * LEGEND_ROW_HEIGHT) as f32;
        let _ = writeln!(
            svg,
            r#"<rect x="{left}" y="{}" width="{LEGEND_SQUARE}" height="{LEGEND_SQUARE}" {}/>"#,
            y - 4.0,
            fill_attrs(entry.color)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{y}" dominant-baseline="central" font-size="{LEGEND_FONT_SIZE}">{}</text>"#,
            left + (LEGEND_SQUARE + 3) as f32,
            xml_escape(&entry.label)
        );
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

fn build_fontdb() -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if db.is_empty() {
        tracing::warn!("no system fonts found; poster text will be missing");
    } else {
        tracing::debug!(faces = db.len(), "loaded system fonts");
    }
    Arc::new(db)
}

// Requested families first, then generic sans-serif, then any face at all.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

/// Rasterize the full poster as straight-alpha RGBA.
#[tracing::instrument(skip_all, fields(requested_scale = opts.scale))]
pub fn render_poster(heatmap: &Heatmap, opts: &PosterOpts) -> SleepGridResult<PixelBuffer> {
    let scale = opts.effective_scale(heatmap)?;
    let (base_w, base_h) = opts.base_size(heatmap);
    let (w, h) = (base_w * scale, base_h * scale);

    let svg = poster_svg(heatmap, opts);
    let usvg_opts = usvg::Options {
        fontdb: build_fontdb(),
        font_resolver: make_font_resolver(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg_opts).context("parse poster svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h).ok_or_else(|| {
        SleepGridError::evaluation(format!("failed to allocate {w}x{h} poster pixmap"))
    })?;
    let s = scale as f32;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(s, s),
        &mut pixmap.as_mut(),
    );
    let mut data = pixmap.take();

    composite_heatmap(&mut data, w, &heatmap.pixels, opts, scale);

    for px in data.chunks_exact_mut(4) {
        let straight = demultiply([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&straight.to_array());
    }
    tracing::info!(width = w, height = h, "rendered poster");
    PixelBuffer::from_raw(w, h, data)
}

// Nearest-neighbour upscale of the heatmap into premultiplied `dst` at the margins.
fn composite_heatmap(
    dst: &mut [u8],
    dst_width: u32,
    src: &PixelBuffer,
    opts: &PosterOpts,
    s: u32,
) {
    let x0 = opts.left_margin * s;
    let y0 = opts.top_margin * s;
    let stride = dst_width as usize * 4;

    for y in 0..src.height() {
        for x in 0..src.width() {
            let px = src.pixel(x, y);
            if px.a == 0 {
                continue;
            }
            let pm = premultiply(px);
            for dy in 0..s {
                let row = (y0 + y * s + dy) as usize;
                for dx in 0..s {
                    let idx = row * stride + ((x0 + x * s + dx) as usize) * 4;
                    if let Some(d) = dst.get_mut(idx..idx + 4) {
                        let out = over([d[0], d[1], d[2], d[3]], pm, 1.0);
                        d.copy_from_slice(&out);
                    }
                }
            }
        }
    }
}

/// Write `image` as a PNG, creating parent directories.
pub fn save_png(image: &PixelBuffer, path: &Path) -> SleepGridResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        image.as_bytes(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "saved image");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/poster.rs"]
mod tests;
