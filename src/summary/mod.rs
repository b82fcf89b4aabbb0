//! Summary image: countries per region as bars, plus a caption header and a GDP ranking.
//!
//! - PNG (default) or SVG output, deterministic for identical input
//! - Captions need a TrueType font (`--font-path`); `ab_glyph` does not discover OS fonts,
//!   so without one only the bars are drawn
//! - Every PNG render also replaces `<cache_dir>/summary.png` when that dir is writable

pub mod text;
pub mod types;
pub mod util;

pub use types::{DEFAULT_SIZE, ImageFormat, TOP_GDP_COUNT};

use crate::config::Config;
use crate::models::Country;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::NamedTempFile;

/// Label for countries the provider lists without a region.
pub const UNKNOWN_REGION: &str = "Unknown";

const HEADER_PX: u32 = 110;
const TITLE_PX: u32 = 28;
const BODY_PX: u32 = 18;
const HEADING_PX: u32 = 16;
const SMALL_PX: u32 = 14;
const LABEL_PX: u32 = 12;

/// Plotters keeps one global font registry, so the first registration decides.
static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

fn ensure_font_registered(path: &Path) -> bool {
    *FONT_REGISTERED.get_or_init(|| match std::fs::read(path) {
        Ok(bytes) => {
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            let ok = plotters::style::register_font(
                "sans-serif",
                plotters::style::FontStyle::Normal,
                bytes,
            )
            .is_ok();
            if !ok {
                log::warn!("{} is not a usable font; captions disabled", path.display());
            }
            ok
        }
        Err(e) => {
            log::warn!("cannot read font {}: {e}; captions disabled", path.display());
            false
        }
    })
}

/// Everything the image shows, computed from the store contents.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryData {
    pub total_countries: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Countries per region, ordered by region name.
    pub region_counts: Vec<(String, usize)>,
    /// Highest estimated GDP first; ties broken by name.
    pub top_gdp: Vec<(String, f64)>,
}

impl SummaryData {
    pub fn from_countries(
        countries: &[Country],
        last_refreshed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut regions: BTreeMap<String, usize> = BTreeMap::new();
        for c in countries {
            let region = c
                .region
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(UNKNOWN_REGION);
            *regions.entry(region.to_string()).or_default() += 1;
        }

        let mut ranked: Vec<(String, f64)> = countries
            .iter()
            .filter_map(|c| {
                c.estimated_gdp
                    .filter(|g| g.is_finite())
                    .map(|g| (c.name.clone(), g))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(TOP_GDP_COUNT);

        Self {
            total_countries: countries.len(),
            last_refreshed_at,
            region_counts: regions.into_iter().collect(),
            top_gdp: ranked,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryRenderer {
    width: u32,
    height: u32,
    cache_dir: PathBuf,
    captions: bool,
}

impl SummaryRenderer {
    pub fn new(config: &Config) -> Self {
        let captions = config
            .font_path
            .as_deref()
            .map(ensure_font_registered)
            .unwrap_or(false);
        Self {
            width: config.image_width.max(200),
            height: config.image_height.max(150),
            cache_dir: config.resolved_cache_dir(),
            captions,
        }
    }

    pub fn captions_enabled(&self) -> bool {
        self.captions
    }

    /// Location of the most recent PNG render.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join("summary.png")
    }

    pub fn render(&self, data: &SummaryData, format: ImageFormat) -> Result<Vec<u8>> {
        match format {
            ImageFormat::Png => self.render_png(data),
            ImageFormat::Svg => self.render_svg(data).map(String::into_bytes),
        }
    }

    /// Render to a temp file in the cache dir, read it back, then move it over `summary.png`.
    /// A cache dir that cannot be written only costs the cached copy.
    pub fn render_png(&self, data: &SummaryData) -> Result<Vec<u8>> {
        let (tmp, cacheable) = match self.cache_tempfile() {
            Ok(tmp) => (tmp, true),
            Err(e) => {
                log::warn!("summary cache unavailable: {e:#}");
                let tmp = png_tempfile()
                    .tempfile()
                    .context("create temp image file")?;
                (tmp, false)
            }
        };
        {
            let root = BitMapBackend::new(tmp.path(), (self.width, self.height)).into_drawing_area();
            draw_summary(root, data, self.captions)?;
        }
        let bytes = std::fs::read(tmp.path()).context("read rendered image")?;
        if cacheable {
            let target = self.cache_path();
            if let Err(e) = tmp.persist(&target) {
                log::warn!("cannot cache summary image at {}: {}", target.display(), e.error);
            }
        }
        Ok(bytes)
    }

    fn cache_tempfile(&self) -> Result<NamedTempFile> {
        std::fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("create cache dir {}", self.cache_dir.display()))?;
        png_tempfile()
            .tempfile_in(&self.cache_dir)
            .with_context(|| format!("create temp image file in {}", self.cache_dir.display()))
    }

    pub fn render_svg(&self, data: &SummaryData) -> Result<String> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (self.width, self.height)).into_drawing_area();
            draw_summary(root, data, self.captions)?;
        }
        Ok(buf)
    }
}

fn png_tempfile() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("summary-").suffix(".png");
    builder
}

/// Draws to any Plotters backend.
fn draw_summary<DB>(root: DrawingArea<DB, Shift>, data: &SummaryData, captions: bool) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&util::BACKGROUND)
        .map_err(|e| anyhow!("{:?}", e))?;

    if captions {
        let (header, rest) = root.split_vertically(HEADER_PX);
        draw_header(&header, data)?;
        let (bars, ranking) = rest.split_horizontally((62).percent_width());
        draw_region_bars(&bars, data, true)?;
        draw_ranking(&ranking, data)?;
    } else {
        draw_region_bars(&root, data, false)?;
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_header<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, data: &SummaryData) -> Result<()> {
    let top_left = Pos::new(HPos::Left, VPos::Top);
    let title = TextStyle::from((FontFamily::SansSerif, TITLE_PX))
        .color(&util::HEADING)
        .pos(top_left);
    let body = TextStyle::from((FontFamily::SansSerif, BODY_PX)).pos(top_left);
    let small = TextStyle::from((FontFamily::SansSerif, SMALL_PX)).pos(top_left);

    let refreshed = data
        .last_refreshed_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    area.draw(&Text::new("Country Data Summary", (20, 16), title))
        .map_err(|e| anyhow!("{:?}", e))?;
    area.draw(&Text::new(
        format!("Total countries: {}", data.total_countries),
        (20, 56),
        body,
    ))
    .map_err(|e| anyhow!("{:?}", e))?;
    area.draw(&Text::new(format!("Last refreshed: {refreshed}"), (20, 84), small))
        .map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_region_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &SummaryData,
    captions: bool,
) -> Result<()> {
    let slots = data.region_counts.len().max(1);
    let max_count = data.region_counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let y_max = (max_count as f64 * 1.15).max(1.0);

    let mut builder = ChartBuilder::on(area);
    builder.margin(16);
    if captions {
        builder
            .caption("Countries per region", ("sans-serif", 18))
            .set_label_area_size(LabelAreaPosition::Left, 44)
            .set_label_area_size(LabelAreaPosition::Bottom, 12);
    }
    let mut chart = builder
        .build_cartesian_2d(0f64..slots as f64, 0f64..y_max)
        .map_err(|e| anyhow!("{:?}", e))?;

    if captions {
        let y_label_fmt = |v: &f64| format!("{:.0}", v);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .y_desc("Countries")
            .y_label_formatter(&y_label_fmt)
            .label_style(("sans-serif", 12))
            .axis_desc_style(("sans-serif", 14))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    chart
        .draw_series(data.region_counts.iter().enumerate().map(|(i, (_, count))| {
            let x = i as f64;
            Rectangle::new(
                [(x + 0.15, 0.0), (x + 0.85, *count as f64)],
                util::office_color(i).filled(),
            )
        }))
        .map_err(|e| anyhow!("{:?}", e))?;

    if captions {
        let (plot_w, _) = chart.plotting_area().dim_in_pixel();
        let slot_px = (plot_w / slots as u32).saturating_sub(4);
        let label_style = TextStyle::from((FontFamily::SansSerif, LABEL_PX))
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(data.region_counts.iter().enumerate().map(|(i, (region, count))| {
                let label = text::truncate_to_width(&format!("{region} ({count})"), LABEL_PX, slot_px);
                Text::new(label, (i as f64 + 0.5, *count as f64), label_style.clone())
            }))
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

fn draw_ranking<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, data: &SummaryData) -> Result<()> {
    let top_left = Pos::new(HPos::Left, VPos::Top);
    let heading = TextStyle::from((FontFamily::SansSerif, HEADING_PX))
        .color(&util::HEADING)
        .pos(top_left);
    let line = TextStyle::from((FontFamily::SansSerif, SMALL_PX)).pos(top_left);
    let (w, _) = area.dim_in_pixel();
    let max_px = w.saturating_sub(16);

    area.draw(&Text::new(
        format!("Top {TOP_GDP_COUNT} by estimated GDP"),
        (8, 20),
        heading,
    ))
    .map_err(|e| anyhow!("{:?}", e))?;

    if data.top_gdp.is_empty() {
        area.draw(&Text::new("No GDP estimates yet", (8, 56), line))
            .map_err(|e| anyhow!("{:?}", e))?;
        return Ok(());
    }

    for (i, (name, gdp)) in data.top_gdp.iter().enumerate() {
        let entry = format!("{}. {}: {}", i + 1, name, util::format_usd(*gdp));
        let entry = text::truncate_to_width(&entry, SMALL_PX, max_px);
        area.draw(&Text::new(entry, (8, 56 + i as i32 * 30), line.clone()))
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}
