//! Render composed tables to **SVG** or **PNG**.
//!
//! - Categorical period axes taken from the calendar, so target and benchmark share positions
//! - Missing values are gaps: bars are omitted and lines are split
//! - Office palette, locale-aware tick labels, magnitude scaling for currency and counts
//! - Legend placement: `Inside`, `Right`, `Top`, `Bottom` (external legends never overlap)

pub mod legend;
pub mod series;
pub mod text;
pub mod types;
pub mod util;

pub use series::RatioKind;
pub use types::{
    ChartData, ChartOptions, ChartSeries, DEFAULT_LEGEND_MODE, LegendMode, PlotKind, ValueFormat,
};

use anyhow::{Result, anyhow, bail};
use num_format::Locale;

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::FontFamily;

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::Once;

use crate::calendar::PeriodCalendar;
use crate::compose::{AreaRow, BasketSeriesRow, SeriesTable, SynopticRow};
use crate::index::IndexedSeries;
use crate::models::{BasketMetric, Metric, Periodicity};

use legend::{draw_legend_panel, estimate_top_bottom_legend_height_px};
use util::{axis_title, compute_left_label_area_px, format_tick, map_locale, office_color, value_scale};

/// `ab_glyph` does not discover OS fonts, so a sans-serif face is registered once.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

fn with_title(mut data: ChartData, opts: &ChartOptions) -> ChartData {
    if let Some(t) = opts.title.as_deref()
        && !t.trim().is_empty()
    {
        data.title = t.trim().to_string();
    }
    data
}

/// Bar chart of the metric column; one bar group per period, grouped per year in YoY views.
pub fn plot_series_table<P: AsRef<Path>>(
    slices: &[(&str, &SeriesTable)],
    calendar: &PeriodCalendar,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let data = series::series_chart(slices, calendar).ok_or_else(|| anyhow!("no series to plot"))?;
    render_chart(&with_title(data, opts), PlotKind::GroupedBar, out_path, opts)
}

/// Line chart of warehouse %, promotion % or GP%.
pub fn plot_ratio_table<P: AsRef<Path>>(
    slices: &[(&str, &SeriesTable)],
    calendar: &PeriodCalendar,
    kind: RatioKind,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let data =
        series::ratio_chart(slices, calendar, kind).ok_or_else(|| anyhow!("no series to plot"))?;
    render_chart(&with_title(data, opts), PlotKind::Line, out_path, opts)
}

pub fn plot_basket_table<P: AsRef<Path>>(
    slices: &[(&str, &[BasketSeriesRow])],
    calendar: &PeriodCalendar,
    periodicity: Periodicity,
    metric: BasketMetric,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let data = series::basket_chart(slices, calendar, periodicity, metric);
    render_chart(&with_title(data, opts), PlotKind::GroupedBar, out_path, opts)
}

/// Indexed lines, typically target vs benchmark.
pub fn plot_indexed<P: AsRef<Path>>(
    slices: &[(&str, &IndexedSeries)],
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let data = series::indexed_chart(slices).ok_or_else(|| anyhow!("no series to plot"))?;
    render_chart(&with_title(data, opts), PlotKind::Line, out_path, opts)
}

/// Share-of-total lines per dimension value.
pub fn plot_synoptic<P: AsRef<Path>>(
    rows: &[SynopticRow],
    metric: Metric,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let data = series::synoptic_chart(rows, metric);
    render_chart(&with_title(data, opts), PlotKind::Line, out_path, opts)
}

/// Value per square metre per store and month.
pub fn plot_area<P: AsRef<Path>>(
    rows: &[AreaRow],
    metric: Metric,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let data = series::area_chart(rows, metric);
    render_chart(&with_title(data, opts), PlotKind::GroupedBar, out_path, opts)
}

/// Render prepared chart data. The backend follows the file extension: `.svg`
/// gives SVG, anything else a bitmap.
pub fn render_chart<P: AsRef<Path>>(
    data: &ChartData,
    kind: PlotKind,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    if data.x_labels.is_empty() || !data.series.iter().any(ChartSeries::has_values) {
        bail!("no data to plot");
    }
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let size = (opts.width, opts.height);

    let is_svg = out_path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        let root = SVGBackend::new(path_string.as_str(), size).into_drawing_area();
        draw_chart(root, data, kind, opts)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), size).into_drawing_area();
        draw_chart(root, data, kind, opts)?;
    }
    log::debug!("chart written to {}", out_path.display());
    Ok(())
}

/// Runs of consecutive present values as (x, y) segments.
fn segments(values: &[Option<f64>], yscale: f64) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut cur: Vec<(f64, f64)> = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(y) => cur.push((i as f64, y * yscale)),
            None if !cur.is_empty() => out.push(std::mem::take(&mut cur)),
            None => {}
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    data: &ChartData,
    kind: PlotKind,
    opts: &ChartOptions,
) -> Result<()>
where
    DB: DrawingBackend,
{
    const MARGIN: i32 = 16;
    const Y_LABELS: usize = 10;
    let (locale, dec_sep): (&Locale, char) = map_locale(&opts.locale);

    let visible: Vec<&ChartSeries> = data.series.iter().filter(|s| s.has_values()).collect();
    let present = visible.iter().flat_map(|s| s.values.iter().flatten().copied());
    let (mut min_val, mut max_val) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if kind == PlotKind::GroupedBar {
        min_val = min_val.min(0.0);
        max_val = max_val.max(0.0);
    }
    let (yscale, scale_word) = value_scale(data.format, min_val.abs().max(max_val.abs()));
    let (mut y_lo, mut y_hi) = (min_val * yscale, max_val * yscale);
    if (y_hi - y_lo).abs() < f64::EPSILON {
        y_lo -= 1.0;
        y_hi += 1.0;
    }
    let headroom = (y_hi - y_lo) * 0.05;
    if kind == PlotKind::Line || y_lo < 0.0 {
        y_lo -= headroom;
    }
    y_hi += headroom;
    let y_desc = axis_title(&data.y_desc, data.format, scale_word);

    let n = data.x_labels.len();
    let x_label_fmt = |x: &f64| {
        let i = x.round();
        if (x - i).abs() > 1e-6 || i < 0.0 || i as usize >= n {
            String::new()
        } else {
            data.x_labels[i as usize].clone()
        }
    };
    let y_label_fmt = |v: &f64| format_tick(*v, locale, dec_sep);

    let left_label_px = compute_left_label_area_px(y_lo, y_hi, Y_LABELS, 12, locale);
    let axis_x_start_px = MARGIN + left_label_px as i32;
    let legend_texts: Vec<String> = visible.iter().map(|s| s.label.clone()).collect();

    let (root_w, root_h) = root.dim_in_pixel();
    let legend_needed_h = if matches!(opts.legend, LegendMode::Top | LegendMode::Bottom) {
        estimate_top_bottom_legend_height_px(&legend_texts, axis_x_start_px, root_w as i32, false)
    } else {
        0
    };

    let (plot_area, legend_area): (DrawingArea<DB, Shift>, Option<DrawingArea<DB, Shift>>) =
        match opts.legend {
            LegendMode::Right => {
                let (plot, legend) = root.split_horizontally((85).percent_width());
                (plot, Some(legend))
            }
            LegendMode::Top => {
                let (legend, plot) = root.split_vertically(legend_needed_h.max(40));
                (plot, Some(legend))
            }
            LegendMode::Bottom => {
                let h = legend_needed_h.max(40);
                let (plot, legend) = root.split_vertically((root_h as i32 - h).max(40));
                (plot, Some(legend))
            }
            LegendMode::Inside => (root, None),
        };
    plot_area.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(MARGIN as u32)
        .caption(data.title.as_str(), (FontFamily::SansSerif, 24))
        .set_label_area_size(LabelAreaPosition::Left, left_label_px)
        .set_label_area_size(LabelAreaPosition::Bottom, 56)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(data.x_desc.as_str())
        .y_desc(y_desc)
        .x_labels(n.min(12))
        .y_labels(Y_LABELS)
        .x_label_formatter(&x_label_fmt)
        .y_label_formatter(&y_label_fmt)
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 16))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    let inside = opts.legend == LegendMode::Inside;
    let mut legend_items: Vec<(String, RGBAColor)> = Vec::new();
    let group_width = 0.8f64;
    let bar_w = group_width / visible.len().max(1) as f64;

    for (idx, s) in visible.iter().enumerate() {
        let color = office_color(idx);
        match kind {
            PlotKind::GroupedBar => {
                let bars = s.values.iter().enumerate().filter_map(|(i, v)| {
                    let v = (*v)? * yscale;
                    let x0 = i as f64 - group_width / 2.0 + idx as f64 * bar_w;
                    Some(Rectangle::new(
                        [(x0, v.min(0.0)), (x0 + bar_w, v.max(0.0))],
                        color.filled(),
                    ))
                });
                chart.draw_series(bars).map_err(|e| anyhow!("{:?}", e))?;
            }
            PlotKind::Line => {
                let style = ShapeStyle {
                    color,
                    filled: false,
                    stroke_width: 2,
                };
                for seg in segments(&s.values, yscale) {
                    if seg.len() == 1 {
                        chart
                            .draw_series(seg.iter().map(|p| Circle::new(*p, 3, color.filled())))
                            .map_err(|e| anyhow!("{:?}", e))?;
                    } else {
                        chart
                            .draw_series(LineSeries::new(seg, style))
                            .map_err(|e| anyhow!("{:?}", e))?;
                    }
                }
            }
        }

        if inside {
            let legend_color = color;
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
                .map_err(|e| anyhow!("{:?}", e))?
                .label(s.label.clone())
                .legend(move |(x, y)| Circle::new((x + 8, y), 4, legend_color.filled()));
        } else {
            legend_items.push((s.label.clone(), color));
        }
    }

    if inside {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, 14))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    } else if let Some(ref area) = legend_area {
        draw_legend_panel(area, &legend_items, "", opts.legend, axis_x_start_px)?;
    }

    plot_area.present().map_err(|e| anyhow!("{:?}", e))?;
    if let Some(ref area) = legend_area {
        area.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}
