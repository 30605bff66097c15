//! External legend layout: a single column on the right, or a column-aligned
//! table band above/below the plot.
//!
//! The height estimator and the renderer share [`LegendLayout`], so the band
//! reserved before splitting the canvas always matches what gets drawn.

use anyhow::{Result, anyhow};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::{estimate_text_width_px, wrap_text_to_width};
use super::types::LegendMode;

const FONT_PX: u32 = 14;
const TITLE_FONT_PX: u32 = 16;
const LINE_H: i32 = FONT_PX as i32 + 2;
const ROW_GAP: i32 = 4;
const PAD_SMALL: i32 = 6;
const PAD_BAND: i32 = 8;
const MARKER_RADIUS: i32 = 4;
const MARKER_GAP: i32 = 12;
const TRAILING_GAP: i32 = 12;
const MIN_SLOT: i32 = 60;
const DECORATION: i32 = MARKER_GAP + MARKER_RADIUS + TRAILING_GAP;

/// Row/column assignment of legend labels for a top or bottom band.
struct LegendLayout {
    /// Item indices per row.
    rows: Vec<Vec<usize>>,
    col_x: Vec<i32>,
    text_cap: Vec<u32>,
}

fn block_width(label: &str, cap_px: i32) -> i32 {
    let lines = wrap_text_to_width(label, FONT_PX, cap_px.max(40) as u32);
    let widest = lines
        .iter()
        .map(|s| estimate_text_width_px(s, FONT_PX) as i32)
        .max()
        .unwrap_or(0);
    DECORATION + widest
}

impl LegendLayout {
    /// Greedily pack labels into rows, then size columns so entries line up.
    ///
    /// Columns take the width of their longest single-line label when the sum
    /// fits the band; otherwise every column gets an equal slot and labels wrap.
    fn new(labels: &[String], start_x: i32, total_w: i32) -> Self {
        let usable = total_w - PAD_SMALL;
        let per_item_cap = ((usable - start_x) as f32 * 0.35).max(140.0) as i32;
        let fresh_cap = ((usable - start_x) - DECORATION).min(per_item_cap);

        let mut rows: Vec<Vec<usize>> = Vec::new();
        let mut cur: Vec<usize> = Vec::new();
        let mut x = start_x;
        for (i, label) in labels.iter().enumerate() {
            let cap_now = ((usable - x).max(40) - DECORATION).min(per_item_cap);
            let mut w = block_width(label, cap_now);
            if x + w > usable && !cur.is_empty() {
                rows.push(std::mem::take(&mut cur));
                x = start_x;
                w = block_width(label, fresh_cap);
            }
            x += w;
            cur.push(i);
        }
        if !cur.is_empty() {
            rows.push(cur);
        }

        let k = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let mut preferred = vec![MIN_SLOT; k];
        for row in &rows {
            for (ci, &i) in row.iter().enumerate() {
                let w = DECORATION + estimate_text_width_px(&labels[i], FONT_PX) as i32;
                preferred[ci] = preferred[ci].max(w);
            }
        }
        let slots = if start_x + preferred.iter().sum::<i32>() <= usable {
            preferred
        } else {
            vec![((usable - start_x) / k as i32).max(MIN_SLOT); k]
        };

        let mut col_x = Vec::with_capacity(k);
        let mut acc = start_x;
        for w in &slots {
            col_x.push(acc);
            acc += w;
        }
        let text_cap = slots.iter().map(|w| (w - DECORATION).max(40) as u32).collect();
        LegendLayout {
            rows,
            col_x,
            text_cap,
        }
    }

    fn row_lines(&self, labels: &[String], row: &[usize]) -> (i32, Vec<Vec<String>>) {
        let mut h = LINE_H;
        let mut blocks = Vec::with_capacity(row.len());
        for (ci, &i) in row.iter().enumerate() {
            let lines = wrap_text_to_width(&labels[i], FONT_PX, self.text_cap[ci]);
            h = h.max(lines.len().max(1) as i32 * LINE_H);
            blocks.push(lines);
        }
        (h, blocks)
    }
}

fn header_height(has_title: bool) -> i32 {
    if has_title {
        PAD_BAND + TITLE_FONT_PX as i32 + 8
    } else {
        PAD_BAND + 8
    }
}

/// Height in pixels a top/bottom legend band needs for `labels`.
pub fn estimate_top_bottom_legend_height_px(
    labels: &[String],
    start_x: i32,
    total_w: i32,
    has_title: bool,
) -> i32 {
    let layout = LegendLayout::new(labels, start_x, total_w);
    let rows_h: i32 = layout
        .rows
        .iter()
        .map(|row| layout.row_lines(labels, row).0)
        .sum();
    let gaps = ROW_GAP * (layout.rows.len().saturating_sub(1) as i32);
    header_height(has_title) + rows_h + gaps + PAD_BAND
}

/// Draw the legend panel for an external placement. `Inside` is a no-op; the
/// chart's own series labels handle it.
pub fn draw_legend_panel<DB: DrawingBackend>(
    legend_area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBAColor)],
    title: &str,
    placement: LegendMode,
    axis_x_start_px: i32,
) -> Result<()> {
    legend_area.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    let (w, _) = legend_area.dim_in_pixel();
    let has_title = !title.trim().is_empty();
    let title_style = TextStyle::from((FontFamily::SansSerif, TITLE_FONT_PX))
        .pos(Pos::new(HPos::Left, VPos::Top));
    let label_style =
        TextStyle::from((FontFamily::SansSerif, FONT_PX)).pos(Pos::new(HPos::Left, VPos::Center));

    let draw_entry = |x_text: i32, y_top: i32, lines: &[String], color: &RGBAColor, block_h: i32| -> Result<()> {
        let dot_x = (x_text - MARKER_GAP).max(0);
        legend_area
            .draw(&Circle::new(
                (dot_x, y_top + block_h / 2),
                MARKER_RADIUS,
                color.filled(),
            ))
            .map_err(|e| anyhow!("{:?}", e))?;
        let text_h = lines.len().max(1) as i32 * LINE_H;
        let first = y_top + (block_h - text_h) / 2;
        for (i, line) in lines.iter().enumerate() {
            legend_area
                .draw(&Text::new(
                    line.as_str(),
                    (x_text, first + i as i32 * LINE_H + LINE_H / 2),
                    label_style.clone(),
                ))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        Ok(())
    };

    match placement {
        LegendMode::Right => {
            let pad_x = PAD_SMALL;
            let mut y = if has_title {
                legend_area
                    .draw(&Text::new(title, (pad_x, PAD_SMALL), title_style))
                    .map_err(|e| anyhow!("{:?}", e))?;
                PAD_SMALL + TITLE_FONT_PX as i32 + 8
            } else {
                PAD_SMALL + 6
            };
            let text_x = pad_x + 24;
            let cap = (w as i32 - text_x - pad_x).max(40) as u32;
            for (label, color) in items {
                let lines = wrap_text_to_width(label, FONT_PX, cap);
                let block_h = lines.len().max(1) as i32 * LINE_H;
                draw_entry(text_x, y, &lines, color, block_h)?;
                y += block_h + ROW_GAP;
            }
        }
        LegendMode::Top | LegendMode::Bottom => {
            if has_title {
                legend_area
                    .draw(&Text::new(title, (axis_x_start_px, PAD_BAND), title_style))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
            let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
            let layout = LegendLayout::new(&labels, axis_x_start_px, w as i32);
            let mut y_top = header_height(has_title);
            for row in &layout.rows {
                let (row_h, blocks) = layout.row_lines(&labels, row);
                for (ci, &i) in row.iter().enumerate() {
                    draw_entry(layout.col_x[ci], y_top, &blocks[ci], &items[i].1, row_h)?;
                }
                y_top += row_h + ROW_GAP;
            }
        }
        LegendMode::Inside => {}
    }
    Ok(())
}
