//! Colors, axis scaling, locale handling and label-area sizing.

use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use super::text::estimate_text_width_px;
use super::types::ValueFormat;

/// Office (2013+) chart series palette.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // #4472C4
    RGBColor(237, 125, 49),  // #ED7D31
    RGBColor(165, 165, 165), // #A5A5A5
    RGBColor(255, 192, 0),   // #FFC000
    RGBColor(91, 155, 213),  // #5B9BD5
    RGBColor(112, 173, 71),  // #70AD47
    RGBColor(38, 68, 120),   // #264478
    RGBColor(158, 72, 14),   // #9E480E
    RGBColor(99, 99, 99),    // #636363
    RGBColor(153, 115, 0),   // #997300
];

#[inline]
pub fn office_color(idx: usize) -> RGBAColor {
    OFFICE10[idx % OFFICE10.len()].to_rgba()
}

/// Pick a Y-axis scale and its word for the overall magnitude, e.g. `(1e6, "millions")`.
pub fn choose_axis_scale(max_abs: f64) -> (f64, &'static str) {
    if max_abs >= 1.0e9 {
        (1.0e9, "billions")
    } else if max_abs >= 1.0e6 {
        (1.0e6, "millions")
    } else if max_abs >= 1.0e3 {
        (1.0e3, "thousands")
    } else {
        (1.0, "")
    }
}

/// Multiplier applied to raw values before plotting, plus the scale word.
pub fn value_scale(format: ValueFormat, max_abs: f64) -> (f64, &'static str) {
    match format {
        ValueFormat::Currency | ValueFormat::Count => {
            let (s, w) = choose_axis_scale(max_abs);
            (1.0 / s, w)
        }
        ValueFormat::Percent => (100.0, ""),
        ValueFormat::Index => (1.0, ""),
    }
}

/// Y-axis title for a base description and scale word.
pub fn axis_title(base: &str, format: ValueFormat, scale_word: &str) -> String {
    match (format, scale_word) {
        (ValueFormat::Currency, "") => format!("{base} ($)"),
        (ValueFormat::Currency, w) => format!("{base} ($ {w})"),
        (ValueFormat::Count, "") => base.to_string(),
        (ValueFormat::Count, w) => format!("{base} ({w})"),
        (ValueFormat::Percent, _) => format!("{base} (%)"),
        (ValueFormat::Index, _) => format!("{base} (base = 100)"),
    }
}

/// Map a locale tag to a `num_format::Locale` and its decimal separator.
///
/// Supported (case-insensitive): `en`, `en_au`, `de`, `fr`, `es`, `it`, `pt`, `nl`.
/// Anything else falls back to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// Tick label: grouped whole numbers from 100 up, one or two decimals below.
pub fn format_tick(v: f64, locale: &Locale, dec_sep: char) -> String {
    let a = v.abs();
    if a >= 100.0 {
        let n = v.round() as i64;
        let s = n.unsigned_abs().to_formatted_string(locale);
        if n < 0 { format!("-{s}") } else { s }
    } else {
        let prec = if a >= 10.0 { 1 } else { 2 };
        let s = format!("{v:.prec$}");
        if dec_sep == '.' { s } else { s.replace('.', &dec_sep.to_string()) }
    }
}

/// Width of the left label area for the scaled Y range, sampled at the same
/// number of ticks the mesh asks for. Clamped to a sensible range.
pub fn compute_left_label_area_px(
    ymin_scaled: f64,
    ymax_scaled: f64,
    ticks: usize,
    font_px: u32,
    locale: &Locale,
) -> u32 {
    let widest = (0..=ticks)
        .map(|i| {
            let t = if ticks == 0 { 0.0 } else { i as f64 / ticks as f64 };
            let v = ymin_scaled + (ymax_scaled - ymin_scaled) * t;
            estimate_text_width_px(&format_tick(v, locale, '.'), font_px)
        })
        .max()
        .unwrap_or(0);
    widest.saturating_add(18).clamp(48, 140)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_group_thousands() {
        assert_eq!(format_tick(12345.4, &Locale::en, '.'), "12,345");
        assert_eq!(format_tick(-1500.0, &Locale::en, '.'), "-1,500");
        assert_eq!(format_tick(1.5, &Locale::de, ','), "1,50");
    }

    #[test]
    fn percent_is_not_magnitude_scaled() {
        assert_eq!(value_scale(ValueFormat::Percent, 5.0e6), (100.0, ""));
        assert_eq!(value_scale(ValueFormat::Currency, 5.0e6).1, "millions");
    }
}
