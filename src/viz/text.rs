//! Text measurement, truncation and wrapping. Plotters has no text metrics of
//! its own, so widths are estimated from the character count.

const CHAR_WIDTH_EM: f32 = 0.60;

pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    chars_width_px(text.chars().count(), font_px)
}

fn chars_width_px(chars: usize, font_px: u32) -> u32 {
    ((chars as f32) * (font_px as f32) * CHAR_WIDTH_EM).ceil() as u32
}

/// Truncate to fit `max_px`, ending in a single ellipsis when anything was cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    let total = text.chars().count();
    if chars_width_px(total, font_px) <= max_px {
        return text.to_string();
    }
    let mut keep = 0usize;
    while keep < total && chars_width_px(keep + 2, font_px) <= max_px {
        keep += 1;
    }
    if keep == 0 {
        return text.chars().take(1).collect();
    }
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

fn hard_break(word: &str, font_px: u32, max_px: u32, lines: &mut Vec<String>) -> String {
    let mut buf = String::new();
    let mut n = 0usize;
    for ch in word.chars() {
        if n > 0 && chars_width_px(n + 1, font_px) > max_px {
            lines.push(std::mem::take(&mut buf));
            n = 0;
        }
        buf.push(ch);
        n += 1;
    }
    buf
}

/// Wrap on word boundaries to `max_px`; words wider than a line are broken by character.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    if max_px <= 12 {
        return vec![truncate_to_width(text, font_px, max_px)];
    }
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let extra = if cur.is_empty() { 0 } else { 1 };
        let candidate = cur.chars().count() + extra + word.chars().count();
        if chars_width_px(candidate, font_px) <= max_px {
            if extra == 1 {
                cur.push(' ');
            }
            cur.push_str(word);
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        if estimate_text_width_px(word, font_px) <= max_px {
            cur.push_str(word);
        } else {
            cur = hard_break(word, font_px, max_px, &mut lines);
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}
