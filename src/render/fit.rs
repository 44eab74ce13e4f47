//! Body text fitting
//!
//! Wraps a note body until its bounding box in monospace columns is no more than
//! about twice as wide as it is tall, then picks a font scale so that tall bodies
//! still fit the text region of the card. Widths count East Asian wide and
//! fullwidth characters as two columns.

use unicode_width::UnicodeWidthChar;

/// Above this many lines the font shrinks proportionally
pub const MAX_LINES_AT_BASE_SIZE: usize = 13;

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    /// Wrapped text, lines joined with '\n', no trailing newline added
    pub text: String,
    /// Widest line in display columns
    pub width: usize,
    /// Line count
    pub height: usize,
    /// Multiplier for the base font size, in (0, 1]
    pub scale: f32,
}

impl LayoutResult {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// (widest line, line count)
pub fn box_size(text: &str) -> (usize, usize) {
    text.split('\n')
        .fold((0, 0), |(w, h), line| (w.max(display_width(line)), h + 1))
}

pub fn font_scale(height: usize) -> f32 {
    if height > MAX_LINES_AT_BASE_SIZE {
        MAX_LINES_AT_BASE_SIZE as f32 / height as f32
    } else {
        1.0
    }
}

/// Greedy word wrap of a single line at `limit` columns.
///
/// Space-separated words are kept whole where they fit; a word wider than the
/// limit is broken at column boundaries. Every produced line is at most `limit`
/// columns wide unless a single character is wider than the limit.
pub fn wrap(line: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut started = false;

    for word in line.split(' ') {
        let word_width = display_width(word);
        if started && current_width + 1 + word_width <= limit {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if started {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        for c in word.chars() {
            let w = char_width(c);
            if current_width > 0 && current_width + w > limit {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(c);
            current_width += w;
        }
        started = true;
    }

    lines.push(current);
    lines
}

/// Wrap `text` until `width <= 2 * height + 4`.
///
/// Each round re-wraps the original lines at one column less than the current
/// box width, so the width strictly shrinks and the loop terminates.
pub fn fit(text: &str) -> LayoutResult {
    if text.chars().count() <= 1 {
        return LayoutResult {
            text: text.to_string(),
            width: 1,
            height: 1,
            scale: 1.0,
        };
    }

    let mut fitted = text.to_string();
    let (mut width, mut height) = box_size(&fitted);
    while width > 2 * height + 4 {
        fitted = text
            .split('\n')
            .flat_map(|line| wrap(line, width - 1))
            .collect::<Vec<_>>()
            .join("\n");
        (width, height) = box_size(&fitted);
    }

    LayoutResult {
        text: fitted,
        width,
        height,
        scale: font_scale(height),
    }
}
