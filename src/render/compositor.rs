//! Mixed text and emoji line drawing
//!
//! A line is split into cells: runs of ordinary text, shaped by the font, and
//! single symbol code points, which are replaced by a pre-rendered image scaled to
//! one square cell. Presentation selectors are dropped.

use image::{GrayImage, RgbaImage};

use super::emoji::{is_symbol, is_variation_selector, EmojiAssets, Substitution};
use super::{blend_pixel, WHITE};

/// Vertical metrics in whole pixels at a given font size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub ascent: i32,
    /// floor(ascent) + floor(descent): line advance and emoji edge length
    pub cell: u32,
}

/// Something that can draw a run of text in white and report its advance
pub trait TextPainter {
    fn cell_metrics(&self, size: f32) -> CellMetrics;
    fn paint(&mut self, canvas: &mut RgbaImage, text: &str, x: f32, baseline: f32, size: f32) -> f32;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphCell {
    Text(String),
    Emoji(char),
}

pub fn segment(line: &str) -> Vec<GlyphCell> {
    let mut cells = Vec::new();
    let mut run = String::new();

    for c in line.chars() {
        if is_variation_selector(c) {
            continue;
        }
        if is_symbol(c) {
            if !run.is_empty() {
                cells.push(GlyphCell::Text(std::mem::take(&mut run)));
            }
            cells.push(GlyphCell::Emoji(c));
        } else {
            run.push(c);
        }
    }
    if !run.is_empty() {
        cells.push(GlyphCell::Text(run));
    }
    cells
}

pub struct GlyphCompositor<'a, P: TextPainter> {
    painter: &'a mut P,
    emoji: &'a mut EmojiAssets,
}

impl<'a, P: TextPainter> GlyphCompositor<'a, P> {
    pub fn new(painter: &'a mut P, emoji: &'a mut EmojiAssets) -> Self {
        Self { painter, emoji }
    }

    /// Draw one line with its baseline at `origin.1`; returns the final pen x
    pub fn draw_line(&mut self, canvas: &mut RgbaImage, origin: (f32, f32), size: f32, line: &str) -> f32 {
        let metrics = self.painter.cell_metrics(size);
        let (mut pen, baseline) = origin;

        for cell in segment(line) {
            match cell {
                GlyphCell::Text(run) => {
                    pen += self.painter.paint(canvas, &run, pen, baseline, size);
                }
                GlyphCell::Emoji(c) => match self.emoji.lookup(c, metrics.cell) {
                    Substitution::Mask(mask) => {
                        composite_mask(
                            canvas,
                            mask,
                            pen.floor() as i64,
                            baseline.floor() as i64 - metrics.ascent as i64,
                        );
                        pen += metrics.cell as f32;
                    }
                    Substitution::Missing => {
                        let mut buf = [0u8; 4];
                        pen += self
                            .painter
                            .paint(canvas, c.encode_utf8(&mut buf), pen, baseline, size);
                    }
                    Substitution::Unreadable => {}
                },
            }
        }
        pen
    }

    /// Draw '\n'-separated lines, the first baseline at `origin.1`, one cell apart
    pub fn draw_block(&mut self, canvas: &mut RgbaImage, origin: (f32, f32), size: f32, text: &str) {
        let cell = self.painter.cell_metrics(size).cell as f32;
        for (i, line) in text.split('\n').enumerate() {
            self.draw_line(canvas, (origin.0, origin.1 + i as f32 * cell), size, line);
        }
    }
}

/// White paint through a luminance mask with its top-left at (x, y)
fn composite_mask(canvas: &mut RgbaImage, mask: &GrayImage, x: i64, y: i64) {
    for (mx, my, coverage) in mask.enumerate_pixels() {
        blend_pixel(canvas, x + mx as i64, y + my as i64, WHITE, coverage.0[0]);
    }
}
