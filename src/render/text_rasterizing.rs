use std::path::Path;

use cosmic_text::fontdb::Database;
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, SwashContent};
use image::RgbaImage;

use super::compositor::{CellMetrics, TextPainter};
use super::{blend_pixel, WHITE};
use crate::error::{QuoteError, Result};

/// Shapes and rasterizes runs of text in a single font face.
///
/// Vertical metrics come straight from the font's `hhea` table so that the cell
/// height matches what emoji substitutions are scaled to.
pub struct TextRenderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: String,
    ascender: f32,
    descender: f32,
}

impl TextRenderer {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| QuoteError::Asset(format!("font {}: {}", path.display(), e)))?;
        Self::from_font_data(data)
    }

    pub fn from_font_data(data: Vec<u8>) -> Result<Self> {
        let (ascender, descender) = {
            let face = ttf_parser::Face::parse(&data, 0)
                .map_err(|e| QuoteError::Asset(format!("font: {}", e)))?;
            let units = face.units_per_em() as f32;
            (
                face.ascender() as f32 / units,
                -(face.descender() as f32) / units,
            )
        };

        let mut db = Database::new();
        db.load_font_data(data);
        let family = db
            .faces()
            .next()
            .and_then(|face| {
                face.families
                    .first()
                    .map(|(name, _)| name.clone())
                    .or_else(|| Some(face.post_script_name.clone()))
            })
            .ok_or_else(|| QuoteError::Asset("font: no usable face".to_string()))?;

        Ok(Self {
            font_system: FontSystem::new_with_locale_and_db("ja-JP".to_string(), db),
            swash_cache: SwashCache::new(),
            family,
            ascender,
            descender,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    fn shape(&mut self, text: &str, size: f32) -> Buffer {
        let attrs = Attrs::new().family(Family::Name(&self.family));

        let mut buffer = Buffer::new(&mut self.font_system, Metrics::relative(size, 1.2));
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Advance width of `text` at `size`, trailing spaces included
    pub fn measure(&mut self, text: &str, size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let buffer = self.shape(text, size);
        run_width(&buffer)
    }

    /// Draw `text` left-aligned with its baseline at `baseline`; returns the advance
    pub fn draw_text(
        &mut self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        colour: [u8; 3],
    ) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let buffer = self.shape(text, size);

        for run in buffer.layout_runs() {
            for glyph in run.glyphs {
                let physical_glyph = glyph.physical((x, baseline), 1.);

                let Some(image) = self
                    .swash_cache
                    .get_image(&mut self.font_system, physical_glyph.cache_key)
                else {
                    continue;
                };

                let glyph_x = physical_glyph.x + image.placement.left;
                let glyph_y = physical_glyph.y - image.placement.top;
                let glyph_width = image.placement.width as usize;
                let glyph_height = image.placement.height as usize;

                for cy in 0..glyph_height {
                    for cx in 0..glyph_width {
                        let i = cy * glyph_width + cx;
                        let alpha = match image.content {
                            SwashContent::Mask => image.data[i],
                            SwashContent::Color => image.data[i * 4 + 3],
                            SwashContent::SubpixelMask => {
                                let p = &image.data[i * 4..i * 4 + 3];
                                p[0].max(p[1]).max(p[2])
                            }
                        };
                        blend_pixel(
                            canvas,
                            (glyph_x + cx as i32) as i64,
                            (glyph_y + cy as i32) as i64,
                            colour,
                            alpha,
                        );
                    }
                }
            }
        }

        run_width(&buffer)
    }
}

fn run_width(buffer: &Buffer) -> f32 {
    buffer.layout_runs().fold(0.0, |max_width, run| {
        let run_width = run
            .glyphs
            .iter()
            .fold(0.0, |w, glyph| (glyph.x + glyph.w).max(w));
        max_width.max(run_width)
    })
}

impl TextPainter for TextRenderer {
    fn cell_metrics(&self, size: f32) -> CellMetrics {
        let ascent = (self.ascender * size).floor();
        let descent = (self.descender * size).floor();
        CellMetrics {
            ascent: ascent as i32,
            cell: (ascent + descent).max(1.0) as u32,
        }
    }

    fn paint(&mut self, canvas: &mut RgbaImage, text: &str, x: f32, baseline: f32, size: f32) -> f32 {
        self.draw_text(canvas, text, x, baseline, size, WHITE)
    }
}
