//! The full quote card: portrait, body, attribution and timestamp on the template.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use image::{ImageFormat, Rgba, RgbaImage};

use super::compositor::{GlyphCompositor, TextPainter};
use super::emoji::EmojiAssets;
use super::fit::fit;
use super::portrait::PortraitMasker;
use super::text_rasterizing::TextRenderer;
use super::WHITE;
use crate::error::{QuoteError, Result};

/// Base font size in pixels before fit scaling
pub const FONT_SIZE: f32 = 25.0;
/// First baseline of the body text
pub const BODY_ORIGIN: (f32, f32) = (520.0, 100.0);
pub const ATTRIBUTION_X: f32 = 480.0;
pub const TIMESTAMP_X: f32 = 600.0;
/// Distance from the canvas bottom to the timestamp baseline
pub const BOTTOM_MARGIN: f32 = 30.0;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub body: String,
    /// "display name (name)"
    pub attribution: String,
    /// URL or `data:` URL of the author's picture
    pub portrait: Option<String>,
}

/// PNG-producing renderer; the pipeline only sees this seam
pub trait Render {
    fn render(&mut self, card: &Card) -> Result<Vec<u8>>;
}

/// Wall clock in a fixed zone, printed with a literal label such as "JST"
#[derive(Debug, Clone)]
pub struct Zone {
    pub offset: FixedOffset,
    pub label: String,
}

impl Zone {
    pub fn format(&self, at: &DateTime<FixedOffset>) -> String {
        format!("{} {}", at.format(TIMESTAMP_FORMAT), self.label)
    }
}

pub struct CardRenderer {
    background: RgbaImage,
    text: TextRenderer,
    emoji: EmojiAssets,
    masker: PortraitMasker,
    zone: Zone,
}

impl CardRenderer {
    pub fn new(background_png: &[u8], text: TextRenderer, emoji: EmojiAssets, timeout: Duration, zone: Zone) -> Result<Self> {
        let background = image::load_from_memory(background_png)
            .map_err(|e| QuoteError::Asset(format!("background template: {}", e)))?
            .to_rgba8();
        Ok(Self {
            background,
            text,
            emoji,
            masker: PortraitMasker::new(timeout),
            zone,
        })
    }

    pub fn from_paths(
        background_png: &[u8],
        font: &Path,
        emoji_dir: &Path,
        timeout: Duration,
        zone: Zone,
    ) -> Result<Self> {
        let text = TextRenderer::from_file(font)?;
        log::info!("Font: {} ({})", text.family(), font.display());
        Self::new(background_png, text, EmojiAssets::new(emoji_dir), timeout, zone)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.background.dimensions()
    }

    /// Draw `card` with the timestamp fixed at `at`; returns PNG bytes
    pub fn render_at(&mut self, card: &Card, at: DateTime<FixedOffset>) -> Result<Vec<u8>> {
        let (width, height) = self.background.dimensions();
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0xFF]));

        if let Some(reference) = card.portrait.as_deref() {
            self.masker.blend(&mut canvas, &self.background, reference)?;
        }

        let layout = fit(&card.body);
        let body_size = FONT_SIZE * layout.scale;
        let cell = self.text.cell_metrics(FONT_SIZE).cell as f32;

        let mut compositor = GlyphCompositor::new(&mut self.text, &mut self.emoji);
        compositor.draw_block(&mut canvas, BODY_ORIGIN, body_size, &layout.text);
        compositor.draw_block(
            &mut canvas,
            (ATTRIBUTION_X, height as f32 - BOTTOM_MARGIN - cell),
            FONT_SIZE,
            &card.attribution,
        );

        self.text.draw_text(
            &mut canvas,
            &self.zone.format(&at),
            TIMESTAMP_X,
            height as f32 - BOTTOM_MARGIN,
            FONT_SIZE,
            WHITE,
        );

        encode_png(canvas)
    }
}

impl Render for CardRenderer {
    fn render(&mut self, card: &Card) -> Result<Vec<u8>> {
        let now = Utc::now().with_timezone(&self.zone.offset);
        self.render_at(card, now)
    }
}

pub fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| QuoteError::Encode(e.to_string()))?;
    Ok(png)
}
