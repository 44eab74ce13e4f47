//! Author portrait behind the card
//!
//! The portrait is scaled to the canvas height (aspect preserved), converted to
//! grayscale, and shown only where the background template is transparent: the
//! template's alpha is the inverse of the portrait's mask.

use std::time::Duration;

use base64::Engine;
use image::RgbaImage;
use resize::Type::Lanczos3;
use rgb::FromSlice;

use super::{div255, luminance};
use crate::error::{QuoteError, Result};

pub struct PortraitMasker {
    timeout: Duration,
}

impl PortraitMasker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fetch and decode `reference`, then blend it onto `canvas` through `background`
    pub fn blend(&self, canvas: &mut RgbaImage, background: &RgbaImage, reference: &str) -> Result<()> {
        let bytes = self.load(reference)?;
        let portrait = image::load_from_memory(&bytes)
            .map_err(|e| QuoteError::Decode(format!("portrait: {}", e)))?
            .to_rgba8();
        blend_portrait(canvas, background, &portrait)
    }

    /// Raw image bytes from a `data:` URL or an HTTP(S) location
    pub fn load(&self, reference: &str) -> Result<Vec<u8>> {
        if let Some(rest) = reference.strip_prefix("data:") {
            return decode_data_url(rest);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| QuoteError::Asset(format!("Failed to create client: {}", e)))?;
        let response = client
            .get(reference)
            .send()
            .map_err(|e| QuoteError::Asset(format!("portrait {}: {}", reference, e)))?;
        if !response.status().is_success() {
            return Err(QuoteError::Asset(format!(
                "portrait {}: HTTP {}",
                reference,
                response.status()
            )));
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| QuoteError::Asset(format!("portrait {}: {}", reference, e)))
    }
}

/// `<mediatype>[;base64],<payload>` with the `data:` prefix already stripped.
/// Non-base64 payloads are taken as raw bytes.
fn decode_data_url(rest: &str) -> Result<Vec<u8>> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| QuoteError::Decode("data URL without payload".to_string()))?;

    if header.split(';').any(|param| param.eq_ignore_ascii_case("base64")) {
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned.as_bytes())
            .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(cleaned.as_bytes()))
            .map_err(|e| QuoteError::Decode(format!("data URL: {}", e)))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Grayscale `portrait` scaled to the canvas height, drawn at the origin with
/// coverage `255 - background alpha`
pub fn blend_portrait(canvas: &mut RgbaImage, background: &RgbaImage, portrait: &RgbaImage) -> Result<()> {
    let (src_w, src_h) = portrait.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(QuoteError::Decode("portrait: empty image".to_string()));
    }

    let dst_h = canvas.height() as usize;
    let dst_w = ((src_w as usize * dst_h + src_h as usize / 2) / src_h as usize).max(1);

    let mut resizer = resize::new(
        src_w as usize,
        src_h as usize,
        dst_w,
        dst_h,
        resize::Pixel::RGBA8,
        Lanczos3,
    )
    .map_err(|e| QuoteError::Decode(format!("Failed to create resizer: {:?}", e)))?;
    let mut scaled = vec![rgb::RGBA8::new(0, 0, 0, 0); dst_w * dst_h];
    resizer
        .resize(portrait.as_raw().as_rgba(), &mut scaled)
        .map_err(|e| QuoteError::Decode(format!("Failed to resize: {:?}", e)))?;

    let width = (canvas.width() as usize).min(dst_w).min(background.width() as usize);
    let height = dst_h.min(background.height() as usize);
    for y in 0..height {
        for x in 0..width {
            let mask = 255 - background.get_pixel(x as u32, y as u32).0[3] as u32;
            if mask == 0 {
                continue;
            }
            let p = scaled[y * dst_w + x];
            let gray = luminance(p.r, p.g, p.b, p.a) as u32;

            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                pixel.0[c] = div255(gray * mask + pixel.0[c] as u32 * (255 - mask));
            }
        }
    }
    Ok(())
}
