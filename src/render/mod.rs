//! Quote card rendering
//!
//! Everything draws onto an `image::RgbaImage` canvas that is fully opaque (alpha 255)
//! from the moment it is created, so blending only ever touches RGB.

pub mod card;
pub mod compositor;
pub mod emoji;
pub mod fit;
pub mod portrait;
mod text_rasterizing;

pub use card::{Card, CardRenderer, Render};
pub use compositor::{GlyphCell, GlyphCompositor, TextPainter};
pub use emoji::EmojiAssets;
pub use fit::{fit, LayoutResult};
pub use portrait::PortraitMasker;
pub use text_rasterizing::TextRenderer;

use image::RgbaImage;

pub const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Rounded `v / 255` for products of two 8-bit values
#[inline]
pub(crate) fn div255(v: u32) -> u8 {
    ((v + 127) / 255) as u8
}

/// Blend `colour` over the pixel at (x, y) with coverage `alpha`; out-of-bounds is a no-op
#[inline]
pub(crate) fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, colour: [u8; 3], alpha: u8) {
    if alpha == 0 || x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    let a = alpha as u32;
    let inv = 255 - a;
    for c in 0..3 {
        pixel.0[c] = div255(pixel.0[c] as u32 * inv + colour[c] as u32 * a);
    }
}

/// Luminance of a straight-alpha RGBA pixel, premultiplied (transparent -> black)
#[inline]
pub(crate) fn luminance(r: u8, g: u8, b: u8, a: u8) -> u8 {
    // ITU-R BT.601 weights in 16.16 fixed point
    let y = (19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + (1 << 15)) >> 16;
    div255(y * a as u32)
}
