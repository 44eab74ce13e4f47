//! Symbol classification and pre-rendered emoji assets
//!
//! A code point is substituted when its general category is one of the Symbol
//! categories (Sm, Sc, Sk, So). Assets live in one directory, one PNG per code point,
//! named `emoji_u<hex>.png` with at least four lowercase hex digits (Noto layout).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::GrayImage;

use super::luminance;

/// Inclusive code point ranges with general category Sm, Sc, Sk or So.
///
/// Sorted and disjoint; covers Latin, the symbol and arrow blocks, CJK symbol
/// blocks, halfwidth/fullwidth forms and the supplementary emoji planes.
const SYMBOL_RANGES: &[(u32, u32)] = &[
    (0x0024, 0x0024),
    (0x002B, 0x002B),
    (0x003C, 0x003E),
    (0x005E, 0x005E),
    (0x0060, 0x0060),
    (0x007C, 0x007C),
    (0x007E, 0x007E),
    (0x00A2, 0x00A6),
    (0x00A8, 0x00A9),
    (0x00AC, 0x00AC),
    (0x00AE, 0x00B1),
    (0x00B4, 0x00B4),
    (0x00B8, 0x00B8),
    (0x00D7, 0x00D7),
    (0x00F7, 0x00F7),
    (0x02C2, 0x02C5),
    (0x02D2, 0x02DF),
    (0x02E5, 0x02EB),
    (0x02ED, 0x02ED),
    (0x02EF, 0x02FF),
    (0x0375, 0x0375),
    (0x0384, 0x0385),
    (0x03F6, 0x03F6),
    (0x0482, 0x0482),
    (0x058D, 0x058F),
    (0x0606, 0x0608),
    (0x060B, 0x060B),
    (0x060E, 0x060F),
    (0x06DE, 0x06DE),
    (0x06E9, 0x06E9),
    (0x06FD, 0x06FE),
    (0x07F6, 0x07F6),
    (0x07FE, 0x07FF),
    (0x09F2, 0x09F3),
    (0x09FA, 0x09FB),
    (0x0AF1, 0x0AF1),
    (0x0B70, 0x0B70),
    (0x0BF3, 0x0BFA),
    (0x0C7F, 0x0C7F),
    (0x0D4F, 0x0D4F),
    (0x0D79, 0x0D79),
    (0x0E3F, 0x0E3F),
    (0x2044, 0x2044),
    (0x2052, 0x2052),
    (0x207A, 0x207C),
    (0x208A, 0x208C),
    (0x20A0, 0x20C0),
    (0x2100, 0x2101),
    (0x2103, 0x2106),
    (0x2108, 0x2109),
    (0x2114, 0x2114),
    (0x2116, 0x2118),
    (0x211E, 0x2123),
    (0x2125, 0x2125),
    (0x2127, 0x2127),
    (0x2129, 0x2129),
    (0x212E, 0x212E),
    (0x213A, 0x213B),
    (0x2140, 0x2144),
    (0x214A, 0x214D),
    (0x214F, 0x214F),
    (0x218A, 0x218B),
    (0x2190, 0x2307),
    (0x230C, 0x2328),
    (0x232B, 0x2426),
    (0x2440, 0x244A),
    (0x249C, 0x24E9),
    (0x2500, 0x2767),
    (0x2794, 0x27C4),
    (0x27C7, 0x27E5),
    (0x27F0, 0x2982),
    (0x2999, 0x29D7),
    (0x29DC, 0x29FB),
    (0x29FE, 0x2B73),
    (0x2B76, 0x2B95),
    (0x2B97, 0x2BFF),
    (0x2CE5, 0x2CEA),
    (0x2E50, 0x2E51),
    (0x2E80, 0x2E99),
    (0x2E9B, 0x2EF3),
    (0x2F00, 0x2FD5),
    (0x2FF0, 0x2FFF),
    (0x3004, 0x3004),
    (0x3012, 0x3013),
    (0x3020, 0x3020),
    (0x3036, 0x3037),
    (0x303E, 0x303F),
    (0x309B, 0x309C),
    (0x3190, 0x3191),
    (0x3196, 0x319F),
    (0x31C0, 0x31E3),
    (0x31EF, 0x31EF),
    (0x3200, 0x321E),
    (0x322A, 0x3247),
    (0x3250, 0x3250),
    (0x3260, 0x327F),
    (0x328A, 0x32B0),
    (0x32C0, 0x33FF),
    (0x4DC0, 0x4DFF),
    (0xA490, 0xA4C6),
    (0xA700, 0xA716),
    (0xA720, 0xA721),
    (0xA789, 0xA78A),
    (0xA828, 0xA82B),
    (0xA836, 0xA839),
    (0xAA77, 0xAA79),
    (0xAB5B, 0xAB5B),
    (0xAB6A, 0xAB6B),
    (0xFB29, 0xFB29),
    (0xFBB2, 0xFBC2),
    (0xFDFC, 0xFDFF),
    (0xFE62, 0xFE62),
    (0xFE64, 0xFE66),
    (0xFE69, 0xFE69),
    (0xFF04, 0xFF04),
    (0xFF0B, 0xFF0B),
    (0xFF1C, 0xFF1E),
    (0xFF3E, 0xFF3E),
    (0xFF40, 0xFF40),
    (0xFF5C, 0xFF5C),
    (0xFF5E, 0xFF5E),
    (0xFFE0, 0xFFE6),
    (0xFFE8, 0xFFEE),
    (0xFFFC, 0xFFFD),
    (0x1D000, 0x1D0F5),
    (0x1D100, 0x1D126),
    (0x1D129, 0x1D164),
    (0x1D16A, 0x1D16C),
    (0x1D183, 0x1D184),
    (0x1D18C, 0x1D1A9),
    (0x1D1AE, 0x1D1EA),
    (0x1D200, 0x1D241),
    (0x1D245, 0x1D245),
    (0x1D300, 0x1D356),
    (0x1EEF0, 0x1EEF1),
    (0x1F000, 0x1F02B),
    (0x1F030, 0x1F093),
    (0x1F0A0, 0x1F0F5),
    (0x1F10D, 0x1F1AD),
    (0x1F1E6, 0x1F202),
    (0x1F210, 0x1F23B),
    (0x1F240, 0x1F248),
    (0x1F250, 0x1F251),
    (0x1F260, 0x1F265),
    (0x1F300, 0x1F6D7),
    (0x1F6DC, 0x1F6EC),
    (0x1F6F0, 0x1F6FC),
    (0x1F700, 0x1F776),
    (0x1F77B, 0x1F7D9),
    (0x1F7E0, 0x1F7EB),
    (0x1F7F0, 0x1F7F0),
    (0x1F800, 0x1F80B),
    (0x1F810, 0x1F847),
    (0x1F850, 0x1F859),
    (0x1F860, 0x1F887),
    (0x1F890, 0x1F8AD),
    (0x1F8B0, 0x1F8B1),
    (0x1F900, 0x1FA53),
    (0x1FA60, 0x1FA6D),
    (0x1FA70, 0x1FA7C),
    (0x1FA80, 0x1FA88),
    (0x1FA90, 0x1FABD),
    (0x1FABF, 0x1FAC5),
    (0x1FACE, 0x1FADB),
    (0x1FAE0, 0x1FAE8),
    (0x1FAF0, 0x1FAF8),
    (0x1FB00, 0x1FB92),
    (0x1FB94, 0x1FBCA),
];

pub fn is_symbol(c: char) -> bool {
    use std::cmp::Ordering;

    let cp = c as u32;
    SYMBOL_RANGES
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                Ordering::Less
            } else if lo > cp {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .is_ok()
}

/// U+FE0E (text presentation) and U+FE0F (emoji presentation)
pub fn is_variation_selector(c: char) -> bool {
    c == '\u{FE0E}' || c == '\u{FE0F}'
}

/// File name of the pre-rendered asset for `c`
pub fn asset_name(c: char) -> String {
    format!("emoji_u{:04x}.png", c as u32)
}

/// Result of looking up a symbol's asset
#[derive(Debug, Clone)]
pub enum Substitution {
    /// Luminance mask scaled to the cell
    Mask(GrayImage),
    /// No asset for this code point: draw it as text
    Missing,
    /// Asset exists but could not be read or decoded: skip the code point
    Unreadable,
}

/// Emoji directory with a per-(code point, cell size) mask cache
pub struct EmojiAssets {
    dir: PathBuf,
    cache: HashMap<(char, u32), Substitution>,
}

impl EmojiAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, c: char) -> PathBuf {
        self.dir.join(asset_name(c))
    }

    pub fn lookup(&mut self, c: char, cell: u32) -> &Substitution {
        let path = self.path_for(c);
        self.cache
            .entry((c, cell))
            .or_insert_with(|| load_mask(&path, cell))
    }
}

fn load_mask(path: &Path, cell: u32) -> Substitution {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Substitution::Missing,
        Err(e) => {
            log::warn!("Emoji: failed to read {}: {}", path.display(), e);
            return Substitution::Unreadable;
        }
    };

    let img = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("Emoji: failed to decode {}: {}", path.display(), e);
            return Substitution::Unreadable;
        }
    };

    let cell = cell.max(1);
    let scaled = image::imageops::resize(&img.to_rgba8(), cell, cell, FilterType::Triangle);
    let mask = GrayImage::from_fn(cell, cell, |x, y| {
        let [r, g, b, a] = scaled.get_pixel(x, y).0;
        image::Luma([luminance(r, g, b, a)])
    });
    Substitution::Mask(mask)
}
