//! End-to-end card rendering with a real font, when the host has one.

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use chrono::{FixedOffset, TimeZone};
use image::{Rgba, RgbaImage};

use makeitquote::config::{default_zone, BACKGROUND_PNG};
use makeitquote::render::card::Zone;
use makeitquote::render::emoji::asset_name;
use makeitquote::render::{Card, CardRenderer};
use makeitquote::QuoteError;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

fn renderer(emoji_dir: &std::path::Path) -> Option<CardRenderer> {
    renderer_in(emoji_dir, default_zone())
}

fn renderer_in(emoji_dir: &std::path::Path, zone: Zone) -> Option<CardRenderer> {
    let Some(font) = system_font() else {
        eprintln!("no system font found, skipping");
        return None;
    };
    Some(CardRenderer::from_paths(BACKGROUND_PNG, &font, emoji_dir, Duration::from_secs(2), zone).unwrap())
}

fn white_square(path: std::path::PathBuf) {
    RgbaImage::from_pixel(72, 72, Rgba([255, 255, 255, 255]))
        .save(path)
        .unwrap();
}

fn data_url(img: &RgbaImage) -> String {
    let mut png = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    )
}

fn fixed_time() -> chrono::DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2023, 3, 14, 15, 9, 26)
        .unwrap()
}

fn decode(png: &[u8]) -> RgbaImage {
    image::load_from_memory(png).unwrap().to_rgba8()
}

fn region_is_black(img: &RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) -> bool {
    (y0..y1).all(|y| (x0..x1).all(|x| img.get_pixel(x, y).0[..3] == [0, 0, 0]))
}

#[test]
fn test_render_is_deterministic_and_template_sized() {
    let emoji = tempfile::tempdir().unwrap();
    let Some(mut renderer) = renderer(emoji.path()) else {
        return;
    };
    let card = Card {
        body: "hello\nworld".to_string(),
        attribution: "Alice (alice)".to_string(),
        portrait: None,
    };

    let first = renderer.render_at(&card, fixed_time()).unwrap();
    let second = renderer.render_at(&card, fixed_time()).unwrap();
    assert_eq!(first, second);

    let img = decode(&first);
    assert_eq!(img.dimensions(), renderer.dimensions());
    assert_eq!(img.dimensions(), (1200, 630));
    assert!(img.pixels().all(|p| p.0[3] == 255));

    // Two body lines hang off the (520, 100) baseline
    assert!(!region_is_black(&img, 520, 70, 700, 105));
    assert!(!region_is_black(&img, 520, 105, 700, 135));
    // Without a portrait the window stays black
    assert!(region_is_black(&img, 200, 250, 300, 380));
    // Timestamp on the bottom baseline
    assert!(!region_is_black(&img, 600, 580, 900, 600));
}

#[test]
fn test_inline_portrait_shows_through_window() {
    let emoji = tempfile::tempdir().unwrap();
    let Some(mut renderer) = renderer(emoji.path()) else {
        return;
    };
    let card = Card {
        body: "hi".to_string(),
        attribution: "Bob (bob)".to_string(),
        portrait: Some(data_url(&RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 255])))),
    };

    let img = decode(&renderer.render_at(&card, fixed_time()).unwrap());
    assert!(img.get_pixel(250, 315).0[0] >= 250);
    // Opaque template area on the right is untouched by the portrait
    assert!(region_is_black(&img, 1150, 10, 1190, 60));
}

#[test]
fn test_soft_window_edge_dims_portrait_once() {
    let emoji = tempfile::tempdir().unwrap();
    let Some(mut renderer) = renderer(emoji.path()) else {
        return;
    };
    let card = Card {
        body: String::new(),
        attribution: String::new(),
        portrait: Some(data_url(&RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 255])))),
    };
    let img = decode(&renderer.render_at(&card, fixed_time()).unwrap());

    // Partially transparent template pixels left of all text
    let template = image::load_from_memory(BACKGROUND_PNG).unwrap().to_rgba8();
    let edge: Vec<(u32, u32, u8)> = template
        .enumerate_pixels()
        .filter(|(x, y, p)| *x < 450 && *y < 560 && p.0[3] > 30 && p.0[3] < 225)
        .map(|(x, y, p)| (x, y, p.0[3]))
        .collect();
    assert!(!edge.is_empty());

    for (x, y, alpha) in edge {
        let expected = 255 - alpha as i32;
        let got = img.get_pixel(x, y).0[0] as i32;
        assert!(
            (got - expected).abs() <= 3,
            "({}, {}) alpha {}: expected {}, got {}",
            x,
            y,
            alpha,
            expected,
            got
        );
    }
}

#[test]
fn test_portrait_failure_fails_render() {
    let emoji = tempfile::tempdir().unwrap();
    let Some(mut renderer) = renderer(emoji.path()) else {
        return;
    };
    let mut card = Card {
        body: "never drawn".to_string(),
        attribution: " ()".to_string(),
        // Nothing listens on the discard port
        portrait: Some("http://127.0.0.1:9/avatar.png".to_string()),
    };
    assert!(matches!(
        renderer.render_at(&card, fixed_time()),
        Err(QuoteError::Asset(_))
    ));

    card.portrait = Some("data:image/png;base64,aGVsbG8=".to_string());
    assert!(matches!(
        renderer.render_at(&card, fixed_time()),
        Err(QuoteError::Decode(_))
    ));
}

#[test]
fn test_timestamp_ignores_emoji_assets() {
    let emoji = tempfile::tempdir().unwrap();
    white_square(emoji.path().join(asset_name('😀')));
    let zone = Zone {
        offset: FixedOffset::east_opt(9 * 3600).unwrap(),
        label: "😀".to_string(),
    };
    let Some(mut renderer) = renderer_in(emoji.path(), zone) else {
        return;
    };
    let card = Card {
        body: String::new(),
        attribution: String::new(),
        portrait: None,
    };
    let img = decode(&renderer.render_at(&card, fixed_time()).unwrap());

    // The label is set in the font, so no solid white asset block appears
    let solid_block = (560..590).any(|y0| {
        (600..1190).any(|x0| {
            (y0..y0 + 10).all(|y| (x0..x0 + 10).all(|x| img.get_pixel(x, y).0[..3] == [255, 255, 255]))
        })
    });
    assert!(!solid_block);
    assert!(!region_is_black(&img, 600, 580, 800, 600));
}

#[test]
fn test_emoji_asset_is_used() {
    let emoji = tempfile::tempdir().unwrap();
    white_square(emoji.path().join(asset_name('😀')));
    let Some(mut renderer) = renderer(emoji.path()) else {
        return;
    };
    let card = Card {
        body: "😀".to_string(),
        attribution: String::new(),
        portrait: None,
    };

    let img = decode(&renderer.render_at(&card, fixed_time()).unwrap());
    // A solid white square sits just right of the body origin, above the baseline
    assert_eq!(img.get_pixel(530, 95).0, [255, 255, 255, 255]);
}
