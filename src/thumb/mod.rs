//! Gradient thumbnail synthesis.
//!
//! Placeholder campaign images: a vertical two-color gradient with a glyph
//! centered over it, rendered once offset in dark as a shadow and once in
//! white above it, encoded as JPEG at fixed quality.
mod font;

use crate::CampaignId;
use crate::artifact;
use crate::payload;
use crate::report::Tally;
use crate::storage_key;
use crate::wrangler::Store;
use anyhow::Context;
use image::ImageEncoder;
use image::Rgb;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// Canvas for themed thumbnails.
pub const WIDTH: u32 = 400;
pub const HEIGHT: u32 = 400;
/// Shorter canvas for plain gradient placeholders.
pub const FILL_HEIGHT: u32 = 300;
/// Glyph size on the themed canvas.
pub const GLYPH_PX: f32 = 120.0;
/// Shadow offset in pixels, down and to the right.
pub const SHADOW_OFFSET: f32 = 3.0;
/// Lossy output quality.
pub const JPEG_QUALITY: u8 = 85;

/// Rotating palette for placeholder gradients on campaigns that never had
/// an image. Index by position in the request, not by campaign id.
pub const FALLBACK_PALETTE: &[(&str, &str)] = &[
    ("#9333EA", "#EC4899"),
    ("#7C3AED", "#A855F7"),
    ("#8B5CF6", "#C084FC"),
    ("#6366F1", "#818CF8"),
    ("#EC4899", "#F472B6"),
];

/// Colors and glyph for one thumbnail.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Theme {
    pub top: String,
    pub bottom: String,
    pub glyph: String,
}

/// One entry of a theme manifest: which campaign gets which theme.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CampaignTheme {
    pub id: CampaignId,
    #[serde(flatten)]
    pub theme: Theme,
}

/// The built-in campaign themes.
pub fn campaign_palette() -> Vec<CampaignTheme> {
    const THEMES: &[(CampaignId, &str, &str, &str)] = &[
        (13, "#FFD700", "#FFA500", "🍗"),
        (14, "#FFB6C1", "#FFC0CB", "✨"),
        (15, "#FFB6C1", "#FF69B4", "🍰"),
        (16, "#98FB98", "#90EE90", "💊"),
        (17, "#FFD700", "#FFA500", "🍯"),
        (18, "#8B4513", "#A0522D", "☕"),
        (19, "#F5DEB3", "#D2B48C", "👜"),
        (20, "#E6E6FA", "#D8BFD8", "🌿"),
        (21, "#FFA07A", "#FF7F50", "🐶"),
        (22, "#7CFC00", "#32CD32", "🥤"),
    ];
    THEMES
        .iter()
        .map(|(id, top, bottom, glyph)| CampaignTheme {
            id: *id,
            theme: Theme {
                top: (*top).to_string(),
                bottom: (*bottom).to_string(),
                glyph: (*glyph).to_string(),
            },
        })
        .collect()
}

/// Parse a `#RRGGBB` hex triple.
pub fn hex(s: &str) -> anyhow::Result<Rgb<u8>> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    anyhow::ensure!(
        digits.len() == 6 && digits.is_ascii(),
        "expected #RRGGBB, got {:?}",
        s
    );
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).with_context(|| format!("bad hex triple {:?}", s))
    };
    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

/// Vertical gradient: the top color at row 0, interpolating linearly toward
/// the bottom color at the final row.
pub fn gradient(top: Rgb<u8>, bottom: Rgb<u8>, width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        let ratio = y as f32 / height as f32;
        let color = lerp(top, bottom, ratio);
        for x in 0..width {
            img.put_pixel(x, y, color);
        }
    }
    img
}

fn lerp(a: Rgb<u8>, b: Rgb<u8>, t: f32) -> Rgb<u8> {
    let mix = |i: usize| (f32::from(a[i]) + (f32::from(b[i]) - f32::from(a[i])) * t) as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// Render a themed thumbnail: gradient background, glyph centered with a
/// drop shadow.
pub fn render(theme: &Theme, width: u32, height: u32) -> anyhow::Result<RgbImage> {
    let top = hex(&theme.top)?;
    let bottom = hex(&theme.bottom)?;
    let mut img = gradient(top, bottom, width, height);
    let face = font::load();
    let (tw, th) = font::measure(&face, &theme.glyph, GLYPH_PX);
    let x = (width as f32 - tw) / 2.0;
    let y = (height as f32 - th) / 2.0;
    font::draw(
        &mut img,
        &face,
        &theme.glyph,
        GLYPH_PX,
        (x + SHADOW_OFFSET, y + SHADOW_OFFSET),
        Rgb([0, 0, 0]),
        0.5,
    );
    font::draw(&mut img, &face, &theme.glyph, GLYPH_PX, (x, y), Rgb([255, 255, 255]), 1.0);
    Ok(img)
}

/// Encode to JPEG at the fixed quality.
pub fn jpeg(img: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgb8)
        .context("jpeg encoding")?;
    Ok(buf)
}

/// Render every themed entry to a data-URI artifact in `dir`.
pub fn generate(entries: &[CampaignTheme], dir: &Path) -> Tally {
    let mut tally = Tally::default();
    for entry in entries {
        match generate_one(entry, dir) {
            Ok(chars) => {
                log::info!("campaign {} ({}): {} chars", entry.id, entry.theme.glyph, chars);
                tally.ok();
            }
            Err(e) => {
                log::warn!("campaign {}: {:#}", entry.id, e);
                tally.fail();
            }
        }
    }
    tally
}

fn generate_one(entry: &CampaignTheme, dir: &Path) -> anyhow::Result<usize> {
    let img = render(&entry.theme, WIDTH, HEIGHT)?;
    let uri = payload::encode(&jpeg(&img)?, "jpeg");
    artifact::write(dir, entry.id, &uri)?;
    Ok(uri.len())
}

/// Upload plain gradient placeholders for campaigns that have no image at
/// all, rotating through the fallback palette.
pub fn fill(ids: &[CampaignId], store: &impl Store) -> Tally {
    let mut tally = Tally::default();
    for (index, id) in ids.iter().enumerate() {
        let (top, bottom) = FALLBACK_PALETTE[index % FALLBACK_PALETTE.len()];
        match fill_one(*id, top, bottom, store) {
            Ok(bytes) => {
                log::info!("campaign {}: uploaded {} bytes as {}", id, bytes, storage_key(*id));
                tally.ok();
            }
            Err(e) => {
                log::warn!("campaign {}: {:#}", id, e);
                tally.fail();
            }
        }
    }
    tally
}

fn fill_one(id: CampaignId, top: &str, bottom: &str, store: &impl Store) -> anyhow::Result<usize> {
    let img = gradient(hex(top)?, hex(bottom)?, WIDTH, FILL_HEIGHT);
    let bytes = jpeg(&img)?;
    store.put(&storage_key(id), &bytes, "image/jpeg")?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_triples() {
        assert_eq!(hex("#FFD700").unwrap(), Rgb([0xFF, 0xD7, 0x00]));
        assert_eq!(hex("8B4513").unwrap(), Rgb([0x8B, 0x45, 0x13]));
        assert!(hex("#FFD7").is_err());
        assert!(hex("#GGGGGG").is_err());
    }

    #[test]
    fn gradient_hits_both_endpoints() {
        let top = Rgb([0x93, 0x33, 0xEA]);
        let bottom = Rgb([0xEC, 0x48, 0x99]);
        let img = gradient(top, bottom, 4, 120);
        assert_eq!(*img.get_pixel(0, 0), top);
        let last = img.get_pixel(0, 119);
        for i in 0..3 {
            assert!((i32::from(last[i]) - i32::from(bottom[i])).abs() <= 3);
        }
    }

    #[test]
    fn gradient_channels_are_monotonic() {
        let top = Rgb([0xFF, 0x33, 0x80]);
        let bottom = Rgb([0x00, 0xEE, 0x80]);
        let img = gradient(top, bottom, 1, 64);
        for i in 0..3 {
            let rising = bottom[i] >= top[i];
            for y in 1..64 {
                let prev = img.get_pixel(0, y - 1)[i];
                let here = img.get_pixel(0, y)[i];
                if rising {
                    assert!(here >= prev);
                } else {
                    assert!(here <= prev);
                }
            }
        }
    }

    #[test]
    fn render_places_a_white_glyph() {
        let theme = Theme {
            top: "#8B4513".to_string(),
            bottom: "#A0522D".to_string(),
            glyph: "A".to_string(),
        };
        let img = render(&theme, WIDTH, HEIGHT).unwrap();
        let white = img.pixels().filter(|p| p[0] > 240 && p[1] > 240 && p[2] > 240).count();
        assert!(white > 0);
    }

    #[test]
    fn jpeg_output_is_jpeg() {
        let img = gradient(Rgb([1, 2, 3]), Rgb([4, 5, 6]), 16, 16);
        let bytes = jpeg(&img).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn manifest_round_trip() {
        let json = r##"[{"id": 13, "top": "#FFD700", "bottom": "#FFA500", "glyph": "C"}]"##;
        let entries: Vec<CampaignTheme> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].id, 13);
        assert_eq!(entries[0].theme.top, "#FFD700");
    }
}
