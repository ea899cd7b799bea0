//! Glyph rendering for thumbnail overlays.
//!
//! Prefers a scalable system face; when none of the known font paths exist
//! the coarse builtin bitmap face takes over, so some glyph always renders
//! at roughly the requested size. Visual fidelity is not a contract here.
use ab_glyph::Font;
use ab_glyph::FontVec;
use ab_glyph::PxScale;
use ab_glyph::ScaleFont;
use ab_glyph::point;
use image::Rgb;
use image::RgbImage;

/// Scalable faces probed in order at render time.
const PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
];

/// Builtin face geometry: 5x7 cells, one cell of inter-glyph gap.
const COLS: i32 = 5;
const ROWS: i32 = 7;

pub enum Face {
    Scalable(FontVec),
    Builtin,
}

/// Load the first usable scalable face, or fall back to the builtin one.
pub fn load() -> Face {
    for path in PATHS {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                log::debug!("scalable face {}", path);
                return Face::Scalable(font);
            }
        }
    }
    log::debug!("no scalable face found, using builtin bitmap face");
    Face::Builtin
}

/// Approximate width and height of `text` rendered at `px`.
pub fn measure(face: &Face, text: &str, px: f32) -> (f32, f32) {
    match face {
        Face::Scalable(font) => {
            let scaled = font.as_scaled(PxScale::from(px));
            let width = text
                .chars()
                .map(|c| scaled.h_advance(scaled.glyph_id(c)))
                .sum();
            (width, px)
        }
        Face::Builtin => {
            let cell = cell(px);
            let glyphs = text.chars().count() as f32;
            (
                (glyphs * (COLS + 1) as f32 - 1.0) * cell,
                ROWS as f32 * cell,
            )
        }
    }
}

/// Draw `text` at `origin` (top-left), blending `color` into the image at
/// `alpha` strength.
pub fn draw(img: &mut RgbImage, face: &Face, text: &str, px: f32, origin: (f32, f32), color: Rgb<u8>, alpha: f32) {
    match face {
        Face::Scalable(font) => scalable(img, font, text, px, origin, color, alpha),
        Face::Builtin => builtin(img, text, px, origin, color, alpha),
    }
}

fn scalable(img: &mut RgbImage, font: &FontVec, text: &str, px: f32, origin: (f32, f32), color: Rgb<u8>, alpha: f32) {
    let scaled = font.as_scaled(PxScale::from(px));
    let mut caret = point(origin.0, origin.1 + scaled.ascent());
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        let glyph = id.with_scale_and_position(PxScale::from(px), caret);
        caret.x += scaled.h_advance(id);
        if let Some(outlined) = scaled.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, coverage| {
                blend(
                    img,
                    bounds.min.x as i32 + x as i32,
                    bounds.min.y as i32 + y as i32,
                    color,
                    coverage * alpha,
                );
            });
        }
    }
}

fn builtin(img: &mut RgbImage, text: &str, px: f32, origin: (f32, f32), color: Rgb<u8>, alpha: f32) {
    let cell = cell(px).round() as i32;
    let mut x0 = origin.0.round() as i32;
    let y0 = origin.1.round() as i32;
    for c in text.chars() {
        let rows = bitmap(c);
        for (r, bits) in rows.iter().enumerate() {
            for col in 0..COLS {
                if bits & (1 << (COLS - 1 - col)) != 0 {
                    square(
                        img,
                        x0 + col * cell,
                        y0 + r as i32 * cell,
                        cell,
                        color,
                        alpha,
                    );
                }
            }
        }
        x0 += (COLS + 1) * cell;
    }
}

fn square(img: &mut RgbImage, x: i32, y: i32, side: i32, color: Rgb<u8>, alpha: f32) {
    for dy in 0..side {
        for dx in 0..side {
            blend(img, x + dx, y + dy, color, alpha);
        }
    }
}

fn blend(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if coverage <= 0.0 || x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let coverage = coverage.min(1.0);
    let pixel = img.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        let base = f32::from(pixel[i]);
        pixel[i] = (base + (f32::from(color[i]) - base) * coverage) as u8;
    }
}

fn cell(px: f32) -> f32 {
    (px / ROWS as f32).max(1.0)
}

/// 5x7 bitmap rows, most significant bit leftmost. Uppercase letters and
/// digits only; everything else renders as a hollow box.
#[rustfmt::skip]
fn bitmap(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        _   => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_measure_scales_with_px() {
        let (w, h) = measure(&Face::Builtin, "A", 120.0);
        assert!(h >= 100.0 && h <= 140.0);
        assert!(w > 0.0 && w < h);
    }

    #[test]
    fn builtin_draw_marks_pixels() {
        let mut img = RgbImage::new(200, 200);
        draw(&mut img, &Face::Builtin, "A", 120.0, (40.0, 40.0), Rgb([255, 255, 255]), 1.0);
        let lit = img.pixels().filter(|p| p[0] == 255).count();
        assert!(lit > 0);
    }

    #[test]
    fn blend_clips_out_of_bounds() {
        let mut img = RgbImage::new(4, 4);
        blend(&mut img, -1, 0, Rgb([255, 0, 0]), 1.0);
        blend(&mut img, 4, 4, Rgb([255, 0, 0]), 1.0);
        blend(&mut img, 1, 1, Rgb([200, 0, 0]), 1.0);
        assert_eq!(img.get_pixel(1, 1)[0], 200);
    }
}
