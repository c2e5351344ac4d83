//! TrueType text rendering onto RGBA canvases.
//!
//! Glyphs are laid out on a single line with ab_glyph and blended into the
//! target with their anti-aliased coverage as alpha.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{Pixel, Rgba, RgbaImage};

/// Size of a laid-out line in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSize {
    pub width: u32,
    pub height: u32,
}

/// Measure one line of text at `pixel_height`.
pub fn measure(font: &FontArc, text: &str, pixel_height: f32) -> TextSize {
    let scaled = font.as_scaled(PxScale::from(pixel_height));
    let mut caret = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        caret += scaled.h_advance(id);
        previous = Some(id);
    }
    TextSize {
        width: caret.ceil().max(0.0) as u32,
        height: (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32,
    }
}

/// Draw text with its line box's top-left corner at `(x, y)`.
pub fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    pixel_height: f32,
    x: i32,
    y: i32,
    color: Rgba<u8>,
) {
    let scale = PxScale::from(pixel_height);
    let scaled = font.as_scaled(scale);
    let baseline = y as f32 + scaled.ascent();
    let (cw, ch) = canvas.dimensions();

    let mut caret = x as f32;
    let mut previous = None;
    for c in text.chars() {
        let id = font.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = gx as i32 + bounds.min.x as i32;
            let py = gy as i32 + bounds.min.y as i32;
            if px < 0 || py < 0 || px >= cw as i32 || py >= ch as i32 {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
            if alpha == 0 {
                return;
            }
            canvas
                .get_pixel_mut(px as u32, py as u32)
                .blend(&Rgba([color[0], color[1], color[2], alpha]));
        });
    }
}

/// Draw text horizontally centred on `center_x`.
pub fn draw_centered(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    pixel_height: f32,
    center_x: i32,
    y: i32,
    color: Rgba<u8>,
) -> TextSize {
    let size = measure(font, text, pixel_height);
    draw_text(
        canvas,
        font,
        text,
        pixel_height,
        center_x - size.width as i32 / 2,
        y,
        color,
    );
    size
}

/// Largest size in `start, start - step, ...` whose width fits `max_width`,
/// bottoming out at `min`.
pub fn fit_size(font: &FontArc, text: &str, start: f32, min: f32, step: f32, max_width: u32) -> f32 {
    shrink_to_fit(start, min, step, |size| measure(font, text, size).width <= max_width)
}

/// Discrete shrink loop shared by [`fit_size`] and its tests.
fn shrink_to_fit(start: f32, min: f32, step: f32, fits: impl Fn(f32) -> bool) -> f32 {
    let mut size = start;
    while size > min && !fits(size) {
        size = (size - step).max(min);
    }
    size
}

/// `1500` → `"1,500"`.
pub fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
