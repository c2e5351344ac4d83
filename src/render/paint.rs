//! Card background primitives: gradients, rounded corners, borders.

use image::{Pixel, Rgb, Rgba, RgbaImage, imageops};

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite interpolation, 0 below `edge0` and 1 above `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Scale each channel by `factor` (0.0 = black, 1.0 = unchanged).
pub fn shade(color: Rgb<u8>, factor: f32) -> Rgb<u8> {
    color.map(|c| (c as f32 * factor).round().clamp(0.0, 255.0) as u8)
}

/// Move each channel toward white by `amount`.
pub fn tint(color: Rgb<u8>, amount: f32) -> Rgb<u8> {
    color.map(|c| lerp(c as f32, 255.0, amount).round().clamp(0.0, 255.0) as u8)
}

/// Gradient stops for a flat rarity colour: lighter at the top, darker at the
/// bottom.
pub fn wash(color: Rgb<u8>) -> Vec<Rgb<u8>> {
    vec![tint(color, 0.25), color, shade(color, 0.45)]
}

/// Colour at `t` in [0, 1] along evenly spaced stops.
pub fn sample_stops(stops: &[Rgb<u8>], t: f32) -> Rgb<u8> {
    match stops.len() {
        0 => Rgb([0, 0, 0]),
        1 => stops[0],
        n => {
            let scaled = t.clamp(0.0, 1.0) * (n - 1) as f32;
            let i = (scaled.floor() as usize).min(n - 2);
            let local = scaled - i as f32;
            let (a, b) = (stops[i], stops[i + 1]);
            Rgb([
                lerp(a[0] as f32, b[0] as f32, local).round() as u8,
                lerp(a[1] as f32, b[1] as f32, local).round() as u8,
                lerp(a[2] as f32, b[2] as f32, local).round() as u8,
            ])
        }
    }
}

/// Top-to-bottom gradient with every colour scaled by `brightness`.
pub fn vertical_gradient(width: u32, height: u32, stops: &[Rgb<u8>], brightness: f32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let span = height.saturating_sub(1).max(1) as f32;
    for y in 0..height {
        let color = shade(sample_stops(stops, y as f32 / span), brightness);
        let pixel = Rgba([color[0], color[1], color[2], 255]);
        for x in 0..width {
            img.put_pixel(x, y, pixel);
        }
    }
    img
}

/// Fade the alpha channel outside a rounded rectangle of `radius`.
pub fn round_corners(img: &mut RgbaImage, radius: u32) {
    let (w, h) = img.dimensions();
    let r = radius.min(w / 2).min(h / 2) as f32;
    if r <= 0.0 {
        return;
    }
    for y in 0..h {
        for x in 0..w {
            // Distance from the nearest corner centre, only inside corner boxes
            let cx = if (x as f32) < r {
                r
            } else if (x as f32) >= w as f32 - r {
                w as f32 - r
            } else {
                continue;
            };
            let cy = if (y as f32) < r {
                r
            } else if (y as f32) >= h as f32 - r {
                h as f32 - r
            } else {
                continue;
            };
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let coverage = 1.0 - smoothstep(r - 1.0, r, dist);
            let pixel = img.get_pixel_mut(x, y);
            pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
        }
    }
}

/// Solid rectangle, alpha-blended, clipped to the canvas.
pub fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = ((x + width as i32).max(0) as u32).min(w);
    let y1 = ((y + height as i32).max(0) as u32).min(h);
    for py in y0..y1 {
        for px in x0..x1 {
            img.get_pixel_mut(px, py).blend(&color);
        }
    }
}

/// Frame of `thickness` pixels along every edge.
pub fn draw_border(img: &mut RgbaImage, thickness: u32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    fill_rect(img, 0, 0, w, thickness, color);
    fill_rect(img, 0, h as i32 - thickness as i32, w, thickness, color);
    fill_rect(img, 0, 0, thickness, h, color);
    fill_rect(img, w as i32 - thickness as i32, 0, thickness, h, color);
}

/// Paste `top` centred horizontally at row `y`.
pub fn overlay_centered(canvas: &mut RgbaImage, top: &RgbaImage, y: i64) {
    let x = (canvas.width() as i64 - top.width() as i64) / 2;
    imageops::overlay(canvas, top, x, y);
}

/// Scale `img` to cover `width`×`height` and crop the overflow.
pub fn cover(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let scale = (width as f32 / img.width().max(1) as f32).max(height as f32 / img.height().max(1) as f32);
    let sw = ((img.width() as f32 * scale).ceil() as u32).max(width);
    let sh = ((img.height() as f32 * scale).ceil() as u32).max(height);
    let resized = imageops::resize(img, sw, sh, imageops::FilterType::Triangle);
    imageops::crop_imm(&resized, (sw - width) / 2, (sh - height) / 2, width, height).to_image()
}
