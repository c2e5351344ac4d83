//! Card renderer: one decorated image per entry.
//!
//! ```text
//! ┌──────────────────────────┐
//! │ 3 Visits          [x][ ] │  ← visits / leaves-in, extra item badges
//! │ Leaves in 1d 4h   [x]    │
//! │                          │
//! │          icon            │
//! │                          │
//! │ ──────────────────────── │  ← text plate (faceplate layer or palette)
//! │     Legendary Outfit     │
//! │      RENEGADE RAIDER     │  ← name, shrunk to fit
//! │   1,200 ◎    9 days ago  │  ← price + currency, novelty badge
//! └──────────────────────────┘
//! ```
//!
//! Cards are a pure function of the entry, the shared assets and the target
//! size. Nothing here touches another entry or any shared mutable state, so
//! the composer renders them in parallel.

use chrono::{DateTime, Utc};
use image::{Rgb, Rgba, RgbaImage, imageops};
use tracing::{error, warn};

use super::CardError;
use super::assets::Assets;
use super::icon::{IconSource, fetch_with_fallback, fit_within};
use super::paint::{self, draw_border, fill_rect, overlay_centered, round_corners, vertical_gradient};
use super::text::{self, draw_centered, fit_size, group_thousands};
use crate::catalog::{Entry, Extra, rarity};

/// Pixel constants for a card, relative to a 300×545 single-unit card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardStyle {
    /// Multiplier applied to every gradient colour.
    pub brightness: f32,
    pub corner_radius: u32,
    /// Top of the text plate.
    pub plate_top: u32,
    pub label_y: u32,
    pub label_size: f32,
    pub name_y: u32,
    pub name_size: f32,
    pub name_min_size: f32,
    pub name_step: f32,
    /// Fraction of the card width the name may use.
    pub name_max_fraction: f32,
    pub footer_y: u32,
    pub footer_size: f32,
    pub corner_text_size: f32,
    pub currency_size: u32,
    pub badge_size: u32,
    pub badge_margin: u32,
    pub border_thickness: u32,
    pub new_border: Rgba<u8>,
    pub absence_border: Rgba<u8>,
    pub plate_color: Rgba<u8>,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            brightness: 0.85,
            corner_radius: 14,
            plate_top: 375,
            label_y: 385,
            label_size: 30.0,
            name_y: 425,
            name_size: 56.0,
            name_min_size: 22.0,
            name_step: 2.0,
            name_max_fraction: 0.87,
            footer_y: 495,
            footer_size: 30.0,
            corner_text_size: 20.0,
            currency_size: 25,
            badge_size: 75,
            badge_margin: 9,
            border_thickness: 10,
            new_border: Rgba([255, 255, 0, 255]),
            absence_border: Rgba([255, 64, 64, 255]),
            plate_color: Rgba([14, 14, 20, 200]),
        }
    }
}

/// Everything a card worker reads.
pub struct CardContext<'a> {
    pub assets: &'a Assets,
    pub icons: &'a dyn IconSource,
    pub style: &'a CardStyle,
    /// Reference time for "Leaves in" text.
    pub now: DateTime<Utc>,
}

/// Icon bounding box for a category on a card `width` wide.
pub fn icon_box(category: &str, width: u32, style: &CardStyle) -> (u32, u32) {
    let max_height = style.plate_top;
    match category {
        "outfit" | "emote" => (width * 95 / 100, max_height.saturating_sub(10)),
        "wrap" => (width * 77 / 100, max_height.saturating_sub(65)),
        _ => (width, max_height + 15),
    }
}

/// Render one card, or say why it could not be rendered.
pub fn render_card(
    entry: &Entry,
    width: u32,
    height: u32,
    ctx: &CardContext,
) -> Result<RgbaImage, CardError> {
    if entry.name.trim().is_empty() {
        return Err(CardError::MissingField("name"));
    }
    if entry.icons.is_empty() {
        return Err(CardError::MissingField("icon"));
    }
    let style = ctx.style;
    let rarity_style = entry.style();
    let accent = rarity_style.color;

    let mut card = match &entry.palette {
        Some(palette) => vertical_gradient(width, height, &palette.stops, style.brightness),
        None => vertical_gradient(width, height, &paint::wash(accent), style.brightness),
    };
    if entry.palette.is_none()
        && let Some(top) = ctx.assets.layer("card_top", rarity_style.frame)
    {
        paste_layer(&mut card, top);
    }

    let icon = fetch_with_fallback(ctx.icons, &entry.icons)?;
    let (box_w, box_h) = icon_box(&entry.category, width, style);
    let icon = fit_within(&icon, box_w, box_h);
    let icon_y = if entry.category == "outfit" { 0 } else { 15 };
    overlay_centered(&mut card, &icon, icon_y);

    for (i, extra) in entry.extras.iter().enumerate() {
        draw_extra(&mut card, extra, i as u32, ctx);
    }

    draw_plate(&mut card, entry, ctx);
    draw_texts(&mut card, entry, ctx);

    if entry.novelty.is_new() {
        draw_border(&mut card, style.border_thickness, style.new_border);
    } else if entry.novelty.is_long_absence() {
        draw_border(&mut card, style.border_thickness, style.absence_border);
    }
    round_corners(&mut card, style.corner_radius);

    Ok(card)
}

/// [`render_card`] that logs failures and returns `None` for them.
pub fn try_render_card(entry: &Entry, width: u32, height: u32, ctx: &CardContext) -> Option<RgbaImage> {
    match render_card(entry, width, height, ctx) {
        Ok(card) => Some(card),
        Err(e) => {
            error!("Failed to generate card for {}, {}", entry.describe(), e);
            None
        }
    }
}

/// Stretch a 300-wide layer to the card width and paste it at the origin.
fn paste_layer(card: &mut RgbaImage, layer: &RgbaImage) {
    if layer.width() == card.width() {
        imageops::overlay(card, layer, 0, 0);
    } else {
        let scaled = imageops::resize(layer, card.width(), layer.height(), imageops::FilterType::Triangle);
        imageops::overlay(card, &scaled, 0, 0);
    }
}

fn draw_extra(card: &mut RgbaImage, extra: &Extra, slot: u32, ctx: &CardContext) {
    let style = ctx.style;
    let size = style.badge_size;
    let x = card.width() as i64 - (size + style.badge_margin) as i64;
    let y = (style.badge_margin + slot * (size + 4)) as i64;
    let frame = rarity::style_for(&extra.rarity);

    match ctx.assets.layer("box_bottom", frame.frame) {
        Some(layer) => imageops::overlay(card, layer, x, y),
        None => {
            let c = frame.color;
            fill_rect(card, x as i32, y as i32, size, size, Rgba([c[0], c[1], c[2], 255]));
            fill_rect(card, x as i32 + 3, y as i32 + 3, size - 6, size - 6, Rgba([20, 20, 28, 255]));
        }
    }

    let Some(url) = &extra.icon else {
        warn!("No icon for extra item {} ({})", extra.name, extra.rarity);
        return;
    };
    match ctx.icons.fetch(url) {
        Ok(icon) => {
            let icon = fit_within(&icon, size, size);
            imageops::overlay(card, &icon, x, y);
        }
        Err(e) => warn!("Skipping extra item {}, {}", extra.name, e),
    }

    if let Some(layer) = ctx.assets.layer("box_faceplate", frame.frame) {
        imageops::overlay(card, layer, x, y);
    }
}

/// Darkened plate behind the text rows.
fn draw_plate(card: &mut RgbaImage, entry: &Entry, ctx: &CardContext) {
    let style = ctx.style;
    let frame = entry.style().frame;
    let faceplate = ctx.assets.layer("card_faceplate", frame);
    let bottom = ctx.assets.layer("card_bottom", frame);

    if entry.palette.is_none() && (faceplate.is_some() || bottom.is_some()) {
        for layer in [faceplate, bottom].into_iter().flatten() {
            paste_layer(card, layer);
        }
        return;
    }

    let color = entry
        .palette
        .as_ref()
        .and_then(|p| p.text_background)
        .map(|c: Rgb<u8>| Rgba([c[0], c[1], c[2], 230]))
        .unwrap_or(style.plate_color);
    let top = style.plate_top.min(card.height());
    let (w, h) = card.dimensions();
    fill_rect(card, 0, top as i32, w, h - top, color);
    let accent = entry.style().color;
    fill_rect(card, 0, top as i32, w, 3, Rgba([accent[0], accent[1], accent[2], 255]));
}

fn draw_texts(card: &mut RgbaImage, entry: &Entry, ctx: &CardContext) {
    let style = ctx.style;
    let font = &ctx.assets.font;
    let width = card.width();
    let center = width as i32 / 2;
    let accent = entry.style().color;
    let accent = Rgba([accent[0], accent[1], accent[2], 255]);
    let white = Rgba([255, 255, 255, 255]);

    // Rarity and category
    let label = entry.label();
    let label_size = fit_size(font, &label, style.label_size, 16.0, 2.0, width - 20);
    draw_centered(card, font, &label, label_size, center, style.label_y as i32, accent);

    // Name, shrunk until it fits; smaller fonts are pushed down to stay centred
    let max_name = (width as f32 * style.name_max_fraction) as u32;
    let name_size = fit_size(
        font,
        &entry.name,
        style.name_size,
        style.name_min_size,
        style.name_step,
        max_name,
    );
    let shift = ((style.name_size - name_size) / 2.0) as i32;
    draw_centered(card, font, &entry.name, name_size, center, style.name_y as i32 + shift, white);

    // Footer: price and currency on the left half, novelty on the right half
    let half = width / 2;
    let price = group_thousands(entry.price.final_price);
    let price_size = fit_size(font, &price, style.footer_size, 14.0, 2.0, half.saturating_sub(style.currency_size + 20));
    let price_w = text::measure(font, &price, price_size).width;
    let total = price_w + 5 + style.currency_size;
    let price_x = (half as i32 - total as i32) / 2;
    text::draw_text(card, font, &price, price_size, price_x, style.footer_y as i32, accent);
    draw_currency(card, ctx, price_x + price_w as i32 + 5, style.footer_y as i32 + 5);

    let badge = entry.novelty.badge();
    let badge_size = fit_size(font, &badge, style.footer_size, 14.0, 2.0, half.saturating_sub(10));
    draw_centered(card, font, &badge, badge_size, (half + half / 2) as i32, style.footer_y as i32, accent);

    let mut y = style.badge_margin as i32;
    for (note, color) in corner_notes(entry, ctx.now) {
        text::draw_text(card, font, &note, style.corner_text_size, style.badge_margin as i32 + 4, y, color);
        y += style.corner_text_size as i32 + 4;
    }
}

/// Top-left lines: banner, visits, expiry, discount.
fn corner_notes(entry: &Entry, now: DateTime<Utc>) -> Vec<(String, Rgba<u8>)> {
    let white = Rgba([255, 255, 255, 255]);
    let gold = Rgba([255, 214, 64, 255]);
    let mut notes = Vec::new();
    if let Some(banner) = entry.banner.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        notes.push((banner.to_string(), gold));
    }
    if let Some(visits) = entry.novelty.visits() {
        notes.push((visits, white));
    }
    if let Some(leaves) = entry.leaves_in(now) {
        notes.push((leaves, white));
    }
    if let Some(discount) = entry.price.discount_percent() {
        notes.push((format!("-{}%", discount), gold));
    }
    notes
}

/// Currency glyph from the assets, or a drawn coin.
fn draw_currency(card: &mut RgbaImage, ctx: &CardContext, x: i32, y: i32) {
    let size = ctx.style.currency_size;
    match &ctx.assets.currency {
        Some(glyph) => {
            let glyph = imageops::resize(glyph, size, size, imageops::FilterType::Lanczos3);
            imageops::overlay(card, &glyph, x as i64, y as i64);
        }
        None => draw_coin(card, x, y, size),
    }
}

fn draw_coin(card: &mut RgbaImage, x: i32, y: i32, size: u32) {
    let r = size as f32 / 2.0;
    let (cw, ch) = card.dimensions();
    for dy in 0..size {
        for dx in 0..size {
            let px = x + dx as i32;
            let py = y + dy as i32;
            if px < 0 || py < 0 || px >= cw as i32 || py >= ch as i32 {
                continue;
            }
            let fx = dx as f32 + 0.5 - r;
            let fy = dy as f32 + 0.5 - r;
            let dist = (fx * fx + fy * fy).sqrt();
            let alpha = 1.0 - paint::smoothstep(r - 1.0, r, dist);
            if alpha <= 0.0 {
                continue;
            }
            let alpha = (alpha * 255.0) as u8;
            let color = if dist < r * 0.6 {
                Rgba([120, 200, 255, alpha])
            } else {
                Rgba([60, 140, 230, alpha])
            };
            image::Pixel::blend(card.get_pixel_mut(px as u32, py as u32), &color);
        }
    }
}
