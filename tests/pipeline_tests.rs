//! # Pipeline Tests
//!
//! Shop document in, poster out. Most tests swap the card renderer for a
//! solid-colour stub so they run without fonts or network; the ones that
//! draw real cards look for a system font and skip when none is installed.

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use itemshop::catalog::{self, Catalog, Entry};
use itemshop::layout::{self, BLOCK_UNITS, GridPlan, GridStyle, LayoutRegime};
use itemshop::render::icon::fetch_with_fallback;
use itemshop::render::poster::{GenerateOptions, compose, generate};
use itemshop::render::{Assets, MemoryIconSource, assets::load_font};
use itemshop::ShopError;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

fn system_font() -> Option<PathBuf> {
    FONT_CANDIDATES.iter().map(PathBuf::from).find(|p| p.is_file())
}

fn icon_url(name: &str) -> String {
    format!("https://img.example/{}.png", name)
}

/// Legacy-shape record inside the `featured` container.
fn legacy_record(name: &str, rarity: &str) -> Value {
    json!({
        "regularPrice": 1500,
        "finalPrice": 1200,
        "offerId": format!("v2:/{}", name),
        "items": [{
            "name": name,
            "type": {"value": "outfit"},
            "rarity": {"value": rarity},
            "images": {"icon": icon_url(name)},
            "shopHistory": ["2024-06-15T00:00:00Z"]
        }]
    })
}

/// Newest-shape record with a section block and a tile size.
fn tile_record(name: &str, section: &str, index: i64, tile: &str) -> Value {
    json!({
        "regularPrice": 800,
        "finalPrice": 800,
        "offerId": format!("v2:/{}", name),
        "layout": {"id": section, "name": section, "index": index},
        "tileSize": tile,
        "brItems": [{
            "name": name,
            "type": {"value": "emote"},
            "rarity": {"value": "rare"},
            "images": {"icon": icon_url(name)},
            "shopHistory": ["2024-06-10T00:00:00Z", "2024-06-15T00:00:00Z"]
        }]
    })
}

fn legacy_shop(n: usize) -> Catalog {
    let entries: Vec<Value> = (0..n).map(|i| legacy_record(&format!("Item{}", i), "rare")).collect();
    let doc = json!({"status": 200, "data": {"date": "2024-06-15T00:00:00Z", "featured": {"entries": entries}}});
    let raw = catalog::parse_catalog(&doc.to_string()).unwrap();
    catalog::normalize(&raw)
}

fn mosaic_shop() -> Catalog {
    let mut entries = Vec::new();
    let tiles = ["Size_1_x_2", "Size_2_x_2", "Size_1_x_2", "Size_4_x_2", "Size_1_x_2", "Size_3_x_2"];
    for (section, index) in [("Featured", 0), ("Jam Tracks", 1), ("Daily", 2)] {
        for (i, tile) in tiles.iter().enumerate() {
            entries.push(tile_record(&format!("{}{}", section, i), section, index, tile));
        }
    }
    let doc = json!({"data": {"date": "2024-06-15", "entries": entries}});
    catalog::normalize(&catalog::parse_catalog(&doc.to_string()).unwrap())
}

fn blank(plan: &GridPlan) -> RgbaImage {
    RgbaImage::from_pixel(plan.width, plan.height, Rgba([18, 18, 18, 255]))
}

fn stub_card(_: &Entry, width: u32, height: u32) -> Option<RgbaImage> {
    Some(RgbaImage::from_pixel(width, height, Rgba([90, 160, 240, 255])))
}

fn icons_for(catalog: &Catalog, skip: &[&str]) -> MemoryIconSource {
    let mut icons = MemoryIconSource::new();
    for entry in &catalog.entries {
        if skip.contains(&entry.name.as_str()) {
            continue;
        }
        let icon = RgbaImage::from_pixel(64, 64, Rgba([240, 200, 40, 255]));
        icons.insert(&icon_url(&entry.name), DynamicImage::ImageRgba8(icon));
    }
    icons
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn test_seven_entries_uniform_grid() {
    let shop = legacy_shop(7);
    assert_eq!(shop.entries.len(), 7);
    assert_eq!(LayoutRegime::detect(&shop.entries), LayoutRegime::Uniform);

    let poster = compose(&shop, LayoutRegime::Uniform, &GridStyle::default(), 4, blank, stub_card).unwrap();
    assert_eq!(poster.plan.columns, 4);
    assert_eq!(poster.plan.rows, 2);
    assert_eq!(poster.plan.first_overlap(), None);
    assert_eq!(poster.rendered, 7);
}

#[test]
fn test_planner_is_idempotent() {
    let shop = mosaic_shop();
    let style = GridStyle::default();
    let regime = LayoutRegime::detect(&shop.entries);
    assert_eq!(regime, LayoutRegime::Mosaic);

    let first = layout::plan(&shop.entries, regime, &style).unwrap();
    let second = layout::plan(&shop.entries, regime, &style).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_mosaic_shop_has_no_overlap_or_block_crossing() {
    let shop = mosaic_shop();
    let plan = layout::plan(&shop.entries, LayoutRegime::Mosaic, &GridStyle::default()).unwrap();

    assert_eq!(plan.placements.len(), shop.entries.len());
    assert_eq!(plan.first_overlap(), None);
    for p in &plan.placements {
        assert!(p.unit + p.footprint.units() <= BLOCK_UNITS, "{:?} crosses its block", p);
        assert!(p.x + p.width <= plan.width);
        assert!(p.y + p.height <= plan.height);
    }
    let labels: Vec<&str> = plan.labels.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(labels, vec!["Featured", "Jam Tracks", "Daily"]);
}

#[test]
fn test_sort_is_stable_across_runs() {
    let shop = mosaic_shop();
    let again = mosaic_shop();
    let names: Vec<&str> = shop.entries.iter().map(|e| e.name.as_str()).collect();
    let names_again: Vec<&str> = again.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, names_again);

    let sections: Vec<i64> = shop.entries.iter().map(|e| e.section_index).collect();
    let mut sorted = sections.clone();
    sorted.sort();
    assert_eq!(sections, sorted);
}

// ============================================================================
// DEGRADATION AND FATAL ERRORS
// ============================================================================

#[test]
fn test_one_broken_icon_leaves_nine_cards() {
    let shop = legacy_shop(10);
    let icons = icons_for(&shop, &["Item4"]);
    let render = |entry: &Entry, width: u32, height: u32| {
        fetch_with_fallback(&icons, &entry.icons)
            .ok()
            .map(|_| RgbaImage::from_pixel(width, height, Rgba([90, 160, 240, 255])))
    };

    let poster = compose(&shop, LayoutRegime::Uniform, &GridStyle::default(), 16, blank, render).unwrap();
    assert_eq!(poster.rendered, 9);
    assert_eq!(poster.failed, 1);

    let index = shop.entries.iter().position(|e| e.name == "Item4").unwrap();
    assert!(poster.plan.placement(index).is_none());
    assert_eq!(poster.plan.placements.len(), 9);
    assert_eq!(poster.plan.first_overlap(), None);
    for p in &poster.plan.placements {
        assert_eq!(poster.image.get_pixel(p.x + 10, p.y + 10), &Rgba([90, 160, 240, 255]));
    }
}

#[test]
fn test_malformed_record_is_dropped() {
    let mut entries: Vec<Value> = (0..9).map(|i| legacy_record(&format!("Item{}", i), "epic")).collect();
    entries.push(json!({"finalPrice": 500, "items": [{"type": {"value": "outfit"}}]}));
    let doc = json!({"data": {"featured": {"entries": entries}}});
    let shop = catalog::normalize(&catalog::parse_catalog(&doc.to_string()).unwrap());
    assert_eq!(shop.entries.len(), 9);
    assert_eq!(shop.dropped, 1);
}

#[test]
fn test_cosmetic_without_rarity_or_type_is_dropped() {
    let mut entries: Vec<Value> = (0..9).map(|i| legacy_record(&format!("Item{}", i), "rare")).collect();
    entries.push(json!({
        "finalPrice": 800,
        "offerId": "v2:/Malformed",
        "items": [{"name": "Malformed", "images": {"icon": icon_url("Malformed")}}]
    }));
    let doc = json!({"data": {"featured": {"entries": entries}}});
    let shop = catalog::normalize(&catalog::parse_catalog(&doc.to_string()).unwrap());
    assert_eq!(shop.entries.len(), 9);
    assert_eq!(shop.dropped, 1);
    assert!(shop.entries.iter().all(|e| e.name != "Malformed"));

    let poster = compose(&shop, LayoutRegime::Uniform, &GridStyle::default(), 4, blank, stub_card).unwrap();
    assert_eq!(poster.rendered, 9);
    assert_eq!(poster.plan.placements.len(), 9);
}

#[test]
fn test_empty_shop_is_fatal_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("itemshop.png");
    let shop = legacy_shop(0);

    let result = compose(&shop, LayoutRegime::Uniform, &GridStyle::default(), 2, blank, stub_card);
    assert!(matches!(result, Err(ShopError::EmptyCatalog)));
    assert!(!output.exists());

    let Some(font) = system_font() else {
        eprintln!("no system font, skipping generate() half");
        return;
    };
    let assets = Assets::with_font(load_font(&font).unwrap());
    let icons = MemoryIconSource::new();
    let result = generate(&shop, &assets, &icons, &GenerateOptions::new(&output));
    assert!(matches!(result, Err(ShopError::EmptyCatalog)));
    assert!(!output.exists());
}

// ============================================================================
// FULL RENDER (needs a font)
// ============================================================================

fn render_to(shop: &Catalog, icons: &MemoryIconSource, output: &Path) -> Option<Result<PathBuf, ShopError>> {
    let font = system_font()?;
    let assets = Assets::with_font(load_font(&font).unwrap());
    let mut options = GenerateOptions::new(output);
    options.workers = 4;
    Some(generate(shop, &assets, icons, &options))
}

#[test]
fn test_generate_uniform_poster() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("itemshop.png");
    let shop = legacy_shop(7);
    let icons = icons_for(&shop, &[]);

    let Some(result) = render_to(&shop, &icons, &output) else {
        eprintln!("no system font, skipping");
        return;
    };
    assert_eq!(result.unwrap(), output);

    let plan = layout::plan(&shop.entries, LayoutRegime::Uniform, &GridStyle::default()).unwrap();
    let saved = image::open(&output).unwrap();
    assert_eq!((saved.width(), saved.height()), (plan.width, plan.height));
}

#[test]
fn test_generate_mosaic_poster_with_missing_icon() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("mosaic.png");
    let shop = mosaic_shop();
    let icons = icons_for(&shop, &["Daily3"]);

    let Some(result) = render_to(&shop, &icons, &output) else {
        eprintln!("no system font, skipping");
        return;
    };
    result.unwrap();
    assert!(output.is_file());
}
