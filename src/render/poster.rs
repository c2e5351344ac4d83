//! Poster composer.
//!
//! ## Pipeline
//!
//! ```text
//! Catalog ─► plan (dry run) ─► rayon pool: one card per placement ─► Vec<Option<card>>
//!                                                                        │
//!            plan the surviving cards ◄──────────────────────────────────┘
//!                 │
//!                 └─► backdrop (background, logo, date, labels) ─► paste cards
//! ```
//!
//! Cards are rendered against the dry-run sizes. Failed cards are left out
//! of the second pass, so the grid closes up around them; every survivor must
//! land in a cell of exactly the size it was rendered at.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use chrono::{DateTime, Utc};
use image::{Rgba, RgbaImage, imageops};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::assets::Assets;
use super::card::{CardContext, CardStyle, try_render_card};
use super::icon::IconSource;
use super::paint::{cover, overlay_centered};
use super::text::{draw_centered, draw_text, fit_size};
use crate::catalog::{Catalog, Entry};
use crate::error::ShopError;
use crate::layout::{self, GridPlan, GridStyle, LayoutError, LayoutRegime, Tile};

/// Poster-level pixel constants.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterStyle {
    pub grid: GridStyle,
    pub card: CardStyle,
    /// Fill used when no background image is available.
    pub background: Rgba<u8>,
    pub logo_y: u32,
    pub logo_height: u32,
    pub date_y: u32,
    pub date_size: f32,
    pub label_size: f32,
}

impl Default for PosterStyle {
    fn default() -> Self {
        Self {
            grid: GridStyle::default(),
            card: CardStyle::default(),
            background: Rgba([18, 18, 18, 255]),
            logo_y: 20,
            logo_height: 210,
            date_y: 255,
            date_size: 48.0,
            label_size: 44.0,
        }
    }
}

/// A composed poster, ready to save.
pub struct Poster {
    pub image: RgbaImage,
    pub plan: GridPlan,
    pub rendered: usize,
    pub failed: usize,
}

impl Poster {
    /// Write the poster as PNG, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<PathBuf, ShopError> {
        let persist = |message: String| ShopError::Persist {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| persist(e.to_string()))?;
        }
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| persist(e.to_string()))?;
        info!(
            "Saved {} ({}x{}, {} cards)",
            path.display(),
            self.image.width(),
            self.image.height(),
            self.rendered
        );
        Ok(path.to_path_buf())
    }
}

/// Plan, render and paste every entry of `catalog`.
///
/// `render` turns one entry into a card of the given size, or `None` if it
/// failed. `backdrop` receives the final plan and returns the canvas the
/// cards are pasted onto.
pub fn compose<B, R>(
    catalog: &Catalog,
    regime: LayoutRegime,
    grid: &GridStyle,
    workers: usize,
    backdrop: B,
    render: R,
) -> Result<Poster, ShopError>
where
    B: FnOnce(&GridPlan) -> RgbaImage,
    R: Fn(&Entry, u32, u32) -> Option<RgbaImage> + Sync,
{
    if catalog.is_empty() {
        return Err(ShopError::EmptyCatalog);
    }
    let entries = &catalog.entries;
    let dry_run = layout::plan(entries, regime, grid)?;
    info!(
        "Planned {} entries ({:?}, {} columns, {} rows, {}x{})",
        entries.len(),
        dry_run.regime,
        dry_run.columns,
        dry_run.rows,
        dry_run.width,
        dry_run.height
    );

    let render_one = |index: usize, width: u32, height: u32| {
        render(&entries[index], width, height).map(|card| (index, card))
    };
    let cards: Vec<Option<(usize, RgbaImage)>> = match rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| {
            dry_run
                .placements
                .par_iter()
                .map(|p| render_one(p.index, p.width, p.height))
                .collect()
        }),
        Err(e) => {
            warn!("Failed to start {} render workers, rendering serially: {}", workers, e);
            dry_run
                .placements
                .iter()
                .map(|p| render_one(p.index, p.width, p.height))
                .collect()
        }
    };
    let survivors: Vec<(usize, RgbaImage)> = cards.into_iter().flatten().collect();

    let rendered = survivors.len();
    let failed = entries.len() - rendered;
    if failed > 0 {
        warn!("{} of {} cards failed to render", failed, entries.len());
    }
    if survivors.is_empty() {
        return Err(ShopError::EmptyCatalog);
    }

    let tiles: Vec<Tile> = survivors.iter().map(|(index, _)| Tile::from(&entries[*index])).collect();
    let mut placement = layout::plan_tiles(&tiles, regime, grid)?;
    for slot in &mut placement.placements {
        slot.index = survivors[slot.index].0;
    }

    let mut canvas = backdrop(&placement);
    for (index, card) in &survivors {
        let slot = placement.placement(*index).ok_or(LayoutError::PlanMismatch)?;
        if card.dimensions() != (slot.width, slot.height) {
            return Err(LayoutError::PlanMismatch.into());
        }
        imageops::overlay(&mut canvas, card, slot.x as i64, slot.y as i64);
    }
    info!("Generated {} cards", rendered);

    Ok(Poster {
        image: canvas,
        plan: placement,
        rendered,
        failed,
    })
}

/// Background, logo, date header and section labels for a plan.
pub fn draw_backdrop(plan: &GridPlan, catalog: &Catalog, style: &PosterStyle, assets: &Assets) -> RgbaImage {
    let mut canvas = match &assets.background {
        Some(background) => cover(background, plan.width, plan.height),
        None => RgbaImage::from_pixel(plan.width, plan.height, style.background),
    };

    if let Some(logo) = &assets.logo {
        let height = style.logo_height.min(plan.height);
        let width = (logo.width() as u64 * height as u64 / logo.height().max(1) as u64) as u32;
        let logo = imageops::resize(logo, width.max(1), height.max(1), imageops::FilterType::Lanczos3);
        overlay_centered(&mut canvas, &logo, style.logo_y as i64);
    }

    match catalog.display_date() {
        Some(date) => draw_header(&mut canvas, &assets.font, &date, style),
        None => debug!("Shop has no date, skipping header"),
    }

    for label in &plan.labels {
        let size = fit_size(&assets.font, &label.text, style.label_size, 20.0, 2.0, label.width);
        draw_text(
            &mut canvas,
            &assets.font,
            &label.text,
            size,
            label.x as i32,
            label.y as i32,
            Rgba([255, 255, 255, 255]),
        );
    }
    canvas
}

fn draw_header(canvas: &mut RgbaImage, font: &FontArc, date: &str, style: &PosterStyle) {
    let center = canvas.width() as i32 / 2;
    draw_centered(
        canvas,
        font,
        date,
        style.date_size,
        center,
        style.date_y as i32,
        Rgba([255, 255, 255, 255]),
    );
}

/// Knobs for [`generate`].
pub struct GenerateOptions {
    pub output: PathBuf,
    /// Forced regime; detected from the entries when `None`.
    pub regime: Option<LayoutRegime>,
    pub workers: usize,
    pub style: PosterStyle,
    /// Reference time for expiry text.
    pub now: DateTime<Utc>,
}

impl GenerateOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            regime: None,
            workers: 16,
            style: PosterStyle::default(),
            now: Utc::now(),
        }
    }
}

/// Compose the poster for a normalized catalog and save it.
///
/// Returns the written path.
pub fn generate(
    catalog: &Catalog,
    assets: &Assets,
    icons: &dyn IconSource,
    options: &GenerateOptions,
) -> Result<PathBuf, ShopError> {
    let regime = options
        .regime
        .unwrap_or_else(|| LayoutRegime::detect(&catalog.entries));
    let ctx = CardContext {
        assets,
        icons,
        style: &options.style.card,
        now: options.now,
    };
    let poster = compose(
        catalog,
        regime,
        &options.style.grid,
        options.workers,
        |plan| draw_backdrop(plan, catalog, &options.style, assets),
        |entry, width, height| try_render_card(entry, width, height, &ctx),
    )?;
    poster.save(&options.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemKind, Novelty, NoveltyKind, Price};
    use crate::render::assets::system_font;

    fn entry(name: &str, section: &str) -> Entry {
        Entry {
            offer_id: format!("v2:/{}", name),
            name: name.to_string(),
            kind: ItemKind::Cosmetic,
            category: "outfit".to_string(),
            rarity: "rare".to_string(),
            icons: vec![format!("https://img/{}.png", name)],
            price: Price {
                final_price: 1200,
                regular_price: None,
            },
            novelty: Novelty {
                kind: NoveltyKind::New,
                appearances: 1,
            },
            extras: Vec::new(),
            section: section.to_string(),
            section_index: 0,
            layout: None,
            palette: None,
            set: None,
            banner: None,
            expires: None,
        }
    }

    fn catalog(n: usize) -> Catalog {
        Catalog {
            date: None,
            entries: (0..n).map(|i| entry(&format!("item{}", i), "Featured")).collect(),
            dropped: 0,
            currency_icon: None,
        }
    }

    fn blank(plan: &GridPlan) -> RgbaImage {
        RgbaImage::from_pixel(plan.width, plan.height, Rgba([18, 18, 18, 255]))
    }

    fn solid(_: &Entry, w: u32, h: u32) -> Option<RgbaImage> {
        Some(RgbaImage::from_pixel(w, h, Rgba([200, 0, 0, 255])))
    }

    #[test]
    fn test_compose_seven_entries() {
        let grid = GridStyle::default();
        let poster = compose(&catalog(7), LayoutRegime::Uniform, &grid, 4, blank, solid).unwrap();
        assert_eq!(poster.plan.columns, 4);
        assert_eq!(poster.plan.rows, 2);
        assert_eq!(poster.rendered, 7);
        assert_eq!(poster.failed, 0);
        assert_eq!(poster.image.dimensions(), (poster.plan.width, poster.plan.height));

        let p = poster.plan.placements[6];
        assert_eq!(poster.image.get_pixel(p.x + 1, p.y + 1), &Rgba([200, 0, 0, 255]));
    }

    #[test]
    fn test_failed_cards_are_compacted() {
        let grid = GridStyle::default();
        let render = |e: &Entry, w: u32, h: u32| {
            if e.name == "item3" {
                None
            } else {
                solid(e, w, h)
            }
        };
        let poster = compose(&catalog(10), LayoutRegime::Uniform, &grid, 3, blank, render).unwrap();
        assert_eq!(poster.rendered, 9);
        assert_eq!(poster.failed, 1);
        assert_eq!(poster.plan.placements.len(), 9);
        assert_eq!((poster.plan.columns, poster.plan.rows), (5, 2));
        assert!(poster.plan.placement(3).is_none());

        // item4 moves up into item3's old cell.
        assert_eq!(poster.plan.placements[3].index, 4);
        for p in &poster.plan.placements {
            assert_eq!(poster.image.get_pixel(p.x + 5, p.y + 5), &Rgba([200, 0, 0, 255]));
        }
    }

    #[test]
    fn test_every_card_failing_is_fatal() {
        let grid = GridStyle::default();
        let result = compose(&catalog(4), LayoutRegime::Uniform, &grid, 2, blank, |_, _, _| None);
        assert!(matches!(result, Err(ShopError::EmptyCatalog)));
    }

    #[test]
    fn test_wrong_card_size_is_plan_mismatch() {
        let grid = GridStyle::default();
        let render = |_: &Entry, w: u32, h: u32| Some(RgbaImage::new(w + 1, h));
        let result = compose(&catalog(2), LayoutRegime::Uniform, &grid, 1, blank, render);
        assert!(matches!(result, Err(ShopError::Layout(LayoutError::PlanMismatch))));
    }

    #[test]
    fn test_backdrop_without_background_is_flat_fill() {
        let Some(font) = system_font() else {
            return;
        };
        let assets = Assets::with_font(font);
        let style = PosterStyle::default();
        let shop = catalog(3);
        let plan = layout::plan(&shop.entries, LayoutRegime::Uniform, &style.grid).unwrap();

        let canvas = draw_backdrop(&plan, &shop, &style, &assets);
        assert_eq!(canvas.dimensions(), (plan.width, plan.height));
        for (x, y) in [(0, 0), (plan.width - 1, plan.height - 1), (plan.width / 2, plan.height - 1)] {
            assert_eq!(canvas.get_pixel(x, y), &Rgba([18, 18, 18, 255]));
        }
    }

    #[test]
    fn test_backdrop_covers_background_image() {
        let Some(font) = system_font() else {
            return;
        };
        let mut assets = Assets::with_font(font);
        assets.background = Some(RgbaImage::from_pixel(64, 32, Rgba([10, 60, 120, 255])));
        let style = PosterStyle::default();
        let shop = catalog(3);
        let plan = layout::plan(&shop.entries, LayoutRegime::Uniform, &style.grid).unwrap();

        let canvas = draw_backdrop(&plan, &shop, &style, &assets);
        assert_eq!(canvas.dimensions(), (plan.width, plan.height));
        let corner = canvas.get_pixel(plan.width - 1, plan.height - 1);
        for (got, want) in corner.0.iter().zip([10u8, 60, 120, 255]) {
            assert!(got.abs_diff(want) <= 1, "{:?}", corner);
        }
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let grid = GridStyle::default();
        let result = compose(&catalog(0), LayoutRegime::Uniform, &grid, 2, blank, solid);
        assert!(matches!(result, Err(ShopError::EmptyCatalog)));
    }

    #[test]
    fn test_cards_rendered_at_planned_size() {
        let grid = GridStyle::default();
        let render = |_: &Entry, w: u32, h: u32| {
            assert_eq!((w, h), (300, 545));
            Some(RgbaImage::new(w, h))
        };
        compose(&catalog(3), LayoutRegime::Uniform, &grid, 2, blank, render).unwrap();
    }

    #[test]
    fn test_save_unwritable_path_is_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();

        let grid = GridStyle::default();
        let poster = compose(&catalog(1), LayoutRegime::Uniform, &grid, 1, blank, solid).unwrap();
        let result = poster.save(&blocker.join("poster.png"));
        assert!(matches!(result, Err(ShopError::Persist { .. })));
    }

    #[test]
    fn test_save_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("shop.png");

        let grid = GridStyle::default();
        let poster = compose(&catalog(2), LayoutRegime::Uniform, &grid, 1, blank, solid).unwrap();
        assert_eq!(poster.save(&path).unwrap(), path);

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.width(), poster.plan.width);
    }
}
