//! Style assets loaded once per run and shared read-only by every card worker.
//!
//! ## Layout on disk
//!
//! | File | Required | Fallback |
//! |------|----------|----------|
//! | `font.ttf` (or any `.ttf`/`.otf`) | yes | fatal |
//! | `background.png` | no | flat dark fill |
//! | `logo.png` | no | skipped |
//! | `vbucks.png` | no | catalog currency icon, then drawn coin |
//! | `card_top_{rarity}.png`, `card_faceplate_*`, `card_bottom_*` | no | `common`, then gradient only |
//! | `box_bottom_{rarity}.png`, `box_faceplate_*` | no | `common`, then drawn frame |

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use image::RgbaImage;
use tracing::{debug, info, warn};

use super::icon::IconSource;
use crate::error::ShopError;

/// Fonts and images used by the renderer.
pub struct Assets {
    pub font: FontArc,
    pub background: Option<RgbaImage>,
    pub logo: Option<RgbaImage>,
    /// Currency glyph drawn next to prices.
    pub currency: Option<RgbaImage>,
    /// Decorative layers keyed by file stem (`card_top_epic`).
    layers: HashMap<String, RgbaImage>,
}

impl Assets {
    /// Assets with only a font; every image falls back to its drawn default.
    pub fn with_font(font: FontArc) -> Self {
        Self {
            font,
            background: None,
            logo: None,
            currency: None,
            layers: HashMap::new(),
        }
    }

    /// Load every asset from a directory.
    pub fn load(dir: &Path) -> Result<Self, ShopError> {
        let font_path = find_font(dir).ok_or_else(|| {
            ShopError::Font(format!("no .ttf or .otf font found in {}", dir.display()))
        })?;
        let font = load_font(&font_path)?;
        let mut assets = Self::with_font(font);

        let entries = fs::read_dir(dir)?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match image::open(&path) {
                Ok(img) => {
                    debug!("Loaded asset {}", stem);
                    assets.insert_layer(&stem, img.to_rgba8());
                }
                Err(e) => warn!("Failed to open {}, {}", path.display(), e),
            }
        }

        assets.background = assets.layers.remove("background");
        assets.logo = assets.layers.remove("logo");
        assets.currency = assets.layers.remove("vbucks");
        if assets.background.is_none() {
            warn!("Failed to open background.png, defaulting to dark gray");
        }

        info!(
            "Loaded assets from {} ({} card layers, font {})",
            dir.display(),
            assets.layers.len(),
            font_path.display()
        );
        Ok(assets)
    }

    /// Add or replace a decorative layer.
    pub fn insert_layer(&mut self, name: &str, layer: RgbaImage) {
        self.layers.insert(name.to_string(), layer);
    }

    /// Look up `{kind}_{frame}`, falling back to `{kind}_common`.
    pub fn layer(&self, kind: &str, frame: &str) -> Option<&RgbaImage> {
        find_layer(&self.layers, kind, frame)
    }

    /// Use the catalog's currency icon when `vbucks.png` was not on disk.
    pub fn fill_currency(&mut self, icons: &dyn IconSource, url: Option<&str>) {
        if self.currency.is_some() {
            return;
        }
        let Some(url) = url else {
            return;
        };
        match icons.fetch(url) {
            Ok(icon) => {
                debug!("Using catalog currency icon {}", url);
                self.currency = Some(icon.to_rgba8());
            }
            Err(e) => warn!("Failed to fetch currency icon, drawing a coin instead: {}", e),
        }
    }
}

fn find_layer<'a>(layers: &'a HashMap<String, RgbaImage>, kind: &str, frame: &str) -> Option<&'a RgbaImage> {
    let name = format!("{}_{}", kind, frame);
    if let Some(layer) = layers.get(&name) {
        return Some(layer);
    }
    // No layers at all is the drawn-only style, nothing to report.
    if layers.is_empty() {
        return None;
    }
    let common = format!("{}_common", kind);
    match layers.get(&common) {
        Some(layer) => {
            warn!("Failed to open {}.png, defaulted to Common", name);
            Some(layer)
        }
        None if frame == "common" => {
            warn!("Failed to open {}.png, using the drawn default", name);
            None
        }
        None => {
            warn!("Failed to open {}.png and {}.png, using the drawn default", name, common);
            None
        }
    }
}

/// `font.ttf` if present, otherwise the first font file in the directory or
/// its `fonts/` subdirectory.
fn find_font(dir: &Path) -> Option<PathBuf> {
    let preferred = dir.join("font.ttf");
    if preferred.is_file() {
        return Some(preferred);
    }
    for candidate in [dir.to_path_buf(), dir.join("fonts")] {
        let Ok(entries) = fs::read_dir(&candidate) else {
            continue;
        };
        let mut fonts: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("ttf") | Some("otf")
                )
            })
            .collect();
        fonts.sort();
        if let Some(font) = fonts.into_iter().next() {
            return Some(font);
        }
    }
    None
}

/// First installed system font, for tests that draw text.
#[cfg(test)]
pub(crate) fn system_font() -> Option<FontArc> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ]
    .iter()
    .map(Path::new)
    .find(|p| p.is_file())
    .and_then(|p| load_font(p).ok())
}

/// Load a TrueType/OpenType font file.
pub fn load_font(path: &Path) -> Result<FontArc, ShopError> {
    let bytes = fs::read(path)
        .map_err(|e| ShopError::Font(format!("{}: {}", path.display(), e)))?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| ShopError::Font(format!("{}: {}", path.display(), e)))
}
