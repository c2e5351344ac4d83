//! # Catalog
//!
//! Retrieval and normalization of the daily shop document.
//!
//! ## Example
//!
//! ```
//! use itemshop::catalog;
//!
//! let json = r#"{
//!     "status": 200,
//!     "data": {
//!         "date": "2024-06-15T00:00:00Z",
//!         "entries": [{
//!             "offerId": "v2:/peely",
//!             "finalPrice": 1500,
//!             "layout": {"name": "Featured", "index": 0},
//!             "tileSize": "Size_1_x_2",
//!             "brItems": [{
//!                 "name": "Peely",
//!                 "type": {"value": "outfit"},
//!                 "rarity": {"value": "epic"},
//!                 "images": {"icon": "https://example.com/peely.png"},
//!                 "shopHistory": ["2024-06-14T00:00:00Z", "2024-06-15T00:00:00Z"]
//!             }]
//!         }]
//!     }
//! }"#;
//!
//! let raw = catalog::parse_catalog(json).unwrap();
//! let catalog = catalog::normalize(&raw);
//! assert_eq!(catalog.entries[0].name, "Peely");
//! assert_eq!(catalog.entries[0].novelty.badge(), "1 day ago");
//! ```

mod entry;
mod normalize;
pub mod novelty;
pub mod rarity;
mod schema;

use std::path::Path;

use tracing::info;

use crate::error::ShopError;

pub use entry::{Entry, Extra, Footprint, ItemKind, LayoutHints, Palette, Price, ResolvedItem};
pub use normalize::{Catalog, CatalogError, normalize, normalize_record};
pub use novelty::{Novelty, NoveltyKind};
pub use schema::{RawCatalog, RawEntry};

/// Default shop endpoint.
pub const SHOP_URL: &str = "https://fortnite-api.com/v2/shop";

/// Parse a shop document, with or without the `{"data": ...}` envelope.
pub fn parse_catalog(json: &str) -> Result<RawCatalog, ShopError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ShopError::Parse(e.to_string()))?;
    let data = match value.get("data") {
        Some(data) => data.clone(),
        None => value,
    };
    serde_json::from_value(data).map_err(|e| ShopError::Parse(e.to_string()))
}

/// Read a shop document from disk (offline runs, fixtures).
pub fn load_catalog(path: &Path) -> Result<RawCatalog, ShopError> {
    let json = std::fs::read_to_string(path)?;
    let raw = parse_catalog(&json)?;
    info!("Loaded item shop from {}", path.display());
    Ok(raw)
}

/// Fetch the shop document for a display language.
pub fn fetch_catalog(
    client: &reqwest::blocking::Client,
    url: &str,
    language: &str,
) -> Result<RawCatalog, ShopError> {
    let response = client
        .get(url)
        .query(&[("language", language)])
        .send()
        .map_err(|e| ShopError::Fetch(format!("{}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(ShopError::Fetch(format!(
            "{}: HTTP {}",
            url,
            response.status()
        )));
    }
    let body = response
        .text()
        .map_err(|e| ShopError::Fetch(format!("Failed to read response body: {}", e)))?;
    let raw = parse_catalog(&body)?;
    info!("Retrieved item shop ({} language)", language);
    Ok(raw)
}
