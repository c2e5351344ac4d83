//! Serde types for the shop catalog document.
//!
//! The remote API has shipped several document shapes over time. The newest
//! puts every offer in `data.entries`; older ones split offers into
//! `featured`, `daily` and `specialFeatured` containers and name the item list
//! `items` instead of `brItems`. Every field is optional so that a malformed
//! record fails normalization instead of failing the whole parse.

use serde::Deserialize;

/// The `data` field of the shop response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalog {
    /// Shop date (ISO-8601, time part ignored).
    #[serde(default)]
    pub date: Option<String>,
    /// Currency glyph URL.
    #[serde(default)]
    pub vbuck_icon: Option<String>,
    /// Newest generation: every offer in one list.
    #[serde(default)]
    pub entries: Vec<RawEntry>,
    #[serde(default)]
    pub featured: Option<RawContainer>,
    #[serde(default)]
    pub daily: Option<RawContainer>,
    #[serde(default)]
    pub special_featured: Option<RawContainer>,
}

/// Legacy container (`featured`, `daily`, `specialFeatured`).
#[derive(Debug, Default, Deserialize)]
pub struct RawContainer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

/// One offer as sent by the API.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    #[serde(default)]
    pub regular_price: Option<i64>,
    #[serde(default)]
    pub final_price: Option<i64>,
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub dev_name: Option<String>,
    #[serde(default)]
    pub in_date: Option<String>,
    #[serde(default)]
    pub out_date: Option<String>,
    #[serde(default)]
    pub sort_priority: Option<i64>,
    #[serde(default)]
    pub layout_id: Option<String>,
    #[serde(default)]
    pub layout: Option<RawLayout>,
    /// Legacy section block.
    #[serde(default)]
    pub section: Option<RawLayout>,
    #[serde(default)]
    pub tile_size: Option<String>,
    #[serde(default)]
    pub colors: Option<RawColors>,
    #[serde(default)]
    pub banner: Option<RawBanner>,
    #[serde(default)]
    pub new_display_asset: Option<RawDisplayAsset>,
    #[serde(default)]
    pub bundle: Option<RawBundle>,
    #[serde(default, alias = "items")]
    pub br_items: Vec<RawCosmetic>,
    #[serde(default)]
    pub tracks: Vec<RawTrack>,
    #[serde(default)]
    pub instruments: Vec<RawKitItem>,
    #[serde(default)]
    pub cars: Vec<RawKitItem>,
    #[serde(default)]
    pub lego_kits: Vec<RawKitItem>,
}

/// Shop section (`layout` in the newest generation, `section` before it).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawLayout {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub index: Option<i64>,
}

/// Offer colours as hex strings (`"ff6a1f"` or `"ff6a1fff"`).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawColors {
    #[serde(default)]
    pub color1: Option<String>,
    #[serde(default)]
    pub color2: Option<String>,
    #[serde(default)]
    pub color3: Option<String>,
    #[serde(default)]
    pub text_background_color: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawBanner {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDisplayAsset {
    #[serde(default)]
    pub render_images: Vec<RawRenderImage>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRenderImage {
    #[serde(default)]
    pub product_tag: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawBundle {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// `{"value": "legendary", "displayValue": "Legendary", "backendValue": "EFortRarity::Legendary"}`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTag {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub backend_value: Option<String>,
}

/// Image variants shared by all item kinds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImages {
    #[serde(default)]
    pub featured: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub small_icon: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub wide: Option<String>,
}

/// Battle royale cosmetic (outfit, emote, wrap, ...).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCosmetic {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<RawTag>,
    #[serde(default)]
    pub rarity: Option<RawTag>,
    #[serde(default)]
    pub series: Option<RawTag>,
    #[serde(default)]
    pub set: Option<RawTag>,
    #[serde(default)]
    pub images: Option<RawImages>,
    #[serde(default)]
    pub shop_history: Vec<String>,
}

/// Music track.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album_art: Option<String>,
    #[serde(default)]
    pub shop_history: Vec<String>,
}

/// Instrument, car or LEGO kit. The three share one shape.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawKitItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<RawTag>,
    #[serde(default)]
    pub rarity: Option<RawTag>,
    #[serde(default)]
    pub images: Option<RawImages>,
    #[serde(default)]
    pub shop_history: Vec<String>,
}

impl RawCatalog {
    /// Flatten every generation's containers into one record list.
    ///
    /// Legacy records without a section block inherit the container name as
    /// their section, which keeps them sortable.
    pub fn records(&self) -> Vec<RawEntry> {
        let mut records = self.entries.clone();
        let legacy = [
            (&self.featured, "Featured", 0),
            (&self.daily, "Daily", 1),
            (&self.special_featured, "Special Featured", 2),
        ];
        for (container, default_name, index) in legacy {
            let Some(container) = container else {
                continue;
            };
            let name = container.name.clone().unwrap_or_else(|| default_name.to_string());
            for entry in &container.entries {
                let mut entry = entry.clone();
                if entry.section.is_none() && entry.layout.is_none() {
                    entry.section = Some(RawLayout {
                        id: Some(name.clone()),
                        name: Some(name.clone()),
                        index: Some(index),
                    });
                }
                records.push(entry);
            }
        }
        records
    }
}
