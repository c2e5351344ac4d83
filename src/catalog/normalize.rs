//! Raw record → [`Entry`] conversion.
//!
//! Classification checks the record's containers in a fixed order: bundle,
//! cosmetics, tracks, instruments, cars, LEGO kits. A record that matches none
//! becomes an `Unknown` entry rendered from its offer image. Records that still
//! lack a required field after every fallback are dropped with a warning.

use std::cmp::Reverse;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use super::entry::{Entry, Extra, Footprint, ItemKind, LayoutHints, Palette, Price, ResolvedItem};
use super::novelty::{Novelty, parse_timestamp};
use super::rarity::{self, DEFAULT_RARITY};
use super::schema::{RawBundle, RawCatalog, RawCosmetic, RawEntry, RawImages, RawKitItem, RawTrack};

/// Why a record was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("no section or layout key")]
    MissingSection,
    #[error("music track without a grid tile")]
    MetadataOnly,
    #[error("no display name")]
    MissingName,
    #[error("no price")]
    MissingPrice,
    #[error("negative price {0}")]
    NegativePrice(i64),
    #[error("price {0} out of range")]
    PriceOutOfRange(i64),
    #[error("no rarity and no item type")]
    MissingClassification,
    #[error("no icon candidates")]
    NoIcon,
}

/// Normalized, sorted catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Shop date, when the document carries one.
    pub date: Option<NaiveDate>,
    pub entries: Vec<Entry>,
    /// Records dropped during normalization.
    pub dropped: usize,
    pub currency_icon: Option<String>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `"June 15, 2024"`.
    pub fn display_date(&self) -> Option<String> {
        self.date.map(|d| d.format("%B %-d, %Y").to_string())
    }
}

/// Total ordering key; ties end on input position so re-runs are identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    section_index: i64,
    section: String,
    priority: Reverse<i64>,
    set: String,
    offer_id: String,
    name: String,
    position: usize,
}

/// Normalize every record in the document, dropping the unusable ones.
pub fn normalize(raw: &RawCatalog) -> Catalog {
    let records = raw.records();
    let mut keyed = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for (position, record) in records.iter().enumerate() {
        match normalize_record(record) {
            Ok(entry) => {
                let key = SortKey {
                    section_index: entry.section_index,
                    section: entry.section.clone(),
                    priority: Reverse(
                        entry
                            .layout
                            .as_ref()
                            .map(|l| l.sort_priority)
                            .or(record.sort_priority)
                            .unwrap_or(0),
                    ),
                    set: entry.set.clone().unwrap_or_default(),
                    offer_id: entry.offer_id.clone(),
                    name: entry.name.clone(),
                    position,
                };
                keyed.push((key, entry));
            }
            Err(CatalogError::MetadataOnly) => {
                debug!("Skipping metadata-only track record {}", record_identity(record));
                dropped += 1;
            }
            Err(e) => {
                warn!("Dropping item {}: {}", record_identity(record), e);
                dropped += 1;
            }
        }
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    Catalog {
        date: raw
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.get(..10)?, "%Y-%m-%d").ok()),
        entries: keyed.into_iter().map(|(_, e)| e).collect(),
        dropped,
        currency_icon: raw.vbuck_icon.clone(),
    }
}

/// Best-effort identity for log lines about records that failed.
fn record_identity(record: &RawEntry) -> String {
    let name = record
        .bundle
        .as_ref()
        .and_then(|b| b.name.clone())
        .or_else(|| record.br_items.first().and_then(|i| i.name.clone()))
        .or_else(|| record.tracks.first().and_then(|t| t.title.clone()))
        .or_else(|| record.dev_name.clone())
        .unwrap_or_else(|| "<unnamed>".to_string());
    let rarity = record
        .br_items
        .first()
        .and_then(|i| i.rarity.as_ref())
        .and_then(|r| r.value.clone())
        .unwrap_or_else(|| "?".to_string());
    let category = record
        .br_items
        .first()
        .and_then(|i| i.kind.as_ref())
        .and_then(|k| k.value.clone())
        .unwrap_or_else(|| "?".to_string());
    let price = record
        .final_price
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("{} ({}/{}/{})", name, rarity, category, price)
}

/// Record classified into one item kind.
enum Classified<'a> {
    Bundle(&'a RawBundle, Option<&'a RawCosmetic>),
    Cosmetic(&'a RawCosmetic),
    Track(&'a RawTrack),
    Instrument(&'a RawKitItem),
    Vehicle(&'a RawKitItem),
    Kit(&'a RawKitItem),
    Unknown,
}

impl<'a> Classified<'a> {
    fn of(record: &'a RawEntry) -> Self {
        if let Some(bundle) = &record.bundle {
            return Classified::Bundle(bundle, record.br_items.first());
        }
        if let Some(item) = record.br_items.first() {
            return Classified::Cosmetic(item);
        }
        if let Some(track) = record.tracks.first() {
            return Classified::Track(track);
        }
        if let Some(item) = record.instruments.first() {
            return Classified::Instrument(item);
        }
        if let Some(item) = record.cars.first() {
            return Classified::Vehicle(item);
        }
        if let Some(item) = record.lego_kits.first() {
            return Classified::Kit(item);
        }
        Classified::Unknown
    }

    fn kind(&self) -> ItemKind {
        match self {
            Classified::Bundle(..) => ItemKind::Bundle,
            Classified::Cosmetic(_) => ItemKind::Cosmetic,
            Classified::Track(_) => ItemKind::Track,
            Classified::Instrument(_) => ItemKind::Instrument,
            Classified::Vehicle(_) => ItemKind::Vehicle,
            Classified::Kit(_) => ItemKind::Kit,
            Classified::Unknown => ItemKind::Unknown,
        }
    }

    fn item(&self) -> Option<Box<dyn ResolvedItem + 'a>> {
        match *self {
            Classified::Bundle(_, item) => item.map(|i| Box::new(i) as Box<dyn ResolvedItem + 'a>),
            Classified::Cosmetic(item) => Some(Box::new(item)),
            Classified::Track(track) => Some(Box::new(track)),
            Classified::Instrument(item) => Some(Box::new(Kit(item, "instrument", "jam"))),
            Classified::Vehicle(item) => Some(Box::new(Kit(item, "vehicle", "vehicle"))),
            Classified::Kit(item) => Some(Box::new(Kit(item, "lego-set", "lego"))),
            Classified::Unknown => None,
        }
    }
}

fn image_urls(images: Option<&RawImages>) -> Vec<String> {
    let Some(images) = images else {
        return Vec::new();
    };
    [
        &images.featured,
        &images.icon,
        &images.large,
        &images.wide,
        &images.small,
        &images.small_icon,
    ]
    .into_iter()
    .flatten()
    .cloned()
    .collect()
}

impl RawCosmetic {
    /// Carries a rarity, a series or an item type. Without any of them the
    /// record cannot be styled or labelled.
    fn is_classified(&self) -> bool {
        let tagged = |tag: &Option<super::schema::RawTag>| {
            tag.as_ref()
                .is_some_and(|t| t.value.is_some() || t.backend_value.is_some())
        };
        tagged(&self.rarity) || tagged(&self.series) || tagged(&self.kind)
    }
}

impl ResolvedItem for RawCosmetic {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn icons(&self) -> Vec<String> {
        image_urls(self.images.as_ref())
    }

    fn rarity(&self) -> Option<String> {
        // Series override the base rarity for styling
        let series = self.series.as_ref().and_then(|s| {
            s.backend_value.clone().or_else(|| s.value.clone())
        });
        series
            .or_else(|| self.rarity.as_ref().and_then(|r| r.value.clone()))
            .or_else(|| self.rarity.as_ref().and_then(|r| r.backend_value.clone()))
            .map(|r| rarity::canonical(&r))
    }

    fn category(&self) -> String {
        self.kind
            .as_ref()
            .and_then(|k| k.value.clone().or_else(|| k.backend_value.clone()))
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|| "cosmetic".to_string())
    }

    fn shop_history(&self) -> &[String] {
        &self.shop_history
    }
}

impl ResolvedItem for RawTrack {
    fn name(&self) -> Option<String> {
        self.title.clone()
    }

    fn icons(&self) -> Vec<String> {
        self.album_art.iter().cloned().collect()
    }

    fn rarity(&self) -> Option<String> {
        Some("jam".to_string())
    }

    fn category(&self) -> String {
        "track".to_string()
    }

    fn shop_history(&self) -> &[String] {
        &self.shop_history
    }
}

/// Instrument, car or LEGO kit with its category and pseudo-rarity.
struct Kit<'a>(&'a RawKitItem, &'static str, &'static str);

impl ResolvedItem for Kit<'_> {
    fn name(&self) -> Option<String> {
        self.0.name.clone()
    }

    fn icons(&self) -> Vec<String> {
        image_urls(self.0.images.as_ref())
    }

    fn rarity(&self) -> Option<String> {
        // Kits without a cosmetic rarity get their kind's pseudo-rarity
        self.0
            .rarity
            .as_ref()
            .and_then(|r| r.value.clone())
            .map(|r| rarity::canonical(&r))
            .or_else(|| Some(self.2.to_string()))
    }

    fn category(&self) -> String {
        self.1.to_string()
    }

    fn shop_history(&self) -> &[String] {
        &self.0.shop_history
    }
}

/// Section name and index: newest `layout`, then `layoutId`, then legacy `section`.
fn section_of(record: &RawEntry) -> Option<(String, i64)> {
    let from_block = |block: &super::schema::RawLayout| {
        let name = block
            .name
            .clone()
            .or_else(|| block.id.clone())
            .filter(|n| !n.trim().is_empty())?;
        Some((name, block.index.unwrap_or(0)))
    };
    record
        .layout
        .as_ref()
        .and_then(from_block)
        .or_else(|| {
            record
                .layout_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .map(|id| (id, 0))
        })
        .or_else(|| record.section.as_ref().and_then(from_block))
}

fn palette_of(record: &RawEntry) -> Option<Palette> {
    let colors = record.colors.as_ref()?;
    let stops: Vec<_> = [&colors.color1, &colors.color2, &colors.color3]
        .into_iter()
        .flatten()
        .filter_map(|hex| rarity::parse_hex(hex))
        .collect();
    if stops.len() < 2 {
        return None;
    }
    Some(Palette {
        stops,
        text_background: colors
            .text_background_color
            .as_deref()
            .and_then(rarity::parse_hex),
    })
}

fn footprint_of(record: &RawEntry) -> Footprint {
    match record.tile_size.as_deref() {
        None => Footprint::One,
        Some(tag) => Footprint::from_tile_size(tag).unwrap_or_else(|| {
            debug!("Unknown tile size {:?}, using a single tile", tag);
            Footprint::One
        }),
    }
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(urls.len());
    for url in urls {
        if !url.is_empty() && !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

fn price_of(raw: i64) -> Result<u32, CatalogError> {
    if raw < 0 {
        return Err(CatalogError::NegativePrice(raw));
    }
    u32::try_from(raw).map_err(|_| CatalogError::PriceOutOfRange(raw))
}

/// Build one entry from a raw record.
pub fn normalize_record(record: &RawEntry) -> Result<Entry, CatalogError> {
    let (section, section_index) = section_of(record).ok_or(CatalogError::MissingSection)?;

    let classified = Classified::of(record);
    if let Classified::Track(_) = classified
        && record.tile_size.is_none()
    {
        return Err(CatalogError::MetadataOnly);
    }

    let item = classified.item();
    let name = match &classified {
        Classified::Bundle(bundle, _) => bundle.name.clone(),
        Classified::Unknown => {
            warn!(
                "Unrecognised item kind in offer {}, using placeholder",
                record.offer_id.as_deref().unwrap_or("<no offer id>")
            );
            record.dev_name.clone().or_else(|| Some("Unknown".to_string()))
        }
        _ => item.as_ref().and_then(|i| i.name()),
    }
    .map(|n| n.trim().to_string())
    .filter(|n| !n.is_empty())
    .ok_or(CatalogError::MissingName)?;

    // Primary render image, then offer image, then the item's size variants
    let mut icons: Vec<String> = record
        .new_display_asset
        .iter()
        .flat_map(|a| a.render_images.iter())
        .filter_map(|r| r.image.clone())
        .collect();
    if let Classified::Bundle(bundle, _) = &classified {
        icons.extend(bundle.image.clone());
    }
    if let Some(item) = &item {
        icons.extend(item.icons());
    }
    let icons = dedup(icons);
    if icons.is_empty() {
        return Err(CatalogError::NoIcon);
    }

    if let Classified::Cosmetic(cosmetic) = &classified
        && !cosmetic.is_classified()
    {
        return Err(CatalogError::MissingClassification);
    }

    let final_price = price_of(record.final_price.ok_or(CatalogError::MissingPrice)?)?;
    let regular_price = match record.regular_price {
        Some(p) if p >= 0 => Some(price_of(p)?),
        _ => None,
    };
    let price = Price {
        final_price,
        regular_price,
    };

    let rarity = item
        .as_ref()
        .and_then(|i| i.rarity())
        .unwrap_or_else(|| DEFAULT_RARITY.to_string());
    let category = match &classified {
        Classified::Bundle(..) => "bundle".to_string(),
        Classified::Unknown => "unknown".to_string(),
        _ => item.as_ref().map(|i| i.category()).unwrap_or_default(),
    };
    let novelty = item
        .as_ref()
        .map(|i| Novelty::from_strings(i.shop_history()))
        .unwrap_or_else(|| Novelty::from_history(&[]));

    let extras = match &classified {
        Classified::Cosmetic(_) => record
            .br_items
            .iter()
            .skip(1)
            .map(|extra| Extra {
                name: extra.name.clone().unwrap_or_default(),
                rarity: ResolvedItem::rarity(extra).unwrap_or_else(|| DEFAULT_RARITY.to_string()),
                icon: extra
                    .images
                    .as_ref()
                    .and_then(|i| i.small_icon.clone().or_else(|| i.icon.clone())),
            })
            .collect(),
        _ => Vec::new(),
    };

    let layout = record.layout.as_ref().map(|_| LayoutHints {
        section: section.clone(),
        section_index,
        sort_priority: record.sort_priority.unwrap_or(0),
        footprint: footprint_of(record),
    });

    let set = match &classified {
        Classified::Cosmetic(item) | Classified::Bundle(_, Some(item)) => item
            .set
            .as_ref()
            .and_then(|s| s.value.clone().or_else(|| s.backend_value.clone())),
        _ => None,
    };

    let offer_id = record
        .offer_id
        .clone()
        .or_else(|| record.dev_name.clone())
        .unwrap_or_else(|| name.clone());

    Ok(Entry {
        offer_id,
        name,
        kind: classified.kind(),
        category,
        rarity,
        icons,
        price,
        novelty,
        extras,
        section,
        section_index,
        layout,
        palette: palette_of(record),
        set,
        banner: record.banner.as_ref().and_then(|b| b.value.clone()),
        expires: record.out_date.as_deref().and_then(parse_timestamp),
    })
}
