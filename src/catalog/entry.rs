//! Normalized catalog entries.
//!
//! An [`Entry`] is built once from a raw record and never modified. The grid
//! planner and the card renderer only read it.

use chrono::{DateTime, Utc};
use image::Rgb;
use serde::Serialize;

use super::novelty::Novelty;
use super::rarity::{self, RarityStyle};

/// Which kind of raw record an entry was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Bundle,
    Cosmetic,
    Track,
    Instrument,
    Vehicle,
    Kit,
    /// No known container matched; rendered from the offer image if any.
    Unknown,
}

/// Horizontal tile width in the mosaic grid, in units of a 4-unit block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u32")]
pub enum Footprint {
    One,
    Two,
    Four,
}

impl Footprint {
    pub fn units(self) -> u32 {
        match self {
            Footprint::One => 1,
            Footprint::Two => 2,
            Footprint::Four => 4,
        }
    }

    /// Parse a tile size tag.
    ///
    /// `Size_N_x_M` maps N to the nearest footprint that tiles a 4-unit block
    /// (1 → 1, 2 and 3 → 2, 4 and up → 4). Legacy names are also accepted.
    pub fn from_tile_size(tag: &str) -> Option<Self> {
        match tag {
            "Small" | "Normal" => return Some(Footprint::One),
            "DoubleWide" => return Some(Footprint::Two),
            "TripleWide" | "QuadWide" => return Some(Footprint::Four),
            _ => {}
        }
        let width: u32 = tag
            .strip_prefix("Size_")?
            .split("_x_")
            .next()?
            .parse()
            .ok()?;
        match width {
            0 => None,
            1 => Some(Footprint::One),
            2 | 3 => Some(Footprint::Two),
            _ => Some(Footprint::Four),
        }
    }
}

impl From<Footprint> for u32 {
    fn from(footprint: Footprint) -> Self {
        footprint.units()
    }
}

/// Section placement hints from the newest catalog generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutHints {
    pub section: String,
    pub section_index: i64,
    pub sort_priority: i64,
    pub footprint: Footprint,
}

/// Offer colours: two or three gradient stops plus the text plate colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    #[serde(skip)]
    pub stops: Vec<Rgb<u8>>,
    #[serde(skip)]
    pub text_background: Option<Rgb<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Price {
    pub final_price: u32,
    pub regular_price: Option<u32>,
}

impl Price {
    /// Whole-percent discount when the regular price is higher.
    pub fn discount_percent(&self) -> Option<u32> {
        let regular = self.regular_price?;
        if regular <= self.final_price || regular == 0 {
            return None;
        }
        Some(((regular - self.final_price) as f64 * 100.0 / regular as f64).round() as u32)
    }
}

/// A secondary item in a multi-item offer, drawn as a small badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extra {
    pub name: String,
    pub rarity: String,
    pub icon: Option<String>,
}

/// One purchasable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub offer_id: String,
    pub name: String,
    pub kind: ItemKind,
    pub category: String,
    pub rarity: String,
    /// Image URLs in fallback order.
    pub icons: Vec<String>,
    pub price: Price,
    pub novelty: Novelty,
    pub extras: Vec<Extra>,
    /// Section key used for grouping, present for every generation.
    pub section: String,
    pub section_index: i64,
    pub layout: Option<LayoutHints>,
    pub palette: Option<Palette>,
    pub set: Option<String>,
    pub banner: Option<String>,
    pub expires: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn style(&self) -> RarityStyle {
        rarity::style_for(&self.rarity)
    }

    pub fn footprint(&self) -> Footprint {
        self.layout
            .as_ref()
            .map(|l| l.footprint)
            .unwrap_or(Footprint::One)
    }

    /// `"Legendary Outfit"`.
    pub fn label(&self) -> String {
        format!(
            "{} {}",
            rarity::capitalize(&self.rarity),
            rarity::capitalize(&self.category)
        )
    }

    /// `"Leaves in 1d 4h"`, or `None` without an expiry or once expired.
    pub fn leaves_in(&self, now: DateTime<Utc>) -> Option<String> {
        let remaining = self.expires? - now;
        if remaining.num_seconds() <= 0 {
            return None;
        }
        let days = remaining.num_days();
        let hours = remaining.num_hours() - days * 24;
        Some(format!("Leaves in {}d {}h", days, hours))
    }

    /// Short identity for log lines.
    pub fn describe(&self) -> String {
        format!(
            "{} ({}/{}/{})",
            self.name, self.rarity, self.category, self.price.final_price
        )
    }
}

/// Capability interface over every raw item kind.
pub trait ResolvedItem {
    fn name(&self) -> Option<String>;
    /// Icon candidates in preference order.
    fn icons(&self) -> Vec<String>;
    fn rarity(&self) -> Option<String>;
    fn category(&self) -> String;
    fn shop_history(&self) -> &[String];
}

impl<T: ResolvedItem + ?Sized> ResolvedItem for &T {
    fn name(&self) -> Option<String> {
        (**self).name()
    }

    fn icons(&self) -> Vec<String> {
        (**self).icons()
    }

    fn rarity(&self) -> Option<String> {
        (**self).rarity()
    }

    fn category(&self) -> String {
        (**self).category()
    }

    fn shop_history(&self) -> &[String] {
        (**self).shop_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_footprint_from_tile_size() {
        assert_eq!(Footprint::from_tile_size("Size_1_x_2"), Some(Footprint::One));
        assert_eq!(Footprint::from_tile_size("Size_2_x_2"), Some(Footprint::Two));
        assert_eq!(Footprint::from_tile_size("Size_3_x_2"), Some(Footprint::Two));
        assert_eq!(Footprint::from_tile_size("Size_5_x_2"), Some(Footprint::Four));
        assert_eq!(Footprint::from_tile_size("DoubleWide"), Some(Footprint::Two));
        assert_eq!(Footprint::from_tile_size("Size_0_x_2"), None);
        assert_eq!(Footprint::from_tile_size("Huge"), None);
    }

    #[test]
    fn test_discount() {
        let price = Price {
            final_price: 1200,
            regular_price: Some(1500),
        };
        assert_eq!(price.discount_percent(), Some(20));
        let full = Price {
            final_price: 800,
            regular_price: Some(800),
        };
        assert_eq!(full.discount_percent(), None);
    }

    #[test]
    fn test_leaves_in() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let entry = Entry {
            offer_id: "offer".into(),
            name: "Renegade Raider".into(),
            kind: ItemKind::Cosmetic,
            category: "outfit".into(),
            rarity: "rare".into(),
            icons: vec![],
            price: Price {
                final_price: 1200,
                regular_price: None,
            },
            novelty: Novelty::from_history(&[]),
            extras: vec![],
            section: "Featured".into(),
            section_index: 0,
            layout: None,
            palette: None,
            set: None,
            banner: None,
            expires: Some(now + Duration::hours(28)),
        };
        assert_eq!(entry.leaves_in(now).as_deref(), Some("Leaves in 1d 4h"));
        assert_eq!(entry.leaves_in(now + Duration::days(2)), None);
        assert_eq!(entry.label(), "Rare Outfit");
    }
}
