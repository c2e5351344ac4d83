//! Rarity normalization and the rarity style table.
//!
//! The catalog uses an open set of free-form rarity strings. They are reduced
//! to a canonical lower-case tag here, and every tag resolves to a
//! [`RarityStyle`]. Tags the table does not know resolve to [`UNKNOWN`] so new
//! catalog tags render instead of failing.

use image::Rgb;

/// Card theme for one canonical rarity tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RarityStyle {
    pub tag: &'static str,
    /// Label and wash colour.
    pub color: Rgb<u8>,
    /// Frame asset suffix (`card_top_{frame}.png`).
    pub frame: &'static str,
}

const fn style(tag: &'static str, r: u8, g: u8, b: u8) -> RarityStyle {
    RarityStyle {
        tag,
        color: Rgb([r, g, b]),
        frame: tag,
    }
}

/// Fallback style for tags the table does not know.
pub const UNKNOWN: RarityStyle = RarityStyle {
    tag: "unknown",
    color: Rgb([255, 255, 255]),
    frame: "common",
};

static STYLES: &[RarityStyle] = &[
    style("frozen", 148, 223, 255),
    style("lava", 234, 141, 35),
    style("legendary", 211, 120, 65),
    style("mythic", 186, 156, 54),
    style("dark", 251, 34, 223),
    style("starwars", 231, 196, 19),
    style("marvel", 197, 51, 52),
    style("dc", 84, 117, 199),
    style("icon", 54, 183, 183),
    style("gaming", 117, 129, 209),
    style("shadow", 113, 113, 113),
    style("slurp", 41, 214, 201),
    style("epic", 177, 91, 226),
    style("rare", 73, 172, 242),
    style("uncommon", 96, 170, 58),
    style("common", 190, 190, 190),
    style("jam", 255, 92, 180),
    style("vehicle", 255, 196, 38),
    style("lego", 227, 0, 11),
];

/// Canonical tag for records with no discoverable rarity.
pub const DEFAULT_RARITY: &str = "common";

/// Look up the style for a canonical tag.
pub fn style_for(tag: &str) -> RarityStyle {
    STYLES
        .iter()
        .find(|s| s.tag == tag)
        .copied()
        .unwrap_or(UNKNOWN)
}

/// Reduce a raw rarity or series string to its canonical tag.
///
/// Accepts display values (`"Legendary"`), backend values
/// (`"EFortRarity::Elegant"`) and series names (`"Icon Series"`,
/// `"MarvelSeries"`).
pub fn canonical(raw: &str) -> String {
    let mut tag: String = raw
        .trim()
        .to_lowercase()
        .trim_start_matches("efortrarity::")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if let Some(stripped) = tag.strip_suffix("series") {
        tag = stripped.to_string();
    }
    // "gaminglegends" and friends share the base tag's style
    if let Some(stripped) = tag.strip_suffix("legends")
        && !stripped.is_empty()
    {
        tag = stripped.to_string();
    }

    let tag = match tag.as_str() {
        "handmade" => "common",
        "sturdy" => "uncommon",
        "quality" => "rare",
        "fine" => "epic",
        "elegant" => "legendary",
        "transcendent" => "mythic",
        "creatorcollab" => "icon",
        "columbus" => "starwars",
        "cube" => "dark",
        "dcu" => "dc",
        "platform" => "gaming",
        "" => DEFAULT_RARITY,
        other => other,
    };
    tag.to_string()
}

/// Title-case a tag for display (`"starwars"` → `"Starwars"`).
pub fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse a `rrggbb` or `rrggbbaa` hex colour (optional leading `#`).
pub fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_display_values() {
        assert_eq!(canonical("Legendary"), "legendary");
        assert_eq!(canonical(" epic "), "epic");
    }

    #[test]
    fn test_canonical_backend_values() {
        assert_eq!(canonical("EFortRarity::Elegant"), "legendary");
        assert_eq!(canonical("EFortRarity::Handmade"), "common");
    }

    #[test]
    fn test_canonical_series() {
        assert_eq!(canonical("Icon Series"), "icon");
        assert_eq!(canonical("MARVEL SERIES"), "marvel");
        assert_eq!(canonical("Star Wars Series"), "starwars");
        assert_eq!(canonical("CreatorCollabSeries"), "icon");
        assert_eq!(canonical("Gaming Legends Series"), "gaming");
        assert_eq!(canonical("DCUSeries"), "dc");
        assert_eq!(canonical("PlatformSeries"), "gaming");
        assert_eq!(style_for(&canonical("DCUSeries")).tag, "dc");
        assert_eq!(style_for(&canonical("PlatformSeries")).tag, "gaming");
    }

    #[test]
    fn test_canonical_empty_defaults_to_common() {
        assert_eq!(canonical(""), "common");
        assert_eq!(canonical("   "), "common");
    }

    #[test]
    fn test_unknown_tag_resolves_to_unknown_style() {
        assert_eq!(style_for("glitter"), UNKNOWN);
        assert_eq!(style_for("glitter").frame, "common");
        assert_eq!(style_for("epic").color, Rgb([177, 91, 226]));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("ff6a1f"), Some(Rgb([255, 106, 31])));
        assert_eq!(parse_hex("#1c0c49ff"), Some(Rgb([28, 12, 73])));
        assert_eq!(parse_hex("xyz"), None);
        assert_eq!(parse_hex("gg0000"), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("outfit"), "Outfit");
        assert_eq!(capitalize(""), "");
    }
}
