//! # Rendering Module
//!
//! Everything between a normalized [`Entry`](crate::catalog::Entry) and the
//! final PNG.
//!
//! ## Modules
//!
//! - [`assets`]: font, background, logo and rarity layers loaded once per run
//! - [`text`]: ab_glyph text measurement and drawing
//! - [`paint`]: gradients, rounded corners, borders
//! - [`icon`]: icon download with a fallback chain
//! - [`card`]: one decorated card per entry
//! - [`poster`]: canvas, header, parallel card rendering and pasting
//!
//! ## Failure model
//!
//! A card that cannot be rendered is a [`CardError`]. It is logged with the
//! entry's identity and the card's cell stays empty; it never stops the run.
//! Only poster-level problems (no font, no entries, unwritable output) are
//! fatal and surface as [`ShopError`](crate::error::ShopError).

pub mod assets;
pub mod card;
pub mod icon;
pub mod paint;
pub mod poster;
pub mod text;

use thiserror::Error;

pub use assets::Assets;
pub use card::{CardContext, CardStyle, render_card, try_render_card};
pub use icon::{HttpIconSource, IconSource, MemoryIconSource};
pub use poster::{Poster, PosterStyle, compose, generate};

/// Per-card rendering failure.
#[derive(Debug, Error)]
pub enum CardError {
    /// An icon URL could not be downloaded or decoded.
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    /// Every icon in the fallback chain failed.
    #[error("no icon could be loaded ({tried} tried)")]
    IconUnavailable { tried: usize },

    /// A field the card needs is missing.
    #[error("missing {0}")]
    MissingField(&'static str),
}
