//! # Itemshop - Daily Item Shop Poster Generator
//!
//! Itemshop turns the daily item shop document into one PNG poster. It
//! provides:
//!
//! - **Catalog normalization**: every generation of the shop document reduced
//!   to a sorted list of uniform entries
//! - **Grid planning**: uniform, sectioned and mosaic layouts with a
//!   deterministic pixel placement per entry
//! - **Card rendering**: one decorated card per entry, rendered in parallel
//! - **Delivery**: Discord and Reddit publishers for the finished poster
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use itemshop::{
//!     catalog,
//!     render::{Assets, HttpIconSource, poster::{GenerateOptions, generate}},
//! };
//!
//! let client = reqwest::blocking::Client::new();
//! let raw = catalog::fetch_catalog(&client, catalog::SHOP_URL, "en")?;
//! let shop = catalog::normalize(&raw);
//!
//! let assets = Assets::load(Path::new("assets"))?;
//! let icons = HttpIconSource::new(client);
//! let path = generate(&shop, &assets, &icons, &GenerateOptions::new("itemshop.png"))?;
//! println!("Saved {}", path.display());
//!
//! # Ok::<(), itemshop::error::ShopError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Shop document schema, fetch and normalization |
//! | [`layout`] | Grid planner |
//! | [`render`] | Assets, cards and poster composition |
//! | [`deliver`] | Publishing the poster |
//! | [`config`] | `configuration.json` and CLI overrides |
//! | [`error`] | Error types |

pub mod catalog;
pub mod config;
pub mod deliver;
pub mod error;
pub mod layout;
pub mod render;

// Re-exports for convenience
pub use catalog::{Catalog, Entry};
pub use config::Config;
pub use error::ShopError;
pub use layout::{GridPlan, GridStyle, LayoutRegime};
