//! # Error Types
//!
//! This module defines the run-level error type. Per-entry failures live in
//! [`crate::catalog::CatalogError`] and [`crate::render::CardError`]; they are
//! logged and dropped at their module boundary and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::layout::LayoutError;

/// Main error type for a poster run
#[derive(Debug, Error)]
pub enum ShopError {
    /// Catalog could not be retrieved (network, HTTP status)
    #[error("Failed to fetch item shop: {0}")]
    Fetch(String),

    /// Catalog response was not the expected JSON document
    #[error("Failed to parse item shop: {0}")]
    Parse(String),

    /// No usable entries survived normalization
    #[error("Item shop is empty: no usable entries")]
    EmptyCatalog,

    /// Grid planning failed
    #[error("Layout error: {0}")]
    Layout(LayoutError),

    /// Required font could not be loaded
    #[error("Font error: {0}")]
    Font(String),

    /// Final poster could not be written
    #[error("Failed to save {}: {message}", path.display())]
    Persist { path: PathBuf, message: String },

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LayoutError> for ShopError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::EmptyCatalog => ShopError::EmptyCatalog,
            other => ShopError::Layout(other),
        }
    }
}
