//! Icon retrieval with a fallback chain.
//!
//! Each card worker downloads its own icons through an [`IconSource`]. The
//! entry's icon list is already ordered (render image, offer image, size
//! variants); the first URL that downloads and decodes wins.

use std::collections::HashMap;

use image::{DynamicImage, RgbaImage, imageops::FilterType};
use tracing::warn;

use super::CardError;

/// Somewhere icons come from.
pub trait IconSource: Sync {
    fn fetch(&self, url: &str) -> Result<DynamicImage, CardError>;
}

/// Icon source backed by a blocking HTTP client.
pub struct HttpIconSource {
    client: reqwest::blocking::Client,
}

impl HttpIconSource {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl IconSource for HttpIconSource {
    fn fetch(&self, url: &str) -> Result<DynamicImage, CardError> {
        let download = |message: String| CardError::Download {
            url: url.to_string(),
            message,
        };
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(download(format!("HTTP {}", response.status())));
        }
        let bytes = response
            .bytes()
            .map_err(|e| download(format!("Failed to read image data: {}", e)))?;
        image::load_from_memory(&bytes).map_err(|e| download(format!("Failed to decode image: {}", e)))
    }
}

/// Icons held in memory, keyed by URL. Unknown URLs fail like a 404.
#[derive(Default)]
pub struct MemoryIconSource {
    icons: HashMap<String, DynamicImage>,
}

impl MemoryIconSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, icon: DynamicImage) {
        self.icons.insert(url.to_string(), icon);
    }
}

impl IconSource for MemoryIconSource {
    fn fetch(&self, url: &str) -> Result<DynamicImage, CardError> {
        self.icons.get(url).cloned().ok_or_else(|| CardError::Download {
            url: url.to_string(),
            message: "HTTP 404 Not Found".to_string(),
        })
    }
}

/// Try each URL in order; log every failure and return the first success.
pub fn fetch_with_fallback(source: &dyn IconSource, urls: &[String]) -> Result<DynamicImage, CardError> {
    for url in urls {
        match source.fetch(url) {
            Ok(icon) => return Ok(icon),
            Err(e) => warn!("Icon fallback: {}", e),
        }
    }
    Err(CardError::IconUnavailable {
        tried: urls.len(),
    })
}

/// Resize to fit inside `max_width`×`max_height`, preserving aspect ratio.
pub fn fit_within(icon: &DynamicImage, max_width: u32, max_height: u32) -> RgbaImage {
    icon.resize(max_width.max(1), max_height.max(1), FilterType::Lanczos3)
        .to_rgba8()
}
