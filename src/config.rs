//! Run configuration from `configuration.json`.
//!
//! Every key is optional; missing keys take their defaults, and a missing
//! file means an all-default run. Command-line flags are applied on top with
//! [`Config::apply`].
//!
//! ```json
//! {
//!     "delayStart": 0,
//!     "language": "en",
//!     "workers": 16,
//!     "layout": "auto",
//!     "discord": {"enabled": true, "token": "...", "channelId": "1234"}
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SHOP_URL;
use crate::layout::LayoutRegime;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "configuration.json";

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// Validation error
    #[error("Configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Layout selection: detected from the catalog, or forced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Auto,
    Uniform,
    Sectioned,
    Mosaic,
}

impl LayoutMode {
    /// Forced regime, `None` for auto-detection.
    pub fn regime(self) -> Option<LayoutRegime> {
        match self {
            LayoutMode::Auto => None,
            LayoutMode::Uniform => Some(LayoutRegime::Uniform),
            LayoutMode::Sectioned => Some(LayoutRegime::Sectioned),
            LayoutMode::Mosaic => Some(LayoutRegime::Mosaic),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscordConfig {
    pub enabled: bool,
    pub token: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedditConfig {
    pub enabled: bool,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub subreddit: String,
    pub user_agent: String,
    pub flair_id: Option<String>,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            subreddit: String::new(),
            user_agent: concat!("itemshop/", env!("CARGO_PKG_VERSION")).to_string(),
            flair_id: None,
        }
    }
}

/// Full run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Seconds to wait before fetching.
    pub delay_start: u64,
    /// Display language passed to the catalog endpoint.
    pub language: String,
    pub log_level: String,
    pub api_url: String,
    pub assets_dir: PathBuf,
    pub output: PathBuf,
    /// Card rendering threads.
    pub workers: usize,
    pub max_rows_per_column: u32,
    pub layout: LayoutMode,
    pub discord: DiscordConfig,
    pub reddit: RedditConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay_start: 0,
            language: "en".to_string(),
            log_level: "info".to_string(),
            api_url: SHOP_URL.to_string(),
            assets_dir: PathBuf::from("assets"),
            output: PathBuf::from("itemshop.png"),
            workers: 16,
            max_rows_per_column: 8,
            layout: LayoutMode::Auto,
            discord: DiscordConfig::default(),
            reddit: RedditConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub output: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub language: Option<String>,
    pub layout: Option<LayoutMode>,
    pub workers: Option<usize>,
    pub log_level: Option<String>,
    /// Disable every publisher for this run.
    pub no_deliver: bool,
}

impl Config {
    /// Load and validate `path`. A missing file yields the defaults.
    ///
    /// Runs before logging is set up, so it reports nothing itself.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a JSON document.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Collect every problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        if self.workers == 0 {
            errors.push("workers must be greater than 0".to_string());
        }
        if self.max_rows_per_column == 0 {
            errors.push("maxRowsPerColumn must be greater than 0".to_string());
        }
        if self.language.trim().is_empty() {
            errors.push("language must not be empty".to_string());
        }
        if self.discord.enabled {
            if self.discord.token.is_empty() {
                errors.push("discord.token is required when discord is enabled".to_string());
            }
            if self.discord.channel_id.is_empty() {
                errors.push("discord.channelId is required when discord is enabled".to_string());
            }
        }
        if self.reddit.enabled {
            let required = [
                ("clientId", &self.reddit.client_id),
                ("clientSecret", &self.reddit.client_secret),
                ("username", &self.reddit.username),
                ("password", &self.reddit.password),
                ("subreddit", &self.reddit.subreddit),
            ];
            for (key, value) in required {
                if value.is_empty() {
                    errors.push(format!("reddit.{} is required when reddit is enabled", key));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Apply command-line overrides and re-validate.
    pub fn apply(&mut self, overrides: &CliOverrides) -> Result<(), ConfigError> {
        if let Some(output) = &overrides.output {
            self.output = output.clone();
        }
        if let Some(dir) = &overrides.assets_dir {
            self.assets_dir = dir.clone();
        }
        if let Some(language) = &overrides.language {
            self.language = language.clone();
        }
        if let Some(layout) = overrides.layout {
            self.layout = layout;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
        if overrides.no_deliver {
            self.discord.enabled = false;
            self.reddit.enabled = false;
        }
        self.validate()
    }
}
