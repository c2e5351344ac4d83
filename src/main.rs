//! # Itemshop CLI
//!
//! Command-line interface for the daily item shop poster.
//!
//! ## Usage
//!
//! ```bash
//! # Fetch today's shop, render itemshop.png and deliver it
//! itemshop generate
//!
//! # Render an offline copy of the shop without delivering
//! itemshop generate --catalog shop.json --no-deliver --output out/shop.png
//!
//! # Force the uniform grid
//! itemshop generate --layout uniform
//!
//! # Print the grid plan as JSON
//! itemshop plan --catalog shop.json
//! ```

use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use itemshop::{
    ShopError,
    catalog::{self, Catalog},
    config::{CONFIG_FILE, CliOverrides, Config, LayoutMode},
    deliver::{self, Announcement},
    layout::{self, LayoutRegime},
    render::{
        Assets, HttpIconSource,
        poster::{GenerateOptions, PosterStyle},
    },
};

/// Itemshop - Daily item shop poster generator
#[derive(Parser, Debug)]
#[command(name = "itemshop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log level or filter directive (overrides RUST_LOG and logLevel)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Source {
    /// Read the shop document from a file instead of fetching it
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Display language for the fetched shop
    #[arg(long)]
    language: Option<String>,

    /// Layout regime (detected from the shop by default)
    #[arg(long, value_enum)]
    layout: Option<LayoutMode>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the poster and deliver it
    Generate {
        #[command(flatten)]
        source: Source,

        /// Output PNG path
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Assets directory (font, background, rarity layers)
        #[arg(long, value_name = "DIR")]
        assets: Option<PathBuf>,

        /// Card rendering threads
        #[arg(long)]
        workers: Option<usize>,

        /// Skip delivery even when publishers are enabled
        #[arg(long)]
        no_deliver: bool,
    },
    /// Print the grid plan as JSON
    Plan {
        #[command(flatten)]
        source: Source,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(cli.log_level.as_deref(), &config.log_level);
    if cli.config.exists() {
        info!("Loaded configuration from {}", cli.config.display());
    } else {
        warn!("{} not found, using default configuration", cli.config.display());
    }

    if let Err(e) = run(cli.command, &config) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config, ShopError> {
    let mut config = Config::load(&cli.config)?;
    let mut overrides = CliOverrides {
        log_level: cli.log_level.clone(),
        ..Default::default()
    };
    match &cli.command {
        Commands::Generate {
            source,
            output,
            assets,
            workers,
            no_deliver,
        } => {
            overrides.language = source.language.clone();
            overrides.layout = source.layout;
            overrides.output = output.clone();
            overrides.assets_dir = assets.clone();
            overrides.workers = *workers;
            overrides.no_deliver = *no_deliver;
        }
        Commands::Plan { source } => {
            overrides.language = source.language.clone();
            overrides.layout = source.layout;
            overrides.no_deliver = true;
        }
    }
    config.apply(&overrides)?;
    Ok(config)
}

/// `--log-level`, then `RUST_LOG`, then the configured level.
fn init_tracing(flag: Option<&str>, configured: &str) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(command: Commands, config: &Config) -> Result<(), ShopError> {
    let client = http_client()?;
    match command {
        Commands::Generate { source, .. } => {
            if config.delay_start > 0 {
                info!("Delaying process start for {}s...", config.delay_start);
                sleep(Duration::from_secs(config.delay_start));
            }

            let shop = retrieve(&client, source.catalog.as_deref(), config)?;
            let icons = HttpIconSource::new(client.clone());
            let mut assets = Assets::load(&config.assets_dir)?;
            assets.fill_currency(&icons, shop.currency_icon.as_deref());

            let mut options = GenerateOptions::new(&config.output);
            options.regime = config.layout.regime();
            options.workers = config.workers;
            options.style = poster_style(config);
            let path = itemshop::render::generate(&shop, &assets, &icons, &options)?;

            let publishers = deliver::publishers(config, &client);
            if publishers.is_empty() {
                info!("No publishers enabled, skipping delivery");
                return Ok(());
            }
            let date = shop.date.unwrap_or_else(|| Utc::now().date_naive());
            let delivered = deliver::deliver_all(&publishers, &path, &Announcement::for_date(date));
            info!("Delivered to {} of {} publishers", delivered, publishers.len());
            Ok(())
        }
        Commands::Plan { source } => {
            let shop = retrieve(&client, source.catalog.as_deref(), config)?;
            let regime = config
                .layout
                .regime()
                .unwrap_or_else(|| LayoutRegime::detect(&shop.entries));
            let plan = layout::plan(&shop.entries, regime, &poster_style(config).grid)?;
            let json = serde_json::to_string_pretty(&plan).map_err(|e| ShopError::Parse(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn http_client() -> Result<reqwest::blocking::Client, ShopError> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("itemshop/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| ShopError::Fetch(format!("HTTP client error: {}", e)))
}

/// Fetch or load the shop, then normalize it.
fn retrieve(
    client: &reqwest::blocking::Client,
    file: Option<&std::path::Path>,
    config: &Config,
) -> Result<Catalog, ShopError> {
    let raw = match file {
        Some(path) => catalog::load_catalog(path)?,
        None => catalog::fetch_catalog(client, &config.api_url, &config.language)?,
    };
    let shop = catalog::normalize(&raw);
    match shop.display_date() {
        Some(date) => info!("Retrieved Item Shop for {}", date),
        None => info!("Retrieved Item Shop"),
    }
    if shop.dropped > 0 {
        warn!("Dropped {} unusable shop entries", shop.dropped);
    }
    if shop.is_empty() {
        return Err(ShopError::EmptyCatalog);
    }
    Ok(shop)
}

fn poster_style(config: &Config) -> PosterStyle {
    let mut style = PosterStyle::default();
    style.grid.max_rows_per_column = config.max_rows_per_column;
    style
}
