//! Service configuration.
//!
//! One `Config` value is built at startup (from flags or environment variables) and handed
//! to each component when it is constructed. Nothing reads settings from globals.

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://countries.db";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GDP_FACTOR: f64 = 1500.0;
const DEFAULT_IMAGE_WIDTH: u32 = crate::summary::DEFAULT_SIZE.0;
const DEFAULT_IMAGE_HEIGHT: u32 = crate::summary::DEFAULT_SIZE.1;

/// What a refresh does when the exchange-rate provider fails.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RateFailurePolicy {
    /// Fail the whole refresh with `UpstreamUnavailable`; nothing is written.
    #[default]
    Abort,
    /// Continue with null rates (and therefore null GDP) for every country.
    Degrade,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite), e.g. sqlite://countries.db or sqlite::memory:
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Maximum pooled database connections.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = DEFAULT_DATABASE_MAX_CONNECTIONS)]
    pub database_max_connections: u32,

    /// Country provider endpoint (REST Countries v2 compatible).
    #[arg(long, env = "COUNTRIES_API_URL", default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: String,

    /// Exchange-rate provider endpoint (open.er-api compatible).
    #[arg(long, env = "EXCHANGE_RATE_API_URL", default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    /// Total timeout for each upstream request, in seconds.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub http_timeout_secs: u64,

    /// Per-capita factor used by the GDP estimate (population * factor / rate).
    #[arg(long, env = "GDP_FACTOR", default_value_t = DEFAULT_GDP_FACTOR)]
    pub gdp_factor: f64,

    /// Behavior when the exchange-rate fetch fails during a refresh.
    #[arg(long, env = "ON_RATE_FAILURE", value_enum, default_value_t = RateFailurePolicy::default())]
    pub on_rate_failure: RateFailurePolicy,

    /// Directory receiving the rendered summary.png (defaults to the user cache dir).
    #[arg(long, env = "CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// TrueType font for image captions. Without it only the bars are drawn.
    #[arg(long, env = "SUMMARY_FONT")]
    pub font_path: Option<PathBuf>,

    /// Width of the summary image.
    #[arg(long, default_value_t = DEFAULT_IMAGE_WIDTH)]
    pub image_width: u32,

    /// Height of the summary image.
    #[arg(long, default_value_t = DEFAULT_IMAGE_HEIGHT)]
    pub image_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            countries_url: DEFAULT_COUNTRIES_URL.into(),
            rates_url: DEFAULT_RATES_URL.into(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            gdp_factor: DEFAULT_GDP_FACTOR,
            on_rate_failure: RateFailurePolicy::default(),
            cache_dir: None,
            font_path: None,
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
        }
    }
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Cache directory, falling back to `<user cache>/country-stats` and then the temp dir.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("country-stats")
        })
    }
}
