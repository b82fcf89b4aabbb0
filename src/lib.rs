//! country_stats
//!
//! A small Rust service that pulls country data and exchange rates from public REST APIs,
//! keeps them in SQLite, and serves them over HTTP. Pairs with the `country-stats` CLI.
//!
//! ### Features
//! - Refresh pipeline: fetch countries and rates, estimate GDP, upsert by country name
//! - Filtered and sorted listing (region, currency, GDP/population/name order)
//! - Lookup and deletion by name, plus service status
//! - Summary chart (PNG or SVG) of countries per region and the top GDP estimates
//!
//! ### Example
//! ```no_run
//! use country_stats::{Config, server};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let state = server::AppState::from_config(&config).await?;
//! let summary = state.pipeline.refresh_all().await?;
//! println!("{} countries upserted", summary.upserted());
//! let app = server::build_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gdp;
pub mod models;
pub mod query;
pub mod refresh;
pub mod server;
pub mod store;
pub mod summary;

pub use api::Client;
pub use config::{Config, RateFailurePolicy};
pub use error::{AppError, AppResult, UpstreamError};
pub use gdp::{GdpEstimator, estimate_gdp};
pub use models::{Country, CountryDraft, CountryPayload, RefreshSummary, Status};
pub use query::{ListQuery, SortKey};
pub use refresh::RefreshPipeline;
pub use store::{CountryStore, SqliteCountryStore};
