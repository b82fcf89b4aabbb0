//! Async clients for the two upstream providers.
//!
//! - The **country provider** (REST Countries v2 shape) returns a JSON array of countries;
//!   each is flattened into a [`CountryPayload`] (first currency code wins).
//! - The **rate provider** (open.er-api shape) returns `{"result": "success", "rates": {...}}`.
//!
//! Each call is a single attempt. Network errors, timeouts, non-2xx responses and
//! malformed payloads all surface as [`UpstreamError`]; retrying is up to the caller.
//!
//! Typical usage:
//! ```no_run
//! # use country_stats::{Client, Config};
//! # use country_stats::api::{CountryProvider, RateProvider};
//! # async fn demo() -> anyhow::Result<()> {
//! let client = Client::new(&Config::default())?;
//! let countries = client.fetch_countries().await?;
//! let rates = client.fetch_exchange_rates().await?;
//! println!("{} countries, {} rates", countries.len(), rates.len());
//! # Ok(())
//! # }
//! ```
use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::{CountryPayload, RawCountry, RawRates};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

const COUNTRIES_SOURCE: &str = "countries API";
const RATES_SOURCE: &str = "exchange rates API";

/// Source of the country list.
#[async_trait]
pub trait CountryProvider: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<CountryPayload>, UpstreamError>;
}

/// Source of exchange rates, keyed by currency code.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_exchange_rates(&self) -> Result<HashMap<String, f64>, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct Client {
    pub countries_url: String,
    pub rates_url: String,
    http: HttpClient,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = HttpClient::builder()
            .timeout(config.http_timeout()) // total request timeout
            .connect_timeout(Duration::from_secs(10).min(config.http_timeout()))
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("country-stats/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            countries_url: config.countries_url.clone(),
            rates_url: config.rates_url.clone(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        source_name: &'static str,
    ) -> Result<T, UpstreamError> {
        log::info!("Fetching {source_name} from {url}");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| UpstreamError::Http { source_name, error })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                source_name,
                status,
            });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|error| UpstreamError::Http { source_name, error })?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Payload {
            source_name,
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl CountryProvider for Client {
    async fn fetch_countries(&self) -> Result<Vec<CountryPayload>, UpstreamError> {
        let raw: Vec<RawCountry> = self.get_json(&self.countries_url, COUNTRIES_SOURCE).await?;
        log::info!("Fetched {} countries", raw.len());
        Ok(raw.into_iter().map(CountryPayload::from).collect())
    }
}

#[async_trait]
impl RateProvider for Client {
    async fn fetch_exchange_rates(&self) -> Result<HashMap<String, f64>, UpstreamError> {
        let raw: RawRates = self.get_json(&self.rates_url, RATES_SOURCE).await?;
        let rates = rates_from_payload(raw)?;
        log::info!("Fetched {} exchange rates", rates.len());
        Ok(rates)
    }
}

/// Validate the rate provider's envelope and extract the rate table.
pub fn rates_from_payload(raw: RawRates) -> Result<HashMap<String, f64>, UpstreamError> {
    match raw.result.as_deref() {
        Some("success") => {}
        other => {
            return Err(UpstreamError::Payload {
                source_name: RATES_SOURCE,
                detail: format!("result was {:?}", other.unwrap_or("missing")),
            });
        }
    }
    raw.rates.ok_or_else(|| UpstreamError::Payload {
        source_name: RATES_SOURCE,
        detail: "missing rates object".into(),
    })
}
