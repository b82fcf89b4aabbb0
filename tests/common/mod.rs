//! Shared fixtures: stub providers and store/pipeline builders.
#![allow(dead_code)]

use async_trait::async_trait;
use country_stats::api::{CountryProvider, RateProvider};
use country_stats::store::{CountryStore, SqliteCountryStore};
use country_stats::{Config, CountryPayload, RateFailurePolicy, RefreshPipeline, UpstreamError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Country provider returning whatever it currently holds, or a 502 when failing.
#[derive(Default)]
pub struct StubCountries {
    pub countries: Mutex<Vec<CountryPayload>>,
    pub fail: Mutex<bool>,
}

impl StubCountries {
    pub fn with(countries: Vec<CountryPayload>) -> Arc<Self> {
        Arc::new(Self {
            countries: Mutex::new(countries),
            fail: Mutex::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            countries: Mutex::new(Vec::new()),
            fail: Mutex::new(true),
        })
    }

    pub fn set(&self, countries: Vec<CountryPayload>) {
        *self.countries.lock().unwrap() = countries;
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl CountryProvider for StubCountries {
    async fn fetch_countries(&self) -> Result<Vec<CountryPayload>, UpstreamError> {
        if *self.fail.lock().unwrap() {
            return Err(UpstreamError::Status {
                source_name: "stub countries",
                status: reqwest::StatusCode::BAD_GATEWAY,
            });
        }
        Ok(self.countries.lock().unwrap().clone())
    }
}

/// Rate provider returning a fixed table, or a malformed-payload error when failing.
#[derive(Default)]
pub struct StubRates {
    pub rates: Mutex<HashMap<String, f64>>,
    pub fail: Mutex<bool>,
}

impl StubRates {
    pub fn with(pairs: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            rates: Mutex::new(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
            fail: Mutex::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            rates: Mutex::new(HashMap::new()),
            fail: Mutex::new(true),
        })
    }
}

#[async_trait]
impl RateProvider for StubRates {
    async fn fetch_exchange_rates(&self) -> Result<HashMap<String, f64>, UpstreamError> {
        if *self.fail.lock().unwrap() {
            return Err(UpstreamError::Payload {
                source_name: "stub rates",
                detail: "result was \"error\"".into(),
            });
        }
        Ok(self.rates.lock().unwrap().clone())
    }
}

pub fn payload(name: &str, region: &str, population: u64, currency: Option<&str>) -> CountryPayload {
    CountryPayload {
        name: name.into(),
        capital: None,
        region: Some(region.into()),
        population,
        currency_code: currency.map(|c| c.into()),
        flag_url: None,
    }
}

pub fn nigeria() -> CountryPayload {
    payload("Nigeria", "Africa", 200_000_000, Some("NGN"))
}

pub fn test_config(cache_dir: &Path, policy: RateFailurePolicy) -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        on_rate_failure: policy,
        cache_dir: Some(cache_dir.to_path_buf()),
        ..Config::default()
    }
}

pub async fn memory_store() -> Arc<dyn CountryStore> {
    Arc::new(SqliteCountryStore::in_memory().await.unwrap())
}

pub fn pipeline(
    countries: Arc<StubCountries>,
    rates: Arc<StubRates>,
    store: Arc<dyn CountryStore>,
    config: &Config,
) -> RefreshPipeline {
    RefreshPipeline::new(countries, rates, store, config)
}
