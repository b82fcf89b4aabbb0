//! Refresh pipeline: fetch countries and rates, derive GDP, upsert by name.
//!
//! Steps run sequentially with a single attempt each:
//! 1. fetch the country list (failure aborts; nothing is written)
//! 2. fetch exchange rates (failure aborts or degrades, per [`RateFailurePolicy`])
//! 3. for every named country: look up its rate, estimate GDP, upsert
//!
//! The run is not atomic across countries: readers may see a mix of old and new records
//! while it is in progress.

use crate::api::{CountryProvider, RateProvider};
use crate::config::{Config, RateFailurePolicy};
use crate::error::AppResult;
use crate::gdp::GdpEstimator;
use crate::models::{CountryDraft, CountryPayload, RefreshSummary, UpsertOutcome};
use crate::store::CountryStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RefreshPipeline {
    countries: Arc<dyn CountryProvider>,
    rates: Arc<dyn RateProvider>,
    store: Arc<dyn CountryStore>,
    estimator: GdpEstimator,
    on_rate_failure: RateFailurePolicy,
}

impl RefreshPipeline {
    pub fn new(
        countries: Arc<dyn CountryProvider>,
        rates: Arc<dyn RateProvider>,
        store: Arc<dyn CountryStore>,
        config: &Config,
    ) -> Self {
        Self {
            countries,
            rates,
            store,
            estimator: GdpEstimator::new(config.gdp_factor),
            on_rate_failure: config.on_rate_failure,
        }
    }

    pub async fn refresh_all(&self) -> AppResult<RefreshSummary> {
        let countries = self.countries.fetch_countries().await?;

        let rates = match self.rates.fetch_exchange_rates().await {
            Ok(rates) => Some(rates),
            Err(e) => match self.on_rate_failure {
                RateFailurePolicy::Abort => return Err(e.into()),
                RateFailurePolicy::Degrade => {
                    log::warn!("{e}; continuing without exchange rates");
                    None
                }
            },
        };

        let refreshed_at = Utc::now();
        let mut summary = RefreshSummary {
            rates_available: rates.is_some(),
            ..RefreshSummary::default()
        };

        for payload in countries {
            summary.processed += 1;
            if payload.name.trim().is_empty() {
                summary.skipped += 1;
                continue;
            }
            let draft = self.draft(payload, rates.as_ref(), refreshed_at);
            match self.store.upsert(&draft).await? {
                UpsertOutcome::Created => {
                    summary.created += 1;
                    log::debug!("Created: {}", draft.name);
                }
                UpsertOutcome::Updated => {
                    summary.updated += 1;
                    log::debug!("Updated: {}", draft.name);
                }
            }
        }

        self.store.record_refresh(refreshed_at).await?;
        log::info!(
            "Refresh completed: {} processed, {} created, {} updated, {} skipped",
            summary.processed,
            summary.created,
            summary.updated,
            summary.skipped
        );
        Ok(summary)
    }

    /// Map one provider entry to a full record; an unknown currency yields null rate and GDP.
    fn draft(
        &self,
        payload: CountryPayload,
        rates: Option<&HashMap<String, f64>>,
        refreshed_at: chrono::DateTime<Utc>,
    ) -> CountryDraft {
        let exchange_rate = match (payload.currency_code.as_deref(), rates) {
            (Some(code), Some(rates)) => rates.get(code).copied(),
            _ => None,
        };
        let estimated_gdp = self.estimator.estimate(payload.population, exchange_rate);
        CountryDraft {
            name: payload.name.trim().to_string(),
            capital: payload.capital,
            region: payload.region,
            population: payload.population,
            currency_code: payload.currency_code,
            exchange_rate,
            estimated_gdp,
            flag_url: payload.flag_url,
            refreshed_at,
        }
    }
}
