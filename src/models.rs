use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw currency entry from the country provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCurrency {
    pub code: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

/// Raw entry from the country provider (REST Countries v2 shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCountry {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    /// Usually a number; a few mirrors serialize it as a string.
    #[serde(default, deserialize_with = "de_opt_u64_from_string_or_number")]
    pub population: Option<u64>,
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<RawCurrency>>,
}

/// Serde helper: parse an optional `u64` from a JSON number, a numeric string or `null`.
fn de_opt_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct PopulationVisitor;

    impl<'de> Visitor<'de> for PopulationVisitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or number representing a non-negative count")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v)
                .map(Some)
                .map_err(|_| E::custom("negative population"))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v < 0.0 {
                return Err(E::custom("population must be a non-negative finite number"));
            }
            Ok(Some(v.round() as u64))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<u64>().map(Some).map_err(E::custom)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(PopulationVisitor)
}

/// Raw response of the exchange-rate provider (open.er-api shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRates {
    pub result: Option<String>,
    pub base_code: Option<String>,
    pub rates: Option<std::collections::HashMap<String, f64>>,
}

/// One country as delivered by a [`crate::api::CountryProvider`], already flattened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryPayload {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub flag_url: Option<String>,
}

/// First currency carrying a non-empty code.
pub fn primary_currency_code(currencies: &[RawCurrency]) -> Option<String> {
    currencies
        .iter()
        .filter_map(|c| c.code.as_deref())
        .map(str::trim)
        .find(|code| !code.is_empty())
        .map(str::to_string)
}

impl From<RawCountry> for CountryPayload {
    fn from(c: RawCountry) -> Self {
        let currency_code = c.currencies.as_deref().and_then(primary_currency_code);
        Self {
            name: c.name.unwrap_or_default().trim().to_string(),
            capital: c.capital.filter(|s| !s.trim().is_empty()),
            region: c.region.filter(|s| !s.trim().is_empty()),
            population: c.population.unwrap_or(0),
            currency_code,
            flag_url: c.flag.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Complete record as written by one upsert. Every field is overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryDraft {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

/// Stored country record, as served by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: u64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Result of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Counters reported by a refresh run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    /// Entries without a usable name.
    pub skipped: usize,
    /// Whether exchange rates were available (false only in degraded runs).
    pub rates_available: bool,
}

impl RefreshSummary {
    pub fn upserted(&self) -> usize {
        self.created + self.updated
    }
}

/// Service statistics for `/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}
