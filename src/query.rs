//! Typed list query: filters and sort order for `GET /countries`.
//!
//! Region and currency filters match case-insensitively. Ties on any sort key fall back to
//! ascending name, and countries without a GDP estimate always come last when sorting by GDP.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Query parameter names accepted by the list endpoint.
pub const VALID_PARAMETERS: [&str; 3] = ["region", "currency", "sort"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    GdpDesc,
    GdpAsc,
    PopulationDesc,
    PopulationAsc,
    #[default]
    NameAsc,
    NameDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::GdpDesc,
        SortKey::GdpAsc,
        SortKey::PopulationDesc,
        SortKey::PopulationAsc,
        SortKey::NameAsc,
        SortKey::NameDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::GdpDesc => "gdp_desc",
            SortKey::GdpAsc => "gdp_asc",
            SortKey::PopulationDesc => "population_desc",
            SortKey::PopulationAsc => "population_asc",
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
        }
    }

    /// SQL `ORDER BY` body. `estimated_gdp IS NULL` sorts false (0) before true (1).
    pub fn order_by_sql(&self) -> &'static str {
        match self {
            SortKey::GdpDesc => "estimated_gdp IS NULL, estimated_gdp DESC, name ASC",
            SortKey::GdpAsc => "estimated_gdp IS NULL, estimated_gdp ASC, name ASC",
            SortKey::PopulationDesc => "population DESC, name ASC",
            SortKey::PopulationAsc => "population ASC, name ASC",
            SortKey::NameAsc => "name ASC",
            SortKey::NameDesc => "name DESC",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| {
                let valid: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
                AppError::validation(format!(
                    "invalid sort key '{s}', expected one of: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// Validated filters and order for listing countries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: SortKey,
}

impl ListQuery {
    /// Build from raw query parameters. Unknown parameter names and sort keys are rejected;
    /// empty values count as absent.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut invalid: Vec<String> = params
            .keys()
            .filter(|k| !VALID_PARAMETERS.contains(&k.as_str()))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            invalid.sort();
            return Err(AppError::Validation {
                message: format!("invalid query parameters: {}", invalid.join(", ")),
                invalid_parameters: invalid,
            });
        }

        let non_empty = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let sort = match non_empty("sort") {
            Some(s) => s.parse()?,
            None => SortKey::default(),
        };

        Ok(Self {
            region: non_empty("region"),
            currency: non_empty("currency"),
            sort,
        })
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}
