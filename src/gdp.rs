/// Heuristic GDP estimate: `population * factor / exchange_rate`.
///
/// Returns `None` ("unknown") when the exchange rate is missing, zero, negative or not
/// finite, so a country without a usable rate never produces a bogus value.
pub fn estimate_gdp(population: u64, exchange_rate: Option<f64>, factor: f64) -> Option<f64> {
    let rate = exchange_rate.filter(|r| r.is_finite() && *r > 0.0)?;
    let gdp = population as f64 * factor / rate;
    gdp.is_finite().then_some(gdp)
}

/// Carries the configured per-capita factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdpEstimator {
    pub factor: f64,
}

impl GdpEstimator {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn estimate(&self, population: u64, exchange_rate: Option<f64>) -> Option<f64> {
        estimate_gdp(population, exchange_rate, self.factor)
    }
}

impl Default for GdpEstimator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_GDP_FACTOR)
    }
}
