mod common;

use common::*;
use country_stats::{AppError, ListQuery, RateFailurePolicy};

#[tokio::test]
async fn nigeria_end_to_end_through_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), RateFailurePolicy::Abort);
    let store = memory_store().await;
    let p = pipeline(
        StubCountries::with(vec![nigeria()]),
        StubRates::with(&[("NGN", 800.0)]),
        store.clone(),
        &config,
    );

    let summary = p.refresh_all().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.upserted(), 1);
    assert!(summary.rates_available);

    assert_eq!(store.count().await.unwrap(), 1);
    let got = store.get_by_name("Nigeria").await.unwrap();
    assert_eq!(got.exchange_rate, Some(800.0));
    let gdp = got.estimated_gdp.expect("gdp estimated");
    assert!((gdp - 375_000_000.0).abs() < 1e-3);
    assert!(store.last_refresh().await.unwrap().is_some());
}

#[tokio::test]
async fn missing_rate_gives_null_gdp_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), RateFailurePolicy::Abort);
    let store = memory_store().await;
    let p = pipeline(
        StubCountries::with(vec![
            nigeria(),
            payload("Ghana", "Africa", 30_000_000, Some("GHS")),
            payload("Antarctica", "Polar", 1_000, None),
        ]),
        StubRates::with(&[("NGN", 800.0), ("GHS", 0.0)]),
        store.clone(),
        &config,
    );

    let summary = p.refresh_all().await.unwrap();
    assert_eq!(summary.upserted(), 3);

    let ghana = store.get_by_name("Ghana").await.unwrap();
    assert_eq!(ghana.exchange_rate, Some(0.0));
    assert_eq!(ghana.estimated_gdp, None);

    let antarctica = store.get_by_name("Antarctica").await.unwrap();
    assert_eq!(antarctica.currency_code, None);
    assert_eq!(antarctica.exchange_rate, None);
    assert_eq!(antarctica.estimated_gdp, None);
}

#[tokio::test]
async fn country_fetch_failure_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), RateFailurePolicy::Degrade);
    let store = memory_store().await;
    let countries = StubCountries::with(vec![nigeria()]);
    let p = pipeline(
        countries.clone(),
        StubRates::with(&[("NGN", 800.0)]),
        store.clone(),
        &config,
    );
    p.refresh_all().await.unwrap();
    let before = store.get_by_name("Nigeria").await.unwrap();

    countries.set_failing(true);
    let err = p.refresh_all().await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert_eq!(err.status_code().as_u16(), 503);

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.get_by_name("Nigeria").await.unwrap(), before);
}

#[tokio::test]
async fn rate_failure_aborts_under_abort_policy() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), RateFailurePolicy::Abort);
    let store = memory_store().await;
    let p = pipeline(
        StubCountries::with(vec![nigeria()]),
        StubRates::failing(),
        store.clone(),
        &config,
    );

    let err = p.refresh_all().await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.last_refresh().await.unwrap(), None);
}

#[tokio::test]
async fn rate_failure_degrades_to_null_rates_under_degrade_policy() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), RateFailurePolicy::Degrade);
    let store = memory_store().await;
    let p = pipeline(
        StubCountries::with(vec![nigeria(), payload("Ghana", "Africa", 30, Some("GHS"))]),
        StubRates::failing(),
        store.clone(),
        &config,
    );

    let summary = p.refresh_all().await.unwrap();
    assert!(!summary.rates_available);
    assert_eq!(summary.upserted(), 2);

    let all = store.list(&ListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|c| c.exchange_rate.is_none() && c.estimated_gdp.is_none()));
}

#[tokio::test]
async fn second_refresh_updates_and_recomputes_gdp() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), RateFailurePolicy::Abort);
    let store = memory_store().await;
    let countries = StubCountries::with(vec![nigeria()]);
    let rates = StubRates::with(&[("NGN", 800.0)]);
    let p = pipeline(countries.clone(), rates.clone(), store.clone(), &config);

    p.refresh_all().await.unwrap();
    countries.set(vec![payload("Nigeria", "Africa", 400_000_000, Some("NGN"))]);
    rates.rates.lock().unwrap().insert("NGN".into(), 1600.0);

    let summary = p.refresh_all().await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);

    let got = store.get_by_name("Nigeria").await.unwrap();
    assert_eq!(got.population, 400_000_000);
    assert!((got.estimated_gdp.unwrap() - 375_000_000.0).abs() < 1e-3);
}

#[tokio::test]
async fn nameless_entries_are_skipped_and_duplicates_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), RateFailurePolicy::Abort);
    let store = memory_store().await;
    let p = pipeline(
        StubCountries::with(vec![
            payload("  ", "Nowhere", 1, None),
            payload("Chad", "Africa", 10, Some("XAF")),
            payload("Chad", "Africa", 20, Some("XAF")),
        ]),
        StubRates::with(&[("XAF", 600.0)]),
        store.clone(),
        &config,
    );

    let summary = p.refresh_all().await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.get_by_name("Chad").await.unwrap().population, 20);
}
