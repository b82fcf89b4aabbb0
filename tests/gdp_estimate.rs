use country_stats::{GdpEstimator, estimate_gdp};

#[test]
fn unknown_iff_rate_missing_or_zero() {
    assert_eq!(estimate_gdp(1_000, None, 1500.0), None);
    assert_eq!(estimate_gdp(1_000, Some(0.0), 1500.0), None);
    assert!(estimate_gdp(1_000, Some(1.0), 1500.0).is_some());
}

#[test]
fn formula_is_population_times_factor_over_rate() {
    let gdp = estimate_gdp(200_000_000, Some(800.0), 1500.0).unwrap();
    assert!((gdp - 375_000_000.0).abs() < 1e-3);
}

#[test]
fn proportional_to_population_and_non_negative() {
    let est = GdpEstimator::new(1200.0);
    let one = est.estimate(10_000, Some(3.5)).unwrap();
    let three = est.estimate(30_000, Some(3.5)).unwrap();
    assert!(one >= 0.0);
    assert!((three - 3.0 * one).abs() < 1e-6);
}

#[test]
fn factor_comes_from_configuration() {
    let low = GdpEstimator::new(1000.0).estimate(5, Some(1.0)).unwrap();
    let high = GdpEstimator::new(2000.0).estimate(5, Some(1.0)).unwrap();
    assert_eq!(low, 5_000.0);
    assert_eq!(high, 10_000.0);
}
