use kira_peerqc::math::mann_kendall::{MkTrend, mann_kendall};

#[test]
fn strictly_increasing_six_points() {
    let mk = mann_kendall(&[120.0, 122.0, 124.0, 126.0, 128.0, 130.0], 0.05).unwrap();
    assert_eq!(mk.s, 15);
    assert!((mk.variance - 510.0 / 18.0).abs() < 1e-9);
    assert!((mk.z - 14.0 / (510.0f64 / 18.0).sqrt()).abs() < 1e-9);
    assert!(mk.p_value < 0.01);
    assert_eq!(mk.trend, MkTrend::Increasing);
    assert!((mk.tau - 1.0).abs() < 1e-12);
    assert!((mk.sen_slope - 2.0).abs() < 1e-12);
}

#[test]
fn strictly_decreasing_is_decreasing() {
    let mk = mann_kendall(&[6.0, 5.0, 4.0, 3.0, 2.0, 1.0], 0.05).unwrap();
    assert_eq!(mk.s, -15);
    assert_eq!(mk.trend, MkTrend::Decreasing);
}

#[test]
fn constant_series_has_no_trend() {
    let mk = mann_kendall(&[5.0; 6], 0.05).unwrap();
    assert_eq!(mk.s, 0);
    assert_eq!(mk.z, 0.0);
    assert!((mk.p_value - 1.0).abs() < 1e-12);
    assert_eq!(mk.trend, MkTrend::NoTrend);
}

#[test]
fn ties_reduce_variance() {
    let mk = mann_kendall(&[1.0, 1.0, 2.0, 3.0], 0.05).unwrap();
    assert_eq!(mk.s, 5);
    assert!((mk.variance - (156.0 - 18.0) / 18.0).abs() < 1e-9);
}

#[test]
fn short_or_non_finite_input_is_rejected() {
    assert!(mann_kendall(&[1.0, 2.0], 0.05).is_none());
    assert!(mann_kendall(&[1.0, f64::NAN, 3.0], 0.05).is_none());
}

#[test]
fn zigzag_is_not_significant() {
    let mk = mann_kendall(&[1.0, 3.0, 2.0, 4.0, 3.0, 5.0], 0.05).unwrap();
    assert_eq!(mk.trend, MkTrend::NoTrend);
}
