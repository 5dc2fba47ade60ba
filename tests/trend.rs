use chrono::{NaiveDate, NaiveDateTime};
use kira_peerqc::scores::trend::{TrendDetector, VitalMetric, escalations, latest_per_day};
use kira_peerqc::scores::{BandLevel, TrendDirection, TrendPresence, TrendSample};

fn ts(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn reading(patient: &str, metric: &str, at: NaiveDateTime, value: f64) -> TrendSample {
    TrendSample {
        patient_id: patient.to_string(),
        metric: metric.to_string(),
        timestamp: at,
        value,
        within_limits: true,
        comment: String::new(),
    }
}

fn daily(patient: &str, metric: &str, values: &[f64]) -> Vec<TrendSample> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| reading(patient, metric, ts(i as u32 + 1, 8), *v))
        .collect()
}

#[test]
fn rising_systolic_is_detected_upwards() {
    let samples = daily("P1", "Systolic", &[120.0, 122.0, 124.0, 126.0, 128.0, 130.0]);
    let result = TrendDetector::default().detect("P1", VitalMetric::Systolic, &samples);
    assert_eq!(result.trend, TrendPresence::Detected);
    assert_eq!(result.direction, TrendDirection::Upwards);
    let p = result.p_value.unwrap();
    assert!(p <= 0.05);
    assert_eq!(p, (p * 10_000.0).round() / 10_000.0);

    let chart = result.chart.unwrap();
    assert_eq!(chart.points.len(), 6);
    assert_eq!(chart.fitted.len(), 6);
    assert!((chart.slope_per_day - 2.0).abs() < 1e-9);
    assert!((chart.sen_slope - 2.0).abs() < 1e-9);
    assert!(chart.bands.iter().any(|b| b.level == BandLevel::Caution
        && b.lower == 170.0
        && b.upper == 180.0));
}

#[test]
fn falling_spo2_accepts_zero_spelling() {
    let samples = daily("P1", " sp02 ", &[97.0, 96.0, 95.0, 94.0, 93.0, 92.0]);
    let result = TrendDetector::default().detect("P1", VitalMetric::SpO2, &samples);
    assert_eq!(result.trend, TrendPresence::Detected);
    assert_eq!(result.direction, TrendDirection::Downwards);
}

#[test]
fn constant_series_is_absent() {
    let samples = daily("P1", "Pulse", &[70.0; 6]);
    let mut with_systolic = samples.clone();
    with_systolic.extend(daily("P1", "Systolic", &[120.0; 6]));
    let result = TrendDetector::default().detect("P1", VitalMetric::Pulse, &with_systolic);
    assert_eq!(result.trend, TrendPresence::Absent);
    assert_eq!(result.direction, TrendDirection::None);
    assert_eq!(result.p_value, Some(1.0));
    assert!(result.chart.is_none());
}

#[test]
fn fewer_than_six_days_is_absent_without_a_test() {
    let samples = daily("P1", "Systolic", &[120.0, 130.0, 140.0, 150.0, 160.0]);
    let result = TrendDetector::default().detect("P1", VitalMetric::Systolic, &samples);
    assert_eq!(result.trend, TrendPresence::Absent);
    assert_eq!(result.p_value, None);
    assert_eq!(result.days_available, 5);
}

#[test]
fn unpaired_pulse_readings_are_excluded() {
    let mut samples = daily("P1", "Pulse", &[60.0, 65.0, 70.0, 75.0, 80.0, 85.0]);
    // Systolic on the first five days only, so day six's pulse has no partner.
    samples.extend(daily("P1", "Systolic", &[120.0; 5]));
    let detector = TrendDetector::default();
    let result = detector.detect("P1", VitalMetric::Pulse, &samples);
    assert_eq!(result.days_available, 5);
    assert_eq!(result.trend, TrendPresence::Absent);

    samples.push(reading("P1", "Systolic", ts(6, 8), 120.0));
    let result = detector.detect("P1", VitalMetric::Pulse, &samples);
    assert_eq!(result.days_available, 6);
    assert_eq!(result.trend, TrendPresence::Detected);
}

#[test]
fn window_uses_latest_reading_of_the_last_six_days() {
    let mut samples = daily(
        "P1",
        "Systolic",
        &[200.0, 120.0, 122.0, 124.0, 126.0, 128.0, 110.0],
    );
    // A later reading on day 7 replaces the 110.
    samples.push(reading("P1", "Systolic", ts(7, 20), 130.0));
    let refs: Vec<&TrendSample> = samples.iter().collect();
    let days = latest_per_day(&refs);
    assert_eq!(days.len(), 7);
    assert_eq!(days[6].value, 130.0);

    let result = TrendDetector::default().detect("P1", VitalMetric::Systolic, &samples);
    assert_eq!(result.days_available, 7);
    assert_eq!(result.direction, TrendDirection::Upwards);
    let chart = result.chart.unwrap();
    assert_eq!(chart.points[0].value, 120.0);
}

#[test]
fn same_timestamp_keeps_the_later_input_row() {
    let a = reading("P1", "Systolic", ts(1, 8), 120.0);
    let b = reading("P1", "Systolic", ts(1, 8), 125.0);
    let days = latest_per_day(&[&a, &b]);
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].value, 125.0);
}

#[test]
fn detect_all_reports_every_metric_per_patient() {
    let mut samples = daily("P2", "Systolic", &[120.0, 122.0, 124.0, 126.0, 128.0, 130.0]);
    samples.extend(daily("P1", "Pulse", &[70.0, 71.0]));
    let results = TrendDetector::default().detect_all(&samples);
    assert_eq!(results.len(), 6);
    assert_eq!(results[0].patient_id, "P1");
    assert_eq!(results[3].patient_id, "P2");
    assert_eq!(results[3].metric, "Systolic");
    assert_eq!(results[3].trend, TrendPresence::Detected);
}

#[test]
fn escalation_uses_latest_reading_of_today() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
    let mut early = reading("P1", "Systolic", ts(6, 8), 190.0);
    early.within_limits = false;
    let late = reading("P1", "Systolic", ts(6, 10), 130.0);
    let mut pulse = reading("P1", "Pulse", ts(6, 9), 130.0);
    pulse.within_limits = false;
    pulse.comment = "Nurse notified".to_string();
    let mut yesterday = reading("P2", "Glucose", ts(5, 9), 20.0);
    yesterday.within_limits = false;

    let events = escalations(&[early, late, pulse, yesterday], today);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].patient_id, "P1");
    assert_eq!(events[0].metric, "Pulse");
    assert_eq!(events[0].comment, "Nurse notified");
    assert_eq!(events[0].timestamp, ts(6, 9));
}
