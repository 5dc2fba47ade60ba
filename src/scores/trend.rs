use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::math::mann_kendall::{MkTrend, mann_kendall};
use crate::math::stats::{linear_fit, round_half_up};
use crate::scores::{
    BandLevel, ChartBand, ChartPoint, EscalationEvent, TrendChart, TrendDirection, TrendPresence,
    TrendResult, TrendSample,
};

pub const DEFAULT_WINDOW_DAYS: usize = 6;
pub const DEFAULT_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalMetric {
    Systolic,
    SpO2,
    Pulse,
}

impl VitalMetric {
    pub const ALL: [VitalMetric; 3] = [VitalMetric::Systolic, VitalMetric::SpO2, VitalMetric::Pulse];

    /// Case-insensitive, surrounding whitespace ignored. `Sp02` is accepted.
    pub fn parse(name: &str) -> Option<Self> {
        match normalize_metric(name).as_str() {
            "systolic" => Some(VitalMetric::Systolic),
            "spo2" | "sp02" => Some(VitalMetric::SpO2),
            "pulse" => Some(VitalMetric::Pulse),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VitalMetric::Systolic => "Systolic",
            VitalMetric::SpO2 => "SpO2",
            VitalMetric::Pulse => "Pulse",
        }
    }

    /// Alarm and caution bands, widened to cover the plotted values.
    pub fn bands(&self, min_value: f64, max_value: f64) -> Vec<ChartBand> {
        let band = |level, lower, upper| ChartBand {
            level,
            lower,
            upper,
        };
        match self {
            VitalMetric::Systolic => vec![
                band(BandLevel::Alarm, 0.0, 100.0),
                band(BandLevel::Alarm, 180.0, max_value.max(250.0)),
                band(BandLevel::Caution, 170.0, 180.0),
            ],
            VitalMetric::SpO2 => vec![
                band(BandLevel::Alarm, min_value.min(80.0), 91.0),
                band(BandLevel::Caution, 91.0, 94.0),
            ],
            VitalMetric::Pulse => vec![
                band(BandLevel::Alarm, 0.0, 50.0),
                band(BandLevel::Alarm, 120.0, max_value.max(150.0)),
                band(BandLevel::Caution, 50.0, 60.0),
                band(BandLevel::Caution, 100.0, 120.0),
            ],
        }
    }
}

pub fn normalize_metric(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendDetector {
    pub window_days: usize,
    pub alpha: f64,
    pub metrics: Vec<VitalMetric>,
    /// Keep only Pulse readings taken at the exact time of a Systolic reading.
    pub pair_pulse_with_systolic: bool,
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            alpha: DEFAULT_ALPHA,
            metrics: VitalMetric::ALL.to_vec(),
            pair_pulse_with_systolic: true,
        }
    }
}

impl TrendDetector {
    /// Runs the test for one patient and metric. `samples` may hold the
    /// patient's readings for every metric; others are ignored.
    pub fn detect(&self, patient_id: &str, metric: VitalMetric, samples: &[TrendSample]) -> TrendResult {
        let own: Vec<&TrendSample> = samples
            .iter()
            .filter(|s| s.patient_id == patient_id)
            .collect();

        let mut readings: Vec<&TrendSample> = own
            .iter()
            .copied()
            .filter(|s| VitalMetric::parse(&s.metric) == Some(metric))
            .collect();

        if metric == VitalMetric::Pulse && self.pair_pulse_with_systolic {
            let systolic_times: Vec<NaiveDateTime> = own
                .iter()
                .filter(|s| VitalMetric::parse(&s.metric) == Some(VitalMetric::Systolic))
                .map(|s| s.timestamp)
                .collect();
            readings.retain(|s| systolic_times.contains(&s.timestamp));
        }

        let daily = latest_per_day(&readings);
        let days_available = daily.len();
        let absent = TrendResult {
            patient_id: patient_id.to_string(),
            metric: metric.label().to_string(),
            trend: TrendPresence::Absent,
            direction: TrendDirection::None,
            p_value: None,
            days_available,
            chart: None,
        };
        if days_available < self.window_days || self.window_days == 0 {
            return absent;
        }

        let window = &daily[days_available - self.window_days..];
        let values: Vec<f64> = window.iter().map(|s| s.value).collect();
        let Some(mk) = mann_kendall(&values, self.alpha) else {
            return absent;
        };

        let p_value = Some(round_half_up(mk.p_value, 4));
        let direction = match mk.trend {
            MkTrend::Increasing => TrendDirection::Upwards,
            MkTrend::Decreasing => TrendDirection::Downwards,
            MkTrend::NoTrend => {
                return TrendResult { p_value, ..absent };
            }
        };

        TrendResult {
            trend: TrendPresence::Detected,
            direction,
            p_value,
            chart: Some(build_chart(metric, window, mk.sen_slope)),
            ..absent
        }
    }

    /// One result per patient and configured metric, patients in id order.
    pub fn detect_all(&self, samples: &[TrendSample]) -> Vec<TrendResult> {
        let mut by_patient: BTreeMap<&str, Vec<TrendSample>> = BTreeMap::new();
        for s in samples {
            by_patient
                .entry(s.patient_id.as_str())
                .or_default()
                .push(s.clone());
        }
        let mut out = Vec::with_capacity(by_patient.len() * self.metrics.len());
        for (patient_id, own) in &by_patient {
            for metric in &self.metrics {
                out.push(self.detect(patient_id, *metric, own));
            }
        }
        out
    }
}

/// Latest reading per calendar day in ascending day order. Equal timestamps
/// resolve to the reading that came last in the input.
pub fn latest_per_day<'a>(readings: &[&'a TrendSample]) -> Vec<&'a TrendSample> {
    let mut by_day: BTreeMap<NaiveDate, &'a TrendSample> = BTreeMap::new();
    for &s in readings {
        let day = s.timestamp.date();
        match by_day.get(&day) {
            Some(current) if current.timestamp > s.timestamp => {}
            _ => {
                by_day.insert(day, s);
            }
        }
    }
    by_day.into_values().collect()
}

fn build_chart(metric: VitalMetric, window: &[&TrendSample], sen_slope: f64) -> TrendChart {
    let points: Vec<ChartPoint> = window
        .iter()
        .map(|s| ChartPoint {
            timestamp: s.timestamp,
            value: s.value,
        })
        .collect();

    let origin = window.first().map(|s| s.timestamp);
    let xs: Vec<f64> = window
        .iter()
        .map(|s| match origin {
            Some(o) => (s.timestamp - o).num_seconds() as f64 / 86_400.0,
            None => 0.0,
        })
        .collect();
    let ys: Vec<f64> = window.iter().map(|s| s.value).collect();

    let (fitted, slope_per_day) = match linear_fit(&xs, &ys) {
        Some((intercept, slope)) => (
            points
                .iter()
                .zip(xs.iter())
                .map(|(p, x)| ChartPoint {
                    timestamp: p.timestamp,
                    value: intercept + slope * x,
                })
                .collect(),
            slope,
        ),
        None => (Vec::new(), 0.0),
    };

    let min_value = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let max_value = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    TrendChart {
        points,
        fitted,
        slope_per_day,
        sen_slope,
        bands: metric.bands(min_value, max_value),
    }
}

/// Readings from `today` whose latest value per patient and metric is out
/// of limits.
pub fn escalations(samples: &[TrendSample], today: NaiveDate) -> Vec<EscalationEvent> {
    let mut latest: BTreeMap<(String, String), &TrendSample> = BTreeMap::new();
    for s in samples.iter().filter(|s| s.timestamp.date() == today) {
        let key = (s.patient_id.clone(), normalize_metric(&s.metric));
        match latest.get(&key) {
            Some(current) if current.timestamp > s.timestamp => {}
            _ => {
                latest.insert(key, s);
            }
        }
    }
    latest
        .into_values()
        .filter(|s| !s.within_limits)
        .map(|s| EscalationEvent {
            patient_id: s.patient_id.clone(),
            metric: s.metric.trim().to_string(),
            comment: s.comment.clone(),
            timestamp: s.timestamp,
        })
        .collect()
}
