//! Mann-Kendall monotonic trend test.
//!
//! S = Σ sign(xⱼ - xᵢ) over i < j, variance tie-corrected, Z with continuity
//! correction, two-sided p-value from the standard normal.

use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MkTrend {
    Increasing,
    Decreasing,
    NoTrend,
}

#[derive(Debug, Clone, Copy)]
pub struct MannKendall {
    pub s: i64,
    pub variance: f64,
    pub z: f64,
    pub p_value: f64,
    pub tau: f64,
    /// Median of pairwise slopes per index step.
    pub sen_slope: f64,
    pub trend: MkTrend,
}

/// Returns `None` for fewer than three points or non-finite input.
pub fn mann_kendall(data: &[f64], alpha: f64) -> Option<MannKendall> {
    let n = data.len();
    if n < 3 || data.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut s: i64 = 0;
    for i in 0..n - 1 {
        for j in (i + 1)..n {
            let diff = data[j] - data[i];
            if diff > 0.0 {
                s += 1;
            } else if diff < 0.0 {
                s -= 1;
            }
        }
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut tie_term = 0.0;
    let mut run = 1usize;
    for i in 1..=sorted.len() {
        if i < sorted.len() && sorted[i] == sorted[i - 1] {
            run += 1;
            continue;
        }
        if run > 1 {
            let t = run as f64;
            tie_term += t * (t - 1.0) * (2.0 * t + 5.0);
        }
        run = 1;
    }

    let nf = n as f64;
    let variance = ((nf * (nf - 1.0) * (2.0 * nf + 5.0) - tie_term) / 18.0).max(0.0);

    let z = if s == 0 || variance == 0.0 {
        0.0
    } else if s > 0 {
        (s as f64 - 1.0) / variance.sqrt()
    } else {
        (s as f64 + 1.0) / variance.sqrt()
    };

    let normal = Normal::new(0.0, 1.0).ok()?;
    let p_value = (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0);

    let trend = if p_value < alpha && z > 0.0 {
        MkTrend::Increasing
    } else if p_value < alpha && z < 0.0 {
        MkTrend::Decreasing
    } else {
        MkTrend::NoTrend
    };

    let tau = s as f64 / (0.5 * nf * (nf - 1.0));

    let mut slopes = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n - 1 {
        for j in (i + 1)..n {
            slopes.push((data[j] - data[i]) / (j - i) as f64);
        }
    }
    slopes.sort_by(|a, b| a.total_cmp(b));
    let sen_slope = crate::math::stats::median_sorted(&slopes);

    Some(MannKendall {
        s,
        variance,
        z,
        p_value,
        tau,
        sen_slope,
        trend,
    })
}
