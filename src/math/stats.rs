//! Robust statistical primitives.
//!
//! Note: Functions taking `&mut [f64]` may reorder the input slice.

pub fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sort_values(values);
    median_sorted(values)
}

pub fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        let a = sorted[n / 2 - 1];
        let b = sorted[n / 2];
        (a + b) / 2.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Fewer than two values give 0.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Nearest-rank quantile over an ascending slice: the element at
/// `round(p * (n - 1))`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    let pos = (p * (n - 1) as f64).round() as usize;
    sorted[pos.min(n - 1)]
}

/// Round half up (towards +inf on ties) to `places` decimals.
///
/// Scaled values within 1e-9 of a half are treated as ties so that inputs such
/// as 2.675 round to 2.68 despite their binary representation.
pub fn round_half_up(x: f64, places: u32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = x * factor;
    let floor = scaled.floor();
    let frac = scaled - floor;
    let rounded = if frac + 1e-9 >= 0.5 { floor + 1.0 } else { floor };
    rounded / factor
}

/// Ordinary least squares fit `y = intercept + slope * x`.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((my - slope * mx, slope))
}
