// src/stats.rs
//! Descriptive statistics for numeric columns (count, mean, std, quartiles).

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); undefined below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

pub fn describe(values: &[f64]) -> ColumnSummary {
    let count = values.len();
    if count == 0 {
        return ColumnSummary {
            count,
            mean: None,
            std: None,
            min: None,
            p25: None,
            p50: None,
            p75: None,
            max: None,
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = count as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let std = (count > 1).then(|| {
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    });

    ColumnSummary {
        count,
        mean: Some(mean),
        std,
        min: sorted.first().copied(),
        p25: Some(quantile(&sorted, 0.25)),
        p50: Some(quantile(&sorted, 0.50)),
        p75: Some(quantile(&sorted, 0.75)),
        max: sorted.last().copied(),
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
