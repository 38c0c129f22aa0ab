use serde::Serialize;

use crate::simulation::InsurerProfits;
use crate::types::Triple;

/// Distribution summary of one profit sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitSummary {
    pub n: usize,
    pub mean: f64,
    /// Sample variance (n − 1 denominator); 0 for a single draw.
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
}

impl ProfitSummary {
    /// `None` for an empty sequence.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = sorted.len();

        let interp = |p: f64| -> f64 {
            let h = p * (n - 1) as f64;
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = h - lo as f64;
            sorted[lo] * (1.0 - frac) + sorted[hi] * frac
        };

        let mean = mean(&sorted);
        let variance = if n > 1 {
            sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        Some(ProfitSummary {
            n,
            mean,
            variance,
            std_dev: variance.sqrt(),
            min: sorted[0],
            p5: interp(0.05),
            p50: interp(0.50),
            p95: interp(0.95),
            max: sorted[n - 1],
        })
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Reduce each insurer's profit sequence to its mean.
pub fn mean_profits(profits: &InsurerProfits) -> Triple<f64> {
    profits.each_ref().map(|seq| mean(seq))
}

/// Full summaries per insurer. `None` if any sequence is empty.
pub fn summarize(profits: &InsurerProfits) -> Option<Triple<ProfitSummary>> {
    Some(Triple::new(
        ProfitSummary::from_samples(&profits.a)?,
        ProfitSummary::from_samples(&profits.b)?,
        ProfitSummary::from_samples(&profits.c)?,
    ))
}
