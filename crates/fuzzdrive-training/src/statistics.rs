//! Per-generation population statistics.

use fuzzdrive_controller::FuzzyController;
use serde::{Deserialize, Serialize};

/// Summary of the fitness values of one generation. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessStats {
    pub best: f32,
    pub worst: f32,
    pub mean: f32,
    pub std_dev: f32,
}

impl FitnessStats {
    /// Returns `None` for an empty input.
    ///
    /// Sums are accumulated in `f64`, so populations holding many rejected chromosomes
    /// (fitness `f32::MAX`) still produce finite statistics.
    #[must_use]
    #[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let best = values.iter().copied().min_by(f32::total_cmp)?;
        let worst = values.iter().copied().max_by(f32::total_cmp)?;
        let n = values.len() as f64;
        let mean = values.iter().map(|v| f64::from(*v)).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|v| (f64::from(*v) - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(Self {
            best,
            worst,
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
        })
    }
}

/// Mean over all entries of the per-entry standard deviation across `controllers`.
///
/// 0 when every controller is identical; grows as the population spreads out.
#[must_use]
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn parameter_diversity<'a, I>(controllers: I) -> f32
where
    I: IntoIterator<Item = &'a FuzzyController>,
{
    let mut sum = vec![0.0_f64; FuzzyController::LEN];
    let mut sum_sq = vec![0.0_f64; FuzzyController::LEN];
    let mut count = 0_usize;
    for controller in controllers {
        for ((s, sq), gene) in sum.iter_mut().zip(&mut sum_sq).zip(controller.genes()) {
            let g = f64::from(*gene);
            *s += g;
            *sq += g * g;
        }
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let total = sum
        .iter()
        .zip(&sum_sq)
        .map(|(s, sq)| {
            let mean = s / n;
            (sq / n - mean * mean).max(0.0).sqrt()
        })
        .sum::<f64>();
    (total / FuzzyController::LEN as f64) as f32
}
