use crate::domain::errors::PricingError;
use crate::domain::ml::FeatureVector;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

pub const DEFAULT_TRAINING_SAMPLES: usize = 10_000;

/// Standard deviation of the label noise
const NOISE_STD: f64 = 2.0;

/// Draws a synthetic training set whose label is a closed-form blend of the
/// features plus Gaussian noise:
///
/// `0.7 b + 0.3 b (demand / 1000) + 0.2 c - 0.05 b [hour > 20] + N(0, 2)`
///
/// Columns are drawn one after another so the set is reproducible per seed.
pub fn synthesize_training_set(n_samples: usize, seed: u64) -> (Vec<FeatureVector>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);

    let base_prices: Vec<f64> = (0..n_samples)
        .map(|_| rng.random_range(10.0..100.0))
        .collect();
    let demand: Vec<u32> = (0..n_samples).map(|_| rng.random_range(0..1000)).collect();
    let competition_prices: Vec<f64> = base_prices
        .iter()
        .map(|b| b * rng.random_range(0.8..1.2))
        .collect();
    let time_of_day: Vec<u8> = (0..n_samples).map(|_| rng.random_range(0..24)).collect();
    let day_of_week: Vec<u8> = (0..n_samples).map(|_| rng.random_range(0..7)).collect();
    let season: Vec<u8> = (0..n_samples).map(|_| rng.random_range(0..4)).collect();

    let mut features = Vec::with_capacity(n_samples);
    let mut targets = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let base = base_prices[i];
        let evening_discount = if time_of_day[i] > 20 { base * 0.05 } else { 0.0 };
        let noise: f64 = rng.sample::<f64, _>(StandardNormal) * NOISE_STD;

        targets.push(
            base * 0.7 + (demand[i] as f64 / 1000.0) * base * 0.3 + competition_prices[i] * 0.2
                - evening_discount
                + noise,
        );
        features.push(FeatureVector::new(
            base,
            demand[i],
            competition_prices[i],
            time_of_day[i],
            day_of_week[i],
            season[i],
        ));
    }

    (features, targets)
}

/// Shuffled hold-out split: `ceil(n * test_fraction)` rows go to the test side.
/// Returns `(train_indices, test_indices)`.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), PricingError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PricingError::InvalidInput {
            reason: format!("test fraction must be in (0, 1), got {}", test_fraction),
        });
    }

    let n_test = (n as f64 * test_fraction).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PricingError::training(format!(
            "need at least 2 samples to split, got {}",
            n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}
