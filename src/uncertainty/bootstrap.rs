//! Percentile bootstrap confidence intervals.
//!
//! Randomness is always injected: the caller passes any [`rand::Rng`], from
//! which we draw one base seed. Each iteration then runs on its own
//! `StdRng::seed_from_u64(mix(base, i))`, so iterations can be evaluated in
//! parallel (rayon) and the result depends only on the injected source, not on
//! thread scheduling.

use std::cmp::Ordering;

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::{BootstrapConfig, BootstrapStatistic, UncertaintyBounds, UncertaintyMethod};
use crate::stats::{mean, median, percentile_sorted};

/// Bootstrap CI for a single sample's statistic.
///
/// With fewer than 2 values no resampling happens: both bounds equal the point
/// value (`0` for empty input) and the method is `InsufficientData`.
pub fn bootstrap_ci<R: Rng + ?Sized>(values: &[f64], config: &BootstrapConfig, rng: &mut R) -> UncertaintyBounds {
    if values.len() < 2 || config.iterations == 0 {
        let point = statistic(values, config.statistic);
        return insufficient(point, config.confidence);
    }

    let base = rng.next_u64();
    let mut distribution: Vec<f64> = (0..config.iterations)
        .into_par_iter()
        .map_init(
            || Vec::with_capacity(values.len()),
            |buf, i| {
                let mut it_rng = StdRng::seed_from_u64(mix(base, i as u64));
                resample_into(values, &mut it_rng, buf);
                statistic(buf, config.statistic)
            },
        )
        .collect();

    percentile_bounds(&mut distribution, config.confidence)
}

/// Bootstrap CI for `mean(post) - mean(pre)`.
///
/// Both sides are resampled independently on each iteration. If either side has
/// fewer than 2 values the observed difference is returned as both bounds.
pub fn bootstrap_impact_uncertainty<R: Rng + ?Sized>(
    pre_values: &[f64],
    post_values: &[f64],
    config: &BootstrapConfig,
    rng: &mut R,
) -> UncertaintyBounds {
    if pre_values.len() < 2 || post_values.len() < 2 || config.iterations == 0 {
        return insufficient(mean(post_values) - mean(pre_values), config.confidence);
    }

    let base = rng.next_u64();
    let mut distribution: Vec<f64> = (0..config.iterations)
        .into_par_iter()
        .map_init(
            || (Vec::with_capacity(pre_values.len()), Vec::with_capacity(post_values.len())),
            |(pre_buf, post_buf), i| {
                let mut it_rng = StdRng::seed_from_u64(mix(base, i as u64));
                resample_into(pre_values, &mut it_rng, pre_buf);
                resample_into(post_values, &mut it_rng, post_buf);
                mean(post_buf) - mean(pre_buf)
            },
        )
        .collect();

    percentile_bounds(&mut distribution, config.confidence)
}

fn statistic(values: &[f64], kind: BootstrapStatistic) -> f64 {
    match kind {
        BootstrapStatistic::Mean => mean(values),
        BootstrapStatistic::Median => median(values),
    }
}

/// Draw `values.len()` items with replacement into `out`.
fn resample_into<R: Rng + ?Sized>(values: &[f64], rng: &mut R, out: &mut Vec<f64>) {
    out.clear();
    let n = values.len();
    out.extend((0..n).map(|_| values[rng.gen_range(0..n)]));
}

fn percentile_bounds(distribution: &mut [f64], confidence: f64) -> UncertaintyBounds {
    distribution.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let confidence = confidence.clamp(0.0, 1.0);
    let alpha = 1.0 - confidence;
    UncertaintyBounds {
        lower: percentile_sorted(distribution, alpha / 2.0 * 100.0),
        upper: percentile_sorted(distribution, (1.0 - alpha / 2.0) * 100.0),
        method: UncertaintyMethod::BootstrapPercentile,
        confidence,
    }
}

fn insufficient(point: f64, confidence: f64) -> UncertaintyBounds {
    UncertaintyBounds {
        lower: point,
        upper: point,
        method: UncertaintyMethod::InsufficientData,
        confidence,
    }
}

/// SplitMix64 finalizer over `base + index`, giving well-spread per-iteration seeds.
fn mix(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_distr::Normal;

    fn config(iterations: usize) -> BootstrapConfig {
        BootstrapConfig {
            iterations,
            ..BootstrapConfig::default()
        }
    }

    #[test]
    fn single_value_is_insufficient() {
        let mut rng = StdRng::seed_from_u64(1);
        let b = bootstrap_ci(&[42.0], &config(500), &mut rng);
        assert_eq!(b.method, UncertaintyMethod::InsufficientData);
        assert_eq!((b.lower, b.upper), (42.0, 42.0));

        let b = bootstrap_ci(&[], &config(500), &mut rng);
        assert_eq!((b.lower, b.upper), (0.0, 0.0));
    }

    #[test]
    fn same_seed_same_bounds() {
        let values = [3.0, 5.0, 4.0, 8.0, 6.0, 7.0, 2.0, 5.5];
        let a = bootstrap_ci(&values, &config(800), &mut StdRng::seed_from_u64(7));
        let b = bootstrap_ci(&values, &config(800), &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        let c = bootstrap_ci(&values, &config(800), &mut StdRng::seed_from_u64(8));
        assert_ne!(a, c);
    }

    #[test]
    fn bounds_are_ordered_and_within_sample_range() {
        let values = [3.0, 5.0, 4.0, 8.0, 6.0, 7.0, 2.0, 5.5];
        let b = bootstrap_ci(&values, &config(1000), &mut StdRng::seed_from_u64(11));
        assert_eq!(b.method, UncertaintyMethod::BootstrapPercentile);
        assert!(b.lower <= b.upper);
        assert!(b.lower >= 2.0 && b.upper <= 8.0);
        assert!(b.contains(mean(&values)));
    }

    #[test]
    fn median_statistic_is_supported() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        let cfg = BootstrapConfig {
            iterations: 1000,
            confidence: 0.9,
            statistic: BootstrapStatistic::Median,
        };
        let b = bootstrap_ci(&values, &cfg, &mut StdRng::seed_from_u64(5));
        assert!(b.upper <= 100.0);
        // The median of a resample of 5 is never the maximum unless 3+ draws hit it.
        assert!(b.lower >= 1.0 && b.lower <= 3.0);
        assert_eq!(b.confidence, 0.9);
    }

    #[test]
    fn mean_ci_covers_sample_mean_across_seeds() {
        let normal = Normal::new(50.0, 10.0).unwrap();
        let mut covered = 0;
        let runs = 40;
        for seed in 0..runs {
            let mut data_rng = StdRng::seed_from_u64(1000 + seed);
            let values: Vec<f64> = (0..40).map(|_| normal.sample(&mut data_rng)).collect();
            let b = bootstrap_ci(&values, &config(1000), &mut StdRng::seed_from_u64(seed));
            if b.contains(mean(&values)) {
                covered += 1;
            }
        }
        assert!(covered >= runs - 1, "covered {covered}/{runs}");
    }

    #[test]
    fn impact_interval_brackets_shift() {
        let pre = [100.0, 102.0, 98.0, 101.0, 99.0, 100.5];
        let post = [110.0, 112.0, 108.0, 111.0, 109.0, 110.5];
        let b = bootstrap_impact_uncertainty(&pre, &post, &config(1000), &mut StdRng::seed_from_u64(3));
        assert!(b.lower > 5.0 && b.upper < 15.0, "{b:?}");
        assert!(b.contains(10.0));
    }

    #[test]
    fn impact_with_short_side_is_insufficient() {
        let b = bootstrap_impact_uncertainty(&[100.0], &[110.0, 120.0], &config(100), &mut StdRng::seed_from_u64(3));
        assert_eq!(b.method, UncertaintyMethod::InsufficientData);
        assert_eq!(b.lower, 15.0);
    }
}
