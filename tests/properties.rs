use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use boundary_impact::domain::{
    BootstrapConfig, HarmonizationMethod, HarmonizedPoint, MetricKind, MetricValues, ReconstructionMethod, YearData,
};
use boundary_impact::harmonize::{merge_series, reconstruct_parent_from_children, validate_coverage_ratios};
use boundary_impact::stats::percentile;
use boundary_impact::uncertainty::bootstrap_ci;

fn point(year: i32, value: f64) -> HarmonizedPoint {
    HarmonizedPoint {
        year,
        value,
        method: HarmonizationMethod::Raw,
        contributing_regions: Vec::new(),
        participation: 1.0,
    }
}

fn one_year(children: &[(f64, f64)]) -> (YearData, Vec<String>) {
    let ids: Vec<String> = (0..children.len()).map(|i| format!("C{i}")).collect();
    let mut data = YearData::new();
    let row = data.entry(2015).or_default();
    for (id, &(area, y)) in ids.iter().zip(children) {
        row.insert(
            id.clone(),
            MetricValues {
                area: Some(area),
                production: Some(area * y),
                yield_: Some(y),
            },
        );
    }
    (data, ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn coverage_valid_iff_sum_within_tolerance(
        ratios in prop::collection::vec(0.0f64..1.0, 1..6),
        tolerance in 0.0f64..0.2,
    ) {
        let map: BTreeMap<String, f64> = ratios.iter().enumerate().map(|(i, r)| (format!("C{i}"), *r)).collect();
        let sum: f64 = map.values().sum();
        prop_assert_eq!(validate_coverage_ratios(&map, tolerance), (sum - 1.0).abs() <= tolerance);
    }

    #[test]
    fn merged_years_are_strictly_increasing_and_respect_cutoff(
        pre in prop::collection::vec(1990i32..2030, 0..20),
        post in prop::collection::vec(1990i32..2030, 0..20),
        split_year in 1995i32..2025,
    ) {
        let pre: Vec<HarmonizedPoint> = pre.into_iter().map(|y| point(y, 1.0)).collect();
        let post: Vec<HarmonizedPoint> = post.into_iter().map(|y| point(y, 2.0)).collect();
        let merged = merge_series(&pre, &post, split_year);

        prop_assert!(merged.windows(2).all(|w| w[0].year < w[1].year));
        for p in &merged {
            if p.year < split_year {
                prop_assert_eq!(p.value, 1.0);
            } else {
                prop_assert_eq!(p.value, 2.0);
            }
        }
    }

    #[test]
    fn extensive_reconstruction_is_the_sum(
        children in prop::collection::vec((1.0f64..1000.0, 100.0f64..5000.0), 1..6),
    ) {
        let (data, ids) = one_year(&children);
        let points = reconstruct_parent_from_children(&data, &ids, MetricKind::Production, None, ReconstructionMethod::AreaWeighted);
        let expected: f64 = children.iter().map(|(a, y)| a * y).sum();
        prop_assert_eq!(points.len(), 1);
        prop_assert_eq!(points[0].method, HarmonizationMethod::Sum);
        prop_assert!((points[0].value - expected).abs() <= 1e-9 * expected);
    }

    #[test]
    fn weighted_yield_stays_within_child_range(
        children in prop::collection::vec((1.0f64..1000.0, 100.0f64..5000.0), 1..6),
    ) {
        let (data, ids) = one_year(&children);
        let points = reconstruct_parent_from_children(&data, &ids, MetricKind::Yield, None, ReconstructionMethod::AreaWeighted);
        let lo = children.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let hi = children.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(points.len(), 1);
        prop_assert_eq!(points[0].method, HarmonizationMethod::AreaWeighted);
        prop_assert!(points[0].value >= lo - 1e-9 && points[0].value <= hi + 1e-9);
    }

    #[test]
    fn bootstrap_is_seed_deterministic_and_ordered(
        values in prop::collection::vec(-100.0f64..100.0, 2..30),
        seed in any::<u64>(),
    ) {
        let config = BootstrapConfig { iterations: 200, ..BootstrapConfig::default() };
        let a = bootstrap_ci(&values, &config, &mut StdRng::seed_from_u64(seed));
        let b = bootstrap_ci(&values, &config, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(a, b);
        prop_assert!(a.lower <= a.upper);
    }

    #[test]
    fn percentile_is_monotone_in_p(
        values in prop::collection::vec(-1e6f64..1e6, 1..40),
        p in 0.0f64..100.0,
        q in 0.0f64..100.0,
    ) {
        let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
        let (a, b) = (percentile(&values, lo), percentile(&values, hi));
        prop_assert!(a <= b + 1e-9 * b.abs().max(1.0), "p{}={} > p{}={}", lo, a, hi, b);
    }
}
