//! Synthetic split scenarios for the `demo` command and tests.
//!
//! A parent region reports area/production/yield up to the event year, then
//! splits into children that each carry a random share of the area and a
//! random yield multiplier. Yield follows a linear trend with multiplicative
//! Gaussian noise; production is always `area × yield`.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{EventKind, LineageEvent, MetricKind, RawObservation, Region};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioParams {
    pub parent_id: String,
    pub children: usize,
    pub event_year: i32,
    pub pre_years: usize,
    pub post_years: usize,
    /// Parent area (e.g. thousand hectares).
    pub base_area: f64,
    /// Yield level at the first observed year.
    pub base_yield: f64,
    /// Yield change per year.
    pub yield_trend: f64,
    /// Relative noise standard deviation (0.03 = 3%).
    pub noise: f64,
    pub seed: u64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            parent_id: "Synthetic".to_string(),
            children: 3,
            event_year: 2012,
            pre_years: 5,
            post_years: 5,
            base_area: 300.0,
            base_yield: 1200.0,
            yield_trend: 15.0,
            noise: 0.03,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    pub observations: Vec<RawObservation>,
    pub event: LineageEvent,
    pub regions: Vec<Region>,
    /// Yield multiplier applied to each child.
    pub child_multipliers: BTreeMap<String, f64>,
}

pub fn generate_split_scenario(params: &ScenarioParams) -> Result<SyntheticScenario, AppError> {
    validate_params(params)?;

    let mut rng = StdRng::seed_from_u64(scenario_seed(params));
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let child_ids: Vec<String> = (0..params.children)
        .map(|i| format!("{}-{}", params.parent_id, child_suffix(i)))
        .collect();

    let raw_shares: Vec<f64> = (0..params.children).map(|_| rng.gen_range(0.5..1.5)).collect();
    let total: f64 = raw_shares.iter().sum();
    let shares: BTreeMap<String, f64> = child_ids
        .iter()
        .zip(&raw_shares)
        .map(|(id, s)| (id.clone(), s / total))
        .collect();

    let child_multipliers: BTreeMap<String, f64> = child_ids
        .iter()
        .map(|id| {
            let z: f64 = normal.sample(&mut rng);
            (id.clone(), (1.0 + 0.1 * z).clamp(0.6, 1.4))
        })
        .collect();

    let first_year = params.event_year - params.pre_years as i32;
    let mut observations = Vec::with_capacity(3 * (params.pre_years + params.post_years * params.children));

    for year in first_year..params.event_year {
        let trend_yield = trend_level(params, year - first_year);
        let area = noisy(params.base_area, params.noise, &normal, &mut rng);
        let yield_ = noisy(trend_yield, params.noise, &normal, &mut rng);
        push_region_year(&mut observations, &params.parent_id, year, area, yield_);
    }

    for year in params.event_year..params.event_year + params.post_years as i32 {
        let trend_yield = trend_level(params, year - first_year);
        for id in &child_ids {
            let area = noisy(params.base_area * shares[id], params.noise, &normal, &mut rng);
            let yield_ = noisy(trend_yield * child_multipliers[id], params.noise, &normal, &mut rng);
            push_region_year(&mut observations, id, year, area, yield_);
        }
    }

    let mut regions = vec![Region {
        id: params.parent_id.clone(),
        name: params.parent_id.clone(),
        state: None,
        created_year: first_year,
        abolished_year: Some(params.event_year),
    }];
    regions.extend(child_ids.iter().map(|id| Region {
        id: id.clone(),
        name: id.clone(),
        state: None,
        created_year: params.event_year,
        abolished_year: None,
    }));

    tracing::debug!(
        parent = %params.parent_id,
        children = params.children,
        observations = observations.len(),
        "generated synthetic split scenario"
    );

    Ok(SyntheticScenario {
        observations,
        event: LineageEvent {
            parent_id: params.parent_id.clone(),
            child_ids,
            event_year: params.event_year,
            kind: EventKind::Split,
            coverage_ratios: Some(shares),
        },
        regions,
        child_multipliers,
    })
}

fn validate_params(params: &ScenarioParams) -> Result<(), AppError> {
    if params.children < 2 {
        return Err(AppError::invalid_input("A split scenario needs at least 2 children."));
    }
    if params.pre_years == 0 || params.post_years == 0 {
        return Err(AppError::invalid_input("A split scenario needs at least one year on each side."));
    }
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(params.base_area) || !positive(params.base_yield) {
        return Err(AppError::invalid_input("Base area and yield must be positive."));
    }
    if !params.yield_trend.is_finite() || !(params.noise.is_finite() && params.noise >= 0.0) {
        return Err(AppError::invalid_input("Invalid trend or noise settings."));
    }
    Ok(())
}

fn trend_level(params: &ScenarioParams, step: i32) -> f64 {
    (params.base_yield + params.yield_trend * f64::from(step)).max(1.0)
}

fn noisy(level: f64, noise: f64, normal: &Normal<f64>, rng: &mut StdRng) -> f64 {
    let z: f64 = normal.sample(rng);
    (level * (1.0 + noise * z)).max(level * 0.05)
}

fn push_region_year(out: &mut Vec<RawObservation>, region_id: &str, year: i32, area: f64, yield_: f64) {
    for (metric, value) in [
        (MetricKind::Area, area),
        (MetricKind::Production, area * yield_),
        (MetricKind::Yield, yield_),
    ] {
        out.push(RawObservation {
            region_id: region_id.to_string(),
            year,
            metric,
            value,
        });
    }
}

fn child_suffix(i: usize) -> String {
    if i < 26 {
        char::from(b'A' + i as u8).to_string()
    } else {
        format!("{}", i + 1)
    }
}

fn scenario_seed(params: &ScenarioParams) -> u64 {
    let mut hasher = DefaultHasher::new();
    params.parent_id.hash(&mut hasher);
    params.children.hash(&mut hasher);
    params.event_year.hash(&mut hasher);
    params.pre_years.hash(&mut hasher);
    params.post_years.hash(&mut hasher);
    params.base_area.to_bits().hash(&mut hasher);
    params.base_yield.to_bits().hash(&mut hasher);
    params.yield_trend.to_bits().hash(&mut hasher);
    params.noise.to_bits().hash(&mut hasher);
    params.seed.hash(&mut hasher);
    hasher.finish()
}
