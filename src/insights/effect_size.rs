//! Standardized pre/post effect size (Cohen's d with pooled sample SD).

use serde::{Deserialize, Serialize};

use crate::insights::InsightStatus;
use crate::stats::{mean, sample_variance};

pub const MIN_EFFECT_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl EffectMagnitude {
    /// Band `|d|` at 0.2 / 0.5 / 0.8 / 1.2.
    pub fn from_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            Self::Negligible
        } else if d < 0.5 {
            Self::Small
        } else if d < 0.8 {
            Self::Medium
        } else if d < 1.2 {
            Self::Large
        } else {
            Self::VeryLarge
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::VeryLarge => "very large",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub status: InsightStatus,
    pub cohens_d: f64,
    pub magnitude: EffectMagnitude,
    /// Heuristic in `[0, 0.95]` growing with sample size.
    pub confidence: f64,
    pub n_pre: usize,
    pub n_post: usize,
    pub interpretation: String,
}

pub fn effect_size(pre: &[f64], post: &[f64]) -> EffectSize {
    let (n_pre, n_post) = (pre.len(), post.len());
    let degraded = |interpretation: String| EffectSize {
        status: InsightStatus::InsufficientData,
        cohens_d: 0.0,
        magnitude: EffectMagnitude::Negligible,
        confidence: 0.0,
        n_pre,
        n_post,
        interpretation,
    };

    if n_pre < MIN_EFFECT_OBSERVATIONS || n_post < MIN_EFFECT_OBSERVATIONS {
        return degraded(format!(
            "Insufficient data: effect size needs at least {MIN_EFFECT_OBSERVATIONS} observations per period (pre={n_pre}, post={n_post})."
        ));
    }

    let pooled_var = ((n_pre - 1) as f64 * sample_variance(pre) + (n_post - 1) as f64 * sample_variance(post))
        / (n_pre + n_post - 2) as f64;
    let pooled_sd = pooled_var.sqrt();
    if !pooled_sd.is_finite() || pooled_sd == 0.0 {
        return degraded("Insufficient data: no within-period variability, effect size is undefined.".to_string());
    }

    let d = (mean(post) - mean(pre)) / pooled_sd;
    let magnitude = EffectMagnitude::from_d(d);
    let confidence = ((n_pre + n_post) as f64 / 20.0).min(0.95);
    let direction = if d >= 0.0 { "increase" } else { "decrease" };

    EffectSize {
        status: InsightStatus::Ok,
        cohens_d: d,
        magnitude,
        confidence,
        n_pre,
        n_post,
        interpretation: format!(
            "{} {direction} after the split (d = {d:.2}, confidence {:.0}%).",
            capitalize(magnitude.label()),
            confidence * 100.0
        ),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
