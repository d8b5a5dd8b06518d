//! Opportunity scoring for a single keyword.
//!
//! Everything here is pure arithmetic over already-recorded snapshots. Missing
//! metrics or trend data are substituted with neutral defaults in exactly one
//! place ([`effective_inputs`]) before any term is computed.

use crate::models::{
    KeywordRecord, MetricsSnapshot, OpportunityScore, RevenueTier, TrendSnapshot, TrendStatus,
};

/// Historical normalization constant, do not re-derive from the weights.
pub const SCORE_NORMALIZER: f64 = 1.7;

pub const DEFAULT_NICHE_SATURATION: f64 = 50.0;
pub const DEFAULT_VELOCITY: f64 = 0.0;
pub const DEFAULT_CONVERSION_POTENTIAL: f64 = 50.0;

const VOLUME_WEIGHT: f64 = 0.2;
const COMPETITION_WEIGHT: f64 = 0.4;
const TREND_WEIGHT: f64 = 0.3;
const SATURATION_WEIGHT: f64 = 0.2;

const FALLBACK_REASON: &str = "Moderate opportunity";

/// Saturation and velocity after default substitution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveInputs {
    pub niche_saturation: f64,
    pub velocity_score: f64,
}

pub fn effective_inputs(
    metrics: Option<&MetricsSnapshot>,
    trend: Option<&TrendSnapshot>,
) -> EffectiveInputs {
    EffectiveInputs {
        niche_saturation: metrics
            .map(|m| m.niche_saturation as f64)
            .unwrap_or(DEFAULT_NICHE_SATURATION),
        velocity_score: trend
            .map(|t| t.velocity_score)
            .unwrap_or(DEFAULT_VELOCITY),
    }
}

pub fn calculate_opportunity_score(
    keyword: &KeywordRecord,
    metrics: Option<&MetricsSnapshot>,
    trend: Option<&TrendSnapshot>,
) -> OpportunityScore {
    let inputs = effective_inputs(metrics, trend);

    let volume_score = (keyword.search_volume as f64 / 100.0).min(100.0);
    let competition_score = (100.0 - keyword.competition_index as f64) * COMPETITION_WEIGHT;
    // Falling trends contribute nothing rather than a penalty.
    let trend_score = inputs.velocity_score.max(0.0) * TREND_WEIGHT;
    let saturation_score = (100.0 - inputs.niche_saturation) * SATURATION_WEIGHT;

    let raw = (volume_score * VOLUME_WEIGHT + competition_score + trend_score + saturation_score)
        / SCORE_NORMALIZER;
    let opportunity_score = (raw.round() as i32).clamp(0, 100);

    OpportunityScore {
        keyword: keyword.keyword.clone(),
        opportunity_score,
        search_volume: keyword.search_volume,
        competition_index: keyword.competition_index,
        category: keyword.category.clone(),
        reason: build_reason(keyword, metrics, trend),
        potential_revenue_tier: revenue_tier(
            opportunity_score,
            keyword.search_volume,
            keyword.competition_index,
        ),
    }
}

/// First matching tier wins; every comparison is strict.
pub fn revenue_tier(score: i32, search_volume: i64, competition_index: i32) -> RevenueTier {
    if score > 80 && search_volume > 1000 && competition_index < 30 {
        RevenueTier::VeryHigh
    } else if score > 70 && search_volume > 500 {
        RevenueTier::High
    } else if score > 50 {
        RevenueTier::Medium
    } else {
        RevenueTier::Low
    }
}

pub fn build_reason(
    keyword: &KeywordRecord,
    metrics: Option<&MetricsSnapshot>,
    trend: Option<&TrendSnapshot>,
) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if keyword.search_volume > 500 {
        reasons.push(format!(
            "High search volume ({} searches)",
            keyword.search_volume
        ));
    }

    if keyword.competition_index < 40 {
        reasons.push("Low competition".to_string());
    } else if keyword.competition_index > 70 {
        reasons.push("High competition market".to_string());
    }

    if let Some(trend) = trend {
        if trend.velocity_score > 50.0 {
            reasons.push("Rapidly rising trend".to_string());
        } else if trend.velocity_score > 20.0 {
            reasons.push("Growing trend".to_string());
        }
    }

    match keyword.trend_status {
        TrendStatus::Peak => reasons.push("Currently at peak popularity".to_string()),
        TrendStatus::Rising => reasons.push("Trending upward".to_string()),
        _ => {}
    }

    if let Some(metrics) = metrics {
        if metrics.commercial_intent > 70 {
            reasons.push("High buyer intent".to_string());
        }
    }

    if reasons.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        format!("{}.", reasons.join(". "))
    }
}

/// General SEO score, not clamped to 0..=100.
pub fn calculate_seo_score(keyword: &KeywordRecord, metrics: Option<&MetricsSnapshot>) -> i32 {
    let volume_part = (keyword.search_volume as f64 / 20.0).min(50.0);
    let competition_part = (100.0 - keyword.competition_index as f64) * 0.3;
    let conversion = metrics
        .map(|m| m.conversion_potential as f64)
        .unwrap_or(DEFAULT_CONVERSION_POTENTIAL);

    (volume_part + competition_part + conversion * 0.2).round() as i32
}

/// Acceleration of a trend from its short and long growth windows.
///
/// Only the accelerating branch is capped at 100 and only the decelerating
/// branch is floored at -100.
pub fn calculate_trend_velocity(growth_7d: f64, growth_30d: f64) -> f64 {
    let delta = (growth_7d - growth_30d) * 2.0;
    if growth_7d > growth_30d {
        delta.min(100.0)
    } else {
        delta.max(-100.0)
    }
}
