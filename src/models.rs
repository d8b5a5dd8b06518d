use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    Rising,
    Stable,
    Declining,
    Peak,
    Seasonal,
}

impl TrendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendStatus::Rising => "rising",
            TrendStatus::Stable => "stable",
            TrendStatus::Declining => "declining",
            TrendStatus::Peak => "peak",
            TrendStatus::Seasonal => "seasonal",
        }
    }
}

impl FromStr for TrendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rising" => Ok(TrendStatus::Rising),
            "stable" => Ok(TrendStatus::Stable),
            "declining" => Ok(TrendStatus::Declining),
            "peak" => Ok(TrendStatus::Peak),
            "seasonal" => Ok(TrendStatus::Seasonal),
            other => Err(format!("unknown trend status: {other}")),
        }
    }
}

impl fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    CrossAppeal,
    TrendCombo,
    SeasonalCombo,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::CrossAppeal => "cross_appeal",
            RelationshipType::TrendCombo => "trend_combo",
            RelationshipType::SeasonalCombo => "seasonal_combo",
        }
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cross_appeal" => Ok(RelationshipType::CrossAppeal),
            "trend_combo" => Ok(RelationshipType::TrendCombo),
            "seasonal_combo" => Ok(RelationshipType::SeasonalCombo),
            other => Err(format!("unknown relationship type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RevenueTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueTier::Low => "low",
            RevenueTier::Medium => "medium",
            RevenueTier::High => "high",
            RevenueTier::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for RevenueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyword as stored, with `competition_index` already clamped to 0..=100.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordRecord {
    pub id: Uuid,
    pub keyword: String,
    pub search_volume: i64,
    pub competition_index: i32,
    pub category: String,
    pub trend_status: TrendStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub click_volume: i64,
    pub conversion_potential: i32,
    pub niche_saturation: i32,
    pub commercial_intent: i32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSnapshot {
    pub velocity_score: f64,
    pub seasonality_pattern: String,
    pub peak_month: Option<i32>,
    pub growth_7d: f64,
    pub growth_30d: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipEdge {
    pub keyword_id: Uuid,
    pub related_keyword_id: Uuid,
    pub correlation_strength: i32,
    pub relationship_type: RelationshipType,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedKeyword {
    pub keyword: String,
    pub edge: RelationshipEdge,
}

/// Read filter for candidate keywords. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    pub min_volume: Option<i64>,
    pub max_competition: Option<i32>,
    pub category: Option<String>,
    pub trend_status: Option<TrendStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpportunityScore {
    pub keyword: String,
    pub opportunity_score: i32,
    pub search_volume: i64,
    pub competition_index: i32,
    pub category: String,
    pub reason: String,
    pub potential_revenue_tier: RevenueTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingKeyword {
    pub keyword: String,
    pub search_volume: i64,
    pub competition_index: i32,
    pub category: String,
    pub velocity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitionSummary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub average: i32,
    pub median: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonalSummary {
    pub category: String,
    pub peaks: Vec<MonthCount>,
}
