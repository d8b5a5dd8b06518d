use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use sqlx::PgPool;

use crate::db;
use crate::models::TrendStatus;
use crate::scoring;

/// One line of a keyword CSV export. Metric and trend columns are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvRow {
    pub keyword: String,
    pub search_volume: i64,
    pub competition_index: i64,
    pub category: String,
    pub trend_status: String,
    pub click_volume: Option<i64>,
    pub conversion_potential: Option<i32>,
    pub niche_saturation: Option<i32>,
    pub commercial_intent: Option<i32>,
    pub velocity_score: Option<f64>,
    pub seasonality_pattern: Option<String>,
    pub peak_month: Option<i32>,
    pub growth_7d: Option<f64>,
    pub growth_30d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordInput {
    pub keyword: String,
    pub search_volume: i64,
    pub competition_index: i32,
    pub category: String,
    pub trend_status: TrendStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsInput {
    pub click_volume: i64,
    pub conversion_potential: i32,
    pub niche_saturation: i32,
    pub commercial_intent: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendInput {
    pub velocity_score: f64,
    pub seasonality_pattern: String,
    pub peak_month: Option<i32>,
    pub growth_7d: f64,
    pub growth_30d: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRow {
    pub keyword: KeywordInput,
    pub metrics: Option<MetricsInput>,
    pub trend: Option<TrendInput>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub keywords: usize,
    pub metrics: usize,
    pub trends: usize,
    pub skipped: usize,
}

pub fn normalize_keyword(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn normalize_category(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

fn clamp_percent(value: i32) -> i32 {
    value.clamp(0, 100)
}

pub fn sanitize_row(row: CsvRow) -> anyhow::Result<SanitizedRow> {
    let keyword = normalize_keyword(&row.keyword);
    anyhow::ensure!(!keyword.is_empty(), "keyword must be non-empty");

    let category = normalize_category(&row.category);
    anyhow::ensure!(!category.is_empty(), "category must be non-empty for '{keyword}'");

    let trend_status: TrendStatus = row
        .trend_status
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    // Sizes beyond i32 clamp to 100 anyway.
    let competition_index = row.competition_index.clamp(0, 100) as i32;

    let has_metrics = row.click_volume.is_some()
        || row.conversion_potential.is_some()
        || row.niche_saturation.is_some()
        || row.commercial_intent.is_some();
    let metrics = has_metrics.then(|| MetricsInput {
        click_volume: row.click_volume.unwrap_or(0).max(0),
        conversion_potential: clamp_percent(row.conversion_potential.unwrap_or(50)),
        niche_saturation: clamp_percent(row.niche_saturation.unwrap_or(50)),
        commercial_intent: clamp_percent(row.commercial_intent.unwrap_or(50)),
    });

    let has_trend = row.velocity_score.is_some()
        || row.growth_7d.is_some()
        || row.growth_30d.is_some()
        || row.peak_month.is_some();
    let trend = has_trend.then(|| {
        let growth_7d = row.growth_7d.unwrap_or(0.0);
        let growth_30d = row.growth_30d.unwrap_or(0.0);
        let velocity_score = row
            .velocity_score
            .unwrap_or_else(|| scoring::calculate_trend_velocity(growth_7d, growth_30d))
            .clamp(-100.0, 100.0);
        TrendInput {
            velocity_score,
            seasonality_pattern: row
                .seasonality_pattern
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            peak_month: row.peak_month.filter(|m| (1..=12).contains(m)),
            growth_7d,
            growth_30d,
        }
    });

    Ok(SanitizedRow {
        keyword: KeywordInput {
            keyword,
            search_volume: row.search_volume.max(0),
            competition_index,
            category,
            trend_status,
        },
        metrics,
        trend,
    })
}

pub fn read_rows(csv_path: &Path) -> anyhow::Result<Vec<CsvRow>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        rows.push(result.with_context(|| format!("malformed CSV record {}", line + 1))?);
    }
    Ok(rows)
}

pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<ImportSummary> {
    let rows = read_rows(csv_path)?;
    let mut summary = ImportSummary::default();
    let mut tx = pool.begin().await.context("begin transaction failed")?;

    for row in rows {
        let raw_keyword = row.keyword.clone();
        let sanitized = match sanitize_row(row) {
            Ok(sanitized) => sanitized,
            Err(err) => {
                tracing::warn!(keyword = %raw_keyword, error = %err, "skipping CSV row");
                summary.skipped += 1;
                continue;
            }
        };

        let keyword_id = db::upsert_keyword(&mut tx, &sanitized.keyword).await?;
        summary.keywords += 1;

        if let Some(metrics) = &sanitized.metrics {
            db::insert_metrics(&mut tx, keyword_id, metrics).await?;
            summary.metrics += 1;
        }
        if let Some(trend) = &sanitized.trend {
            db::insert_trend(&mut tx, keyword_id, trend).await?;
            summary.trends += 1;
        }
    }

    tx.commit().await.context("commit transaction failed")?;
    tracing::info!(
        keywords = summary.keywords,
        metrics = summary.metrics,
        trends = summary.trends,
        skipped = summary.skipped,
        "imported keyword CSV"
    );
    Ok(summary)
}
