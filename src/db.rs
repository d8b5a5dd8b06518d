use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::import::{KeywordInput, MetricsInput, TrendInput};
use crate::models::{
    KeywordFilter, KeywordRecord, MetricsSnapshot, RelatedKeyword, RelationshipEdge,
    RelationshipType, TrendSnapshot, TrendStatus,
};
use crate::repository::KeywordRepository;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

pub async fn upsert_keyword(conn: &mut PgConnection, input: &KeywordInput) -> anyhow::Result<Uuid> {
    sqlx::query(
        "INSERT INTO keyword_opportunity.categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
    )
    .bind(&input.category)
    .execute(&mut *conn)
    .await
    .context("upsert category failed")?;

    let keyword_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO keyword_opportunity.keywords
        (id, keyword, search_volume, competition_index, category, trend_status)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (keyword) DO UPDATE
        SET search_volume = EXCLUDED.search_volume,
            competition_index = EXCLUDED.competition_index,
            category = EXCLUDED.category,
            trend_status = EXCLUDED.trend_status,
            updated_at = now()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&input.keyword)
    .bind(input.search_volume)
    .bind(input.competition_index)
    .bind(&input.category)
    .bind(input.trend_status.as_str())
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("upsert keyword '{}' failed", input.keyword))?;

    Ok(keyword_id)
}

pub async fn insert_metrics(
    conn: &mut PgConnection,
    keyword_id: Uuid,
    metrics: &MetricsInput,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO keyword_opportunity.keyword_metrics
        (id, keyword_id, click_volume, conversion_potential, niche_saturation, commercial_intent)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(keyword_id)
    .bind(metrics.click_volume)
    .bind(metrics.conversion_potential)
    .bind(metrics.niche_saturation)
    .bind(metrics.commercial_intent)
    .execute(&mut *conn)
    .await
    .context("insert keyword_metrics failed")?;
    Ok(())
}

pub async fn insert_trend(
    conn: &mut PgConnection,
    keyword_id: Uuid,
    trend: &TrendInput,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO keyword_opportunity.keyword_trends
        (id, keyword_id, velocity_score, seasonality_pattern, peak_month, growth_7d, growth_30d)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(keyword_id)
    .bind(trend.velocity_score)
    .bind(&trend.seasonality_pattern)
    .bind(trend.peak_month)
    .bind(trend.growth_7d)
    .bind(trend.growth_30d)
    .execute(&mut *conn)
    .await
    .context("insert keyword_trends failed")?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let keywords = vec![
        ("linen tote bag", 4200, 22, "bags", TrendStatus::Rising, 35, 70, 3.0, 6),
        ("canvas backpack", 9800, 61, "bags", TrendStatus::Stable, 55, 60, -1.5, 9),
        ("mini crossbody bag", 2600, 38, "bags", TrendStatus::Peak, 40, 82, 12.0, 5),
        ("beach tote", 1900, 27, "bags", TrendStatus::Seasonal, 30, 64, 25.0, 6),
        ("wool socks", 7400, 74, "apparel", TrendStatus::Seasonal, 68, 55, 8.0, 12),
        ("rain poncho", 850, 18, "apparel", TrendStatus::Rising, 20, 76, 31.0, 4),
        ("linen shirt", 5100, 45, "apparel", TrendStatus::Declining, 62, 58, -20.0, 7),
    ];

    let mut tx = pool.begin().await.context("begin transaction failed")?;
    let mut ids = std::collections::HashMap::new();

    for (
        keyword,
        search_volume,
        competition_index,
        category,
        trend_status,
        niche_saturation,
        commercial_intent,
        growth_7d,
        peak_month,
    ) in keywords
    {
        let id = upsert_keyword(
            &mut tx,
            &KeywordInput {
                keyword: keyword.to_string(),
                search_volume,
                competition_index,
                category: category.to_string(),
                trend_status,
            },
        )
        .await?;

        insert_metrics(
            &mut tx,
            id,
            &MetricsInput {
                click_volume: search_volume / 3,
                conversion_potential: 60,
                niche_saturation,
                commercial_intent,
            },
        )
        .await?;

        let growth_30d = 4.0;
        insert_trend(
            &mut tx,
            id,
            &TrendInput {
                velocity_score: crate::scoring::calculate_trend_velocity(growth_7d, growth_30d),
                seasonality_pattern: String::new(),
                peak_month: Some(peak_month),
                growth_7d,
                growth_30d,
            },
        )
        .await?;

        ids.insert(keyword, id);
    }

    let relationships = vec![
        ("linen tote bag", "beach tote", 78, RelationshipType::SeasonalCombo),
        ("linen tote bag", "linen shirt", 64, RelationshipType::CrossAppeal),
        ("rain poncho", "canvas backpack", 52, RelationshipType::TrendCombo),
    ];

    for (from, to, strength, relationship_type) in relationships {
        let (Some(&keyword_id), Some(&related_id)) = (ids.get(from), ids.get(to)) else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO keyword_opportunity.keyword_relationships
            (keyword_id, related_keyword_id, correlation_strength, relationship_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (keyword_id, related_keyword_id) DO UPDATE
            SET correlation_strength = EXCLUDED.correlation_strength,
                relationship_type = EXCLUDED.relationship_type
            "#,
        )
        .bind(keyword_id)
        .bind(related_id)
        .bind(strength)
        .bind(relationship_type.as_str())
        .execute(&mut *tx)
        .await
        .context("insert keyword_relationships failed")?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(())
}

/// Postgres-backed [`KeywordRepository`].
#[derive(Debug, Clone)]
pub struct PgKeywordRepository {
    pool: PgPool,
}

impl PgKeywordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Outgoing relationship edges of a keyword, strongest first.
    pub async fn related_keywords(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<RelatedKeyword>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT r.keyword_id, r.related_keyword_id, r.correlation_strength,
                   r.relationship_type, related.keyword
            FROM keyword_opportunity.keyword_relationships r
            JOIN keyword_opportunity.keywords source ON source.id = r.keyword_id
            JOIN keyword_opportunity.keywords related ON related.id = r.related_keyword_id
            WHERE source.keyword = $1
            ORDER BY r.correlation_strength DESC
            LIMIT $2
            "#,
        )
        .bind(keyword)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<RelatedKeyword, RepositoryError> {
                let relationship_type: String = row.try_get("relationship_type")?;
                Ok(RelatedKeyword {
                    keyword: row.try_get("keyword")?,
                    edge: RelationshipEdge {
                        keyword_id: row.try_get("keyword_id")?,
                        related_keyword_id: row.try_get("related_keyword_id")?,
                        correlation_strength: row.try_get("correlation_strength")?,
                        relationship_type: relationship_type
                            .parse()
                            .map_err(RepositoryError::Decode)?,
                    },
                })
            })
            .collect()
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn keyword_from_row(row: &PgRow) -> Result<KeywordRecord, RepositoryError> {
    let trend_status: String = row.try_get("trend_status")?;
    Ok(KeywordRecord {
        id: row.try_get("id")?,
        keyword: row.try_get("keyword")?,
        search_volume: row.try_get("search_volume")?,
        competition_index: row.try_get("competition_index")?,
        category: row.try_get("category")?,
        trend_status: trend_status.parse().map_err(RepositoryError::Decode)?,
    })
}

#[async_trait]
impl KeywordRepository for PgKeywordRepository {
    async fn list_keywords(
        &self,
        filter: &KeywordFilter,
        limit: usize,
    ) -> Result<Vec<KeywordRecord>, RepositoryError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, keyword, search_volume, competition_index, category, trend_status \
             FROM keyword_opportunity.keywords WHERE TRUE",
        );

        if let Some(min_volume) = filter.min_volume {
            query.push(" AND search_volume >= ").push_bind(min_volume);
        }
        if let Some(max_competition) = filter.max_competition {
            query
                .push(" AND competition_index <= ")
                .push_bind(max_competition);
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(status) = filter.trend_status {
            query.push(" AND trend_status = ").push_bind(status.as_str());
        }
        query
            .push(" ORDER BY search_volume DESC, keyword ASC LIMIT ")
            .push_bind(sql_limit(limit));

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(keyword_from_row).collect()
    }

    async fn latest_metrics(
        &self,
        keyword_id: Uuid,
    ) -> Result<Option<MetricsSnapshot>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT click_volume, conversion_potential, niche_saturation, commercial_intent, recorded_at
            FROM keyword_opportunity.keyword_metrics
            WHERE keyword_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(keyword_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<MetricsSnapshot, RepositoryError> {
            Ok(MetricsSnapshot {
                click_volume: row.try_get("click_volume")?,
                conversion_potential: row.try_get("conversion_potential")?,
                niche_saturation: row.try_get("niche_saturation")?,
                commercial_intent: row.try_get("commercial_intent")?,
                recorded_at: row.try_get("recorded_at")?,
            })
        })
        .transpose()
    }

    async fn latest_trend(&self, keyword_id: Uuid) -> Result<Option<TrendSnapshot>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT velocity_score, seasonality_pattern, peak_month, growth_7d, growth_30d, recorded_at
            FROM keyword_opportunity.keyword_trends
            WHERE keyword_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(keyword_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<TrendSnapshot, RepositoryError> {
            Ok(TrendSnapshot {
                velocity_score: row.try_get("velocity_score")?,
                seasonality_pattern: row.try_get("seasonality_pattern")?,
                peak_month: row.try_get("peak_month")?,
                growth_7d: row.try_get("growth_7d")?,
                growth_30d: row.try_get("growth_30d")?,
                recorded_at: row.try_get("recorded_at")?,
            })
        })
        .transpose()
    }

    async fn competition_indices(&self, category: &str) -> Result<Vec<i32>, RepositoryError> {
        let indices = sqlx::query_scalar(
            "SELECT competition_index FROM keyword_opportunity.keywords WHERE category = $1",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(indices)
    }

    async fn trend_peaks_for_category(
        &self,
        category: &str,
    ) -> Result<Vec<Option<i32>>, RepositoryError> {
        let peaks = sqlx::query_scalar(
            r#"
            SELECT t.peak_month
            FROM keyword_opportunity.keyword_trends t
            JOIN keyword_opportunity.keywords k ON k.id = t.keyword_id
            WHERE k.category = $1
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(peaks)
    }
}
