//! Set-level analysis over keywords fetched from a [`KeywordRepository`].

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{
    CompetitionSummary, KeywordFilter, MonthCount, OpportunityScore, SeasonalSummary,
    TrendStatus, TrendingKeyword,
};
use crate::repository::KeywordRepository;
use crate::scoring;

/// Upper bound on candidates scored per `find_opportunities` call.
pub const CANDIDATE_LIMIT: usize = 100;
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 4;

// Competition buckets: [0, 33) low, [33, 66) medium, [66, ..] high.
const LOW_COMPETITION_BELOW: i32 = 33;
const HIGH_COMPETITION_FROM: i32 = 66;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub struct AnalysisCoordinator<R> {
    repository: R,
    lookup_concurrency: usize,
}

impl<R: KeywordRepository> AnalysisCoordinator<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            lookup_concurrency: DEFAULT_LOOKUP_CONCURRENCY,
        }
    }

    /// Number of per-candidate snapshot lookups allowed in flight at once.
    pub fn with_lookup_concurrency(mut self, lookup_concurrency: usize) -> Self {
        self.lookup_concurrency = lookup_concurrency.max(1);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Scores high-volume, low-competition candidates, best first.
    ///
    /// Equal scores keep the repository's volume-descending order.
    pub async fn find_opportunities(
        &self,
        min_volume: i64,
        max_competition: i32,
    ) -> AnalysisResult<Vec<OpportunityScore>> {
        let filter = KeywordFilter {
            min_volume: Some(min_volume),
            max_competition: Some(max_competition),
            ..KeywordFilter::default()
        };
        let candidates = self
            .repository
            .list_keywords(&filter, CANDIDATE_LIMIT)
            .await?;

        let repository = &self.repository;
        let snapshots: Vec<_> = stream::iter(candidates.iter())
            .map(|keyword| async move {
                futures::try_join!(
                    repository.latest_metrics(keyword.id),
                    repository.latest_trend(keyword.id)
                )
            })
            .buffered(self.lookup_concurrency)
            .try_collect()
            .await?;

        let mut scores: Vec<OpportunityScore> = candidates
            .iter()
            .zip(snapshots.iter())
            .map(|(keyword, (metrics, trend))| {
                scoring::calculate_opportunity_score(keyword, metrics.as_ref(), trend.as_ref())
            })
            .collect();

        // `sort_by` is stable.
        scores.sort_by(|a, b| b.opportunity_score.cmp(&a.opportunity_score));

        tracing::info!(
            min_volume,
            max_competition,
            candidates = candidates.len(),
            "scored keyword opportunities"
        );
        Ok(scores)
    }

    /// Rising keywords in volume order, enriched with their latest velocity.
    pub async fn get_trending_keywords(
        &self,
        category: Option<&str>,
        limit: usize,
    ) -> AnalysisResult<Vec<TrendingKeyword>> {
        let filter = KeywordFilter {
            category: category.map(str::to_string),
            trend_status: Some(TrendStatus::Rising),
            ..KeywordFilter::default()
        };
        let keywords = self.repository.list_keywords(&filter, limit).await?;

        let mut trending = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let velocity_score = self
                .repository
                .latest_trend(keyword.id)
                .await?
                .map(|trend| trend.velocity_score)
                .unwrap_or(scoring::DEFAULT_VELOCITY);

            trending.push(TrendingKeyword {
                keyword: keyword.keyword,
                search_volume: keyword.search_volume,
                competition_index: keyword.competition_index,
                category: keyword.category,
                velocity_score,
            });
        }

        tracing::debug!(?category, count = trending.len(), "collected trending keywords");
        Ok(trending)
    }

    pub async fn get_competition_analysis(&self, category: &str) -> AnalysisResult<CompetitionSummary> {
        let indices = self.repository.competition_indices(category).await?;
        let summary = summarize_competition(&indices)
            .ok_or_else(|| AnalysisError::EmptyCategory(category.to_string()))?;

        tracing::debug!(category, keywords = indices.len(), "summarized competition");
        Ok(summary)
    }

    pub async fn get_seasonal_trends(&self, category: &str) -> AnalysisResult<SeasonalSummary> {
        let peaks = self.repository.trend_peaks_for_category(category).await?;
        let summary = SeasonalSummary {
            category: category.to_string(),
            peaks: summarize_seasonal_peaks(&peaks),
        };

        tracing::debug!(category, snapshots = peaks.len(), "summarized seasonal peaks");
        Ok(summary)
    }
}

/// Bucket counts, rounded mean and lower median. `None` for an empty slice.
pub fn summarize_competition(indices: &[i32]) -> Option<CompetitionSummary> {
    if indices.is_empty() {
        return None;
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable();

    let low = sorted.iter().filter(|&&c| c < LOW_COMPETITION_BELOW).count();
    let high = sorted.iter().filter(|&&c| c >= HIGH_COMPETITION_FROM).count();
    let medium = sorted.len() - low - high;

    let total: i64 = sorted.iter().map(|&c| c as i64).sum();
    let average = (total as f64 / sorted.len() as f64).round() as i32;
    let median = sorted[sorted.len() / 2];

    Some(CompetitionSummary {
        low,
        medium,
        high,
        average,
        median,
    })
}

/// Histogram of peak months in calendar order, listing only months that occur.
pub fn summarize_seasonal_peaks(peaks: &[Option<i32>]) -> Vec<MonthCount> {
    let mut counts = [0usize; 12];

    for month in peaks.iter().flatten() {
        match usize::try_from(*month) {
            Ok(m @ 1..=12) => counts[m - 1] += 1,
            _ => tracing::warn!(month, "ignoring out-of-range peak month"),
        }
    }

    MONTH_NAMES
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(month, count)| MonthCount {
            month: *month,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::error::RepositoryError;
    use crate::models::{KeywordRecord, MetricsSnapshot, TrendSnapshot};

    #[derive(Default)]
    struct InMemoryRepository {
        keywords: Vec<KeywordRecord>,
        metrics: HashMap<Uuid, Vec<MetricsSnapshot>>,
        trends: HashMap<Uuid, Vec<TrendSnapshot>>,
    }

    impl InMemoryRepository {
        fn add_keyword(
            &mut self,
            keyword: &str,
            search_volume: i64,
            competition_index: i32,
            category: &str,
            trend_status: TrendStatus,
        ) -> Uuid {
            let id = Uuid::new_v4();
            self.keywords.push(KeywordRecord {
                id,
                keyword: keyword.to_string(),
                search_volume,
                competition_index,
                category: category.to_string(),
                trend_status,
            });
            id
        }

        fn add_trend(&mut self, keyword_id: Uuid, velocity_score: f64, peak_month: Option<i32>, days_ago: i64) {
            self.trends.entry(keyword_id).or_default().push(TrendSnapshot {
                velocity_score,
                seasonality_pattern: String::new(),
                peak_month,
                growth_7d: 0.0,
                growth_30d: 0.0,
                recorded_at: Utc::now() - Duration::days(days_ago),
            });
        }

        fn add_metrics(&mut self, keyword_id: Uuid, niche_saturation: i32, days_ago: i64) {
            self.metrics.entry(keyword_id).or_default().push(MetricsSnapshot {
                click_volume: 100,
                conversion_potential: 50,
                niche_saturation,
                commercial_intent: 50,
                recorded_at: Utc::now() - Duration::days(days_ago),
            });
        }

        fn category_of(&self, keyword_id: &Uuid) -> Option<&str> {
            self.keywords
                .iter()
                .find(|k| &k.id == keyword_id)
                .map(|k| k.category.as_str())
        }
    }

    #[async_trait]
    impl KeywordRepository for InMemoryRepository {
        async fn list_keywords(
            &self,
            filter: &KeywordFilter,
            limit: usize,
        ) -> Result<Vec<KeywordRecord>, RepositoryError> {
            let mut matched: Vec<KeywordRecord> = self
                .keywords
                .iter()
                .filter(|k| filter.min_volume.map_or(true, |v| k.search_volume >= v))
                .filter(|k| filter.max_competition.map_or(true, |c| k.competition_index <= c))
                .filter(|k| filter.category.as_deref().map_or(true, |c| k.category == c))
                .filter(|k| filter.trend_status.map_or(true, |s| k.trend_status == s))
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.search_volume.cmp(&a.search_volume));
            matched.truncate(limit);
            Ok(matched)
        }

        async fn latest_metrics(
            &self,
            keyword_id: Uuid,
        ) -> Result<Option<MetricsSnapshot>, RepositoryError> {
            Ok(self
                .metrics
                .get(&keyword_id)
                .and_then(|all| all.iter().max_by_key(|m| m.recorded_at))
                .cloned())
        }

        async fn latest_trend(&self, keyword_id: Uuid) -> Result<Option<TrendSnapshot>, RepositoryError> {
            Ok(self
                .trends
                .get(&keyword_id)
                .and_then(|all| all.iter().max_by_key(|t| t.recorded_at))
                .cloned())
        }

        async fn competition_indices(&self, category: &str) -> Result<Vec<i32>, RepositoryError> {
            Ok(self
                .keywords
                .iter()
                .filter(|k| k.category == category)
                .map(|k| k.competition_index)
                .collect())
        }

        async fn trend_peaks_for_category(
            &self,
            category: &str,
        ) -> Result<Vec<Option<i32>>, RepositoryError> {
            Ok(self
                .trends
                .iter()
                .filter(|(id, _)| self.category_of(id) == Some(category))
                .flat_map(|(_, snapshots)| snapshots.iter().map(|t| t.peak_month))
                .collect())
        }
    }

    struct FailingRepository {
        inner: InMemoryRepository,
    }

    #[async_trait]
    impl KeywordRepository for FailingRepository {
        async fn list_keywords(
            &self,
            filter: &KeywordFilter,
            limit: usize,
        ) -> Result<Vec<KeywordRecord>, RepositoryError> {
            self.inner.list_keywords(filter, limit).await
        }

        async fn latest_metrics(
            &self,
            keyword_id: Uuid,
        ) -> Result<Option<MetricsSnapshot>, RepositoryError> {
            self.inner.latest_metrics(keyword_id).await
        }

        async fn latest_trend(&self, _keyword_id: Uuid) -> Result<Option<TrendSnapshot>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection reset".to_string()))
        }

        async fn competition_indices(&self, _category: &str) -> Result<Vec<i32>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection reset".to_string()))
        }

        async fn trend_peaks_for_category(
            &self,
            category: &str,
        ) -> Result<Vec<Option<i32>>, RepositoryError> {
            self.inner.trend_peaks_for_category(category).await
        }
    }

    #[tokio::test]
    async fn opportunities_sorted_by_score_with_stable_ties() {
        let mut repo = InMemoryRepository::default();
        // Volume score saturates at 100, so these two tie.
        repo.add_keyword("ceramic mug", 20_000, 50, "kitchen", TrendStatus::Stable);
        repo.add_keyword("enamel mug", 15_000, 50, "kitchen", TrendStatus::Stable);
        let rising = repo.add_keyword("camp mug", 800, 0, "outdoor", TrendStatus::Rising);
        repo.add_trend(rising, 80.0, Some(7), 1);
        repo.add_keyword("glass mug", 50, 10, "kitchen", TrendStatus::Stable);
        repo.add_keyword("gold mug", 9_000, 95, "kitchen", TrendStatus::Stable);

        let coordinator = AnalysisCoordinator::new(repo);
        let results = coordinator.find_opportunities(100, 60).await.unwrap();

        let order: Vec<&str> = results.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(order, vec!["camp mug", "ceramic mug", "enamel mug"]);
        assert_eq!(results[0].opportunity_score, 44);
        assert_eq!(results[1].opportunity_score, results[2].opportunity_score);
        assert!(results
            .windows(2)
            .all(|w| w[0].opportunity_score >= w[1].opportunity_score));
    }

    #[tokio::test]
    async fn opportunities_use_latest_snapshots() {
        let mut repo = InMemoryRepository::default();
        let id = repo.add_keyword("wool socks", 1_000, 40, "apparel", TrendStatus::Stable);
        repo.add_metrics(id, 100, 30);
        repo.add_metrics(id, 0, 1);
        repo.add_trend(id, 100.0, None, 20);
        repo.add_trend(id, 0.0, None, 2);

        let coordinator = AnalysisCoordinator::new(repo).with_lookup_concurrency(1);
        let results = coordinator.find_opportunities(0, 100).await.unwrap();

        // (10 * 0.2 + 60 * 0.4 + 0 + 100 * 0.2) / 1.7 = 27.06
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].opportunity_score, 27);
    }

    #[tokio::test]
    async fn opportunities_empty_when_nothing_matches() {
        let mut repo = InMemoryRepository::default();
        repo.add_keyword("crowded niche", 50_000, 99, "misc", TrendStatus::Peak);

        let coordinator = AnalysisCoordinator::new(repo);
        let results = coordinator.find_opportunities(1_000, 50).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn opportunities_cap_candidates() {
        let mut repo = InMemoryRepository::default();
        for i in 0..(CANDIDATE_LIMIT + 25) {
            repo.add_keyword(&format!("keyword {i}"), 1_000 + i as i64, 10, "bulk", TrendStatus::Stable);
        }

        let coordinator = AnalysisCoordinator::new(repo);
        let results = coordinator.find_opportunities(0, 100).await.unwrap();
        assert_eq!(results.len(), CANDIDATE_LIMIT);
    }

    #[tokio::test]
    async fn repository_failure_aborts_opportunities() {
        let mut inner = InMemoryRepository::default();
        inner.add_keyword("desk lamp", 4_000, 20, "home", TrendStatus::Rising);
        let coordinator = AnalysisCoordinator::new(FailingRepository { inner });

        let err = coordinator.find_opportunities(0, 100).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Repository(_)));

        let err = coordinator.get_competition_analysis("home").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Repository(_)));
    }

    #[tokio::test]
    async fn trending_keeps_volume_order_and_defaults_velocity() {
        let mut repo = InMemoryRepository::default();
        let slow = repo.add_keyword("planner", 9_000, 40, "office", TrendStatus::Rising);
        repo.add_trend(slow, 5.0, None, 1);
        let fast = repo.add_keyword("sticky notes", 3_000, 30, "office", TrendStatus::Rising);
        repo.add_trend(fast, 90.0, None, 1);
        repo.add_keyword("stapler", 2_000, 30, "office", TrendStatus::Rising);
        repo.add_keyword("desk mat", 20_000, 30, "office", TrendStatus::Stable);
        repo.add_keyword("tent", 50_000, 30, "outdoor", TrendStatus::Rising);

        let coordinator = AnalysisCoordinator::new(repo);
        let trending = coordinator
            .get_trending_keywords(Some("office"), 10)
            .await
            .unwrap();

        let order: Vec<&str> = trending.iter().map(|t| t.keyword.as_str()).collect();
        assert_eq!(order, vec!["planner", "sticky notes", "stapler"]);
        assert_eq!(trending[0].velocity_score, 5.0);
        assert_eq!(trending[1].velocity_score, 90.0);
        assert_eq!(trending[2].velocity_score, 0.0);

        let all = coordinator.get_trending_keywords(None, 2).await.unwrap();
        let order: Vec<&str> = all.iter().map(|t| t.keyword.as_str()).collect();
        assert_eq!(order, vec!["tent", "planner"]);
    }

    #[tokio::test]
    async fn competition_analysis_for_category() {
        let mut repo = InMemoryRepository::default();
        for (i, competition) in [40, 10, 30, 20].into_iter().enumerate() {
            repo.add_keyword(&format!("k{i}"), 100, competition, "crafts", TrendStatus::Stable);
        }

        let coordinator = AnalysisCoordinator::new(repo);
        let summary = coordinator.get_competition_analysis("crafts").await.unwrap();
        assert_eq!(
            summary,
            CompetitionSummary {
                low: 3,
                medium: 1,
                high: 0,
                average: 25,
                median: 30,
            }
        );
    }

    #[tokio::test]
    async fn competition_analysis_rejects_empty_category() {
        let coordinator = AnalysisCoordinator::new(InMemoryRepository::default());
        let err = coordinator.get_competition_analysis("nothing").await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyCategory(ref c) if c == "nothing"));
    }

    #[test]
    fn competition_buckets_are_half_open() {
        let summary = summarize_competition(&[32, 33, 65, 66, 100, 0]).unwrap();
        assert_eq!(summary.low, 2);
        assert_eq!(summary.medium, 2);
        assert_eq!(summary.high, 2);
        // sorted: 0 32 33 65 66 100 -> index 3
        assert_eq!(summary.median, 65);
        assert_eq!(summary.average, 49);
        assert!(summarize_competition(&[]).is_none());
    }

    #[tokio::test]
    async fn seasonal_trends_skip_missing_peaks() {
        let mut repo = InMemoryRepository::default();
        let a = repo.add_keyword("pumpkin", 500, 20, "seasonal", TrendStatus::Seasonal);
        let b = repo.add_keyword("sled", 500, 20, "seasonal", TrendStatus::Seasonal);
        let other = repo.add_keyword("kite", 500, 20, "toys", TrendStatus::Seasonal);
        repo.add_trend(a, 10.0, Some(10), 1);
        repo.add_trend(a, 10.0, Some(10), 40);
        repo.add_trend(a, 10.0, None, 80);
        repo.add_trend(b, 10.0, Some(12), 1);
        repo.add_trend(b, 10.0, None, 5);
        repo.add_trend(other, 10.0, Some(4), 1);

        let coordinator = AnalysisCoordinator::new(repo);
        let summary = coordinator.get_seasonal_trends("seasonal").await.unwrap();
        assert_eq!(summary.category, "seasonal");
        assert_eq!(
            summary.peaks,
            vec![
                MonthCount { month: "October", count: 2 },
                MonthCount { month: "December", count: 1 },
            ]
        );
    }

    #[test]
    fn seasonal_histogram_ignores_invalid_months() {
        let peaks = vec![Some(1), Some(13), Some(0), None, Some(1), Some(-4)];
        assert_eq!(
            summarize_seasonal_peaks(&peaks),
            vec![MonthCount { month: "January", count: 2 }]
        );
    }
}
