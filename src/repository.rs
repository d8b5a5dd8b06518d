//! Read-side capability the analysis layer depends on.
//!
//! Implemented for Postgres in [`crate::db`]; tests substitute an in-memory
//! repository.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{KeywordFilter, KeywordRecord, MetricsSnapshot, TrendSnapshot};

#[async_trait]
pub trait KeywordRepository: Send + Sync {
    /// Keywords matching `filter`, ordered by search volume descending, at most `limit`.
    async fn list_keywords(
        &self,
        filter: &KeywordFilter,
        limit: usize,
    ) -> Result<Vec<KeywordRecord>, RepositoryError>;

    /// Most recently recorded metrics for a keyword.
    async fn latest_metrics(&self, keyword_id: Uuid)
        -> Result<Option<MetricsSnapshot>, RepositoryError>;

    /// Most recently recorded trend for a keyword.
    async fn latest_trend(&self, keyword_id: Uuid) -> Result<Option<TrendSnapshot>, RepositoryError>;

    async fn competition_indices(&self, category: &str) -> Result<Vec<i32>, RepositoryError>;

    /// Peak month of every trend snapshot recorded for keywords in `category`.
    async fn trend_peaks_for_category(
        &self,
        category: &str,
    ) -> Result<Vec<Option<i32>>, RepositoryError>;
}
