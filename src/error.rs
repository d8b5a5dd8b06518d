use thiserror::Error;

/// Failure of the keyword repository to answer a read.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored value could not be decoded: {0}")]
    Decode(String),

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("category has no keywords to analyze: {0}")]
    EmptyCategory(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
