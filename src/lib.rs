//! Keyword opportunity scoring and analysis.
//!
//! [`scoring`] turns one keyword's recorded signals into an opportunity score;
//! [`analysis`] runs it over repository candidates and summarizes categories.

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod report;
pub mod repository;
pub mod scoring;

pub use analysis::AnalysisCoordinator;
pub use error::{AnalysisError, RepositoryError};
pub use repository::KeywordRepository;
