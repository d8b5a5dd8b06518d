use anyhow::Context;

use crate::analysis::DEFAULT_LOOKUP_CONCURRENCY;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub lookup_concurrency: usize,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            lookup_concurrency: parse_var("LOOKUP_CONCURRENCY", DEFAULT_LOOKUP_CONCURRENCY)?,
        })
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a Postgres instance")
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_value(name, std::env::var(name).ok().as_deref(), default)
}

fn parse_value<T>(name: &str, value: Option<&str>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a number (got '{raw}')")),
        None => Ok(default),
    }
}
