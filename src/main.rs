use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyword_opportunity::config::Settings;
use keyword_opportunity::db::{self, PgKeywordRepository};
use keyword_opportunity::report::{self, ReportInput};
use keyword_opportunity::{import, AnalysisCoordinator, AnalysisError};

#[derive(Parser)]
#[command(name = "keyword-opportunity")]
#[command(about = "Find and rank high-opportunity search keywords", long_about = None)]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import keywords, metrics and trends from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank keywords by opportunity score
    Opportunities {
        #[arg(long, default_value_t = 100)]
        min_volume: i64,
        #[arg(long, default_value_t = 50)]
        max_competition: i32,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List rising keywords with their trend velocity
    Trending {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Summarize competition within a category
    Competition {
        #[arg(long)]
        category: String,
    },
    /// Count seasonal peak months within a category
    Seasonal {
        #[arg(long)]
        category: String,
    },
    /// Show keywords related to a keyword
    Related {
        #[arg(long)]
        keyword: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 100)]
        min_volume: i64,
        #[arg(long, default_value_t = 50)]
        max_competition: i32,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let database_url = settings.require_database_url()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    let repository = PgKeywordRepository::new(pool.clone());
    let coordinator = AnalysisCoordinator::new(repository)
        .with_lookup_concurrency(settings.lookup_concurrency);

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let summary = import::import_csv(&pool, &csv).await?;
            println!(
                "Imported {} keywords ({} metrics, {} trends, {} skipped) from {}.",
                summary.keywords,
                summary.metrics,
                summary.trends,
                summary.skipped,
                csv.display()
            );
        }
        Commands::Opportunities {
            min_volume,
            max_competition,
            limit,
        } => {
            let mut scores = coordinator
                .find_opportunities(min_volume, max_competition)
                .await?;
            scores.truncate(limit);

            if cli.json {
                return print_json(&scores);
            }
            if scores.is_empty() {
                println!("No keywords matched these filters.");
                return Ok(());
            }

            println!("Top keywords by opportunity score:");
            for score in &scores {
                println!(
                    "- {} ({}) score {} [{}], {} searches, competition {}: {}",
                    score.keyword,
                    score.category,
                    score.opportunity_score,
                    score.potential_revenue_tier,
                    score.search_volume,
                    score.competition_index,
                    score.reason
                );
            }
        }
        Commands::Trending { category, limit } => {
            let trending = coordinator
                .get_trending_keywords(category.as_deref(), limit)
                .await?;

            if cli.json {
                return print_json(&trending);
            }
            if trending.is_empty() {
                println!("No rising keywords found.");
                return Ok(());
            }

            for keyword in &trending {
                println!(
                    "- {} ({}) {} searches, velocity {:.1}",
                    keyword.keyword, keyword.category, keyword.search_volume, keyword.velocity_score
                );
            }
        }
        Commands::Competition { category } => {
            let summary = coordinator.get_competition_analysis(&category).await?;

            if cli.json {
                return print_json(&summary);
            }
            println!("Competition in {category}:");
            println!(
                "- low: {}, medium: {}, high: {}",
                summary.low, summary.medium, summary.high
            );
            println!("- average {}, median {}", summary.average, summary.median);
        }
        Commands::Seasonal { category } => {
            let summary = coordinator.get_seasonal_trends(&category).await?;

            if cli.json {
                return print_json(&summary);
            }
            if summary.peaks.is_empty() {
                println!("No peak months recorded for {category}.");
                return Ok(());
            }

            println!("Peak months in {category}:");
            for peak in &summary.peaks {
                println!("- {}: {}", peak.month, peak.count);
            }
        }
        Commands::Related { keyword, limit } => {
            let related = coordinator
                .repository()
                .related_keywords(&keyword, limit)
                .await?;

            if cli.json {
                return print_json(&related);
            }
            if related.is_empty() {
                println!("No related keywords recorded for {keyword}.");
                return Ok(());
            }

            for item in &related {
                println!(
                    "- {} ({}, strength {})",
                    item.keyword,
                    item.edge.relationship_type.as_str(),
                    item.edge.correlation_strength
                );
            }
        }
        Commands::Report {
            category,
            min_volume,
            max_competition,
            out,
        } => {
            let opportunities = coordinator
                .find_opportunities(min_volume, max_competition)
                .await?;
            let trending = coordinator
                .get_trending_keywords(category.as_deref(), 10)
                .await?;

            let (competition, seasonal) = match category.as_deref() {
                Some(category) => {
                    let competition = match coordinator.get_competition_analysis(category).await {
                        Ok(summary) => Some(summary),
                        Err(AnalysisError::EmptyCategory(_)) => None,
                        Err(err) => return Err(err.into()),
                    };
                    let seasonal = coordinator.get_seasonal_trends(category).await?;
                    (competition, Some(seasonal))
                }
                None => (None, None),
            };

            let report = report::build_report(&ReportInput {
                category: category.as_deref(),
                min_volume,
                max_competition,
                opportunities: &opportunities,
                trending: &trending,
                competition: competition.as_ref(),
                seasonal: seasonal.as_ref(),
            });
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
