use std::fmt::Write;

use crate::models::{CompetitionSummary, OpportunityScore, SeasonalSummary, TrendingKeyword};

pub struct ReportInput<'a> {
    pub category: Option<&'a str>,
    pub min_volume: i64,
    pub max_competition: i32,
    pub opportunities: &'a [OpportunityScore],
    pub trending: &'a [TrendingKeyword],
    pub competition: Option<&'a CompetitionSummary>,
    pub seasonal: Option<&'a SeasonalSummary>,
}

pub fn build_report(input: &ReportInput<'_>) -> String {
    let mut output = String::new();
    let category_label = input.category.unwrap_or("all categories");

    // Opportunity scoring is not category-scoped; narrow the listing here.
    let opportunities: Vec<&OpportunityScore> = input
        .opportunities
        .iter()
        .filter(|o| input.category.map_or(true, |c| o.category == c))
        .collect();

    let _ = writeln!(output, "# Keyword Opportunity Report");
    let _ = writeln!(
        output,
        "Generated for {} (volume >= {}, competition <= {})",
        category_label, input.min_volume, input.max_competition
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Opportunities");

    if opportunities.is_empty() {
        let _ = writeln!(output, "No keywords matched these filters.");
    } else {
        for score in opportunities.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) score {} [{}]: {}",
                score.keyword,
                score.category,
                score.opportunity_score,
                score.potential_revenue_tier,
                score.reason
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trending Keywords");

    if input.trending.is_empty() {
        let _ = writeln!(output, "No rising keywords recorded.");
    } else {
        for keyword in input.trending {
            let _ = writeln!(
                output,
                "- {} ({} searches, velocity {:.1})",
                keyword.keyword, keyword.search_volume, keyword.velocity_score
            );
        }
    }

    if let Some(summary) = input.competition {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Competition");
        let _ = writeln!(
            output,
            "- low: {}, medium: {}, high: {}",
            summary.low, summary.medium, summary.high
        );
        let _ = writeln!(
            output,
            "- average {}, median {}",
            summary.average, summary.median
        );
    }

    if let Some(seasonal) = input.seasonal {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Seasonal Peaks");
        if seasonal.peaks.is_empty() {
            let _ = writeln!(output, "No peak months recorded.");
        } else {
            for peak in &seasonal.peaks {
                let _ = writeln!(output, "- {}: {}", peak.month, peak.count);
            }
        }
    }

    output
}
