// crates/core/src/report.rs
//! Slow-query range-index report.
//!
//! Fetches the top statements, prints their statistics, then prints one
//! analysis section per statement. Only the statistics fetch and output
//! writes are fatal; everything else degrades to a placeholder line.

use std::io::Write;

use crate::analyzer::PlanAnalyzer;
use crate::catalog::StatsCatalog;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::heuristics::extract_table_name;
use crate::types::{AnalysisResult, QueryRecord};

const WIDE_DIVIDER: usize = 100;
const NARROW_DIVIDER: usize = 50;

pub const NO_PLAN_ANALYSIS: &str = "No explain plan analysis available";
pub const NO_INDEXES: &str = "No indexes found for this table";

/// Counts for the run log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub queries_analyzed: usize,
    pub range_predicates_found: usize,
    pub plans_interpreted: usize,
}

pub struct ReportDriver {
    analyzer: PlanAnalyzer,
    config: ReportConfig,
}

impl ReportDriver {
    pub fn new(analyzer: PlanAnalyzer, config: ReportConfig) -> Self {
        Self { analyzer, config }
    }

    /// Run the report against `catalog`, writing text to `out`.
    pub async fn run(
        &self,
        catalog: &mut dyn StatsCatalog,
        out: &mut dyn Write,
    ) -> Result<ReportSummary, ReportError> {
        let records = catalog
            .top_slow_queries(self.config.top_n)
            .await
            .map_err(ReportError::TopQueries)?;
        tracing::info!(count = records.len(), limit = self.config.top_n, "fetched slow queries");

        write_statistics(out, &records)?;

        writeln!(out, "\nQuery Analysis:")?;
        writeln!(out, "{}", divider(WIDE_DIVIDER))?;

        let mut summary = ReportSummary::default();
        for (i, record) in records.iter().enumerate() {
            let n = i + 1;
            tracing::info!(query_index = n, query = %record.query, "analyzing query");

            let analysis = self.analyzer.analyze_query(catalog, &record.query).await;
            let indexes = match extract_table_name(&record.query) {
                Some(table) => match catalog.table_indexes(&table).await {
                    Ok(defs) => defs,
                    Err(e) => {
                        tracing::error!(table = %table, error = %e, "error getting indexes for table");
                        Vec::new()
                    }
                },
                None => {
                    tracing::debug!(query_index = n, "no table name found, skipping index lookup");
                    Vec::new()
                }
            };

            summary.queries_analyzed += 1;
            if analysis.contains_range {
                summary.range_predicates_found += 1;
            }
            if analysis.explain_analysis.is_some() {
                summary.plans_interpreted += 1;
            }

            self.write_analysis(out, n, &analysis, &indexes)?;
        }

        out.flush()?;
        Ok(summary)
    }

    fn write_analysis(
        &self,
        out: &mut dyn Write,
        n: usize,
        analysis: &AnalysisResult,
        indexes: &[String],
    ) -> Result<(), ReportError> {
        writeln!(out, "\nAnalysis for Query {n}:")?;
        writeln!(out, "{}", divider(NARROW_DIVIDER))?;
        writeln!(out, "\nQuery Analysis:")?;
        writeln!(out, "{}", analysis.analysis)?;

        if analysis.contains_range {
            if self.config.show_plan {
                if let Some(plan) = &analysis.explain_plan {
                    writeln!(out, "\nExplain Plan:")?;
                    let pretty = serde_json::to_string_pretty(plan).unwrap_or_else(|_| plan.to_string());
                    writeln!(out, "{pretty}")?;
                }
            }

            writeln!(out, "\nExplain Plan Analysis:")?;
            match &analysis.explain_analysis {
                Some(text) => writeln!(out, "{text}")?,
                None => writeln!(out, "{NO_PLAN_ANALYSIS}")?,
            }

            if indexes.is_empty() {
                writeln!(out, "{NO_INDEXES}")?;
            } else {
                writeln!(out, "\nExisting Indexes:")?;
                for idx in indexes {
                    writeln!(out, "  {idx}")?;
                }
            }
        }
        writeln!(out, "{}", divider(NARROW_DIVIDER))?;
        Ok(())
    }
}

fn divider(width: usize) -> String {
    "-".repeat(width)
}

fn write_statistics(out: &mut dyn Write, records: &[QueryRecord]) -> std::io::Result<()> {
    writeln!(out, "\nRows from pg_stat_statements:")?;
    writeln!(out, "{}", divider(WIDE_DIVIDER))?;
    for (i, record) in records.iter().enumerate() {
        writeln!(out, "\nRow {}:", i + 1)?;
        writeln!(out, "  Calls: {}", record.calls)?;
        // Debug keeps the fractional part of whole numbers ("1200.0").
        writeln!(out, "  Total Exec Time (ms): {:?}", record.total_exec_time)?;
        writeln!(out, "  Avg Exec Time (ms): {:?}", record.avg_exec_time)?;
        writeln!(out, "\n  Query:")?;
        writeln!(out, "{}", record.query)?;
        writeln!(out, "{}", divider(WIDE_DIVIDER))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_statistics_block_format() {
        let mut buf = Vec::new();
        write_statistics(&mut buf, &[QueryRecord::new("SELECT 1", 10.5, 2)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let expected = format!(
            "\nRows from pg_stat_statements:\n{d}\n\nRow 1:\n  Calls: 2\n  Total Exec Time (ms): 10.5\n  Avg Exec Time (ms): 5.25\n\n  Query:\nSELECT 1\n{d}\n",
            d = "-".repeat(100)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_statistics_whole_millis_keep_fraction() {
        let mut buf = Vec::new();
        write_statistics(&mut buf, &[QueryRecord::new("SELECT 1", 1200.0, 4)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("  Total Exec Time (ms): 1200.0\n"), "got: {text}");
        assert!(text.contains("  Avg Exec Time (ms): 300.0\n"), "got: {text}");
    }

    #[test]
    fn test_statistics_block_empty() {
        let mut buf = Vec::new();
        write_statistics(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, format!("\nRows from pg_stat_statements:\n{}\n", "-".repeat(100)));
    }
}
