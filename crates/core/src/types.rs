// crates/core/src/types.rs
/// Plan document from `EXPLAIN (ANALYZE, VERBOSE, FORMAT JSON)`, kept opaque.
pub type ExecutionPlan = serde_json::Value;

/// One row of `pg_stat_statements`, reduced to what the report needs.
///
/// Times are cumulative since the last `pg_stat_statements_reset()`, not
/// per-interval values.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub query: String,
    /// Total execution time in milliseconds.
    pub total_exec_time: f64,
    pub calls: i64,
    /// Average execution time in milliseconds.
    pub avg_exec_time: f64,
}

impl QueryRecord {
    /// Build a record, deriving the average. Zero calls average to 0.
    pub fn new(query: impl Into<String>, total_exec_time: f64, calls: i64) -> Self {
        let avg_exec_time = if calls > 0 {
            total_exec_time / calls as f64
        } else {
            0.0
        };
        Self {
            query: query.into(),
            total_exec_time,
            calls,
            avg_exec_time,
        }
    }
}

/// Per-query outcome of the plan analyzer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    /// Free-text answer from the range-predicate detector.
    pub analysis: String,
    pub explain_plan: Option<ExecutionPlan>,
    pub explain_analysis: Option<String>,
    pub contains_range: bool,
}
