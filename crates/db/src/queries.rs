// crates/db/src/queries.rs
// Statistics reads: slowest statements, index definitions, execution plans.

use async_trait::async_trait;
use range_advisor_core::{CatalogError, ExecutionPlan, QueryRecord, StatsCatalog};
use serde_json::Value;

use crate::{Database, DbError, DbResult, Row};

const TOP_SLOW_QUERIES_SQL: &str = "\
SELECT query, total_exec_time, calls, total_exec_time / NULLIF(calls, 0) AS avg_exec_time \
FROM pg_stat_statements \
ORDER BY total_exec_time DESC \
LIMIT $1";

const TABLE_INDEXES_SQL: &str = "SELECT indexdef FROM pg_indexes WHERE tablename = $1";

impl Database {
    /// Up to `limit` statements ordered by cumulative execution time.
    pub async fn top_slow_queries(&mut self, limit: u32) -> DbResult<Vec<QueryRecord>> {
        let rows = self
            .execute(TOP_SLOW_QUERIES_SQL, &[i64::from(limit).into()])
            .await?;
        Ok(rows.iter().map(query_record_from_row).collect())
    }

    /// Index definitions for `table_name`. Unknown tables give an empty list.
    pub async fn table_indexes(&mut self, table_name: &str) -> DbResult<Vec<String>> {
        let rows = self.execute(TABLE_INDEXES_SQL, &[table_name.into()]).await?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get("indexdef").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// `EXPLAIN (ANALYZE, VERBOSE, FORMAT JSON)` on an executable statement.
    ///
    /// ANALYZE runs the statement, so the transaction is rolled back rather
    /// than committed.
    pub async fn explain_plan(&mut self, query: &str) -> DbResult<ExecutionPlan> {
        let statement = format!("EXPLAIN (ANALYZE, VERBOSE, FORMAT JSON) {}", query.trim());
        let rows = self.run(&statement, &[], false).await?;
        let plan = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_values().next())
            .ok_or(DbError::EmptyPlan)?;
        Ok(plan_document(plan))
    }
}

fn query_record_from_row(row: &Row) -> QueryRecord {
    let query = row
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let total = row
        .get("total_exec_time")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let calls = row.get("calls").and_then(Value::as_i64).unwrap_or(0);

    let mut record = QueryRecord::new(query, total, calls);
    if let Some(avg) = row.get("avg_exec_time").and_then(Value::as_f64) {
        record.avg_exec_time = avg;
    }
    record
}

/// Servers that return the plan as text get it parsed here.
fn plan_document(value: Value) -> ExecutionPlan {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

impl From<DbError> for CatalogError {
    fn from(e: DbError) -> Self {
        CatalogError::new(e)
    }
}

#[async_trait]
impl StatsCatalog for Database {
    async fn top_slow_queries(&mut self, limit: u32) -> Result<Vec<QueryRecord>, CatalogError> {
        Ok(Database::top_slow_queries(self, limit).await?)
    }

    async fn table_indexes(&mut self, table_name: &str) -> Result<Vec<String>, CatalogError> {
        Ok(Database::table_indexes(self, table_name).await?)
    }

    async fn explain_plan(&mut self, query: &str) -> Result<ExecutionPlan, CatalogError> {
        Ok(Database::explain_plan(self, query).await?)
    }
}
