// crates/core/src/catalog.rs
//! StatsCatalog trait: the database reads the report needs.
//!
//! `range-advisor-db::Database` is the production implementation; tests use
//! in-memory stubs.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ExecutionPlan, QueryRecord};

/// Opaque error from a catalog implementation.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct CatalogError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl CatalogError {
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(source))
    }

    /// Error from a plain message (stubs, tests).
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }
}

/// Read access to query statistics, plans and index definitions.
///
/// Methods take `&mut self`: an implementation owns a single session and
/// runs one statement at a time.
#[async_trait]
pub trait StatsCatalog: Send {
    /// Up to `limit` statements, slowest total execution time first.
    async fn top_slow_queries(&mut self, limit: u32) -> Result<Vec<QueryRecord>, CatalogError>;

    /// Index definitions for `table_name`; empty when there are none.
    async fn table_indexes(&mut self, table_name: &str) -> Result<Vec<String>, CatalogError>;

    /// Run `EXPLAIN (ANALYZE, VERBOSE, FORMAT JSON)` on an executable statement.
    async fn explain_plan(&mut self, query: &str) -> Result<ExecutionPlan, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_is_transparent() {
        let err = CatalogError::msg("permission denied for view pg_stat_statements");
        assert_eq!(err.to_string(), "permission denied for view pg_stat_statements");
    }

    #[test]
    fn test_catalog_error_displays_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "socket closed");
        let err = CatalogError::new(io);
        assert_eq!(err.to_string(), "socket closed");
    }
}
