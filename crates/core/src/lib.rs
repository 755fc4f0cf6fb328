// crates/core/src/lib.rs
pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod llm;
pub mod prompts;
pub mod report;
pub mod types;

pub use analyzer::{PlanAnalyzer, RangeDetection};
pub use catalog::{CatalogError, StatsCatalog};
pub use config::{AppConfig, DatabaseConfig, ReportConfig, SslMode};
pub use error::*;
pub use report::{ReportDriver, ReportSummary};
pub use types::*;
