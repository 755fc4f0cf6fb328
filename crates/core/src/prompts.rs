// crates/core/src/prompts.rs
//! Prompt templates for the three plan-analysis steps.

use crate::types::ExecutionPlan;

/// Operators the prompts describe as range predicates.
const RANGE_OPERATORS: &str = "BETWEEN, >, <, >=, <=, or IN with a range of values";

/// Ask whether the query has a range predicate.
///
/// The answer is free text; the caller only looks for "yes" in it.
pub fn build_range_detection_prompt(query: &str) -> String {
    format!(
        r#"Analyze the following SQL query and determine if it contains any range predicates.
A range predicate is a WHERE clause that uses operators like {RANGE_OPERATORS}.

SQL Query: {query}

Does this query contain any range predicates? If yes, specify what they are."#
    )
}

/// Ask for the query with `$n` placeholders replaced by literal values.
pub fn build_bind_resolution_prompt(query: &str) -> String {
    format!(
        r#"Replace any bind variables ($1, $2, etc.) in the following SQL query with actual values.
If the query doesn't contain bind variables, return it unchanged.

SQL Query: {query}

Return ONLY the SQL query with bind variables replaced. Do not include any markdown formatting."#
    )
}

/// Ask for sequential scans on range-predicate fields and an index recommendation.
///
/// The plan is embedded as compact JSON.
pub fn build_plan_interpretation_prompt(query: &str, plan: &ExecutionPlan) -> String {
    format!(
        r#"Analyze the following explain plan and determine if there are any sequential scans (Seq Scan)
on fields used in range predicates. A range predicate is a WHERE clause that uses operators
like {RANGE_OPERATORS}.

SQL Query: {query}

Explain Plan: {plan}

Context about YugabyteDB Partitioning:
- By default, indexes are HASH which produces even distribution of rows across tablets.
- RANGE partitioning (PRIMARY KEY(field ASC)) keeps rows ordered but may create a write hotspot in a tablet where all activity such as inserts and selects are only on the most recent values.
- Common query problem: Queries using range predicates or ORDER BY without a supporting range index often trigger sequential scans, even when only a small key range is needed.

Analysis Tasks:
1. Identify any range predicates in the query
2. Check if there are sequential scans on fields used in these range predicates
3. If sequential scans are found:
   a. Check if the field is the primary key
   b. If it is the primary key, suggest:
      - Recreating the table with RANGE partitioning on this field
      - Or adding a secondary range index (CREATE INDEX table_field_idx ON table_name (field ASC))
   c. If it is not the primary key:
      - Suggest creating a secondary range index (CREATE INDEX table_field_idx ON table_name (field ASC))
4. Return a detailed analysis of your findings, including:
   - Whether sequential scans are found
   - Which fields are affected
   - Recommended index creation strategy
   - Explanation of why the current index (if it exists) is not sufficient

Do not include pleasantries or introductory phrases. Be concise and factual."#
    )
}
