// crates/core/src/heuristics.rs
//! Text heuristics applied to LLM answers and raw SQL.
//!
//! None of these parse SQL. Each function documents the inputs it gets wrong
//! so callers (and the tests below) can see the limits in one place.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Positional bind placeholder as written by `pg_stat_statements` (`$1`, `$12`).
static BIND_PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn bind_placeholder_re() -> &'static Regex {
    BIND_PLACEHOLDER.get_or_init(|| Regex::new(r"\$\d+").expect("static regex"))
}

/// True when the detector's free-text answer contains "yes" in any case.
///
/// Substring match, not a word match: "Yes, it does" and "yess" are both
/// true, and so is "eyes". A model that answers "No, yes-like operators are
/// absent" is counted as a positive. Callers that need certainty must change
/// the prompt contract, not this function.
pub fn mentions_yes(response: &str) -> bool {
    response.to_lowercase().contains("yes")
}

/// Table name taken from the word right after the first `FROM`.
///
/// Only the uppercase keyword is recognised, and it is found as a substring,
/// so an identifier such as `DATE_FROM` also triggers it. Surrounding `(`, `)`
/// and `,` are trimmed. Known wrong answers:
/// - joins: only the first table is returned
/// - subqueries: `FROM (SELECT ...)` yields `SELECT`
/// - schema-qualified names come back as `schema.table`
/// - quoted identifiers keep their quotes
/// - CTEs return the first `FROM` inside the `WITH` body
/// - lowercase `from`, or no `FROM` at all, yields `None`
pub fn extract_table_name(sql: &str) -> Option<String> {
    let (_, after) = sql.split_once("FROM")?;
    let word = after.split_whitespace().next()?;
    let name = word.trim_matches(|c: char| matches!(c, '(' | ')' | ','));
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Remove markdown code fences (```` ```sql ```` and ```` ``` ````) and trim.
///
/// Fences are removed wherever they appear, including inside the text, and
/// other language tags (```` ```postgresql ````) leave their tag behind.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```sql", "").replace("```", "").trim().to_string()
}

/// True when the statement still has `$n` placeholders.
///
/// Placeholders inside string literals or comments are counted too.
pub fn has_bind_placeholders(sql: &str) -> bool {
    bind_placeholder_re().is_match(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_yes_case_insensitive() {
        assert!(mentions_yes("Yes, it does"));
        assert!(mentions_yes("YES"));
        assert!(mentions_yes("The answer is yes."));
        assert!(!mentions_yes("No"));
        assert!(!mentions_yes(""));
    }

    #[test]
    fn test_mentions_yes_is_a_substring_check() {
        // Documented looseness: not a whole-word match.
        assert!(mentions_yes("yess"));
        assert!(mentions_yes("The eyes have it"));
    }

    #[test]
    fn test_extract_table_simple() {
        assert_eq!(
            extract_table_name("SELECT * FROM orders WHERE created_at > $1"),
            Some("orders".to_string())
        );
    }

    #[test]
    fn test_extract_table_without_from() {
        assert_eq!(extract_table_name("SELECT 1;"), None);
    }

    #[test]
    fn test_extract_table_lowercase_keyword_is_missed() {
        assert_eq!(extract_table_name("select * from orders"), None);
    }

    #[test]
    fn test_extract_table_trims_punctuation() {
        assert_eq!(
            extract_table_name("SELECT count(*) FROM orders, customers"),
            Some("orders".to_string())
        );
        assert_eq!(
            extract_table_name("SELECT * FROM (orders)"),
            Some("orders".to_string())
        );
    }

    #[test]
    fn test_extract_table_known_failures() {
        // Join: second table ignored.
        assert_eq!(
            extract_table_name("SELECT * FROM orders o JOIN items i ON i.order_id = o.id"),
            Some("orders".to_string())
        );
        // Subquery: keyword after the paren.
        assert_eq!(
            extract_table_name("SELECT * FROM (SELECT id FROM orders) t"),
            Some("SELECT".to_string())
        );
        // Bare paren after FROM.
        assert_eq!(extract_table_name("SELECT * FROM ( SELECT 1 ) t"), None);
        // Schema-qualified.
        assert_eq!(
            extract_table_name("SELECT * FROM sales.orders"),
            Some("sales.orders".to_string())
        );
        // Quoted identifier keeps quotes.
        assert_eq!(
            extract_table_name("SELECT * FROM \"Orders\""),
            Some("\"Orders\"".to_string())
        );
        // Nothing after FROM.
        assert_eq!(extract_table_name("SELECT * FROM"), None);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT * FROM t WHERE a > 1\n```\n"),
            "SELECT * FROM t WHERE a > 1"
        );
        assert_eq!(strip_code_fences("  SELECT 1  "), "SELECT 1");
        assert_eq!(strip_code_fences("```\nSELECT 2\n```"), "SELECT 2");
    }

    #[test]
    fn test_has_bind_placeholders() {
        assert!(has_bind_placeholders("SELECT * FROM t WHERE id = $1"));
        assert!(has_bind_placeholders("LIMIT $12"));
        assert!(!has_bind_placeholders("SELECT * FROM t WHERE id = 1"));
        assert!(!has_bind_placeholders("SELECT $$dollar quoted$$"));
    }
}
