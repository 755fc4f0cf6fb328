// crates/db/src/rows.rs
//! Column decoding from `PgRow` into JSON values keyed by column name.
//!
//! Numbers and booleans map to JSON numbers and booleans, NUMERIC to a JSON
//! number, text-like and date/time/uuid columns to strings, JSON/JSONB as-is.
//! Enum columns are read as their label. Any other type becomes `null` and
//! is reported at debug level.

use serde_json::Value;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgRow, PgTypeInfo, PgTypeKind};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, Uuid};
use sqlx::{Column, Decode, Postgres, Row as _, Type, TypeInfo};
use std::collections::BTreeMap;

/// One result row: column name to value.
pub type Row = BTreeMap<String, Value>;

pub(crate) fn decode_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|col| {
            let value = decode_column(row, col.ordinal(), col.type_info());
            (col.name().to_string(), value)
        })
        .collect()
}

/// Non-null value of column `idx`, or `None` on NULL or a decode failure.
fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

fn decode_column(row: &PgRow, idx: usize, type_info: &PgTypeInfo) -> Value {
    match type_info.name() {
        "BOOL" => get::<bool>(row, idx).map(Value::Bool).unwrap_or(Value::Null),
        "INT2" => int_value(get::<i16>(row, idx).map(i64::from)),
        "INT4" => int_value(get::<i32>(row, idx).map(i64::from)),
        "INT8" => int_value(get::<i64>(row, idx)),
        // Single-byte "char"; `char(n)` reports as CHAR.
        "\"CHAR\"" => int_value(get::<i8>(row, idx).map(i64::from)),
        "OID" => int_value(get::<Oid>(row, idx).map(|o| i64::from(o.0))),
        "FLOAT4" => float_value(get::<f32>(row, idx).map(f64::from)),
        "FLOAT8" => float_value(get::<f64>(row, idx)),
        "NUMERIC" => get::<Decimal>(row, idx)
            .map(|d| decimal_value(&d.to_string()))
            .unwrap_or(Value::Null),
        "TEXT" | "VARCHAR" | "NAME" | "BPCHAR" | "CHAR" => string_value(get::<String>(row, idx)),
        "JSON" | "JSONB" => get::<Value>(row, idx).unwrap_or(Value::Null),
        "TIMESTAMPTZ" => string_value(get::<DateTime<Utc>>(row, idx).map(|t| t.to_rfc3339())),
        "TIMESTAMP" => string_value(get::<NaiveDateTime>(row, idx).map(|t| t.to_string())),
        "DATE" => string_value(get::<NaiveDate>(row, idx).map(|d| d.to_string())),
        "TIME" => string_value(get::<NaiveTime>(row, idx).map(|t| t.to_string())),
        "UUID" => string_value(get::<Uuid>(row, idx).map(|u| u.to_string())),
        other => match type_info.kind() {
            // Enum values travel as their UTF-8 label.
            PgTypeKind::Enum(_) => string_value(
                row.try_get_unchecked::<Option<String>, _>(idx)
                    .ok()
                    .flatten(),
            ),
            _ => {
                tracing::debug!(column = idx, type_name = other, "unsupported column type, decoded as null");
                Value::Null
            }
        },
    }
}

fn int_value(v: Option<i64>) -> Value {
    v.map(Value::from).unwrap_or(Value::Null)
}

fn string_value(v: Option<String>) -> Value {
    v.map(Value::String).unwrap_or(Value::Null)
}

/// Non-finite floats have no JSON form and become `null`.
fn float_value(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// NUMERIC as a JSON number; values JSON cannot hold (NaN) stay strings.
fn decimal_value(text: &str) -> Value {
    text.parse::<serde_json::Number>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_value() {
        assert_eq!(float_value(Some(12.5)), serde_json::json!(12.5));
        assert_eq!(float_value(Some(f64::NAN)), Value::Null);
        assert_eq!(float_value(Some(f64::INFINITY)), Value::Null);
        assert_eq!(float_value(None), Value::Null);
    }

    #[test]
    fn test_int_value() {
        assert_eq!(int_value(Some(-3)), serde_json::json!(-3));
        assert_eq!(int_value(None), Value::Null);
    }

    #[test]
    fn test_decimal_value() {
        assert_eq!(decimal_value("1.5"), serde_json::json!(1.5));
        assert_eq!(decimal_value("42"), serde_json::json!(42));
        assert_eq!(decimal_value("NaN"), serde_json::json!("NaN"));
    }
}
