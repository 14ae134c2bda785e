//! Declarative per-entity column schemas.
//!
//! Each entity declares its columns as `{name -> ColumnDef}`. The storage
//! layer uses the schema in both directions: [`EntitySchema::cast_types`]
//! coerces raw store values into their semantic types on read, and
//! [`EntitySchema::sanitize`] filters and normalizes data on write so that
//! unknown columns never reach the SQL builder.

use serde_json::Value;

use crate::types::RowMap;

// ---------------------------------------------------------------------------
// Column definitions
// ---------------------------------------------------------------------------

/// Semantic type of a column.
///
/// `Email` and `Url` are stored as strings; the distinction exists so input
/// validation and future formatting can key off the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Json,
    Email,
    Url,
}

impl ColumnType {
    /// Whether values of this type are bound to SQL as text.
    pub fn is_textual(self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Email | ColumnType::Url)
    }
}

/// Definition of a single column: semantic type, nullability, default.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl ColumnDef {
    /// A non-nullable column with no default.
    pub fn required(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: false,
            default: None,
        }
    }

    /// A nullable column with no default.
    pub fn nullable(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: true,
            default: None,
        }
    }

    /// A non-nullable column with a default applied when the key is absent.
    pub fn with_default(column_type: ColumnType, default: Value) -> Self {
        Self {
            column_type,
            nullable: false,
            default: Some(default),
        }
    }
}

// ---------------------------------------------------------------------------
// EntitySchema
// ---------------------------------------------------------------------------

/// Ordered set of column definitions for one entity.
///
/// Order matters only for deterministic SQL generation; lookups are by name.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    columns: Vec<(&'static str, ColumnDef)>,
}

impl EntitySchema {
    pub fn new(columns: Vec<(&'static str, ColumnDef)>) -> Self {
        Self { columns }
    }

    /// Look up a column definition by name.
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|(col, _)| *col == name)
            .map(|(_, def)| def)
    }

    /// Whether the schema declares a column with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }

    /// Coerce every value whose key appears in the schema into its semantic
    /// type, in place.
    ///
    /// Numeric coercion of a non-numeric input yields `null` rather than
    /// zero, so "not a number" is never silently read as "zero donation".
    /// Keys absent from the schema pass through unmodified.
    pub fn cast_types(&self, row: &mut RowMap) {
        for (key, value) in row.iter_mut() {
            if let Some(def) = self.get(key) {
                let raw = value.take();
                *value = cast_value(def.column_type, raw);
            }
        }
    }

    /// Filter `data` down to schema columns and normalize empty strings to
    /// `null` for nullable columns, so `""` and "unset" are not
    /// distinguished at the storage layer.
    pub fn sanitize(&self, data: &RowMap) -> RowMap {
        let mut out = RowMap::new();
        for (key, value) in data {
            let Some(def) = self.get(key) else {
                continue;
            };
            let value = match value {
                Value::String(s) if s.is_empty() && def.nullable => Value::Null,
                other => other.clone(),
            };
            out.insert(key.clone(), value);
        }
        out
    }

    /// Fill in declared defaults for keys that are absent from `row`.
    ///
    /// A `null` under a non-nullable column with a default is also replaced,
    /// which covers rows written before the column existed.
    pub fn apply_defaults(&self, row: &mut RowMap) {
        for (name, def) in &self.columns {
            let Some(default) = &def.default else {
                continue;
            };
            let missing = match row.get(*name) {
                None => true,
                Some(Value::Null) => !def.nullable,
                Some(_) => false,
            };
            if missing {
                row.insert((*name).to_string(), default.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Coerce a single raw value into the given semantic type.
fn cast_value(column_type: ColumnType, value: Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match column_type {
        ColumnType::String | ColumnType::Email | ColumnType::Url => cast_string(value),
        ColumnType::Integer => cast_integer(value),
        ColumnType::Float => cast_float(value),
        ColumnType::Boolean => Value::Bool(truthy(&value)),
        ColumnType::Json => cast_json(value),
    }
}

fn cast_string(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        // Structured data has no faithful string form.
        _ => Value::Null,
    }
}

fn cast_integer(value: Value) -> Value {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => n.as_f64().map(|f| Value::from(f as i64)).unwrap_or(Value::Null),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = s.parse::<f64>() {
                Value::from(f as i64)
            } else {
                Value::Null
            }
        }
        Value::Bool(b) => Value::from(i64::from(b)),
        _ => Value::Null,
    }
}

fn cast_float(value: Value) -> Value {
    match value {
        Value::Number(n) => n.as_f64().map(Value::from).unwrap_or(Value::Null),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// `"1"`, `1`, `true`, `"true"`, `"yes"`, `"on"` are true; everything else
/// is false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        }
        _ => false,
    }
}

fn cast_json(value: Value) -> Value {
    match value {
        // Already structured: pass through unchanged.
        Value::Object(_) | Value::Array(_) => value,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_schema() -> EntitySchema {
        EntitySchema::new(vec![
            ("id", ColumnDef::required(ColumnType::Integer)),
            ("title", ColumnDef::nullable(ColumnType::String)),
            ("goal", ColumnDef::nullable(ColumnType::Float)),
            ("show_goal", ColumnDef::with_default(ColumnType::Boolean, json!(false))),
            ("fixed_amounts", ColumnDef::nullable(ColumnType::Json)),
            ("currency", ColumnDef::with_default(ColumnType::String, json!("EUR"))),
        ])
    }

    fn row(value: serde_json::Value) -> RowMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn non_numeric_integer_becomes_null_not_zero() {
        let mut r = row(json!({"id": "abc"}));
        test_schema().cast_types(&mut r);
        assert_eq!(r["id"], Value::Null);
    }

    #[test]
    fn numeric_string_becomes_float() {
        let mut r = row(json!({"goal": "10.50"}));
        test_schema().cast_types(&mut r);
        assert_eq!(r["goal"], json!(10.5));
    }

    #[test]
    fn boolean_string_zero_is_false() {
        let mut r = row(json!({"show_goal": "0"}));
        test_schema().cast_types(&mut r);
        assert_eq!(r["show_goal"], json!(false));
    }

    #[test]
    fn boolean_one_like_values_are_true() {
        for raw in [json!("1"), json!(1), json!(true), json!("true")] {
            let mut r = row(json!({ "show_goal": raw }));
            test_schema().cast_types(&mut r);
            assert_eq!(r["show_goal"], json!(true), "input should be truthy");
        }
    }

    #[test]
    fn json_column_decodes_encoded_strings() {
        let mut r = row(json!({"fixed_amounts": "[5, 10, 25]"}));
        test_schema().cast_types(&mut r);
        assert_eq!(r["fixed_amounts"], json!([5, 10, 25]));
    }

    #[test]
    fn json_column_passes_structured_values_through() {
        let mut r = row(json!({"fixed_amounts": [5, 10]}));
        test_schema().cast_types(&mut r);
        assert_eq!(r["fixed_amounts"], json!([5, 10]));
    }

    #[test]
    fn json_column_invalid_payload_becomes_null() {
        let mut r = row(json!({"fixed_amounts": "{not json"}));
        test_schema().cast_types(&mut r);
        assert_eq!(r["fixed_amounts"], Value::Null);
    }

    #[test]
    fn unknown_keys_pass_through_unmodified() {
        let mut r = row(json!({"created_at": "2026-01-01T00:00:00Z", "goal": "7"}));
        test_schema().cast_types(&mut r);
        assert_eq!(r["created_at"], json!("2026-01-01T00:00:00Z"));
        assert_eq!(r["goal"], json!(7.0));
    }

    #[test]
    fn sanitize_drops_unknown_keys_and_nulls_empty_strings() {
        let schema = test_schema();
        let data = row(json!({"title": "", "unknown_field": "x"}));
        let clean = schema.sanitize(&data);
        assert_eq!(clean.get("title"), Some(&Value::Null));
        assert!(!clean.contains_key("unknown_field"));
    }

    #[test]
    fn sanitize_keeps_empty_string_for_non_nullable_columns() {
        let schema = test_schema();
        let data = row(json!({"currency": ""}));
        let clean = schema.sanitize(&data);
        assert_eq!(clean["currency"], json!(""));
    }

    #[test]
    fn defaults_fill_absent_keys_only() {
        let schema = test_schema();
        let mut r = row(json!({"title": "Summer drive"}));
        schema.apply_defaults(&mut r);
        assert_eq!(r["show_goal"], json!(false));
        assert_eq!(r["currency"], json!("EUR"));
        assert_eq!(r["title"], json!("Summer drive"));
    }

    #[test]
    fn defaults_replace_null_in_non_nullable_columns() {
        let schema = test_schema();
        let mut r = row(json!({"currency": null, "goal": null}));
        schema.apply_defaults(&mut r);
        assert_eq!(r["currency"], json!("EUR"));
        // Nullable column stays null.
        assert_eq!(r["goal"], Value::Null);
    }
}
