/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A row (or partial row) as an untyped column/value map.
///
/// This is the currency of the schema-descriptor layer: repositories read
/// rows into this shape, cast them against the entity schema, and only then
/// hydrate typed entities from them.
pub type RowMap = serde_json::Map<String, serde_json::Value>;
