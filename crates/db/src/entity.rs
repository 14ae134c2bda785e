//! The [`Entity`] trait binding typed models to their declared schemas.

use obol_core::error::CoreError;
use obol_core::schema::EntitySchema;
use obol_core::types::{DbId, RowMap};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A typed entity backed by one table and one [`EntitySchema`].
///
/// Hydration goes through the schema: raw row maps are cast to their
/// semantic types and filled with declared defaults before the typed struct
/// is built, so rows written by older schema versions (or hand-edited data)
/// still deserialize.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin {
    /// Backing table name.
    const TABLE: &'static str;

    /// Human-readable entity name used in error messages.
    const ENTITY: &'static str;

    fn schema() -> &'static EntitySchema;

    fn id(&self) -> DbId;

    /// Build a typed entity from a raw row map.
    fn from_row(mut row: RowMap) -> Result<Self, CoreError> {
        let schema = Self::schema();
        schema.cast_types(&mut row);
        schema.apply_defaults(&mut row);
        serde_json::from_value(Value::Object(row)).map_err(|e| {
            CoreError::Internal(format!("failed to hydrate {}: {e}", Self::ENTITY))
        })
    }

    /// Shallow projection back to a row map.
    ///
    /// Keys outside the schema (id, timestamps) are dropped again by the
    /// repository's sanitize step before any SQL is built.
    fn to_row(&self) -> RowMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RowMap::new(),
        }
    }
}

/// Serialize a DTO into a row map for insert/update calls.
pub fn to_row_map<T: Serialize>(value: &T) -> Result<RowMap, CoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoreError::Internal(format!(
            "expected an object row, got {other}"
        ))),
        Err(e) => Err(CoreError::Internal(format!("row serialization failed: {e}"))),
    }
}
