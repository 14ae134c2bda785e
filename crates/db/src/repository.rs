//! Generic schema-driven repository over one entity's backing table.
//!
//! Reads select the whole row as `jsonb` and run it through the entity
//! schema's type casting before hydration; writes are sanitized against the
//! schema so unknown columns never reach the SQL builder. Filters are an
//! equality map ANDed together. Storage errors propagate as [`sqlx::Error`]
//! and are classified at the API boundary, never swallowed here.

use std::marker::PhantomData;

use obol_core::schema::{ColumnDef, ColumnType};
use obol_core::types::{DbId, RowMap};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::entity::Entity;

/// Ordering direction for [`Repository::find_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Generic CRUD over `E`'s backing table.
pub struct Repository<E: Entity> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch one entity by primary key.
    pub async fn get(&self, id: DbId) -> Result<Option<E>, sqlx::Error> {
        let sql = format!("SELECT to_jsonb(t) FROM {} t WHERE id = $1", E::TABLE);
        let row: Option<(Value,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(value,)| hydrate::<E>(value)).transpose()
    }

    /// Fetch the first entity matching the equality filters.
    pub async fn find_one(&self, filters: &RowMap) -> Result<Option<E>, sqlx::Error> {
        let mut found = self.find_all(filters, None, Some(1), None).await?;
        Ok(found.pop())
    }

    /// Fetch all entities matching the equality filters.
    ///
    /// Filter keys absent from the schema are dropped (they cannot name
    /// real columns), and filter values are cast to their semantic types so
    /// e.g. a `"42"` string matches an integer column. An order column is
    /// honored only when the schema (or the bookkeeping columns) declare it.
    pub async fn find_all(
        &self,
        filters: &RowMap,
        order: Option<(&str, Order)>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<E>, sqlx::Error> {
        let filters = normalize::<E>(filters);

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT to_jsonb(t) FROM {} t WHERE TRUE", E::TABLE));

        for (column, value) in &filters {
            let def = schema_def::<E>(column);
            if value.is_null() {
                qb.push(format!(" AND {column} IS NULL"));
            } else {
                qb.push(format!(" AND {column} = "));
                bind_value(&mut qb, def.column_type, value);
            }
        }

        if let Some((column, direction)) = order {
            if is_orderable::<E>(column) {
                qb.push(format!(" ORDER BY {column} {}", direction.sql()));
            }
        }
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
        if let Some(offset) = offset {
            qb.push(" OFFSET ");
            qb.push_bind(offset);
        }

        let rows: Vec<(Value,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(|(value,)| hydrate::<E>(value)).collect()
    }

    /// Insert a new row, returning the generated id.
    ///
    /// Null values are dropped so column defaults apply; inserting with no
    /// remaining columns is a programming error.
    pub async fn insert(&self, data: &RowMap) -> Result<DbId, sqlx::Error> {
        let mut row = normalize::<E>(data);
        row.remove("id");
        row.retain(|_, value| !value.is_null());
        if row.is_empty() {
            return Err(sqlx::Error::Protocol(format!(
                "insert into {} with no columns",
                E::TABLE
            )));
        }

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} (", E::TABLE));
        let columns: Vec<&str> = ordered_columns::<E>(&row);
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
        }
        qb.push(") VALUES (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            bind_value(&mut qb, schema_def::<E>(column).column_type, &row[*column]);
        }
        qb.push(") RETURNING id");

        let (id,): (DbId,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(id)
    }

    /// Apply a partial update to the row with the given id.
    ///
    /// An empty change set is a successful no-op. Returns whether a row was
    /// actually updated.
    pub async fn update(&self, id: DbId, changes: &RowMap) -> Result<bool, sqlx::Error> {
        let mut row = normalize::<E>(changes);
        row.remove("id");
        if row.is_empty() {
            return Ok(true);
        }

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ", E::TABLE));
        let columns: Vec<&str> = ordered_columns::<E>(&row);
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("{column} = "));
            bind_value(&mut qb, schema_def::<E>(column).column_type, &row[*column]);
        }
        qb.push(", updated_at = NOW() WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update a full entity via its row projection.
    pub async fn update_entity(&self, entity: &E) -> Result<bool, sqlx::Error> {
        self.update(entity.id(), &entity.to_row()).await
    }

    /// Delete the row with the given id. Returns whether a row was removed.
    pub async fn delete(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count rows matching the equality filters.
    pub async fn count(&self, filters: &RowMap) -> Result<i64, sqlx::Error> {
        let filters = normalize::<E>(filters);
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {} t WHERE TRUE", E::TABLE));
        for (column, value) in &filters {
            let def = schema_def::<E>(column);
            if value.is_null() {
                qb.push(format!(" AND {column} IS NULL"));
            } else {
                qb.push(format!(" AND {column} = "));
                bind_value(&mut qb, def.column_type, value);
            }
        }
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sanitize then cast a column/value map against the entity schema.
fn normalize<E: Entity>(data: &RowMap) -> RowMap {
    let schema = E::schema();
    let mut row = schema.sanitize(data);
    schema.cast_types(&mut row);
    row
}

/// Row keys in schema declaration order, for deterministic SQL.
fn ordered_columns<'a, E: Entity>(row: &'a RowMap) -> Vec<&'a str> {
    E::schema()
        .column_names()
        .filter(|name| row.contains_key(*name))
        .collect()
}

fn schema_def<E: Entity>(column: &str) -> &'static ColumnDef {
    // Keys survive `normalize` only when the schema declares them.
    E::schema()
        .get(column)
        .unwrap_or_else(|| panic!("column {column} missing from {} schema", E::ENTITY))
}

/// Columns accepted in ORDER BY: schema columns plus the bookkeeping pair.
fn is_orderable<E: Entity>(column: &str) -> bool {
    E::schema().contains(column) || column == "created_at" || column == "updated_at"
}

/// Bind a cast JSON value with the SQL type its column expects.
fn bind_value(qb: &mut QueryBuilder<'_, Postgres>, column_type: ColumnType, value: &Value) {
    match column_type {
        ColumnType::Integer => {
            qb.push_bind(value.as_i64());
        }
        ColumnType::Float => {
            qb.push_bind(value.as_f64());
        }
        ColumnType::Boolean => {
            qb.push_bind(value.as_bool());
        }
        ColumnType::Json => {
            qb.push_bind(sqlx::types::Json(value.clone()));
        }
        ColumnType::String | ColumnType::Email | ColumnType::Url => {
            qb.push_bind(value.as_str().map(str::to_owned));
        }
    }
}

fn hydrate<E: Entity>(value: Value) -> Result<E, sqlx::Error> {
    let Value::Object(map) = value else {
        return Err(sqlx::Error::Decode(
            format!("{} row did not decode to an object", E::ENTITY).into(),
        ));
    };
    E::from_row(map).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
