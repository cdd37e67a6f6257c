//! Generic CRUD execution against PostgreSQL.

use crate::case::object_keys_to_camel_case;
use crate::error::AppError;
use crate::model::{PagedDtos, Record, ID_KEY};
use crate::pagination::PageRequest;
use crate::schema::{EntityKind, EntitySchema};
use crate::service::{merge_patch, RequestValidator};
use crate::sql::{count, delete, insert, select_by_id, select_page, update, PgBindValue, QueryBuf};
use serde_json::Value;
use sqlx::PgPool;

/// PostgreSQL foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct CrudService;

impl CrudService {
    /// One page ordered by id plus the total row count.
    pub async fn list_page(
        pool: &PgPool,
        schema: &EntitySchema,
        db_schema: &str,
        page: PageRequest,
    ) -> Result<PagedDtos<Record>, AppError> {
        let total: (i64,) = sqlx::query_as(&count(schema, db_schema).sql)
            .fetch_one(pool)
            .await?;
        let offset = u64::from(page.page_number.saturating_sub(1)) * u64::from(page.page_size);
        let q = select_page(schema, db_schema, page.page_size, offset);
        let dtos = Self::query_many(pool, &q).await?;
        Ok(PagedDtos {
            dtos,
            total_count: total.0,
        })
    }

    /// Fetch one row by primary key.
    pub async fn read(
        pool: &PgPool,
        schema: &EntitySchema,
        db_schema: &str,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        let q = select_by_id(schema, db_schema, id);
        Self::query_optional(pool, &q).await
    }

    /// Validate and insert; the database assigns the id.
    pub async fn create(
        pool: &PgPool,
        schema: &EntitySchema,
        db_schema: &str,
        body: &Record,
    ) -> Result<Record, AppError> {
        let clean = RequestValidator::validate(schema, body)?;
        let q = insert(schema, db_schema, &clean);
        Self::query_optional(pool, &q)
            .await
            .map_err(|e| reference_error(schema.kind, e))?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Validate and replace every stored field. `None` when the id does not exist.
    pub async fn update(
        pool: &PgPool,
        schema: &EntitySchema,
        db_schema: &str,
        id: i64,
        body: &Record,
    ) -> Result<Option<Record>, AppError> {
        let clean = RequestValidator::validate(schema, body)?;
        let q = update(schema, db_schema, id, &clean);
        Self::query_optional(pool, &q)
            .await
            .map_err(|e| reference_error(schema.kind, e))
    }

    /// Merge-patch the current wire record and store the result. The id cannot change.
    pub async fn patch(
        pool: &PgPool,
        schema: &EntitySchema,
        db_schema: &str,
        id: i64,
        patch: &Value,
    ) -> Result<Option<Record>, AppError> {
        let Some(current) = Self::read(pool, schema, db_schema, id).await? else {
            return Ok(None);
        };
        let mut doc = Value::Object(current);
        merge_patch(&mut doc, patch);
        let Value::Object(mut merged) = doc else {
            return Err(AppError::BadRequest(format!("Patch for {} must be a JSON object.", schema.kind)));
        };
        merged.insert(ID_KEY.into(), Value::from(id));
        Self::update(pool, schema, db_schema, id, &merged).await
    }

    /// Delete one row. `false` when the id does not exist; a referencing row blocks the delete.
    pub async fn delete(
        pool: &PgPool,
        schema: &EntitySchema,
        db_schema: &str,
        id: i64,
    ) -> Result<bool, AppError> {
        let q = delete(schema, db_schema, id);
        match Self::query_optional(pool, &q).await {
            Ok(row) => Ok(row.is_some()),
            Err(AppError::Db(e)) if is_foreign_key_violation(&e) => {
                tracing::info!(kind = %schema.kind, id, "delete blocked by referencing rows");
                Err(AppError::Constraint(format!(
                    "Cannot delete {}, it has reference in Sale.",
                    schema.kind
                )))
            }
            Err(e) => Err(e),
        }
    }

    async fn query_optional(pool: &PgPool, q: &QueryBuf) -> Result<Option<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_record(&r)))
    }

    async fn query_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION),
        _ => false,
    }
}

/// A write naming a record that does not exist.
fn reference_error(kind: EntityKind, e: AppError) -> AppError {
    match e {
        AppError::Db(ref db) if is_foreign_key_violation(db) => {
            AppError::Validation(format!("{} refers to a record that does not exist.", kind))
        }
        other => other,
    }
}

/// Row to wire record: snake_case columns become camelCase keys.
fn row_to_record(row: &sqlx::postgres::PgRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let map = row
        .columns()
        .iter()
        .map(|col| (col.name().to_string(), cell_to_value(row, col.name())))
        .collect();
    object_keys_to_camel_case(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
