use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, PgPool, Row};
use std::time::Instant;

use crate::config;
use crate::database::manager::DatabaseError;
use crate::query::{BuiltQuery, SqlValue};
use crate::resources::ResourceSpec;

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;

/// CRUD over one registered table. Rows come back as JSON objects via
/// `row_to_json`, so no per-table structs are needed.
pub struct Repository {
    spec: &'static ResourceSpec,
    pool: PgPool,
}

impl Repository {
    pub fn new(spec: &'static ResourceSpec, pool: PgPool) -> Self {
        Self { spec, pool }
    }

    /// One page of rows plus the total matching count.
    pub async fn select_page(&self, query: &BuiltQuery) -> Result<(Vec<Value>, i64), DatabaseError> {
        let select = format!(
            "SELECT row_to_json(t) AS row FROM ({}) t",
            query.select_sql(self.spec.table)
        );
        let rows = self.fetch_rows(&select, &query.params).await?;

        let count_sql = query.count_sql(self.spec.table);
        let started = Instant::now();
        let mut q = sqlx::query(&count_sql);
        for p in query.params.iter() {
            q = bind_value(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        log_timing(&count_sql, started);
        let total: i64 = row.try_get("count")?;

        Ok((rows.into_iter().map(Value::Object).collect(), total))
    }

    pub async fn select_one(&self, id: i64) -> Result<Option<Map<String, Value>>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE \"id\" = $1) t",
            self.spec.table
        );
        let rows = self.fetch_rows(&sql, &[SqlValue::Int(id)]).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn select_404(&self, id: i64) -> Result<Map<String, Value>, DatabaseError> {
        self.select_one(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", self.spec.table, id)))
    }

    pub async fn insert(&self, values: &[(&'static str, SqlValue)]) -> Result<Map<String, Value>, DatabaseError> {
        let (sql, params) = insert_sql(self.spec.table, values);

        self.fetch_rows(&sql, &params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::QueryError(format!("insert into {} returned no row", self.spec.table)))
    }

    pub async fn update(&self, id: i64, values: &[(&'static str, SqlValue)]) -> Result<Map<String, Value>, DatabaseError> {
        let (sql, params) = update_sql(self.spec.table, id, values);

        self.fetch_rows(&sql, &params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", self.spec.table, id)))
    }

    pub async fn delete(&self, id: i64) -> Result<Map<String, Value>, DatabaseError> {
        let (sql, params) = delete_sql(self.spec.table, id);

        self.fetch_rows(&sql, &params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", self.spec.table, id)))
    }

    async fn fetch_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Map<String, Value>>, DatabaseError> {
        let started = Instant::now();
        let mut q = sqlx::query(sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        log_timing(sql, started);

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match row.try_get::<Value, _>("row")? {
                Value::Object(map) => out.push(map),
                other => {
                    return Err(DatabaseError::QueryError(format!(
                        "unexpected row format: {}",
                        other
                    )))
                }
            }
        }
        Ok(out)
    }
}

fn returning_json(statement: String) -> String {
    format!("WITH t AS ({}) SELECT row_to_json(t) AS row FROM t", statement)
}

/// `INSERT ... RETURNING *` wrapped to yield one JSON row.
pub fn insert_sql(table: &str, values: &[(&'static str, SqlValue)]) -> (String, Vec<SqlValue>) {
    let mut params = Vec::with_capacity(values.len());
    let (columns, placeholders): (Vec<String>, Vec<String>) = values
        .iter()
        .map(|(column, value)| (format!("\"{}\"", column), placeholder(value, &mut params)))
        .unzip();

    let insert = if columns.is_empty() {
        format!("INSERT INTO \"{}\" DEFAULT VALUES RETURNING *", table)
    } else {
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            table,
            columns.join(", "),
            placeholders.join(", ")
        )
    };

    (returning_json(insert), params)
}

/// The id is always the last parameter; `updated_at` is stamped by the database.
pub fn update_sql(table: &str, id: i64, values: &[(&'static str, SqlValue)]) -> (String, Vec<SqlValue>) {
    let mut params = Vec::with_capacity(values.len() + 1);
    let mut assignments: Vec<String> = values
        .iter()
        .map(|(column, value)| format!("\"{}\" = {}", column, placeholder(value, &mut params)))
        .collect();
    assignments.push("\"updated_at\" = NOW()".to_string());
    let id_placeholder = placeholder(&SqlValue::Int(id), &mut params);

    let update = format!(
        "UPDATE \"{}\" SET {} WHERE \"id\" = {} RETURNING *",
        table,
        assignments.join(", "),
        id_placeholder
    );

    (returning_json(update), params)
}

pub fn delete_sql(table: &str, id: i64) -> (String, Vec<SqlValue>) {
    let delete = format!("DELETE FROM \"{}\" WHERE \"id\" = $1 RETURNING *", table);
    (returning_json(delete), vec![SqlValue::Int(id)])
}

/// NULLs are written as literals: a typed NULL parameter would not coerce
/// to every column type.
fn placeholder(value: &SqlValue, params: &mut Vec<SqlValue>) -> String {
    if matches!(value, SqlValue::Null) {
        return "NULL".to_string();
    }
    params.push(value.clone());
    format!("${}", params.len())
}

fn bind_value<'q>(q: PgQuery<'q>, v: &'q SqlValue) -> PgQuery<'q> {
    match v {
        SqlValue::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Float(f) => q.bind(*f),
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::Timestamp(t) => q.bind(*t),
        SqlValue::Date(d) => q.bind(*d),
        SqlValue::Json(j) => q.bind(j.clone()),
    }
}

fn log_timing(sql: &str, started: Instant) {
    let settings = &config::config().database;
    let elapsed = started.elapsed();
    if elapsed.as_millis() as u64 >= settings.slow_query_threshold_ms {
        tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "Slow query: {}", sql);
    } else if settings.enable_query_logging {
        tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "{}", sql);
    }
}
