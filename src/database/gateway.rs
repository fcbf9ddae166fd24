use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use thiserror::Error;
use tracing::info;

/// Errors from the data gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Parameterized-query wrapper around the connection pool. Every externally
/// supplied value is bound as a `$n` parameter; identifiers (table and column
/// names, which never originate from requests) are validated and quoted.
/// Performs no validation of row contents, only safe execution and typed
/// result shaping.
#[derive(Clone)]
pub struct Gateway {
    pool: PgPool,
}

impl Gateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, GatewayError> {
        let mut q = sqlx::query(sql);
        for p in params {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Fetch exactly one row; a missing row becomes a typed NotFound.
    pub async fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> Result<T, GatewayError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        match self.fetch_optional(sql, params).await? {
            Some(row) => Ok(row),
            None => Err(GatewayError::NotFound("Record not found".to_string())),
        }
    }

    pub async fn fetch_optional<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, GatewayError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut q = sqlx::query_as::<_, T>(sql);
        for p in params {
            q = bind_param_as(q, p);
        }
        Ok(q.fetch_optional(&self.pool).await?)
    }

    pub async fn fetch_all<T>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>, GatewayError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut q = sqlx::query_as::<_, T>(sql);
        for p in params {
            q = bind_param_as(q, p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    /// Fetch a single integer column, e.g. a COUNT(*).
    pub async fn fetch_scalar(&self, sql: &str, params: &[Value]) -> Result<i64, GatewayError> {
        let mut q = sqlx::query(sql);
        for p in params {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }

    /// Insert a row from (column, value) pairs and return the generated id.
    pub async fn insert(&self, table: &str, values: &[(&str, Value)]) -> Result<i64, GatewayError> {
        let sql = build_insert_sql(table, values)?;
        let mut q = sqlx::query(&sql);
        for (_, v) in values {
            q = bind_param(q, v);
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }

    /// Update columns of the row whose `id` equals `id`.
    pub async fn update_by_id(
        &self,
        table: &str,
        values: &[(&str, Value)],
        id: i64,
    ) -> Result<u64, GatewayError> {
        let sql = build_update_sql(table, values)?;
        let mut q = sqlx::query(&sql);
        for (_, v) in values {
            q = bind_param(q, v);
        }
        q = q.bind(id);
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_id(&self, table: &str, id: i64) -> Result<u64, GatewayError> {
        let sql = format!(
            "DELETE FROM {} WHERE \"id\" = $1",
            quote_identifier(table)?
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Begin an explicit transaction. Callers hold cross-statement atomicity
    /// through `commit`/`rollback` on the returned handle.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, GatewayError> {
        Ok(self.pool.begin().await?)
    }

    /// Apply a batch of migration statements inside a single transaction.
    pub async fn apply_migrations(&self, statements: &[&str]) -> Result<(), GatewayError> {
        let mut tx = self.begin().await?;
        for statement in statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| GatewayError::QueryError(format!("migration failed: {}", e)))?;
        }
        tx.commit().await?;
        info!("Applied {} migration statements", statements.len());
        Ok(())
    }

    /// Pings the pool to ensure connectivity.
    pub async fn health_check(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn build_insert_sql(table: &str, values: &[(&str, Value)]) -> Result<String, GatewayError> {
    if values.is_empty() {
        return Err(GatewayError::QueryError(
            "insert requires at least one column".to_string(),
        ));
    }
    let columns = values
        .iter()
        .map(|(name, _)| quote_identifier(name))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let placeholders = (1..=values.len())
        .map(|n| format!("${}", n))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING \"id\"",
        quote_identifier(table)?,
        columns,
        placeholders
    ))
}

fn build_update_sql(table: &str, values: &[(&str, Value)]) -> Result<String, GatewayError> {
    if values.is_empty() {
        return Err(GatewayError::QueryError(
            "update requires at least one column".to_string(),
        ));
    }
    let assignments = values
        .iter()
        .enumerate()
        .map(|(i, (name, _))| Ok(format!("{} = ${}", quote_identifier(name)?, i + 1)))
        .collect::<Result<Vec<_>, GatewayError>>()?
        .join(", ");
    Ok(format!(
        "UPDATE {} SET {} WHERE \"id\" = ${}",
        quote_identifier(table)?,
        assignments,
        values.len() + 1
    ))
}

/// Validate then quote a SQL identifier. Identifiers come from code, not from
/// requests, so the character set is deliberately narrow.
fn quote_identifier(name: &str) -> Result<String, GatewayError> {
    if !is_valid_identifier(name) {
        return Err(GatewayError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

fn bind_param_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
