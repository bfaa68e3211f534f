//! The database capability: a SQLite pool behind statement-level helpers.
//!
//! Constructed once at process start and passed by reference through
//! `AppState`; handlers never reach for a global handle.

use crate::error::AppError;
use crate::response::RunResult;
use crate::sql::Statement;
use crate::tables::create_all_sql;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, SqliteConnection, SqlitePool, TypeInfo, ValueRef};
use std::str::FromStr;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `path`. Foreign keys are
    /// enforced on every connection.
    pub async fn connect(path: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(AppError::Db)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Database { pool })
    }

    /// In-memory database on a single connection, for tests and local runs.
    pub async fn open_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(AppError::Db)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Database { pool })
    }

    /// Create tables, triggers, and constraints. Idempotent.
    pub async fn apply_schema(&self) -> Result<(), AppError> {
        let ddl = create_all_sql();
        sqlx::raw_sql(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// Execute a mutating statement once; returns the changes summary.
    pub async fn run(&self, stmt: &Statement) -> Result<RunResult, AppError> {
        tracing::debug!(sql = %stmt.sql, args = ?stmt.args, "run");
        let mut query = sqlx::query(&stmt.sql);
        for arg in &stmt.args {
            query = query.bind(arg.clone());
        }
        let result = query.execute(&self.pool).await?;
        Ok(RunResult {
            changes: result.rows_affected(),
            last_insert_rowid: result.last_insert_rowid(),
        })
    }

    /// Execute a read statement once; returns at most one row as JSON.
    pub async fn row(&self, stmt: &Statement) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %stmt.sql, args = ?stmt.args, "row");
        let mut query = sqlx::query(&stmt.sql);
        for arg in &stmt.args {
            query = query.bind(arg.clone());
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    /// Execute a read statement once; returns all rows as JSON.
    pub async fn rows(&self, stmt: &Statement) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %stmt.sql, args = ?stmt.args, "rows");
        let mut query = sqlx::query(&stmt.sql);
        for arg in &stmt.args {
            query = query.bind(arg.clone());
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// Begin a transaction for multi-read handlers that need one snapshot.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Sqlite>, AppError> {
        Ok(self.pool.begin().await?)
    }

    /// `row` against an open transaction.
    pub async fn row_tx(
        conn: &mut SqliteConnection,
        stmt: &Statement,
    ) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %stmt.sql, args = ?stmt.args, "row (tx)");
        let mut query = sqlx::query(&stmt.sql);
        for arg in &stmt.args {
            query = query.bind(arg.clone());
        }
        let row = query.fetch_optional(conn).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    /// `rows` against an open transaction.
    pub async fn rows_tx(
        conn: &mut SqliteConnection,
        stmt: &Statement,
    ) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %stmt.sql, args = ?stmt.args, "rows (tx)");
        let mut query = sqlx::query(&stmt.sql);
        for arg in &stmt.args {
            query = query.bind(arg.clone());
        }
        let rows = query.fetch_all(conn).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &SqliteRow) -> Value {
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        map.insert(col.name().to_string(), cell_to_value(row, col.ordinal()));
    }
    Value::Object(map)
}

/// Decode by the value's storage class so TEXT never collapses to 0.
fn cell_to_value(row: &SqliteRow, idx: usize) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => row
            .try_get::<i64, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(idx)
            .ok()
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(idx)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
