//! SQLite connection used by the SQL-builder and ORM-query sources

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use datagrid_core::{Connection, GridError, QueryResult, Result, Row, Value};
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};

/// SQLite connection wrapper
#[derive(Clone)]
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
}

impl SqliteConnection {
    /// Open a SQLite database file, or an in-memory one for `":memory:"`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening SQLite database");

        if path == Path::new(":memory:") {
            return Self::open_in_memory();
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
            GridError::Configuration(format!(
                "Failed to open SQLite database at '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = RusqliteConnection::open_in_memory().map_err(|e| {
            GridError::Configuration(format!("Failed to open in-memory database: {}", e))
        })?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a script of several statements, e.g. fixture setup
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing SQL batch");
        self.conn
            .lock()
            .execute_batch(sql)
            .map_err(|e| GridError::Query(format!("Failed to execute batch: {}", e)))
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        tracing::debug!(sql = %sql, "executing statement");
        let conn = self.conn.lock();
        let params: Vec<rusqlite::types::Value> = params.iter().map(value_to_rusqlite).collect();
        let affected = conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|e| GridError::Query(format!("Failed to execute statement: {}", e)))?;
        Ok(affected as u64)
    }

    #[tracing::instrument(skip(self, params), fields(params = params.len()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let conn = self.conn.lock();
        let params: Vec<rusqlite::types::Value> = params.iter().map(value_to_rusqlite).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| GridError::Query(format!("Failed to prepare query: {}", e)))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(|e| GridError::Query(format!("Failed to execute query: {}", e)))?;

        while let Some(row) = query_rows
            .next()
            .map_err(|e| GridError::Query(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::with_capacity(column_names.len());
            for i in 0..column_names.len() {
                values.push(rusqlite_to_value(row, i)?);
            }
            rows.push(Row::new(column_names.clone(), values));
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            rows = rows.len(),
            execution_time_ms,
            "SQLite query completed"
        );

        Ok(QueryResult {
            columns: column_names,
            rows,
        })
    }
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;

    match value {
        Value::Null => Sql::Null,
        Value::Bool(b) => Sql::Integer(i64::from(*b)),
        Value::Int64(i) => Sql::Integer(*i),
        Value::Float64(f) => Sql::Real(*f),
        Value::Decimal(d) => Sql::Text(d.clone()),
        Value::String(s) => Sql::Text(s.clone()),
        Value::Date(d) => Sql::Text(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => Sql::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Array(_) => Sql::Text(value.to_string()),
    }
}

fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| GridError::Query(e.to_string()))?;

    Ok(match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_rows() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        conn.execute_batch("CREATE TABLE book (title TEXT, vol INTEGER);")
            .unwrap();
        let affected = conn
            .execute(
                "INSERT INTO book VALUES (?, ?)",
                &[Value::from("Dune"), Value::Int64(3)],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let result = conn
            .query("SELECT title, vol FROM book WHERE vol = ?", &[Value::Int64(3)])
            .await
            .unwrap();
        assert_eq!(result.columns, vec!["title", "vol"]);
        assert_eq!(result.rows[0].values, vec![Value::from("Dune"), Value::Int64(3)]);
    }

    #[tokio::test]
    async fn reports_prepare_failures() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        let err = conn.query("SELECT * FROM missing", &[]).await.unwrap_err();
        assert!(matches!(err, GridError::Query(_)));
    }
}
