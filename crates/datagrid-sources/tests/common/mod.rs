//! Common test utilities and mocks

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use datagrid_core::{Connection, GridError, QueryResult, Result, Row, Value};
use datagrid_sources::SqliteConnection;

/// Mock connection that records every SQL statement it receives.
///
/// Responses are picked by substring match on the SQL, falling back to the
/// default result.
pub struct MockConnection {
    pub driver: String,
    pub should_fail: bool,
    pub query_results: Vec<QueryResult>,
    pub query_responses: Vec<(String, QueryResult)>,
    pub query_count: Arc<parking_lot::Mutex<usize>>,
    /// Log of all SQL queries executed, with their parameters
    pub query_log: Arc<parking_lot::Mutex<Vec<(String, Vec<Value>)>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            driver: "sqlite".to_string(),
            should_fail: false,
            query_results: vec![],
            query_responses: vec![],
            query_count: Arc::new(parking_lot::Mutex::new(0)),
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn with_result(mut self, result: QueryResult) -> Self {
        self.query_results.push(result);
        self
    }

    /// Register a response for queries containing the given SQL pattern.
    pub fn with_query_response(
        mut self,
        sql_contains: impl Into<String>,
        result: QueryResult,
    ) -> Self {
        self.query_responses.push((sql_contains.into(), result));
        self
    }

    pub fn query_count(&self) -> usize {
        *self.query_count.lock()
    }

    pub fn query_log(&self) -> Vec<(String, Vec<Value>)> {
        self.query_log.lock().clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    async fn execute(&self, _sql: &str, _params: &[Value]) -> Result<u64> {
        if self.should_fail {
            Err(GridError::Query("Execute failed".into()))
        } else {
            Ok(1)
        }
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        *self.query_count.lock() += 1;
        self.query_log.lock().push((sql.to_string(), params.to_vec()));

        if self.should_fail {
            return Err(GridError::Query("Query failed".into()));
        }

        for (pattern, result) in &self.query_responses {
            if sql.contains(pattern.as_str()) {
                return Ok(result.clone());
            }
        }

        Ok(self.query_results.first().cloned().unwrap_or_default())
    }
}

pub fn mock_query_result(column_names: Vec<&str>, row_data: Vec<Vec<Value>>) -> QueryResult {
    let columns: Vec<String> = column_names.iter().map(|name| name.to_string()).collect();
    let rows = row_data
        .into_iter()
        .map(|values| Row::new(columns.clone(), values))
        .collect();
    QueryResult { columns, rows }
}

/// In-memory `book` table shared by the backend consistency tests
pub fn book_database() -> Arc<SqliteConnection> {
    let conn = SqliteConnection::open_in_memory().expect("open in-memory database");
    conn.execute_batch(
        "CREATE TABLE book (id INTEGER PRIMARY KEY, title TEXT, vol INTEGER);
         INSERT INTO book (id, title, vol) VALUES
            (1, 'x', 67),
            (2, 'y', 86),
            (3, 'z', 85),
            (4, 'x_y', 12),
            (5, 'X', 40),
            (6, NULL, 30);",
    )
    .expect("create fixture table");
    Arc::new(conn)
}

/// The `book` table rows as in-memory rows
pub fn book_rows() -> Vec<datagrid_core::RawRow> {
    [
        (1, Some("x"), 67),
        (2, Some("y"), 86),
        (3, Some("z"), 85),
        (4, Some("x_y"), 12),
        (5, Some("X"), 40),
        (6, None, 30),
    ]
    .into_iter()
    .map(|(id, title, vol)| {
        [
            ("id".to_string(), Value::Int64(id)),
            ("title".to_string(), title.map(Value::from).unwrap_or(Value::Null)),
            ("vol".to_string(), Value::Int64(vol)),
        ]
        .into_iter()
        .collect()
    })
    .collect()
}
