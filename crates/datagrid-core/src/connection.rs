//! Backend connection trait

use crate::{QueryResult, Result, Value};
use async_trait::async_trait;

/// A database connection consumed by the SQL-builder and ORM-query sources.
///
/// Only the narrow query surface the grid needs is exposed; connection
/// lifecycle belongs to whoever hands the connection to the grid.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgres", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement that modifies data (INSERT/UPDATE/DELETE/DDL)
    ///
    /// Returns the number of affected rows.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a query that returns rows (SELECT)
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;
}
