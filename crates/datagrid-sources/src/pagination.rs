//! Lazy page fetching

use async_trait::async_trait;
use datagrid_core::{RawRow, Result};

/// Total count plus offset/limit fetch over a finalized query or collection.
///
/// Rows are keyed by column unique id.
#[async_trait]
pub trait PaginationAdapter: Send + Sync {
    async fn count(&self) -> Result<usize>;

    async fn get_items(&self, offset: usize, limit: usize) -> Result<Vec<RawRow>>;
}

/// Paginator over rows already held in memory
#[derive(Debug, Clone, Default)]
pub struct ArrayPaginator {
    rows: Vec<RawRow>,
}

impl ArrayPaginator {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl PaginationAdapter for ArrayPaginator {
    async fn count(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    async fn get_items(&self, offset: usize, limit: usize) -> Result<Vec<RawRow>> {
        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }
}
