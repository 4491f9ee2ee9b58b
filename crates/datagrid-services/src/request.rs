//! What a caller asks the grid for

use datagrid_core::SortDirection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub column: String,
    pub direction: SortDirection,
}

/// Raw filter input typed by a user for one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub column: String,
    pub input: String,
}

/// One logical request against a grid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridRequest {
    /// Correlates interactive requests with later exports
    pub session_id: String,
    /// Falls back to the grid's default renderer
    pub renderer: Option<String>,
    /// 1-based; defaults to the first page
    pub page: Option<usize>,
    pub items_per_page: Option<usize>,
    pub sorts: Vec<SortRequest>,
    pub filters: Vec<FilterRequest>,
}

impl GridRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = Some(renderer.into());
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_items_per_page(mut self, items: usize) -> Self {
        self.items_per_page = Some(items);
        self
    }

    pub fn sort_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(SortRequest {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn filter(mut self, column: impl Into<String>, input: impl Into<String>) -> Self {
        self.filters.push(FilterRequest {
            column: column.into(),
            input: input.into(),
        });
        self
    }
}
