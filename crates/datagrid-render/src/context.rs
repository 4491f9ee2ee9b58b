//! Everything a renderer gets to see

use std::sync::Arc;

use datagrid_core::{
    Column, CsvSettings, Filter, GridError, PreparedRow, Result, SortCondition, SortDirection,
    Style,
};

/// One page (or, for exports, the exported rows) ready for output
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub grid_id: String,
    pub title: String,
    pub columns: Vec<Arc<Column>>,
    pub rows: Vec<PreparedRow>,
    /// Row count of the whole filtered result, not just `rows`
    pub total: usize,
    /// 1-based
    pub page: usize,
    pub items_per_page: usize,
    pub sort_conditions: Vec<SortCondition>,
    pub filters: Vec<Filter>,
    pub row_styles: Vec<Style>,
    pub csv: CsvSettings,
}

impl RenderContext {
    pub fn visible_columns(&self) -> Vec<&Arc<Column>> {
        self.columns.iter().filter(|c| !c.hidden).collect()
    }

    /// Columns written by export renderers
    pub fn export_columns(&self) -> Result<Vec<&Arc<Column>>> {
        let columns: Vec<&Arc<Column>> = self
            .columns
            .iter()
            .filter(|c| c.exportable && !c.hidden)
            .collect();
        if columns.is_empty() {
            return Err(GridError::NoColumnsToExport);
        }
        Ok(columns)
    }

    pub fn page_count(&self) -> usize {
        if self.items_per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.items_per_page).max(1)
    }

    /// Direction the grid is currently sorted by `column`, if any
    pub fn sort_direction(&self, column: &Column) -> Option<SortDirection> {
        self.sort_conditions
            .iter()
            .find(|sort| sort.column.unique_id() == column.unique_id())
            .map(|sort| sort.direction)
    }

    /// Display value of the active filter on `column`, if any
    pub fn filter_display(&self, column: &Column) -> Option<&str> {
        self.filters
            .iter()
            .find(|filter| filter.column().unique_id() == column.unique_id())
            .map(|filter| filter.display_value())
    }
}

/// Cell text of a prepared row
pub(crate) fn cell_text(row: &PreparedRow, column: &Column) -> String {
    row.get(column.unique_id())
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Rendered document plus what a caller needs to deliver it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub content_type: &'static str,
    pub body: String,
    /// Suggested download name for export renderers
    pub file_name: Option<String>,
}

impl RenderOutput {
    pub fn new(content_type: &'static str, body: String) -> Self {
        Self {
            content_type,
            body,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}
