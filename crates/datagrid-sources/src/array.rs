//! In-memory backend

use std::cmp::Ordering;
use std::sync::Arc;

use datagrid_core::{
    Column, Filter, GridError, RawRow, Result, SelectSource, SortDirection, Value, compare_loose,
    predicate::{CompareMode, matches_with},
};

use crate::{ArrayPaginator, DataSource, PaginationAdapter, SourceState};

/// Evaluates filters against rows keyed by column unique id
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayFilter;

impl ArrayFilter {
    pub fn new() -> Self {
        Self
    }

    /// Whether the row passes the filter; a missing value counts as empty
    pub fn matches(&self, filter: &Filter, row: &RawRow) -> Result<bool> {
        let cell = row
            .get(filter.column().unique_id())
            .unwrap_or(&Value::Null);
        let mode = CompareMode::for_column(filter.column());
        matches_with(mode, filter.operator(), filter.values(), cell)
    }
}

/// Data source over rows held in memory
#[derive(Clone, Default)]
pub struct ArraySource {
    state: SourceState,
    rows: Vec<RawRow>,
}

impl ArraySource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            state: SourceState::default(),
            rows,
        }
    }

    /// Rows from JSON objects
    pub fn from_json(rows: Vec<serde_json::Map<String, serde_json::Value>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }
}

/// Value of a column in an unprojected row
fn lookup<'a>(row: &'a RawRow, column: &Column) -> Option<&'a Value> {
    row.get(column.unique_id()).or_else(|| match column.select_source()? {
        SelectSource::Field { column, .. } => row.get(column),
        SelectSource::Expression(_) => None,
    })
}

fn sort_key_cmp(a: Option<&Value>, b: Option<&Value>, numeric: bool) -> Ordering {
    if numeric {
        let magnitude = |v: Option<&Value>| v.and_then(Value::as_f64).map(f64::abs);
        if let (Some(x), Some(y)) = (magnitude(a), magnitude(b)) {
            return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        }
    }
    let text = |v: Option<&Value>| v.map(Value::to_string).unwrap_or_default();
    compare_loose(&text(a), &text(b))
}

impl DataSource for ArraySource {
    fn state(&self) -> &SourceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SourceState {
        &mut self.state
    }

    #[tracing::instrument(skip(self), fields(rows = self.rows.len()))]
    fn execute(&mut self) -> Result<()> {
        let columns: Vec<Arc<Column>> = self.state.selectable_columns().cloned().collect();

        let mut rows: Vec<RawRow> = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        let value = lookup(row, column).cloned().unwrap_or(Value::Null);
                        (column.unique_id().to_string(), value)
                    })
                    .collect()
            })
            .collect();

        if !self.state.sort_conditions.is_empty() {
            for sort in &self.state.sort_conditions {
                if !sort.column.is_selectable() {
                    return Err(GridError::ColumnNotSortable(
                        sort.column.unique_id().to_string(),
                    ));
                }
            }
            let conditions = &self.state.sort_conditions;
            rows.sort_by(|a, b| {
                for sort in conditions {
                    let key = sort.column.unique_id();
                    let numeric = sort.column.value_type.is_number();
                    let ordering = sort_key_cmp(a.get(key), b.get(key), numeric);
                    let ordering = match sort.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let translator = ArrayFilter::new();
        for filter in &self.state.filters {
            if !filter.column().is_selectable() {
                return Err(GridError::ColumnNotFilterable(
                    filter.column().unique_id().to_string(),
                ));
            }
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if translator.matches(filter, &row)? {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        tracing::debug!(remaining = rows.len(), "filtered in-memory rows");

        let adapter: Arc<dyn PaginationAdapter> = match &self.state.pagination_override {
            Some(adapter) => adapter.clone(),
            None => Arc::new(ArrayPaginator::new(rows)),
        };
        self.state.pagination_adapter = Some(adapter);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagrid_core::{FilterOperator, NumberType, ValueType};

    fn row(vol: i64, ed: i64) -> RawRow {
        [
            ("vol".to_string(), Value::Int64(vol)),
            ("ed".to_string(), Value::Int64(ed)),
        ]
        .into_iter()
        .collect()
    }

    fn number(name: &str) -> Arc<Column> {
        Arc::new(Column::select(name, None).with_type(ValueType::Number(NumberType::default())))
    }

    #[tokio::test]
    async fn sorts_and_filters_in_order() {
        let vol = number("vol");
        let mut source = ArraySource::new(vec![row(67, 2), row(86, 1), row(85, 6)]);
        source.set_columns(vec![vol.clone(), number("ed")]);
        source.add_sort_condition(vol.clone(), SortDirection::Asc);
        source.add_filter(Filter::parse(vol, ">=85"));
        source.execute().unwrap();

        let adapter = source.pagination_adapter().unwrap();
        assert_eq!(adapter.count().await.unwrap(), 2);
        let rows = adapter.get_items(0, 10).await.unwrap();
        assert_eq!(rows, vec![row(85, 6), row(86, 1)]);
    }

    #[tokio::test]
    async fn number_sort_uses_magnitude() {
        let vol = number("vol");
        let mut source = ArraySource::new(vec![row(-9, 0), row(3, 0), row(-1, 0)]);
        source.set_columns(vec![vol.clone()]);
        source.add_sort_condition(vol, SortDirection::Asc);
        source.execute().unwrap();

        let rows = source.pagination_adapter().unwrap().get_items(0, 10).await.unwrap();
        let vols: Vec<&Value> = rows.iter().map(|r| &r["vol"]).collect();
        assert_eq!(vols, vec![&Value::Int64(-1), &Value::Int64(3), &Value::Int64(-9)]);
    }

    #[tokio::test]
    async fn projects_to_unique_ids() {
        let title = Arc::new(Column::select("title", Some("book")));
        let mut raw = RawRow::new();
        raw.insert("title".into(), Value::from("Dune"));
        raw.insert("unused".into(), Value::from("x"));

        let mut source = ArraySource::new(vec![raw]);
        source.set_columns(vec![title]);
        source.execute().unwrap();

        let rows = source.pagination_adapter().unwrap().get_items(0, 1).await.unwrap();
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["book_title"]);
    }

    #[test]
    fn text_columns_compare_as_text() {
        let code = Arc::new(Column::select("code", None));
        let filter = Filter::parse(code, ">5");
        let cell = |v: &str| -> RawRow { [("code".to_string(), Value::from(v))].into_iter().collect() };

        assert!(!ArrayFilter::new().matches(&filter, &cell("10")).unwrap());
        assert!(ArrayFilter::new().matches(&filter, &cell("9")).unwrap());
        assert!(ArrayFilter::new().matches(&filter, &cell("x")).unwrap());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let filter = Filter::new(number("vol"), FilterOperator::Other("xyz".into()), vec![], "");
        let err = ArrayFilter::new().matches(&filter, &row(1, 1)).unwrap_err();
        assert_eq!(err.to_string(), "Filter operator \"xyz\" is not supported");
    }
}
