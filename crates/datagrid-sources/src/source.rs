//! Data source contract shared by every backend

use std::sync::Arc;

use datagrid_core::{
    Column, Filter, Result, SortCondition, SortDirection, Value, parse_number,
    predicate::{CompareMode, matches_with},
};

use crate::PaginationAdapter;

/// Request state accumulated before `execute`
#[derive(Clone, Default)]
pub struct SourceState {
    pub columns: Vec<Arc<Column>>,
    pub sort_conditions: Vec<SortCondition>,
    pub filters: Vec<Filter>,
    /// Replaces the adapter `execute` would build
    pub pagination_override: Option<Arc<dyn PaginationAdapter>>,
    pub pagination_adapter: Option<Arc<dyn PaginationAdapter>>,
}

impl SourceState {
    pub fn selectable_columns(&self) -> impl Iterator<Item = &Arc<Column>> {
        self.columns.iter().filter(|c| c.is_selectable())
    }
}

/// A backend the grid can sort, filter and paginate.
///
/// `execute` applies, in order: column projection, sort conditions
/// (replacing any ordering the backend query already had), filters in
/// insertion order, and finally builds the pagination adapter.
pub trait DataSource: Send + Sync {
    fn state(&self) -> &SourceState;

    fn state_mut(&mut self) -> &mut SourceState;

    fn execute(&mut self) -> Result<()>;

    fn set_columns(&mut self, columns: Vec<Arc<Column>>) {
        self.state_mut().columns = columns;
    }

    fn columns(&self) -> &[Arc<Column>] {
        &self.state().columns
    }

    fn add_sort_condition(&mut self, column: Arc<Column>, direction: SortDirection) {
        self.state_mut()
            .sort_conditions
            .push(SortCondition::new(column, direction));
    }

    fn set_sort_conditions(&mut self, conditions: Vec<SortCondition>) {
        self.state_mut().sort_conditions = conditions;
    }

    fn sort_conditions(&self) -> &[SortCondition] {
        &self.state().sort_conditions
    }

    fn add_filter(&mut self, filter: Filter) {
        self.state_mut().filters.push(filter);
    }

    fn set_filters(&mut self, filters: Vec<Filter>) {
        self.state_mut().filters = filters;
    }

    fn filters(&self) -> &[Filter] {
        &self.state().filters
    }

    fn set_pagination_adapter(&mut self, adapter: Arc<dyn PaginationAdapter>) {
        self.state_mut().pagination_override = Some(adapter);
    }

    /// Available after `execute`
    fn pagination_adapter(&self) -> Option<Arc<dyn PaginationAdapter>> {
        self.state().pagination_adapter.clone()
    }
}

/// Literal for a filter value: numbers on Number columns, text otherwise
pub(crate) fn typed_literal(column: &Column, value: &str) -> Value {
    if column.value_type.is_number() {
        if let Ok(int) = value.trim().parse::<i64>() {
            return Value::Int64(int);
        }
        if let Some(float) = parse_number(value) {
            return Value::Float64(float);
        }
    }
    Value::String(value.to_string())
}

/// Whether an in-memory filter keeps a NULL cell. SQL translators add an
/// `IS NULL` branch when it does, since SQL drops NULL on every comparison.
pub(crate) fn keeps_null(filter: &Filter) -> Result<bool> {
    matches_with(
        CompareMode::for_column(filter.column()),
        filter.operator(),
        filter.values(),
        &Value::Null,
    )
}

/// Escape LIKE wildcards with `!` as the escape character
pub(crate) fn escape_like_value(value: &str) -> String {
    value
        .to_lowercase()
        .replace('!', "!!")
        .replace('%', "!%")
        .replace('_', "!_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagrid_core::{NumberType, ValueType};

    #[test]
    fn literals_follow_column_type() {
        let number = Column::select("vol", None).with_type(ValueType::Number(NumberType::default()));
        assert_eq!(typed_literal(&number, "85"), Value::Int64(85));
        assert_eq!(typed_literal(&number, "8.5"), Value::Float64(8.5));
        assert_eq!(typed_literal(&number, "abc"), Value::from("abc"));

        let text = Column::select("title", None);
        assert_eq!(typed_literal(&text, "85"), Value::from("85"));
    }

    #[test]
    fn like_escaping_lowercases_and_escapes() {
        assert_eq!(escape_like_value("A_b%!"), "a!_b!%!!");
    }
}
