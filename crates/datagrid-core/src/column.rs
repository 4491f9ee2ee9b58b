//! Column model

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{DataPopulation, FilterOperator, Formatter, SortDirection, Style, Value, ValueType};

/// Where a selectable column reads its value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectSource {
    /// A plain column, optionally qualified by table (or entity alias)
    Field {
        table: Option<String>,
        column: String,
    },
    /// A raw backend expression, e.g. `price * quantity`
    Expression(String),
}

#[derive(Debug, Clone)]
pub enum ColumnSource {
    Select(SelectSource),
    External(DataPopulation),
}

/// Value -> label replacement applied before type conversion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplaceValues {
    pub table: IndexMap<String, String>,
    /// Values without a table entry become empty instead of staying as-is
    pub not_replaced_get_empty: bool,
}

impl ReplaceValues {
    pub fn new(table: IndexMap<String, String>) -> Self {
        Self {
            table,
            not_replaced_get_empty: true,
        }
    }

    pub fn apply(&self, value: Value) -> Value {
        match value {
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.apply(item)).collect())
            }
            scalar => match self.table.get(&scalar.to_string()) {
                Some(label) => Value::String(label.clone()),
                None if self.not_replaced_get_empty => Value::String(String::new()),
                None => scalar,
            },
        }
    }
}

/// Sort applied when the request carries none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDefault {
    /// Lower priorities sort first
    pub priority: usize,
    pub direction: SortDirection,
}

/// A single data channel of a grid
#[derive(Debug, Clone)]
pub struct Column {
    unique_id: String,
    source: ColumnSource,
    pub label: String,
    pub value_type: ValueType,
    pub filter_default_operator: Option<FilterOperator>,
    pub filter_default_value: Option<String>,
    pub identity: bool,
    pub sortable: bool,
    pub filterable: bool,
    pub hidden: bool,
    pub exportable: bool,
    /// Relative width used by renderers that lay out columns
    pub width: f32,
    pub sort_default: Option<SortDefault>,
    pub translation_enabled: bool,
    pub replace_values: Option<ReplaceValues>,
    pub styles: Vec<Style>,
    pub formatters: Vec<Arc<dyn Formatter>>,
}

impl Column {
    fn with_source(unique_id: String, source: ColumnSource) -> Self {
        let selectable = matches!(source, ColumnSource::Select(_));
        Self {
            label: unique_id.clone(),
            unique_id,
            source,
            value_type: ValueType::default(),
            filter_default_operator: None,
            filter_default_value: None,
            identity: false,
            sortable: selectable,
            filterable: selectable,
            hidden: false,
            exportable: true,
            width: 5.0,
            sort_default: None,
            translation_enabled: false,
            replace_values: None,
            styles: Vec::new(),
            formatters: Vec::new(),
        }
    }

    /// A column selected from the backend. The unique id is `table_column`,
    /// or just `column` when no table is given.
    pub fn select(column: &str, table: Option<&str>) -> Self {
        let unique_id = match table {
            Some(table) if !table.is_empty() => format!("{}_{}", table, column),
            _ => column.to_string(),
        };
        Self::select_as(unique_id, column, table)
    }

    /// A selected column with an explicit unique id
    pub fn select_as(unique_id: impl Into<String>, column: &str, table: Option<&str>) -> Self {
        Self::with_source(
            unique_id.into(),
            ColumnSource::Select(SelectSource::Field {
                table: table.filter(|t| !t.is_empty()).map(str::to_string),
                column: column.to_string(),
            }),
        )
    }

    /// A column selected through a backend expression
    pub fn expression(unique_id: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::with_source(
            unique_id.into(),
            ColumnSource::Select(SelectSource::Expression(expression.into())),
        )
    }

    /// A column whose value is computed per row instead of read from the backend
    pub fn external(unique_id: impl Into<String>, population: DataPopulation) -> Self {
        Self::with_source(unique_id.into(), ColumnSource::External(population))
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn source(&self) -> &ColumnSource {
        &self.source
    }

    /// Whether the backend can project this column
    pub fn is_selectable(&self) -> bool {
        matches!(self.source, ColumnSource::Select(_))
    }

    pub fn select_source(&self) -> Option<&SelectSource> {
        match &self.source {
            ColumnSource::Select(select) => Some(select),
            ColumnSource::External(_) => None,
        }
    }

    pub fn population(&self) -> Option<&DataPopulation> {
        match &self.source {
            ColumnSource::External(population) => Some(population),
            ColumnSource::Select(_) => None,
        }
    }

    /// The configured override, or the value type's default
    pub fn filter_default_operator(&self) -> FilterOperator {
        self.filter_default_operator
            .clone()
            .unwrap_or_else(|| self.value_type.default_filter_operator())
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_identity(mut self, identity: bool) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_exportable(mut self, exportable: bool) -> Self {
        self.exportable = exportable;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_sort_default(mut self, priority: usize, direction: SortDirection) -> Self {
        self.sort_default = Some(SortDefault {
            priority,
            direction,
        });
        self
    }

    pub fn with_filter_default_operator(mut self, operator: FilterOperator) -> Self {
        self.filter_default_operator = Some(operator);
        self
    }

    pub fn with_filter_default_value(mut self, value: impl Into<String>) -> Self {
        self.filter_default_value = Some(value.into());
        self
    }

    pub fn with_translation(mut self, enabled: bool) -> Self {
        self.translation_enabled = enabled;
        self
    }

    pub fn with_replace_values(mut self, replace: ReplaceValues) -> Self {
        self.replace_values = Some(replace);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.styles.push(style);
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatters.push(formatter);
        self
    }
}
