//! ORM-style entity query backend
//!
//! `OrmQuery` is a small entity query builder: fields are addressed through
//! aliases (`b.title`), conditions are text fragments with named parameters
//! (`:p0`), and the whole query renders as DQL for inspection. For execution
//! it lowers to SQL with positional parameters.

use std::sync::Arc;

use async_trait::async_trait;
use datagrid_core::{
    Column, Connection, Filter, FilterOperator, GridError, RawRow, Result, SelectSource,
    SortDirection, Value,
};
use indexmap::IndexMap;

use crate::source::{escape_like_value, keeps_null, typed_literal};
use crate::{DataSource, PaginationAdapter, SourceState};

#[derive(Debug, Clone, PartialEq)]
pub struct OrmQuery {
    entity: String,
    table: String,
    alias: String,
    selects: Vec<(String, String)>,
    conditions: Vec<String>,
    parameters: IndexMap<String, Value>,
    order_by: Vec<(String, SortDirection)>,
    first_result: Option<usize>,
    max_results: Option<usize>,
}

impl OrmQuery {
    /// `FROM entity alias`; the entity maps to a table of the same name
    pub fn new(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            table: entity.clone(),
            entity,
            alias: alias.into(),
            selects: Vec::new(),
            conditions: Vec::new(),
            parameters: IndexMap::new(),
            order_by: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }

    /// Map the entity to a differently named table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn root_alias(&self) -> &str {
        &self.alias
    }

    pub fn select(&mut self, expression: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.selects.push((expression.into(), alias.into()));
        self
    }

    pub fn clear_select(&mut self) -> &mut Self {
        self.selects.clear();
        self
    }

    pub fn and_where(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Bind a value under a fresh parameter name and return its placeholder
    pub fn bind(&mut self, value: Value) -> String {
        let name = format!("p{}", self.parameters.len());
        let placeholder = format!(":{}", name);
        self.parameters.insert(name, value);
        placeholder
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    pub fn add_order_by(&mut self, expression: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.order_by.push((expression.into(), direction));
        self
    }

    pub fn clear_order_by(&mut self) -> &mut Self {
        self.order_by.clear();
        self
    }

    pub fn set_first_result(&mut self, offset: usize) -> &mut Self {
        self.first_result = Some(offset);
        self
    }

    pub fn set_max_results(&mut self, limit: usize) -> &mut Self {
        self.max_results = Some(limit);
        self
    }

    fn render(&self, from: &str) -> String {
        let select = if self.selects.is_empty() {
            self.alias.clone()
        } else {
            self.selects
                .iter()
                .map(|(expression, alias)| format!("{} AS {}", expression, alias))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut text = format!("SELECT {} FROM {} {}", select, from, self.alias);
        if !self.conditions.is_empty() {
            let conditions: Vec<String> =
                self.conditions.iter().map(|c| format!("({})", c)).collect();
            text.push_str(" WHERE ");
            text.push_str(&conditions.join(" AND "));
        }
        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(expression, direction)| format!("{} {}", expression, direction.label()))
                .collect();
            text.push_str(" ORDER BY ");
            text.push_str(&terms.join(", "));
        }
        text
    }

    /// DQL text with named parameters
    pub fn to_dql(&self) -> String {
        self.render(&self.entity)
    }

    /// SQL with positional parameters in the placeholder style of `driver`
    pub fn to_sql(&self, driver: &str) -> Result<(String, Vec<Value>)> {
        let mut sql = self.render(&self.table);
        match (self.max_results, self.first_result) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {}", limit));
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {}", offset));
                }
            }
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }
        self.lower_parameters(&sql, driver)
    }

    /// `SELECT COUNT(*)` over this query, without paging or ordering
    pub fn to_count_sql(&self, driver: &str) -> Result<(String, Vec<Value>)> {
        let mut inner = self.clone();
        inner.clear_order_by();
        let sql = format!("SELECT COUNT(*) FROM ({}) grid_count", inner.render(&self.table));
        self.lower_parameters(&sql, driver)
    }

    /// Replace `:name` placeholders by positional ones, in order of appearance
    fn lower_parameters(&self, sql: &str, driver: &str) -> Result<(String, Vec<Value>)> {
        let mut out = String::with_capacity(sql.len());
        let mut params = Vec::new();
        let mut chars = sql.char_indices().peekable();

        while let Some((idx, ch)) = chars.next() {
            let starts_name = ch == ':'
                && !sql[..idx].ends_with(':')
                && chars
                    .peek()
                    .is_some_and(|(_, next)| next.is_ascii_alphabetic() || *next == '_');
            if !starts_name {
                out.push(ch);
                continue;
            }

            let mut name = String::new();
            while let Some((_, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || *next == '_' {
                    name.push(*next);
                    chars.next();
                } else {
                    break;
                }
            }

            let value = self.parameters.get(&name).ok_or_else(|| {
                GridError::Query(format!("Parameter \"{}\" is not bound", name))
            })?;
            params.push(value.clone());
            match driver {
                "postgres" | "postgresql" => out.push_str(&format!("${}", params.len())),
                _ => out.push('?'),
            }
        }

        Ok((out, params))
    }
}

/// Alias-qualified field path or expression of a selectable column
pub fn field_path(column: &Column, root_alias: &str) -> Option<String> {
    match column.select_source()? {
        SelectSource::Field {
            table: Some(alias),
            column,
        } => Some(format!("{}.{}", alias, column)),
        SelectSource::Field {
            table: None,
            column,
        } => Some(format!("{}.{}", root_alias, column)),
        SelectSource::Expression(expression) => Some(expression.clone()),
    }
}

/// Applies filters to an `OrmQuery`
#[derive(Debug, Default, Clone, Copy)]
pub struct OrmQueryFilter;

impl OrmQueryFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, filter: &Filter, query: &mut OrmQuery) -> Result<()> {
        let column = filter.column();
        let path = field_path(column, query.root_alias())
            .ok_or_else(|| GridError::ColumnNotFilterable(column.unique_id().to_string()))?;
        let values = filter.values();

        let condition = match filter.operator() {
            FilterOperator::Between => {
                let (min, max) = filter.range();
                let min = query.bind(typed_literal(column, min));
                let max = query.bind(typed_literal(column, max));
                format!("{} BETWEEN {} AND {}", path, min, max)
            }
            FilterOperator::In | FilterOperator::NotIn => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| query.bind(typed_literal(column, v)))
                    .collect();
                let not = if *filter.operator() == FilterOperator::NotIn {
                    "NOT "
                } else {
                    ""
                };
                format!("{} {}IN ({})", path, not, placeholders.join(", "))
            }
            operator => {
                let mut parts: Vec<String> = Vec::with_capacity(values.len());
                for v in values {
                    if let Some((pattern, negated)) = like_pattern(operator, &escape_like_value(v)) {
                        let placeholder = query.bind(Value::String(pattern));
                        let not = if negated { "NOT " } else { "" };
                        parts.push(format!(
                            "LOWER({}) {}LIKE {} ESCAPE '!'",
                            path, not, placeholder
                        ));
                    } else {
                        let op = comparison(operator).ok_or_else(|| {
                            GridError::UnsupportedOperator(operator.as_str().to_string())
                        })?;
                        let placeholder = query.bind(typed_literal(column, v));
                        parts.push(format!("{} {} {}", path, op, placeholder));
                    }
                }
                parts.join(" OR ")
            }
        };

        let condition = if keeps_null(filter)? {
            format!("{} IS NULL OR {}", path, condition)
        } else {
            condition
        };

        query.and_where(condition);
        Ok(())
    }
}

/// LIKE pattern and negation for the LIKE family
fn like_pattern(operator: &FilterOperator, escaped: &str) -> Option<(String, bool)> {
    match operator {
        FilterOperator::Like => Some((format!("%{}%", escaped), false)),
        FilterOperator::LikeLeft => Some((format!("%{}", escaped), false)),
        FilterOperator::LikeRight => Some((format!("{}%", escaped), false)),
        FilterOperator::NotLike => Some((format!("%{}%", escaped), true)),
        FilterOperator::NotLikeLeft => Some((format!("%{}", escaped), true)),
        FilterOperator::NotLikeRight => Some((format!("{}%", escaped), true)),
        _ => None,
    }
}

fn comparison(operator: &FilterOperator) -> Option<&'static str> {
    match operator {
        FilterOperator::Equal => Some("="),
        FilterOperator::NotEqual => Some("<>"),
        FilterOperator::GreaterEqual => Some(">="),
        FilterOperator::Greater => Some(">"),
        FilterOperator::LessEqual => Some("<="),
        FilterOperator::Less => Some("<"),
        _ => None,
    }
}

/// Data source over an `OrmQuery`
pub struct OrmSource {
    state: SourceState,
    query: OrmQuery,
    connection: Option<Arc<dyn Connection>>,
}

impl OrmSource {
    pub fn new(query: OrmQuery) -> Self {
        Self {
            state: SourceState::default(),
            query,
            connection: None,
        }
    }

    pub fn with_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn query(&self) -> &OrmQuery {
        &self.query
    }
}

impl DataSource for OrmSource {
    fn state(&self) -> &SourceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SourceState {
        &mut self.state
    }

    #[tracing::instrument(skip(self), fields(columns = self.state.columns.len()))]
    fn execute(&mut self) -> Result<()> {
        let connection = self.connection.clone().ok_or_else(|| {
            GridError::Configuration("No connection set for the ORM query source".to_string())
        })?;

        let mut query = self.query.clone();
        let root = query.root_alias().to_string();

        query.clear_select();
        for column in self.state.selectable_columns() {
            if let Some(path) = field_path(column, &root) {
                query.select(path, column.unique_id());
            }
        }

        if !self.state.sort_conditions.is_empty() {
            query.clear_order_by();
            for sort in &self.state.sort_conditions {
                let column = &sort.column;
                let path = field_path(column, &root)
                    .ok_or_else(|| GridError::ColumnNotSortable(column.unique_id().to_string()))?;
                let expression = if column.value_type.is_number() {
                    format!("ABS({})", path)
                } else {
                    path
                };
                query.add_order_by(expression, sort.direction);
            }
        }

        let translator = OrmQueryFilter::new();
        for filter in &self.state.filters {
            translator.apply(filter, &mut query)?;
        }

        tracing::debug!(dql = %query.to_dql(), "finalized ORM query");

        let adapter: Arc<dyn PaginationAdapter> = match &self.state.pagination_override {
            Some(adapter) => adapter.clone(),
            None => Arc::new(OrmPaginator::new(query, connection)),
        };
        self.state.pagination_adapter = Some(adapter);
        Ok(())
    }
}

/// Count and page fetch for a finalized `OrmQuery`
pub struct OrmPaginator {
    query: OrmQuery,
    connection: Arc<dyn Connection>,
}

impl OrmPaginator {
    pub fn new(query: OrmQuery, connection: Arc<dyn Connection>) -> Self {
        Self { query, connection }
    }
}

#[async_trait]
impl PaginationAdapter for OrmPaginator {
    #[tracing::instrument(skip(self))]
    async fn count(&self) -> Result<usize> {
        let (sql, params) = self.query.to_count_sql(self.connection.driver_name())?;
        tracing::debug!(sql = %sql, "counting rows");

        let result = self.connection.query(&sql, &params).await?;
        let count = result.scalar().and_then(Value::as_i64).unwrap_or(0);
        Ok(usize::try_from(count).unwrap_or(0))
    }

    #[tracing::instrument(skip(self))]
    async fn get_items(&self, offset: usize, limit: usize) -> Result<Vec<RawRow>> {
        let mut page = self.query.clone();
        page.set_first_result(offset).set_max_results(limit);
        let (sql, params) = page.to_sql(self.connection.driver_name())?;
        tracing::debug!(sql = %sql, "fetching page");

        Ok(self.connection.query(&sql, &params).await?.into_maps())
    }
}
