//! SQL-builder backend on top of `sea_query::SelectStatement`

use std::sync::Arc;

use async_trait::async_trait;
use datagrid_core::{
    Column, Connection, Filter, FilterOperator, GridError, RawRow, Result, SelectSource,
    SortDirection, Value,
};
use sea_query::{
    Alias, Cond, ConditionalStatement, Expr, Func, LikeExpr, MysqlQueryBuilder, Order,
    OrderedStatement, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
    SqliteQueryBuilder,
};

use crate::source::{escape_like_value, keeps_null, typed_literal};
use crate::{DataSource, PaginationAdapter, SourceState};

/// Backend expression for a selectable column
pub fn column_expr(column: &Column) -> Option<SimpleExpr> {
    match column.select_source()? {
        SelectSource::Field {
            table: Some(table),
            column,
        } => Some(Expr::col((Alias::new(table), Alias::new(column))).into()),
        SelectSource::Field {
            table: None,
            column,
        } => Some(Expr::col(Alias::new(column)).into()),
        SelectSource::Expression(expression) => Some(Expr::cust(expression)),
    }
}

fn to_sea_value(value: Value) -> sea_query::Value {
    match value {
        Value::Int64(v) => v.into(),
        Value::Float64(v) => v.into(),
        other => other.to_string().into(),
    }
}

fn from_sea_value(value: &sea_query::Value) -> Value {
    use sea_query::Value as Sea;
    match value {
        Sea::Bool(Some(v)) => Value::Bool(*v),
        Sea::TinyInt(Some(v)) => Value::Int64(i64::from(*v)),
        Sea::SmallInt(Some(v)) => Value::Int64(i64::from(*v)),
        Sea::Int(Some(v)) => Value::Int64(i64::from(*v)),
        Sea::BigInt(Some(v)) => Value::Int64(*v),
        Sea::TinyUnsigned(Some(v)) => Value::Int64(i64::from(*v)),
        Sea::SmallUnsigned(Some(v)) => Value::Int64(i64::from(*v)),
        Sea::Unsigned(Some(v)) => Value::Int64(i64::from(*v)),
        Sea::BigUnsigned(Some(v)) => Value::Int64(i64::try_from(*v).unwrap_or(i64::MAX)),
        Sea::Float(Some(v)) => Value::Float64(f64::from(*v)),
        Sea::Double(Some(v)) => Value::Float64(*v),
        Sea::String(Some(v)) => Value::String(v.to_string()),
        Sea::Char(Some(v)) => Value::String(v.to_string()),
        _ => Value::Null,
    }
}

/// Render a statement with the placeholder style of the connection's driver
pub fn build_for_driver(query: &SelectStatement, driver: &str) -> (String, Vec<Value>) {
    let (sql, values) = match driver {
        "postgres" | "postgresql" => query.build(PostgresQueryBuilder),
        "mysql" | "mariadb" => query.build(MysqlQueryBuilder),
        _ => query.build(SqliteQueryBuilder),
    };
    (sql, values.0.iter().map(from_sea_value).collect())
}

/// Applies filters to a `SelectStatement`
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlBuilderFilter;

impl SqlBuilderFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, filter: &Filter, query: &mut SelectStatement) -> Result<()> {
        let column = filter.column();
        let expr = column_expr(column)
            .ok_or_else(|| GridError::ColumnNotFilterable(column.unique_id().to_string()))?;
        let values = filter.values();
        let literal = |v: &String| to_sea_value(typed_literal(column, v));

        let like = |v: &String, pattern: &dyn Fn(&str) -> String, negated: bool| {
            let lowered = Expr::expr(Func::lower(expr.clone()));
            let pattern = LikeExpr::new(pattern(&escape_like_value(v))).escape('!');
            if negated {
                lowered.not_like(pattern)
            } else {
                lowered.like(pattern)
            }
        };
        let both = |v: &str| format!("%{}%", v);
        let left = |v: &str| format!("%{}", v);
        let right = |v: &str| format!("{}%", v);

        let condition = match filter.operator() {
            FilterOperator::Like => any(values, |v| like(v, &both, false)),
            FilterOperator::LikeLeft => any(values, |v| like(v, &left, false)),
            FilterOperator::LikeRight => any(values, |v| like(v, &right, false)),
            FilterOperator::NotLike => any(values, |v| like(v, &both, true)),
            FilterOperator::NotLikeLeft => any(values, |v| like(v, &left, true)),
            FilterOperator::NotLikeRight => any(values, |v| like(v, &right, true)),
            FilterOperator::Equal => any(values, |v| Expr::expr(expr.clone()).eq(literal(v))),
            FilterOperator::NotEqual => any(values, |v| Expr::expr(expr.clone()).ne(literal(v))),
            FilterOperator::GreaterEqual => {
                any(values, |v| Expr::expr(expr.clone()).gte(literal(v)))
            }
            FilterOperator::Greater => any(values, |v| Expr::expr(expr.clone()).gt(literal(v))),
            FilterOperator::LessEqual => any(values, |v| Expr::expr(expr.clone()).lte(literal(v))),
            FilterOperator::Less => any(values, |v| Expr::expr(expr.clone()).lt(literal(v))),
            FilterOperator::In => Cond::any()
                .add(Expr::expr(expr.clone()).is_in(values.iter().map(literal).collect::<Vec<_>>())),
            FilterOperator::NotIn => Cond::any().add(
                Expr::expr(expr.clone()).is_not_in(values.iter().map(literal).collect::<Vec<_>>()),
            ),
            FilterOperator::Between => {
                let (min, max) = filter.range();
                Cond::any().add(
                    Expr::expr(expr.clone())
                        .between(literal(&min.to_string()), literal(&max.to_string())),
                )
            }
            FilterOperator::Other(raw) => {
                return Err(GridError::UnsupportedOperator(raw.clone()));
            }
        };

        let condition = if keeps_null(filter)? {
            Cond::any().add(Expr::expr(expr).is_null()).add(condition)
        } else {
            condition
        };

        query.cond_where(condition);
        Ok(())
    }
}

fn any(values: &[String], build: impl Fn(&String) -> SimpleExpr) -> Cond {
    values
        .iter()
        .fold(Cond::any(), |cond, value| cond.add(build(value)))
}

/// Data source over a `SelectStatement` executed through a `Connection`
pub struct SqlBuilderSource {
    state: SourceState,
    query: SelectStatement,
    connection: Option<Arc<dyn Connection>>,
}

impl SqlBuilderSource {
    pub fn new(query: SelectStatement) -> Self {
        Self {
            state: SourceState::default(),
            query,
            connection: None,
        }
    }

    /// Select everything from one table
    pub fn from_table(table: &str) -> Self {
        Self::new(Query::select().from(Alias::new(table)).to_owned())
    }

    pub fn with_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn set_connection(&mut self, connection: Arc<dyn Connection>) {
        self.connection = Some(connection);
    }

    /// The base statement; `execute` finalizes a copy of it
    pub fn query(&self) -> &SelectStatement {
        &self.query
    }
}

impl DataSource for SqlBuilderSource {
    fn state(&self) -> &SourceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SourceState {
        &mut self.state
    }

    #[tracing::instrument(skip(self), fields(columns = self.state.columns.len()))]
    fn execute(&mut self) -> Result<()> {
        let connection = self.connection.clone().ok_or_else(|| {
            GridError::Configuration("No connection set for the SQL builder source".to_string())
        })?;

        let mut query = self.query.clone();

        query.clear_selects();
        for column in self.state.selectable_columns() {
            if let Some(expr) = column_expr(column) {
                query.expr_as(expr, Alias::new(column.unique_id()));
            }
        }

        if !self.state.sort_conditions.is_empty() {
            query.clear_order_by();
            for sort in &self.state.sort_conditions {
                let column = &sort.column;
                let mut expr = column_expr(column)
                    .ok_or_else(|| GridError::ColumnNotSortable(column.unique_id().to_string()))?;
                if column.value_type.is_number() {
                    expr = Func::abs(expr).into();
                }
                let order = match sort.direction {
                    SortDirection::Asc => Order::Asc,
                    SortDirection::Desc => Order::Desc,
                };
                query.order_by_expr(expr, order);
            }
        }

        let translator = SqlBuilderFilter::new();
        for filter in &self.state.filters {
            translator.apply(filter, &mut query)?;
        }

        tracing::debug!(sql = %query.to_string(SqliteQueryBuilder), "finalized SQL builder query");

        let adapter: Arc<dyn PaginationAdapter> = match &self.state.pagination_override {
            Some(adapter) => adapter.clone(),
            None => Arc::new(SqlPaginator::new(query, connection)),
        };
        self.state.pagination_adapter = Some(adapter);
        Ok(())
    }
}

/// Count and page fetch for a finalized `SelectStatement`
pub struct SqlPaginator {
    query: SelectStatement,
    connection: Arc<dyn Connection>,
}

impl SqlPaginator {
    pub fn new(query: SelectStatement, connection: Arc<dyn Connection>) -> Self {
        Self { query, connection }
    }
}

#[async_trait]
impl PaginationAdapter for SqlPaginator {
    #[tracing::instrument(skip(self))]
    async fn count(&self) -> Result<usize> {
        let count_query = Query::select()
            .expr(Expr::cust("COUNT(*)"))
            .from_subquery(self.query.clone(), Alias::new("grid_count"))
            .to_owned();
        let (sql, params) = build_for_driver(&count_query, self.connection.driver_name());
        tracing::debug!(sql = %sql, "counting rows");

        let result = self.connection.query(&sql, &params).await?;
        let count = result.scalar().and_then(Value::as_i64).unwrap_or(0);
        Ok(usize::try_from(count).unwrap_or(0))
    }

    #[tracing::instrument(skip(self))]
    async fn get_items(&self, offset: usize, limit: usize) -> Result<Vec<RawRow>> {
        let page_query = self
            .query
            .clone()
            .limit(limit as u64)
            .offset(offset as u64)
            .to_owned();
        let (sql, params) = build_for_driver(&page_query, self.connection.driver_name());
        tracing::debug!(sql = %sql, "fetching page");

        Ok(self.connection.query(&sql, &params).await?.into_maps())
    }
}
