//! Data source backends for the grid
//!
//! Every backend implements [`DataSource`]: it accumulates columns, sort
//! conditions and filters, and `execute` turns them into a
//! [`PaginationAdapter`] that counts and fetches pages lazily.

mod array;
mod orm;
mod pagination;
mod source;
mod sql_builder;
mod sqlite;

pub use array::{ArrayFilter, ArraySource};
pub use orm::{OrmPaginator, OrmQuery, OrmQueryFilter, OrmSource, field_path};
pub use pagination::{ArrayPaginator, PaginationAdapter};
pub use source::{DataSource, SourceState};
pub use sql_builder::{
    SqlBuilderFilter, SqlBuilderSource, SqlPaginator, build_for_driver, column_expr,
};
pub use sqlite::SqliteConnection;

pub use sea_query;
