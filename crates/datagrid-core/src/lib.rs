//! Datagrid Core - column model, filter language and shared contracts
//!
//! This crate provides the types every other datagrid crate depends on:
//!
//! - `Column` - a data channel with its value type and display metadata
//! - `Filter` - structured filter plus the user filter expression parser
//! - `SortCondition` - one ORDER BY term
//! - `Connection` - narrow query surface of a database backend
//! - `GridConfig` / `ColumnRegistry` - declarative grid definitions

mod column;
pub mod config;
mod connection;
mod error;
mod filter;
mod formatter;
mod locale;
mod population;
pub mod predicate;
mod sort;
mod style;
mod translation;
mod types;
mod value_type;

pub use column::*;
pub use config::{
    COLUMN_REGISTRY, ColumnBuilder, ColumnDefinition, ColumnRegistry, CsvSettings, GridConfig,
    GridSettings, SourceConfig,
};
pub use connection::*;
pub use error::*;
pub use filter::*;
pub use formatter::*;
pub use locale::*;
pub use population::*;
pub use sort::*;
pub use style::*;
pub use translation::*;
pub use types::*;
pub use value_type::*;
