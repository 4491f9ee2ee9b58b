//! Error types for datagrid

use thiserror::Error;

/// Core error type for datagrid operations
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Filter operator \"{0}\" is not supported")]
    UnsupportedOperator(String),

    #[error("This column cannot be filtered: {0}")]
    ColumnNotFilterable(String),

    #[error("This column cannot be sorted: {0}")]
    ColumnNotSortable(String),

    #[error("No columns to export available")]
    NoColumnsToExport,

    #[error("Could not write the grid state to the cache with key \"{0}\"")]
    CacheWrite(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for datagrid operations
pub type Result<T> = std::result::Result<T, GridError>;
