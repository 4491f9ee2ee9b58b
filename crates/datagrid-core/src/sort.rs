//! Sort conditions

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Column, GridError};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(GridError::Configuration(format!(
                "Unknown sort direction: {}",
                other
            ))),
        }
    }
}

/// One ORDER BY term; position in a list is its priority
#[derive(Debug, Clone)]
pub struct SortCondition {
    pub column: Arc<Column>,
    pub direction: SortDirection,
}

impl SortCondition {
    pub fn new(column: Arc<Column>, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn asc(column: Arc<Column>) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    pub fn desc(column: Arc<Column>) -> Self {
        Self::new(column, SortDirection::Desc)
    }
}
