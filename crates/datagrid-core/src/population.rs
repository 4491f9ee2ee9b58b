//! Data population for external (computed) columns

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{RawRow, Result, Value};

/// Computes a cell value from row-derived parameters
pub trait PopulationSource: Send + Sync + fmt::Debug {
    fn populate(&self, parameters: &IndexMap<String, Value>) -> Result<String>;
}

/// Feeds the value of `column_id` from the current row to the source as `name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationParameter {
    pub name: String,
    pub column_id: String,
}

impl PopulationParameter {
    pub fn new(name: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_id: column_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DataPopulation {
    StaticValue(String),
    Object {
        source: Arc<dyn PopulationSource>,
        parameters: Vec<PopulationParameter>,
    },
}

impl DataPopulation {
    pub fn object(source: Arc<dyn PopulationSource>) -> Self {
        Self::Object {
            source,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: PopulationParameter) -> Self {
        if let Self::Object { parameters, .. } = &mut self {
            parameters.push(parameter);
        }
        self
    }

    /// Compute the value for one row
    pub fn resolve(&self, row: &RawRow) -> Result<String> {
        match self {
            Self::StaticValue(value) => Ok(value.clone()),
            Self::Object { source, parameters } => {
                let values: IndexMap<String, Value> = parameters
                    .iter()
                    .map(|param| {
                        let value = row.get(&param.column_id).cloned().unwrap_or(Value::Null);
                        (param.name.clone(), value)
                    })
                    .collect();
                source.populate(&values)
            }
        }
    }
}

/// Fills `:name:` placeholders of a template with parameter values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePopulation {
    pub template: String,
}

impl TemplatePopulation {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl PopulationSource for TemplatePopulation {
    fn populate(&self, parameters: &IndexMap<String, Value>) -> Result<String> {
        Ok(parameters.iter().fold(self.template.clone(), |out, (name, value)| {
            out.replace(&format!(":{}:", name), &value.to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_value_ignores_row() {
        let population = DataPopulation::StaticValue("edit".into());
        assert_eq!(population.resolve(&RawRow::new()).unwrap(), "edit");
    }

    #[test]
    fn object_population_reads_row_parameters() {
        let population = DataPopulation::object(Arc::new(TemplatePopulation::new("/book/:id:/:ed:")))
            .with_parameter(PopulationParameter::new("id", "book_id"))
            .with_parameter(PopulationParameter::new("ed", "missing"));

        let mut row = RawRow::new();
        row.insert("book_id".into(), Value::Int64(7));

        assert_eq!(population.resolve(&row).unwrap(), "/book/7/");
    }
}
