//! Row preparation pipeline
//!
//! Turns raw backend rows into what renderers display. For every row and
//! every column, in this order:
//!
//! 1. collect the raw value of identity columns
//! 2. compute external column values from their population strategy
//! 3. default missing (or NULL) values to the empty string
//! 4. apply the replace-value table
//! 5. convert to the display form of the value type, except for the raw
//!    spreadsheet renderer
//! 6. translate, when enabled for the column
//! 7. trim string leaves
//! 8. run formatters applicable to the active renderer
//!
//! and finally store the collected identity values as `idConcated`.
//!
//! Replacement tables are keyed by raw values and translations by display
//! strings, so steps 4 to 6 cannot be reordered.

use std::sync::Arc;

use datagrid_core::{Column, ID_CONCATED, PreparedRow, RawRow, Result, Translator, Value};
use datagrid_render::SPREADSHEET_RAW;

/// Prepares one page of rows for one renderer; the first result is kept
pub struct RowPreparer {
    renderer: String,
    translator: Option<Arc<dyn Translator>>,
    prepared: Option<Vec<PreparedRow>>,
}

impl RowPreparer {
    pub fn new(renderer: impl Into<String>) -> Self {
        Self {
            renderer: renderer.into(),
            translator: None,
            prepared: None,
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Prepare `rows`. Later calls return the first result unchanged.
    pub fn prepare(&mut self, rows: &[RawRow], columns: &[Arc<Column>]) -> Result<&[PreparedRow]> {
        if self.prepared.is_none() {
            let prepared = rows
                .iter()
                .map(|row| self.prepare_row(row, columns))
                .collect::<Result<Vec<_>>>()?;
            tracing::debug!(rows = prepared.len(), renderer = %self.renderer, "prepared rows");
            self.prepared = Some(prepared);
        }
        Ok(self.prepared.as_deref().unwrap_or_default())
    }

    /// Consume the preparer, keeping the prepared rows
    pub fn into_rows(self) -> Vec<PreparedRow> {
        self.prepared.unwrap_or_default()
    }

    fn prepare_row(&self, raw: &RawRow, columns: &[Arc<Column>]) -> Result<PreparedRow> {
        let mut row: PreparedRow = raw.clone();
        let mut identity: Vec<String> = Vec::new();

        for column in columns {
            let key = column.unique_id();

            if column.identity
                && let Some(value) = row.get(key).filter(|v| !v.is_null())
            {
                identity.push(value.to_string());
            }

            if let Some(population) = column.population() {
                let populated = population.resolve(&row)?;
                row.insert(key.to_string(), Value::String(populated));
            }

            let mut value = match row.get(key) {
                None | Some(Value::Null) => Value::String(String::new()),
                Some(value) => value.clone(),
            };

            if let Some(replace) = &column.replace_values {
                value = replace.apply(value);
            }

            if self.renderer != SPREADSHEET_RAW {
                value = column.value_type.to_display_value(value);
            }

            if column.translation_enabled
                && let Some(translator) = &self.translator
            {
                value = translate(translator.as_ref(), value);
            }

            value = trim(value);
            row.insert(key.to_string(), value);

            for formatter in &column.formatters {
                if formatter.is_applicable(&self.renderer) {
                    let formatted = formatter.format(&row, column);
                    row.insert(key.to_string(), Value::String(formatted));
                }
            }
        }

        if !identity.is_empty() {
            row.insert(ID_CONCATED.to_string(), Value::String(identity.join("~")));
        }

        Ok(row)
    }
}

/// Strings and strings inside a top-level array; nested arrays stay as is
fn translate(translator: &dyn Translator, value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(translator.translate(&text)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(text) => Value::String(translator.translate(&text)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

fn trim(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(text.trim().to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(trim).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use datagrid_core::{
        ArrayType, DataPopulation, FnFormatter, MapTranslator, NumberType, ReplaceValues,
        TemplatePopulation, ValueType,
    };
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn raw(pairs: &[(&str, Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn identity_values_are_joined_with_tilde() {
        let columns = vec![
            Arc::new(Column::select("a", None).with_identity(true)),
            Arc::new(Column::select("b", None).with_identity(true)),
        ];
        let rows = vec![raw(&[("a", Value::Int64(7)), ("b", Value::Int64(3))])];

        let mut preparer = RowPreparer::new("html");
        let prepared = preparer.prepare(&rows, &columns).unwrap();
        assert_eq!(prepared[0][ID_CONCATED], Value::from("7~3"));
    }

    #[test]
    fn rows_without_identity_columns_have_no_id() {
        let columns = vec![Arc::new(Column::select("a", None))];
        let rows = vec![raw(&[("a", Value::Int64(7))])];

        let mut preparer = RowPreparer::new("html");
        let prepared = preparer.prepare(&rows, &columns).unwrap();
        assert!(!prepared[0].contains_key(ID_CONCATED));
    }

    #[test]
    fn replacement_runs_before_formatters() {
        let mut table = IndexMap::new();
        table.insert("1".to_string(), "  active ".to_string());
        let column = Column::select("status", None)
            .with_replace_values(ReplaceValues::new(table))
            .with_formatter(Arc::new(FnFormatter::new(|row, column| {
                format!("[{}]", row[column.unique_id()])
            })));
        let rows = vec![raw(&[("status", Value::Int64(1))])];

        let mut preparer = RowPreparer::new("html");
        let prepared = preparer.prepare(&rows, &[Arc::new(column)]).unwrap();
        assert_eq!(prepared[0]["status"], Value::from("[active]"));
    }

    #[test]
    fn second_prepare_reuses_the_first_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let column = Column::select("title", None).with_formatter(Arc::new(FnFormatter::new(
            move |row, column| {
                counter.fetch_add(1, Ordering::SeqCst);
                row[column.unique_id()].to_string().to_uppercase()
            },
        )));
        let columns = vec![Arc::new(column)];
        let rows = vec![raw(&[("title", Value::from("dune"))])];

        let mut preparer = RowPreparer::new("html");
        let first = preparer.prepare(&rows, &columns).unwrap().to_vec();
        let second = preparer.prepare(&rows, &columns).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(first[0]["title"], Value::from("DUNE"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn formatters_outside_their_renderer_pass_through() {
        let column = Column::select("title", None).with_formatter(Arc::new(
            FnFormatter::new(|_, _| "<b>x</b>".to_string()).for_renderers(["html"]),
        ));
        let rows = vec![raw(&[("title", Value::from("dune"))])];

        let mut preparer = RowPreparer::new("csv");
        let prepared = preparer.prepare(&rows, &[Arc::new(column)]).unwrap();
        assert_eq!(prepared[0]["title"], Value::from("dune"));
    }

    #[test]
    fn missing_and_null_values_become_empty() {
        let columns = vec![
            Arc::new(Column::select("a", None)),
            Arc::new(Column::select("b", None)),
        ];
        let rows = vec![raw(&[("a", Value::Null)])];

        let mut preparer = RowPreparer::new("html");
        let prepared = preparer.prepare(&rows, &columns).unwrap();
        assert_eq!(prepared[0]["a"], Value::from(""));
        assert_eq!(prepared[0]["b"], Value::from(""));
    }

    #[test]
    fn raw_spreadsheet_skips_type_conversion() {
        let number = Arc::new(
            Column::select("price", None)
                .with_type(ValueType::Number(NumberType::default().with_fraction_digits(2))),
        );
        let rows = vec![raw(&[("price", Value::Float64(3.5))])];

        let mut raw_preparer = RowPreparer::new(SPREADSHEET_RAW);
        let prepared = raw_preparer.prepare(&rows, &[number.clone()]).unwrap();
        assert_eq!(prepared[0]["price"], Value::Float64(3.5));

        let mut display = RowPreparer::new("html");
        let prepared = display.prepare(&rows, &[number]).unwrap();
        assert_eq!(prepared[0]["price"], Value::from("3.50"));
    }

    #[test]
    fn translation_follows_type_conversion() {
        let mut translator = MapTranslator::default();
        translator.insert("red", "rot");
        translator.insert("blue", "blau");
        let tags = Arc::new(
            Column::select("tags", None)
                .with_type(ValueType::ArrayOfStrings(ArrayType::default()))
                .with_translation(true),
        );
        let rows = vec![raw(&[("tags", Value::from("red, blue ,green"))])];

        let mut preparer = RowPreparer::new("html").with_translator(Arc::new(translator));
        let prepared = preparer.prepare(&rows, &[tags]).unwrap();
        assert_eq!(
            prepared[0]["tags"],
            Value::Array(vec![Value::from("rot"), Value::from("blau"), Value::from("green")])
        );
    }

    #[test]
    fn external_columns_see_the_row() {
        let link = Column::external(
            "edit",
            DataPopulation::object(Arc::new(TemplatePopulation::new("/book/:id:/edit")))
                .with_parameter(datagrid_core::PopulationParameter::new("id", "id")),
        );
        let columns = vec![Arc::new(Column::select("id", None)), Arc::new(link)];
        let rows = vec![raw(&[("id", Value::Int64(12))])];

        let mut preparer = RowPreparer::new("html");
        let prepared = preparer.prepare(&rows, &columns).unwrap();
        assert_eq!(prepared[0]["edit"], Value::from("/book/12/edit"));
    }
}
