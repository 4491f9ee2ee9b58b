//! CSV export

use datagrid_core::{CsvSettings, Result, Value};

use crate::{RenderContext, RenderOutput, Renderer};

pub const CSV: &str = "csv";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvRenderer;

impl CsvRenderer {
    fn qualify_value(value: &str, qualifier: Option<char>) -> String {
        match qualifier {
            Some(q) => {
                let escaped = value.replace(q, &format!("{}{}", q, q));
                format!("{}{}{}", q, escaped, q)
            }
            None => value.to_string(),
        }
    }

    fn write_line<'a>(
        out: &mut String,
        fields: impl Iterator<Item = &'a str>,
        settings: &CsvSettings,
    ) {
        let line = fields
            .map(|field| Self::qualify_value(field, settings.text_qualifier))
            .collect::<Vec<_>>()
            .join(&settings.delimiter.to_string());
        out.push_str(&line);
        out.push_str(&settings.record_delimiter);
    }
}

impl Renderer for CsvRenderer {
    fn name(&self) -> &'static str {
        CSV
    }

    fn is_export(&self) -> bool {
        true
    }

    fn render(&self, context: &RenderContext) -> Result<RenderOutput> {
        let columns = context.export_columns()?;
        let settings = &context.csv;
        let mut out = String::new();

        if settings.include_headers {
            Self::write_line(&mut out, columns.iter().map(|c| c.label.as_str()), settings);
        }

        for row in &context.rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| match row.get(column.unique_id()) {
                    None | Some(Value::Null) => String::new(),
                    Some(value) => value.to_string(),
                })
                .collect();
            Self::write_line(&mut out, cells.iter().map(String::as_str), settings);
        }

        tracing::debug!(rows = context.rows.len(), "rendered CSV export");
        Ok(RenderOutput::new("text/csv; charset=utf-8", out)
            .with_file_name(format!("{}.csv", context.grid_id)))
    }
}
