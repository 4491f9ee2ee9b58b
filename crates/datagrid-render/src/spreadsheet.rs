//! SpreadsheetML (XML workbook) export
//!
//! `spreadsheet` writes display strings. `spreadsheet_raw` receives rows that
//! skipped type conversion and writes numbers, booleans and dates as typed
//! cells.

use std::fmt::Write;

use datagrid_core::{Result, Value, escape_html};

use crate::{RenderContext, RenderOutput, Renderer};

pub const SPREADSHEET: &str = "spreadsheet";
pub const SPREADSHEET_RAW: &str = "spreadsheet_raw";

const MAX_SHEET_NAME: usize = 31;
const POINTS_PER_WIDTH_UNIT: f32 = 12.0;

#[derive(Debug, Clone, Copy)]
pub struct SpreadsheetRenderer {
    raw: bool,
}

impl SpreadsheetRenderer {
    /// Display values as text cells
    pub fn display() -> Self {
        Self { raw: false }
    }

    /// Native typed cells
    pub fn raw() -> Self {
        Self { raw: true }
    }

    fn cell(&self, value: Option<&Value>) -> (&'static str, String) {
        let value = match value {
            None | Some(Value::Null) => return ("String", String::new()),
            Some(value) => value,
        };
        if !self.raw {
            return ("String", value.to_string());
        }
        match value {
            Value::Int64(_) | Value::Float64(_) | Value::Decimal(_) => ("Number", value.to_string()),
            Value::Bool(b) => ("Boolean", if *b { "1" } else { "0" }.to_string()),
            Value::Date(date) => ("DateTime", format!("{}T00:00:00.000", date.format("%Y-%m-%d"))),
            Value::DateTime(datetime) => (
                "DateTime",
                datetime.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            ),
            other => ("String", other.to_string()),
        }
    }
}

fn sheet_name(context: &RenderContext) -> String {
    let name = if context.title.is_empty() {
        &context.grid_id
    } else {
        &context.title
    };
    name.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '?' | '*' | '[' | ']' | ':'))
        .take(MAX_SHEET_NAME)
        .collect()
}

impl Renderer for SpreadsheetRenderer {
    fn name(&self) -> &'static str {
        if self.raw { SPREADSHEET_RAW } else { SPREADSHEET }
    }

    fn is_export(&self) -> bool {
        true
    }

    fn render(&self, context: &RenderContext) -> Result<RenderOutput> {
        let columns = context.export_columns()?;
        let mut out = String::new();

        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<?mso-application progid=\"Excel.Sheet\"?>\n");
        out.push_str(
            "<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\" \
             xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n",
        );
        let _ = writeln!(
            out,
            "<Worksheet ss:Name=\"{}\"><Table>",
            escape_html(&sheet_name(context))
        );

        for column in &columns {
            let _ = writeln!(
                out,
                "<Column ss:Width=\"{:.0}\"/>",
                column.width * POINTS_PER_WIDTH_UNIT
            );
        }

        out.push_str("<Row>");
        for column in &columns {
            let _ = write!(
                out,
                "<Cell><Data ss:Type=\"String\">{}</Data></Cell>",
                escape_html(&column.label)
            );
        }
        out.push_str("</Row>\n");

        for row in &context.rows {
            out.push_str("<Row>");
            for column in &columns {
                let (kind, text) = self.cell(row.get(column.unique_id()));
                let _ = write!(
                    out,
                    "<Cell><Data ss:Type=\"{}\">{}</Data></Cell>",
                    kind,
                    escape_html(&text)
                );
            }
            out.push_str("</Row>\n");
        }

        out.push_str("</Table></Worksheet>\n</Workbook>\n");

        tracing::debug!(rows = context.rows.len(), raw = self.raw, "rendered spreadsheet export");
        Ok(
            RenderOutput::new("application/vnd.ms-excel; charset=utf-8", out)
                .with_file_name(format!("{}.xml", context.grid_id)),
        )
    }
}
