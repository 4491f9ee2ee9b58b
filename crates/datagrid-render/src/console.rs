//! Plain-text table for terminals

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use datagrid_core::{Result, SortDirection};

use crate::context::cell_text;
use crate::{RenderContext, RenderOutput, Renderer};

pub const CONSOLE: &str = "console";

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleRenderer {
    /// Terminal width hint; `None` lets the table grow
    pub width: Option<u16>,
}

impl Renderer for ConsoleRenderer {
    fn name(&self) -> &'static str {
        CONSOLE
    }

    fn render(&self, context: &RenderContext) -> Result<RenderOutput> {
        let columns = context.visible_columns();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        if let Some(width) = self.width {
            table
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(width);
        }

        table.set_header(columns.iter().map(|column| {
            match context.sort_direction(column) {
                Some(SortDirection::Asc) => format!("{} ^", column.label),
                Some(SortDirection::Desc) => format!("{} v", column.label),
                None => column.label.clone(),
            }
        }));

        for row in &context.rows {
            table.add_row(columns.iter().map(|column| cell_text(row, column)));
        }

        let mut body = table.to_string();
        if !context.title.is_empty() {
            body = format!("{}\n{}", context.title, body);
        }
        body.push_str(&format!(
            "\nPage {}/{}, {} rows\n",
            context.page,
            context.page_count(),
            context.total
        ));

        Ok(RenderOutput::new("text/plain; charset=utf-8", body))
    }
}
