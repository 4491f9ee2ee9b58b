//! HTML table renderer
//!
//! Cell values are escaped unless the column has a formatter for this
//! renderer, in which case the formatter output is trusted markup. Styles
//! become inline CSS and classes; `Html` styles rewrite the cell content.

use std::fmt::Write;

use datagrid_core::{
    Column, PreparedRow, Result, SortDirection, Style, StyleEffect, ValueType, escape_html,
};

use crate::context::cell_text;
use crate::{RenderContext, RenderOutput, Renderer};

pub const HTML: &str = "html";

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

/// Inline CSS and classes collected from the styles that apply
#[derive(Debug, Default)]
struct Decoration {
    css: Vec<String>,
    classes: Vec<String>,
}

impl Decoration {
    fn collect<'a>(styles: &'a [Style], row: &PreparedRow) -> Result<(Self, Vec<&'a Style>)> {
        let mut decoration = Self::default();
        let mut content = Vec::new();
        for style in styles {
            if !style.applies_to(row)? {
                continue;
            }
            match style.kind.css_side_effect() {
                StyleEffect::Css(css) => decoration.css.push(css),
                StyleEffect::Class(class) => decoration.classes.push(class),
                StyleEffect::Content => content.push(style),
            }
        }
        Ok((decoration, content))
    }

    fn attributes(&self) -> String {
        let mut out = String::new();
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_html(&self.classes.join(" ")));
        }
        if !self.css.is_empty() {
            let _ = write!(out, " style=\"{}\"", escape_html(&self.css.join("; ")));
        }
        out
    }
}

fn cell_content(row: &PreparedRow, column: &Column) -> String {
    let text = cell_text(row, column);
    let trusted = column.formatters.iter().any(|f| f.is_applicable(HTML));
    if trusted {
        return text;
    }
    match column.value_type {
        ValueType::Image if !text.is_empty() => {
            format!("<img src=\"{}\" alt=\"\" />", escape_html(&text))
        }
        _ => escape_html(&text),
    }
}

impl HtmlRenderer {
    fn header(&self, out: &mut String, context: &RenderContext, columns: &[&std::sync::Arc<Column>]) {
        out.push_str("<thead><tr>");
        for column in columns {
            let sort = match context.sort_direction(column) {
                Some(SortDirection::Asc) => " data-sort=\"asc\"",
                Some(SortDirection::Desc) => " data-sort=\"desc\"",
                None => "",
            };
            let _ = write!(
                out,
                "<th data-column=\"{}\"{}>{}</th>",
                escape_html(column.unique_id()),
                sort,
                escape_html(&column.label)
            );
        }
        out.push_str("</tr>");

        if columns.iter().any(|c| c.filterable) {
            out.push_str("<tr class=\"filters\">");
            for column in columns {
                if column.filterable {
                    let value = context
                        .filter_display(column)
                        .or(column.filter_default_value.as_deref())
                        .unwrap_or("");
                    let _ = write!(
                        out,
                        "<th><input type=\"text\" name=\"filter_{}\" value=\"{}\" /></th>",
                        escape_html(column.unique_id()),
                        escape_html(value)
                    );
                } else {
                    out.push_str("<th></th>");
                }
            }
            out.push_str("</tr>");
        }
        out.push_str("</thead>");
    }
}

impl Renderer for HtmlRenderer {
    fn name(&self) -> &'static str {
        HTML
    }

    fn render(&self, context: &RenderContext) -> Result<RenderOutput> {
        let columns = context.visible_columns();
        let mut out = String::new();

        let _ = write!(out, "<table id=\"{}\" class=\"datagrid\">", escape_html(&context.grid_id));
        if !context.title.is_empty() {
            let _ = write!(out, "<caption>{}</caption>", escape_html(&context.title));
        }
        self.header(&mut out, context, &columns);

        out.push_str("<tbody>");
        for row in &context.rows {
            let (row_decoration, _) = Decoration::collect(&context.row_styles, row)?;
            out.push_str("<tr");
            if let Some(id) = row.get(datagrid_core::ID_CONCATED) {
                let _ = write!(out, " data-id=\"{}\"", escape_html(&id.to_string()));
            }
            out.push_str(&row_decoration.attributes());
            out.push('>');

            for column in &columns {
                let (decoration, content_styles) = Decoration::collect(&column.styles, row)?;
                let mut content = cell_content(row, column);
                for style in content_styles {
                    content = style.kind.apply(content);
                }
                let _ = write!(out, "<td{}>{}</td>", decoration.attributes(), content);
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody>");

        let _ = write!(
            out,
            "<tfoot><tr><td colspan=\"{}\">Page {} of {} ({} rows)</td></tr></tfoot></table>",
            columns.len().max(1),
            context.page,
            context.page_count(),
            context.total
        );

        Ok(RenderOutput::new("text/html; charset=utf-8", out))
    }
}
