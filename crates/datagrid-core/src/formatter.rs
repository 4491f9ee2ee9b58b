//! Column formatters
//!
//! Formatters run last in row preparation. Each one sees the whole row as
//! prepared so far and returns the new cell content for its column.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{Column, PreparedRow, Value};

pub trait Formatter: Send + Sync + fmt::Debug {
    /// Renderer names this formatter applies to; empty means all
    fn valid_renderers(&self) -> &[String];

    fn is_applicable(&self, renderer: &str) -> bool {
        let valid = self.valid_renderers();
        valid.is_empty() || valid.iter().any(|name| name == renderer)
    }

    fn format(&self, row: &PreparedRow, column: &Column) -> String;
}

fn html_only() -> Vec<String> {
    vec!["html".to_string()]
}

fn cell(row: &PreparedRow, column: &Column) -> String {
    row.get(column.unique_id())
        .map(Value::to_string)
        .unwrap_or_default()
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders the value as a `mailto:` link
#[derive(Debug, Clone)]
pub struct EmailFormatter {
    renderers: Vec<String>,
}

impl Default for EmailFormatter {
    fn default() -> Self {
        Self {
            renderers: html_only(),
        }
    }
}

impl Formatter for EmailFormatter {
    fn valid_renderers(&self) -> &[String] {
        &self.renderers
    }

    fn format(&self, row: &PreparedRow, column: &Column) -> String {
        let value = escape_html(&cell(row, column));
        format!("<a href=\"mailto:{0}\">{0}</a>", value)
    }
}

/// Renders the value as a link to itself
#[derive(Debug, Clone)]
pub struct LinkFormatter {
    renderers: Vec<String>,
}

impl Default for LinkFormatter {
    fn default() -> Self {
        Self {
            renderers: html_only(),
        }
    }
}

impl Formatter for LinkFormatter {
    fn valid_renderers(&self) -> &[String] {
        &self.renderers
    }

    fn format(&self, row: &PreparedRow, column: &Column) -> String {
        let value = escape_html(&cell(row, column));
        format!("<a href=\"{0}\">{0}</a>", value)
    }
}

/// Human readable byte sizes, e.g. `1536` -> `1.50 KB`
#[derive(Debug, Clone, Default)]
pub struct FileSizeFormatter {
    renderers: Vec<String>,
}

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

impl Formatter for FileSizeFormatter {
    fn valid_renderers(&self) -> &[String] {
        &self.renderers
    }

    fn format(&self, row: &PreparedRow, column: &Column) -> String {
        let text = cell(row, column);
        let Some(mut size) = crate::parse_number(&text) else {
            return text;
        };

        let mut unit = 0;
        while size.abs() >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            format!("{} {}", size, SIZE_UNITS[0])
        } else {
            format!("{:.2} {}", size, SIZE_UNITS[unit])
        }
    }
}

/// Wraps the value in an HTML element.
///
/// Attribute values may reference other cells of the row as `:column_id:`.
#[derive(Debug, Clone)]
pub struct HtmlTagFormatter {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    renderers: Vec<String>,
}

impl HtmlTagFormatter {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            renderers: html_only(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// `<a href="...">` shorthand
    pub fn link(href: impl Into<String>) -> Self {
        Self::new("a").with_attribute("href", href)
    }

    fn fill_placeholders(template: &str, row: &PreparedRow) -> String {
        row.iter().fold(template.to_string(), |out, (key, value)| {
            let placeholder = format!(":{}:", key);
            if out.contains(&placeholder) {
                out.replace(&placeholder, &value.to_string())
            } else {
                out
            }
        })
    }
}

impl Formatter for HtmlTagFormatter {
    fn valid_renderers(&self) -> &[String] {
        &self.renderers
    }

    fn format(&self, row: &PreparedRow, column: &Column) -> String {
        let mut html = format!("<{}", self.tag);
        for (name, template) in &self.attributes {
            let value = Self::fill_placeholders(template, row);
            html.push_str(&format!(" {}=\"{}\"", name, escape_html(&value)));
        }
        html.push('>');
        html.push_str(&escape_html(&cell(row, column)));
        html.push_str(&format!("</{}>", self.tag));
        html
    }
}

type FormatFn = dyn Fn(&PreparedRow, &Column) -> String + Send + Sync;

/// Closure-backed formatter
#[derive(Clone)]
pub struct FnFormatter {
    renderers: Vec<String>,
    format: Arc<FormatFn>,
}

impl FnFormatter {
    pub fn new(format: impl Fn(&PreparedRow, &Column) -> String + Send + Sync + 'static) -> Self {
        Self {
            renderers: Vec::new(),
            format: Arc::new(format),
        }
    }

    pub fn for_renderers<I, S>(mut self, renderers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.renderers = renderers.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for FnFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFormatter")
            .field("renderers", &self.renderers)
            .finish_non_exhaustive()
    }
}

impl Formatter for FnFormatter {
    fn valid_renderers(&self) -> &[String] {
        &self.renderers
    }

    fn format(&self, row: &PreparedRow, column: &Column) -> String {
        (self.format)(row, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> PreparedRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn email_is_html_only() {
        let formatter = EmailFormatter::default();
        assert!(formatter.is_applicable("html"));
        assert!(!formatter.is_applicable("csv"));

        let column = Column::select("mail", None);
        let out = formatter.format(&row(&[("mail", Value::from("a@b.c"))]), &column);
        assert_eq!(out, "<a href=\"mailto:a@b.c\">a@b.c</a>");
    }

    #[test]
    fn file_size_scales_units() {
        let formatter = FileSizeFormatter::default();
        let column = Column::select("size", None);
        assert!(formatter.is_applicable("csv"));
        assert_eq!(formatter.format(&row(&[("size", Value::from("512"))]), &column), "512 B");
        assert_eq!(
            formatter.format(&row(&[("size", Value::Int64(1536))]), &column),
            "1.50 KB"
        );
        assert_eq!(formatter.format(&row(&[("size", Value::from("n/a"))]), &column), "n/a");
    }

    #[test]
    fn html_tag_fills_row_placeholders() {
        let formatter = HtmlTagFormatter::link("/book/:id:");
        let column = Column::select("title", None);
        let out = formatter.format(
            &row(&[("id", Value::Int64(7)), ("title", Value::from("Dune & Co"))]),
            &column,
        );
        assert_eq!(out, "<a href=\"/book/7\">Dune &amp; Co</a>");
    }

    #[test]
    fn fn_formatter_limits_renderers() {
        let formatter = FnFormatter::new(|_, _| "x".to_string()).for_renderers(["csv"]);
        assert!(formatter.is_applicable("csv"));
        assert!(!formatter.is_applicable("html"));
    }
}
