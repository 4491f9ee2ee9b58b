//! Output renderers for prepared grid pages
//!
//! A renderer turns a [`RenderContext`] into a document. Its name is what
//! formatters and the row pipeline see as the active renderer, so it must
//! match the names used in column configuration.

mod console;
mod context;
mod csv;
mod html;
mod json;
mod spreadsheet;

use std::sync::{Arc, LazyLock};

use datagrid_core::{GridError, Result};
use indexmap::IndexMap;

pub use console::{CONSOLE, ConsoleRenderer};
pub use context::{RenderContext, RenderOutput};
pub use csv::{CSV, CsvRenderer};
pub use html::{HTML, HtmlRenderer};
pub use json::{JSON, JsonRenderer};
pub use spreadsheet::{SPREADSHEET, SPREADSHEET_RAW, SpreadsheetRenderer};

pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Export renderers write every row of the cached request state
    fn is_export(&self) -> bool {
        false
    }

    fn render(&self, context: &RenderContext) -> Result<RenderOutput>;
}

/// Renderers by name
pub struct RendererRegistry {
    renderers: IndexMap<String, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self {
            renderers: IndexMap::new(),
        }
    }

    /// The built-in renderers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlRenderer));
        registry.register(Arc::new(JsonRenderer));
        registry.register(Arc::new(ConsoleRenderer::default()));
        registry.register(Arc::new(CsvRenderer));
        registry.register(Arc::new(SpreadsheetRenderer::display()));
        registry.register(Arc::new(SpreadsheetRenderer::raw()));
        registry
    }

    pub fn register(&mut self, renderer: Arc<dyn Renderer>) {
        self.renderers.insert(renderer.name().to_string(), renderer);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Renderer>> {
        self.renderers
            .get(name)
            .cloned()
            .ok_or_else(|| GridError::Configuration(format!("Unknown renderer: {}", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

pub static RENDERERS: LazyLock<Arc<RendererRegistry>> =
    LazyLock::new(|| Arc::new(RendererRegistry::with_defaults()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_every_renderer() {
        let names: Vec<&str> = RENDERERS.names().collect();
        assert_eq!(
            names,
            vec![HTML, JSON, CONSOLE, CSV, SPREADSHEET, SPREADSHEET_RAW]
        );
        assert!(RENDERERS.get(CSV).unwrap().is_export());
        assert!(!RENDERERS.get(HTML).unwrap().is_export());
    }

    #[test]
    fn unknown_renderer_is_a_configuration_error() {
        let err = RENDERERS.get("pdf").err().unwrap();
        assert_eq!(err.to_string(), "Configuration error: Unknown renderer: pdf");
    }
}
