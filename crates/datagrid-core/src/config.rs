//! Grid configuration
//!
//! A grid is described by a TOML (or JSON) document:
//!
//! ```toml
//! [grid]
//! id = "books"
//! items_per_page = 10
//!
//! [source]
//! type = "sqlite"
//! database = "library.db"
//! table = "book"
//!
//! [[columns]]
//! kind = "select"
//! column = "vol"
//! sort_default = { priority = 1, direction = "ASC" }
//!
//! [columns.type]
//! name = "number"
//! locale = "de_DE"
//! ```
//!
//! Columns carry a `kind` discriminant. The [`ColumnRegistry`] maps each kind
//! to a builder that deserializes its own options struct.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    ArrayType, Column, DataPopulation, DateTimeType, EmailFormatter, FileSizeFormatter,
    FilterOperator, Formatter, GridError, HtmlTagFormatter, LinkFormatter, NumberLocale,
    NumberType, PopulationParameter, ReplaceValues, Result, SortDirection, Style,
    TemplatePopulation, ValueType, parse_time_zone,
};

/// Top-level grid definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub csv: CsvSettings,
    #[serde(default)]
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    /// Styles applied to whole rows
    #[serde(default)]
    pub row_styles: Vec<Style>,
    /// Translation table for columns with `translate = true`
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub id: String,
    pub title: String,
    pub items_per_page: usize,
    pub default_renderer: String,
    /// Export renderers export only the cached page instead of every row
    pub export_current_page_only: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            id: "defaultGrid".to_string(),
            title: String::new(),
            items_per_page: 25,
            default_renderer: "html".to_string(),
            export_current_page_only: false,
        }
    }
}

/// Options of the CSV renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSettings {
    pub delimiter: char,
    pub text_qualifier: Option<char>,
    pub record_delimiter: String,
    pub include_headers: bool,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            text_qualifier: Some('"'),
            record_delimiter: "\n".to_string(),
            include_headers: true,
        }
    }
}

/// Backend the grid reads from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// In-memory rows, inline or from a JSON file holding an array of objects
    Array {
        #[serde(default)]
        rows: Vec<IndexMap<String, serde_json::Value>>,
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Sqlite {
        database: PathBuf,
        table: String,
    },
}

/// One `[[columns]]` entry: a kind plus kind-specific options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

fn default_kind() -> String {
    "select".to_string()
}

impl GridConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load by file extension; anything but `.json` is read as TOML
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        tracing::debug!(path = %path.display(), columns = config.columns.len(), "loaded grid config");
        Ok(config)
    }

    /// Build every column through the registry, checking unique ids
    pub fn build_columns(&self, registry: &ColumnRegistry) -> Result<Vec<Column>> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len());
        for definition in &self.columns {
            let column = registry.build(definition)?;
            if columns.iter().any(|c| c.unique_id() == column.unique_id()) {
                return Err(GridError::Configuration(format!(
                    "Duplicate column unique id: {}",
                    column.unique_id()
                )));
            }
            columns.push(column);
        }
        Ok(columns)
    }
}

/// Value type options, tagged by `name`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum TypeOptions {
    #[default]
    String,
    Number {
        #[serde(default = "default_locale")]
        locale: String,
        #[serde(default)]
        fraction_digits: Option<usize>,
        #[serde(default = "default_true")]
        grouping: bool,
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
    },
    Datetime {
        #[serde(default = "default_datetime_format")]
        source_format: String,
        #[serde(default = "default_timezone")]
        source_timezone: String,
        #[serde(default = "default_datetime_format")]
        output_pattern: String,
        #[serde(default = "default_timezone")]
        output_timezone: String,
        #[serde(default)]
        daterange: bool,
    },
    ArrayOfStrings {
        #[serde(default = "default_separator")]
        separator: String,
    },
    Image,
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_true() -> bool {
    true
}

fn default_datetime_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_separator() -> String {
    ",".to_string()
}

impl TypeOptions {
    /// Resolve locale and time zones into a value type
    pub fn build(&self) -> Result<ValueType> {
        Ok(match self {
            Self::String => ValueType::String,
            Self::Number {
                locale,
                fraction_digits,
                grouping,
                prefix,
                suffix,
            } => ValueType::Number(NumberType {
                locale: NumberLocale::from_code(locale)?,
                fraction_digits: *fraction_digits,
                grouping: *grouping,
                prefix: prefix.clone(),
                suffix: suffix.clone(),
            }),
            Self::Datetime {
                source_format,
                source_timezone,
                output_pattern,
                output_timezone,
                daterange,
            } => ValueType::DateTime(DateTimeType {
                source_format: source_format.clone(),
                source_timezone: parse_time_zone(source_timezone)?,
                output_pattern: output_pattern.clone(),
                output_timezone: parse_time_zone(output_timezone)?,
                daterange_enabled: *daterange,
            }),
            Self::ArrayOfStrings { separator } => ValueType::ArrayOfStrings(ArrayType {
                separator: separator.clone(),
            }),
            Self::Image => ValueType::Image,
        })
    }
}

/// Built-in formatter options, tagged by `name`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum FormatterOptions {
    Email,
    Link,
    FileSize,
    HtmlTag {
        tag: String,
        #[serde(default)]
        attributes: IndexMap<String, String>,
    },
}

impl FormatterOptions {
    pub fn build(&self) -> Arc<dyn Formatter> {
        match self {
            Self::Email => Arc::new(EmailFormatter::default()),
            Self::Link => Arc::new(LinkFormatter::default()),
            Self::FileSize => Arc::new(FileSizeFormatter::default()),
            Self::HtmlTag { tag, attributes } => Arc::new(
                attributes
                    .iter()
                    .fold(HtmlTagFormatter::new(tag.clone()), |f, (name, value)| {
                        f.with_attribute(name.clone(), value.clone())
                    }),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SortDefaultOptions {
    #[serde(default)]
    pub priority: usize,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Options shared by every column kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommonColumnOptions {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub value_type: TypeOptions,
    #[serde(default)]
    pub identity: bool,
    #[serde(default)]
    pub sortable: Option<bool>,
    #[serde(default)]
    pub filterable: Option<bool>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub exportable: Option<bool>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub sort_default: Option<SortDefaultOptions>,
    #[serde(default)]
    pub filter_default_operator: Option<FilterOperator>,
    #[serde(default)]
    pub filter_default_value: Option<String>,
    #[serde(default)]
    pub translate: bool,
    #[serde(default)]
    pub replace_values: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub not_replaced_get_empty: Option<bool>,
    #[serde(default)]
    pub styles: Vec<Style>,
    #[serde(default)]
    pub formatters: Vec<FormatterOptions>,
}

impl CommonColumnOptions {
    fn apply(&self, mut column: Column) -> Result<Column> {
        if let Some(label) = &self.label {
            column.label = label.clone();
        }
        column.value_type = self.value_type.build()?;
        column.identity = self.identity;
        if let Some(sortable) = self.sortable {
            column.sortable = sortable;
        }
        if let Some(filterable) = self.filterable {
            column.filterable = filterable;
        }
        column.hidden = self.hidden;
        if let Some(exportable) = self.exportable {
            column.exportable = exportable;
        }
        if let Some(width) = self.width {
            column.width = width;
        }
        if let Some(sort) = self.sort_default {
            column = column.with_sort_default(sort.priority, sort.direction);
        }
        column.filter_default_operator = self.filter_default_operator.clone();
        column.filter_default_value = self.filter_default_value.clone();
        column.translation_enabled = self.translate;
        if let Some(table) = &self.replace_values {
            let mut replace = ReplaceValues::new(table.clone());
            if let Some(empty) = self.not_replaced_get_empty {
                replace.not_replaced_get_empty = empty;
            }
            column.replace_values = Some(replace);
        }
        column.styles = self.styles.clone();
        column.formatters = self.formatters.iter().map(FormatterOptions::build).collect();
        Ok(column)
    }
}

/// Options of `kind = "select"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectColumnOptions {
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    /// Backend expression; requires `unique_id`
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(flatten)]
    pub common: CommonColumnOptions,
}

/// Options of `kind = "external"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalColumnOptions {
    pub unique_id: String,
    /// Static cell value
    #[serde(default)]
    pub value: Option<String>,
    /// Template with `:parameter:` placeholders
    #[serde(default)]
    pub template: Option<String>,
    /// Template parameter name -> column unique id
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    #[serde(flatten)]
    pub common: CommonColumnOptions,
}

fn build_select(options: &serde_json::Map<String, serde_json::Value>) -> Result<Column> {
    let options: SelectColumnOptions =
        serde_json::from_value(serde_json::Value::Object(options.clone()))?;

    let column = match (&options.expression, &options.column) {
        (Some(expression), _) => {
            let unique_id = options.unique_id.clone().ok_or_else(|| {
                GridError::Configuration(format!(
                    "Expression column \"{}\" needs a unique_id",
                    expression
                ))
            })?;
            Column::expression(unique_id, expression.clone())
        }
        (None, Some(name)) => match &options.unique_id {
            Some(unique_id) => Column::select_as(unique_id.clone(), name, options.table.as_deref()),
            None => Column::select(name, options.table.as_deref()),
        },
        (None, None) => {
            return Err(GridError::Configuration(
                "Select column needs either `column` or `expression`".to_string(),
            ));
        }
    };

    options.common.apply(column)
}

fn build_external(options: &serde_json::Map<String, serde_json::Value>) -> Result<Column> {
    let options: ExternalColumnOptions =
        serde_json::from_value(serde_json::Value::Object(options.clone()))?;

    let population = match (&options.value, &options.template) {
        (_, Some(template)) => options.parameters.iter().fold(
            DataPopulation::object(Arc::new(TemplatePopulation::new(template.clone()))),
            |population, (name, column_id)| {
                population.with_parameter(PopulationParameter::new(name.clone(), column_id.clone()))
            },
        ),
        (Some(value), None) => DataPopulation::StaticValue(value.clone()),
        (None, None) => {
            return Err(GridError::Configuration(format!(
                "External column \"{}\" needs a `value` or a `template`",
                options.unique_id
            )));
        }
    };

    options
        .common
        .apply(Column::external(options.unique_id.clone(), population))
}

pub type ColumnBuilder =
    Arc<dyn Fn(&serde_json::Map<String, serde_json::Value>) -> Result<Column> + Send + Sync>;

/// Maps column kind discriminants to builders
#[derive(Clone, Default)]
pub struct ColumnRegistry {
    builders: HashMap<String, ColumnBuilder>,
}

impl ColumnRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `select` and `external` kinds
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("select", Arc::new(build_select));
        registry.register("external", Arc::new(build_external));
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, builder: ColumnBuilder) {
        self.builders.insert(kind.into(), builder);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    pub fn build(&self, definition: &ColumnDefinition) -> Result<Column> {
        let builder = self.builders.get(&definition.kind).ok_or_else(|| {
            GridError::Configuration(format!("Unknown column kind: {}", definition.kind))
        })?;
        builder(&definition.options)
    }
}

impl std::fmt::Debug for ColumnRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnRegistry")
            .field("kinds", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Default column kinds
pub static COLUMN_REGISTRY: LazyLock<Arc<ColumnRegistry>> =
    LazyLock::new(|| Arc::new(ColumnRegistry::with_defaults()));
