//! Grid orchestrator
//!
//! A `Grid` binds columns, a data source and renderers. `render` resolves
//! request state (or, for export renderers, the cached state of the last
//! interactive request), runs the source, fetches the page, prepares rows
//! and renders them.

use std::sync::Arc;

use datagrid_core::{
    COLUMN_REGISTRY, Column, CsvSettings, Filter, GridConfig, GridError, GridSettings,
    MapTranslator, RawRow, Result, SortCondition, SourceConfig, Style, Translator, Value,
};
use datagrid_render::{RENDERERS, RenderContext, RenderOutput, Renderer, RendererRegistry};
use datagrid_sources::{ArraySource, DataSource, SqlBuilderSource, SqliteConnection};

use crate::cache::{CacheEntry, CacheStore, CachedFilter, CachedSort, cache_key};
use crate::preparer::RowPreparer;
use crate::request::GridRequest;

/// Sort, filter and page state of one request
#[derive(Debug, Clone, Default)]
struct RequestState {
    sorts: Vec<SortCondition>,
    filters: Vec<Filter>,
    page: usize,
}

pub struct Grid {
    settings: GridSettings,
    csv: CsvSettings,
    columns: Vec<Arc<Column>>,
    row_styles: Vec<Style>,
    source: Box<dyn DataSource>,
    cache: Option<Arc<dyn CacheStore>>,
    translator: Option<Arc<dyn Translator>>,
    renderers: Arc<RendererRegistry>,
}

impl Grid {
    pub fn new(settings: GridSettings, columns: Vec<Column>, source: Box<dyn DataSource>) -> Self {
        Self {
            settings,
            csv: CsvSettings::default(),
            columns: columns.into_iter().map(Arc::new).collect(),
            row_styles: Vec::new(),
            source,
            cache: None,
            translator: None,
            renderers: RENDERERS.clone(),
        }
    }

    /// Build a grid from its definition; the source comes from `[source]`
    /// unless one is given
    pub fn from_config(config: &GridConfig, source: Option<Box<dyn DataSource>>) -> Result<Self> {
        let source = match source {
            Some(source) => source,
            None => {
                let source_config = config.source.as_ref().ok_or_else(|| {
                    GridError::Configuration("No data source configured for the grid".to_string())
                })?;
                build_source(source_config)?
            }
        };

        let columns = config.build_columns(&COLUMN_REGISTRY)?;
        let mut grid = Self::new(config.grid.clone(), columns, source)
            .with_csv(config.csv.clone())
            .with_row_styles(config.row_styles.clone());
        if !config.translations.is_empty() {
            grid = grid.with_translator(Arc::new(MapTranslator::new(config.translations.clone())));
        }
        Ok(grid)
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_renderers(mut self, renderers: Arc<RendererRegistry>) -> Self {
        self.renderers = renderers;
        self
    }

    pub fn with_row_styles(mut self, styles: Vec<Style>) -> Self {
        self.row_styles = styles;
        self
    }

    pub fn with_csv(mut self, csv: CsvSettings) -> Self {
        self.csv = csv;
        self
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn columns(&self) -> &[Arc<Column>] {
        &self.columns
    }

    pub fn column(&self, unique_id: &str) -> Option<&Arc<Column>> {
        self.columns.iter().find(|c| c.unique_id() == unique_id)
    }

    #[tracing::instrument(skip(self, request), fields(grid = %self.settings.id))]
    pub async fn render(&mut self, request: &GridRequest) -> Result<RenderOutput> {
        let renderer_name = request
            .renderer
            .as_deref()
            .unwrap_or(&self.settings.default_renderer);
        let renderer = self.renderers.get(renderer_name)?;
        let items_per_page = request
            .items_per_page
            .unwrap_or(self.settings.items_per_page)
            .max(1);
        let key = cache_key(&request.session_id, &self.settings.id);

        let state = if renderer.is_export() {
            self.cached_state(&key, request)?
        } else {
            let state = self.request_state(request);
            self.store_state(&key, &state)?;
            state
        };

        self.source.set_columns(self.columns.clone());
        self.source.set_sort_conditions(state.sorts.clone());
        self.source.set_filters(state.filters.clone());
        self.source.execute()?;

        let adapter = self.source.pagination_adapter().ok_or_else(|| {
            GridError::Configuration("Data source produced no pagination adapter".to_string())
        })?;
        let total = adapter.count().await?;

        let whole_result = renderer.is_export() && !self.settings.export_current_page_only;
        let page_count = total.div_ceil(items_per_page).max(1);
        let page = state.page.clamp(1, page_count);
        let rows: Vec<RawRow> = if whole_result {
            adapter.get_items(0, total).await?
        } else {
            adapter
                .get_items((page - 1) * items_per_page, items_per_page)
                .await?
        };

        let mut preparer = RowPreparer::new(renderer.name());
        if let Some(translator) = &self.translator {
            preparer = preparer.with_translator(translator.clone());
        }
        preparer.prepare(&rows, &self.columns)?;

        tracing::info!(
            renderer = renderer.name(),
            rows = rows.len(),
            total,
            page,
            filters = state.filters.len(),
            sorts = state.sorts.len(),
            "grid loaded"
        );

        let context = RenderContext {
            grid_id: self.settings.id.clone(),
            title: self.settings.title.clone(),
            columns: self.columns.clone(),
            rows: preparer.into_rows(),
            total,
            page: if whole_result { 1 } else { page },
            items_per_page: if whole_result { total.max(1) } else { items_per_page },
            sort_conditions: state.sorts,
            filters: state.filters,
            row_styles: self.row_styles.clone(),
            csv: self.csv.clone(),
        };
        renderer.render(&context)
    }

    /// Sorts, filters and page from the request, with column defaults where
    /// the request is silent
    fn request_state(&self, request: &GridRequest) -> RequestState {
        let mut sorts = Vec::new();
        for sort in &request.sorts {
            match self.column(&sort.column) {
                Some(column) if column.sortable => {
                    sorts.push(SortCondition::new(column.clone(), sort.direction));
                }
                Some(_) => tracing::warn!(column = %sort.column, "ignoring sort on a non-sortable column"),
                None => tracing::warn!(column = %sort.column, "ignoring sort on an unknown column"),
            }
        }
        if request.sorts.is_empty() {
            let mut defaults: Vec<(usize, SortCondition)> = self
                .columns
                .iter()
                .filter_map(|column| {
                    column.sort_default.map(|default| {
                        (default.priority, SortCondition::new(column.clone(), default.direction))
                    })
                })
                .collect();
            defaults.sort_by_key(|(priority, _)| *priority);
            sorts = defaults.into_iter().map(|(_, sort)| sort).collect();
        }

        let mut filters = Vec::new();
        for filter in &request.filters {
            match self.column(&filter.column) {
                Some(column) if column.filterable => {
                    if !filter.input.trim().is_empty() {
                        filters.push(Filter::parse(column.clone(), &filter.input));
                    }
                }
                Some(_) => tracing::warn!(column = %filter.column, "ignoring filter on a non-filterable column"),
                None => tracing::warn!(column = %filter.column, "ignoring filter on an unknown column"),
            }
        }
        for column in &self.columns {
            let requested = request.filters.iter().any(|f| f.column == column.unique_id());
            if let Some(default) = &column.filter_default_value
                && !requested
                && column.filterable
            {
                filters.push(Filter::parse(column.clone(), default));
            }
        }

        RequestState {
            sorts,
            filters,
            page: request.page.unwrap_or(1),
        }
    }

    fn store_state(&self, key: &str, state: &RequestState) -> Result<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let entry = CacheEntry {
            sort_conditions: state
                .sorts
                .iter()
                .map(|sort| CachedSort {
                    column: sort.column.unique_id().to_string(),
                    direction: sort.direction,
                })
                .collect(),
            filters: state
                .filters
                .iter()
                .map(|filter| CachedFilter {
                    column: filter.column().unique_id().to_string(),
                    operator: filter.operator().clone(),
                    values: filter.values().to_vec(),
                    display_value: filter.display_value().to_string(),
                })
                .collect(),
            current_page: state.page,
        };
        if !cache.set(key, &entry)? {
            return Err(GridError::CacheWrite(key.to_string()));
        }
        Ok(())
    }

    /// State of the last interactive request, or the request itself when
    /// nothing was cached
    fn cached_state(&self, key: &str, request: &GridRequest) -> Result<RequestState> {
        let entry = match &self.cache {
            Some(cache) => cache.get(key)?,
            None => None,
        };
        let Some(entry) = entry else {
            tracing::warn!(key = %key, "no cached grid state for export, using the request");
            return Ok(self.request_state(request));
        };

        let sorts = entry
            .sort_conditions
            .iter()
            .filter_map(|sort| {
                let column = self.column(&sort.column)?;
                Some(SortCondition::new(column.clone(), sort.direction))
            })
            .collect();
        let filters = entry
            .filters
            .iter()
            .filter_map(|cached| {
                let column = self.column(&cached.column)?;
                Some(Filter::new(
                    column.clone(),
                    cached.operator.clone(),
                    cached.values.clone(),
                    cached.display_value.clone(),
                ))
            })
            .collect();

        Ok(RequestState {
            sorts,
            filters,
            page: entry.current_page.max(1),
        })
    }
}

/// Data source for a `[source]` definition
pub fn build_source(config: &SourceConfig) -> Result<Box<dyn DataSource>> {
    match config {
        SourceConfig::Array { rows, path } => {
            let mut raw: Vec<RawRow> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                        .collect()
                })
                .collect();
            if let Some(path) = path {
                let text = std::fs::read_to_string(path)?;
                let loaded: Vec<serde_json::Map<String, serde_json::Value>> =
                    serde_json::from_str(&text)?;
                raw.extend(ArraySource::from_json(loaded).rows().iter().cloned());
            }
            tracing::debug!(rows = raw.len(), "array source");
            Ok(Box::new(ArraySource::new(raw)))
        }
        SourceConfig::Sqlite { database, table } => {
            let connection = SqliteConnection::open(database)?;
            Ok(Box::new(
                SqlBuilderSource::from_table(table).with_connection(Arc::new(connection)),
            ))
        }
    }
}
