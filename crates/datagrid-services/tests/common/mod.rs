//! Common test utilities and fixtures

#![allow(dead_code)]

use std::sync::Arc;

use datagrid_core::{Column, GridSettings, NumberType, RawRow, Result, Value, ValueType};
use datagrid_services::{CacheEntry, CacheStore, Grid, MemoryCache};
use datagrid_sources::ArraySource;
use parking_lot::Mutex;

pub fn edition_rows() -> Vec<RawRow> {
    [(67, 2), (86, 1), (85, 6)]
        .into_iter()
        .map(|(vol, ed)| {
            [
                ("vol".to_string(), Value::Int64(vol)),
                ("ed".to_string(), Value::Int64(ed)),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

pub fn number(name: &str) -> Column {
    Column::select(name, None).with_type(ValueType::Number(NumberType::default()))
}

pub fn edition_settings() -> GridSettings {
    GridSettings {
        id: "editions".into(),
        items_per_page: 2,
        ..Default::default()
    }
}

pub fn edition_columns() -> Vec<Column> {
    vec![
        number("vol").with_label("Volume"),
        number("ed").with_label("Edition"),
    ]
}

pub fn edition_grid(cache: Option<Arc<dyn CacheStore>>) -> Grid {
    let grid = Grid::new(
        edition_settings(),
        edition_columns(),
        Box::new(ArraySource::new(edition_rows())),
    );
    match cache {
        Some(cache) => grid.with_cache(cache),
        None => grid.with_cache(Arc::new(MemoryCache::new())),
    }
}

/// Cache that refuses writes and remembers the keys it was asked for
#[derive(Default)]
pub struct RefusingCache {
    pub attempts: Mutex<Vec<String>>,
}

impl CacheStore for RefusingCache {
    fn get(&self, _key: &str) -> Result<Option<CacheEntry>> {
        Ok(None)
    }

    fn set(&self, key: &str, _entry: &CacheEntry) -> Result<bool> {
        self.attempts.lock().push(key.to_string());
        Ok(false)
    }
}
