//! Request state cache
//!
//! Interactive requests store their sort conditions, filters and page so a
//! following export renders exactly the same rows. Last writer wins.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;

use datagrid_core::{FilterOperator, GridError, Result, SortDirection};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSort {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFilter {
    pub column: String,
    pub operator: FilterOperator,
    pub values: Vec<String>,
    pub display_value: String,
}

/// What an export needs to reproduce the interactive row set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub sort_conditions: Vec<CachedSort>,
    pub filters: Vec<CachedFilter>,
    pub current_page: usize,
}

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Returns whether the entry was stored
    fn set(&self, key: &str, entry: &CacheEntry) -> Result<bool>;
}

/// Deterministic key for a grid within a session
pub fn cache_key(session_id: &str, grid_id: &str) -> String {
    let mut hasher = DefaultHasher::new();
    session_id.hash(&mut hasher);
    grid_id.hash(&mut hasher);
    format!("datagrid_{:016x}", hasher.finish())
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entry = self.entries.read().get(key).cloned();
        if entry.is_some() {
            tracing::debug!(key = %key, "cache hit");
        } else {
            tracing::debug!(key = %key, "cache miss");
        }
        Ok(entry)
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<bool> {
        self.entries.write().insert(key.to_string(), entry.clone());
        Ok(true)
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.path(key);
        if !path.exists() {
            tracing::debug!(key = %key, "cache miss");
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<bool> {
        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(&self.dir)?;
            let text = serde_json::to_string(entry)?;
            std::fs::write(self.path(key), text)
        };
        write().map_err(|e| {
            tracing::warn!(key = %key, error = %e, "cache write failed");
            GridError::CacheWrite(key.to_string())
        })?;
        Ok(true)
    }
}
