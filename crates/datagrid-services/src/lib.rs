//! Datagrid Services Layer
//!
//! Orchestration on top of the core model, the data sources and the
//! renderers:
//!
//! ```text
//! GridRequest
//!     ↓
//! Grid (this crate) ── CacheStore
//!     ↓
//! DataSource → PaginationAdapter (datagrid-sources)
//!     ↓
//! RowPreparer (this crate)
//!     ↓
//! Renderer (datagrid-render)
//! ```
//!
//! # Services
//!
//! - [`Grid`] - resolves request state, runs the source and renders a page
//! - [`RowPreparer`] - raw rows to display rows
//! - [`CacheStore`] - request state kept for exports

mod cache;
mod grid;
mod preparer;
mod request;

pub use cache::{
    CacheEntry, CacheStore, CachedFilter, CachedSort, FileCache, MemoryCache, cache_key,
};
pub use grid::{Grid, build_source};
pub use preparer::RowPreparer;
pub use request::{FilterRequest, GridRequest, SortRequest};
