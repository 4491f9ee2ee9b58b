//! Command line front end for grid definitions
//!
//! ```bash
//! # First page in the terminal
//! datagrid books.toml
//!
//! # Sorted and filtered page as JSON
//! datagrid books.toml -r json --sort vol:desc --filter "vol=>=85"
//!
//! # Export what the last request of the session showed
//! datagrid books.toml -r csv --session alice -o books.csv
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use datagrid_core::{GridConfig, SortDirection};
use datagrid_render::{CONSOLE, ConsoleRenderer, RendererRegistry};
use datagrid_services::{CacheStore, FileCache, Grid, GridRequest, MemoryCache};

#[derive(Parser, Debug)]
#[command(name = "datagrid")]
#[command(version)]
#[command(about = "Render a page of a configured data grid")]
struct Cli {
    /// Grid definition (TOML or JSON)
    config: PathBuf,

    /// Renderer name; defaults to the console table
    #[arg(short, long)]
    renderer: Option<String>,

    /// 1-based page number
    #[arg(short, long)]
    page: Option<usize>,

    #[arg(long = "per-page")]
    per_page: Option<usize>,

    /// Sort condition as `column[:asc|desc]`, repeatable
    #[arg(short, long = "sort", value_parser = parse_sort)]
    sorts: Vec<(String, SortDirection)>,

    /// Filter as `column=input`, repeatable
    #[arg(short, long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Session that owns the cached grid state
    #[arg(long, env = "DATAGRID_SESSION", default_value = "default")]
    session: String,

    /// Directory of the grid state cache
    #[arg(long, env = "DATAGRID_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Console table width
    #[arg(long)]
    width: Option<u16>,

    /// Write the rendered output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn request(&self) -> GridRequest {
        let mut request = GridRequest::new(&self.session);
        request.renderer = self.renderer.clone();
        request.page = self.page;
        request.items_per_page = self.per_page;
        for (column, direction) in &self.sorts {
            request = request.sort_by(column, *direction);
        }
        for (column, input) in &self.filters {
            request = request.filter(column, input);
        }
        request
    }

    fn cache(&self) -> Arc<dyn CacheStore> {
        let dir = self
            .cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("datagrid")));
        match dir {
            Some(dir) => Arc::new(FileCache::new(dir)),
            None => {
                tracing::warn!("no cache directory available, exports will not see earlier requests");
                Arc::new(MemoryCache::new())
            }
        }
    }
}

fn parse_sort(arg: &str) -> Result<(String, SortDirection)> {
    let (column, direction) = match arg.rsplit_once(':') {
        Some((column, direction)) => (column, direction.parse()?),
        None => (arg, SortDirection::Asc),
    };
    if column.is_empty() {
        bail!("missing column in sort \"{}\"", arg);
    }
    Ok((column.to_string(), direction))
}

fn parse_filter(arg: &str) -> Result<(String, String)> {
    let Some((column, input)) = arg.split_once('=') else {
        bail!("expected column=input, got \"{}\"", arg);
    };
    if column.is_empty() {
        bail!("missing column in filter \"{}\"", arg);
    }
    Ok((column.to_string(), input.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = GridConfig::load(&cli.config)
        .with_context(|| format!("Failed to load grid definition {}", cli.config.display()))?;
    let mut grid = Grid::from_config(&config, None).context("Failed to build the grid")?;

    if let Some(width) = cli.width {
        let mut renderers = RendererRegistry::with_defaults();
        renderers.register(Arc::new(ConsoleRenderer { width: Some(width) }));
        grid = grid.with_renderers(Arc::new(renderers));
    }
    let mut request = cli.request();
    // the terminal gets a table unless a renderer was asked for
    if request.renderer.is_none() {
        request.renderer = Some(CONSOLE.to_string());
    }

    let output = grid
        .with_cache(cli.cache())
        .render(&request)
        .await
        .context("Failed to render the grid")?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &output.body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), content_type = output.content_type, "grid written");
        }
        None => print!("{}", output.body),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("vol").unwrap(), ("vol".to_string(), SortDirection::Asc));
        assert_eq!(
            parse_sort("vol:desc").unwrap(),
            ("vol".to_string(), SortDirection::Desc)
        );
        assert!(parse_sort("vol:sideways").is_err());
        assert!(parse_sort(":desc").is_err());
    }

    #[test]
    fn test_parse_filter_keeps_operators() {
        assert_eq!(
            parse_filter("vol=>=85").unwrap(),
            ("vol".to_string(), ">=85".to_string())
        );
        assert_eq!(
            parse_filter("title==x,y").unwrap(),
            ("title".to_string(), "=x,y".to_string())
        );
        assert!(parse_filter("vol").is_err());
    }

    #[test]
    fn test_request_from_arguments() {
        let cli = Cli::try_parse_from([
            "datagrid",
            "books.toml",
            "-r",
            "json",
            "--page",
            "2",
            "--per-page",
            "5",
            "--sort",
            "vol:desc",
            "--filter",
            "title=~x",
            "--session",
            "alice",
        ])
        .unwrap();

        let request = cli.request();
        assert_eq!(
            request,
            GridRequest::new("alice")
                .with_renderer("json")
                .with_page(2)
                .with_items_per_page(5)
                .sort_by("vol", SortDirection::Desc)
                .filter("title", "~x")
        );
    }

    #[test]
    fn test_explicit_cache_dir_is_used() {
        let cli = Cli::try_parse_from(["datagrid", "books.toml", "--cache-dir", "/tmp/grids"])
            .unwrap();
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/grids")));
        assert!(cli.sorts.is_empty());
    }
}
