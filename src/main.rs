//! Racecrawl main entry point
//!
//! This is the command-line interface for the race-result crawler.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use racecrawl::cache::{Cache, CacheBackend, DEFAULT_MEMCACHED_ADDR};
use racecrawl::config::{builtin_layout, load_layout};
use racecrawl::crawler::{run_crawl, CrawlOptions};
use racecrawl::output::write_csv_file;
use racecrawl::{EventParams, SiteLayout};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Racecrawl: crawl race results into a CSV file
///
/// Walks the paginated result listing of one event, visits every runner's
/// detail page and writes one CSV row per runner. Pages are cached so that a
/// second run of the same event never touches the network.
#[derive(Parser, Debug)]
#[command(name = "racecrawl")]
#[command(version)]
#[command(about = "Crawl race results into CSV", long_about = None)]
struct Cli {
    /// Output CSV file
    #[arg(long, value_name = "PATH", default_value = "crawl.csv")]
    filename: PathBuf,

    /// Built-in site layout to crawl
    #[arg(long, default_value = "competitor", conflicts_with = "layout")]
    site: String,

    /// Custom site layout TOML file
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,

    /// City identifier
    #[arg(long)]
    city_id: Option<u64>,

    /// Year identifier
    #[arg(long)]
    year_id: Option<u64>,

    /// Event identifier
    #[arg(long)]
    event_id: Option<u64>,

    /// Sub-event identifier
    #[arg(long, alias = "subevent-id")]
    sub_event_id: Option<u64>,

    /// Extra layout parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, u64)>,

    /// Where to cache fetched pages
    #[arg(long, value_enum, default_value_t = CacheKind::Memcached)]
    cache: CacheKind,

    /// memcached address
    #[arg(long, default_value = DEFAULT_MEMCACHED_ADDR)]
    cache_addr: String,

    /// SQLite cache file
    #[arg(long, default_value = "racecrawl-cache.db")]
    cache_path: PathBuf,

    /// Stop after this many listing pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CacheKind {
    Memcached,
    Sqlite,
    #[value(name = "none")]
    Disabled,
}

impl Cli {
    fn cache_backend(&self) -> CacheBackend {
        match self.cache {
            CacheKind::Memcached => CacheBackend::Memcached {
                addr: self.cache_addr.clone(),
            },
            CacheKind::Sqlite => CacheBackend::Sqlite {
                path: self.cache_path.clone(),
            },
            CacheKind::Disabled => CacheBackend::Disabled,
        }
    }

    /// Parameters given on the command line, by layout parameter name
    fn param_overrides(&self) -> EventParams {
        let mut overrides = EventParams::new();
        let named = [
            ("city_id", self.city_id),
            ("year_id", self.year_id),
            ("event_id", self.event_id),
            ("subevent_id", self.sub_event_id),
        ];
        for (name, value) in named {
            if let Some(value) = value {
                overrides.insert(name.to_string(), value);
            }
        }
        for (name, value) in &self.params {
            overrides.insert(name.clone(), *value);
        }
        overrides
    }
}

fn parse_param(raw: &str) -> Result<(String, u64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a non-negative integer", value))?;
    Ok((key.trim().to_string(), value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Crawl failed: {:#}", e);
            Err(e)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("racecrawl=info,warn"),
            1 => EnvFilter::new("racecrawl=debug,info"),
            2 => EnvFilter::new("racecrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn resolve_layout(cli: &Cli) -> anyhow::Result<SiteLayout> {
    match &cli.layout {
        Some(path) => {
            tracing::info!("Loading layout from: {}", path.display());
            load_layout(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(builtin_layout(&cli.site)?),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let layout = resolve_layout(&cli)?;
    let params = layout.event_params(&cli.param_overrides())?;
    tracing::info!("Crawling {} ({})", layout.name, layout.base_url);

    let cache = Cache::open(&cli.cache_backend()).await;
    let options = CrawlOptions {
        max_pages: cli.max_pages,
        ..CrawlOptions::default()
    };

    let records = run_crawl(layout, cache, options, &params).await?;
    let written = write_csv_file(&records, &cli.filename)?;
    tracing::info!("Wrote {} rows to {}", written, cli.filename.display());

    Ok(())
}
