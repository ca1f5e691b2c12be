//! Racecrawl: a cached race-result crawler
//!
//! This crate walks the paginated result listings of a race-timing site,
//! follows every runner link, extracts one flat record per runner and writes
//! the records to CSV. Every fetch goes through an optional key-value cache so
//! that crawling the same event twice never hits the network twice.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    FieldParse(#[from] FieldParseError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Cannot render listing URL: {0}")]
    Template(String),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No runner records were collected")]
    EmptyResultSet,

    #[error("Record {row} has fields missing from the CSV header: {}", extra.join(", "))]
    SchemaMismatch { row: usize, extra: Vec<String> },
}

/// Non-success HTTP response from the results site
#[derive(Debug, Error)]
#[error("HTTP {status} for {url}")]
pub struct FetchError {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// A runner field that could not be read from the detail page
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldParseError {
    #[error("Field '{field}' not found in document")]
    Missing { field: String },

    #[error("Field '{field}' is not a number: '{value}'")]
    NotANumber { field: String, value: String },

    #[error("Required field '{field}' holds a placeholder value")]
    Placeholder { field: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read layout file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in layout: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Unknown site '{0}'")]
    UnknownSite(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::SiteLayout;
pub use record::{CrawlRequest, EventParams, RunnerRecord};
