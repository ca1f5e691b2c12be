//! Crawler module for fetching and walking result pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - Cache-or-fetch with caller-chosen cached values
//! - The pagination loop over listing pages and runner pages

mod cached;
mod coordinator;
mod fetcher;

pub use cached::CachedFetcher;
pub use coordinator::{run_crawl, Coordinator, CrawlOptions};
pub use fetcher::{build_http_client, default_user_agent, fetch_url};
