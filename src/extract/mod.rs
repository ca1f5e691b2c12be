//! Page and runner extraction
//!
//! This module turns fetched HTML into crawl data:
//! - Listing pages into ordered runner-detail URLs
//! - Runner pages into flat [`RunnerRecord`](crate::RunnerRecord)s
//! - Text cleanup shared by both (trimming, placeholder dashes)

mod listing;
mod runner;
pub mod value;

pub use listing::LinkExtractor;
pub use runner::RunnerExtractor;

use crate::ConfigError;
use scraper::Selector;

/// Parses a CSS selector, reporting failures as configuration errors
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidPattern(format!("selector '{}': {:?}", selector, e)))
}
