//! Runner link extraction from listing pages

use crate::config::SiteLayout;
use crate::extract::compile_selector;
use crate::ConfigError;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Finds the runner-detail links on one listing page
#[derive(Debug)]
pub struct LinkExtractor {
    /// Base URL without a trailing slash
    base: String,
    base_url: Url,
    container: Selector,
    anchor: Selector,
    pattern: Option<Regex>,
}

impl LinkExtractor {
    /// Compiles the layout's container selector and link pattern
    pub fn from_layout(layout: &SiteLayout) -> Result<Self, ConfigError> {
        let pattern = layout
            .runner_link_pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ConfigError::InvalidPattern(format!("runner-link-pattern '{}': {}", p, e))
                })
            })
            .transpose()?;

        let base = layout.base_url.trim_end_matches('/').to_string();
        let base_url = Url::parse(&base)
            .map_err(|e| ConfigError::InvalidUrl(format!("base-url '{}': {}", base, e)))?;

        Ok(Self {
            base,
            base_url,
            container: compile_selector(&layout.results_selector)?,
            anchor: compile_selector("a[href]")?,
            pattern,
        })
    }

    /// Returns the absolute runner URLs on the page, in document order
    ///
    /// A page without the results container, or whose container holds no
    /// matching links, yields an empty list. That is how the last page is
    /// recognized, so it is never an error.
    pub fn extract_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Some(container) = document.select(&self.container).next() else {
            return Vec::new();
        };

        container
            .select(&self.anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| self.resolve(href))
            .filter(|url| self.pattern.as_ref().map_or(true, |re| re.is_match(url)))
            .collect()
    }

    /// Resolves an href against the base URL
    ///
    /// Relative hrefs are prefixed with the base URL as-is, so the resulting
    /// string (and therefore its cache key) is exactly what the site links to.
    /// Absolute hrefs are kept only if they live under the base URL.
    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        if href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            return None;
        }

        let resolved = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base, href)
        } else {
            format!("{}/{}", self.base, href)
        };

        let url = Url::parse(&resolved).ok()?;
        if !self.is_under_base(&url) {
            tracing::debug!("Skipping off-site link {}", resolved);
            return None;
        }

        Some(resolved)
    }

    /// Same scheme, host and port as the base, and a path at or below its path
    fn is_under_base(&self, url: &Url) -> bool {
        let base = &self.base_url;
        if url.scheme() != base.scheme()
            || url.host_str() != base.host_str()
            || url.port_or_known_default() != base.port_or_known_default()
        {
            return false;
        }

        let base_path = base.path().trim_end_matches('/');
        let path = url.path();
        base_path.is_empty()
            || path == base_path
            || path
                .strip_prefix(base_path)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
