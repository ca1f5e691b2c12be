//! Crawl coordinator - the pagination loop
//!
//! Listing pages are requested one after another starting at page 1. Every
//! runner link on a page is fetched and extracted before the next page is
//! requested. The first page without runner links ends the crawl.

use crate::cache::Cache;
use crate::config::{CacheUnit, SiteLayout};
use crate::crawler::cached::CachedFetcher;
use crate::crawler::fetcher::build_http_client;
use crate::extract::{LinkExtractor, RunnerExtractor};
use crate::record::{CrawlRequest, EventParams, RunnerRecord};
use crate::CrawlError;

/// Knobs that are not part of a site layout
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub user_agent: String,

    /// Stop after this many listing pages even if more exist
    pub max_pages: Option<u32>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            user_agent: crate::crawler::default_user_agent(),
            max_pages: None,
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    layout: SiteLayout,
    links: LinkExtractor,
    runners: RunnerExtractor,
    fetcher: CachedFetcher,
    max_pages: Option<u32>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `layout` - The site to crawl
    /// * `cache` - Cache shared by every fetch of the crawl
    /// * `options` - User agent and page limit
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(CrawlError)` - Layout selectors do not compile or the HTTP client
    ///   cannot be built
    pub fn new(layout: SiteLayout, cache: Cache, options: CrawlOptions) -> Result<Self, CrawlError> {
        let links = LinkExtractor::from_layout(&layout)?;
        let runners = RunnerExtractor::from_layout(&layout)?;

        let client = build_http_client(&options.user_agent).map_err(|source| CrawlError::Http {
            url: layout.base_url.clone(),
            source,
        })?;

        Ok(Self {
            layout,
            links,
            runners,
            fetcher: CachedFetcher::new(client, cache),
            max_pages: options.max_pages,
        })
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Crawls every listing page of one event
    ///
    /// Records come back in discovery order: page by page, and within a page
    /// in link order. Any fetch or field error aborts the whole crawl.
    pub async fn crawl(&self, params: &EventParams) -> Result<Vec<RunnerRecord>, CrawlError> {
        let start_time = std::time::Instant::now();
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            if self.max_pages.is_some_and(|max| page > max) {
                tracing::info!("Reached page limit, stopping before page {}", page);
                break;
            }

            let request = CrawlRequest::new(params.clone(), page);
            tracing::info!("Querying for {}", request);

            let links = self.fetch_links(&request).await?;
            if links.is_empty() {
                tracing::info!("Page {} has no runners, crawl complete", page);
                break;
            }

            tracing::debug!("Page {} lists {} runners", page, links.len());
            for link in &links {
                records.push(self.fetch_runner(link).await?);
            }

            page += 1;
        }

        tracing::info!(
            "Crawl completed: {} runners from {} pages in {:?} ({} fetched, {} from cache)",
            records.len(),
            page - 1,
            start_time.elapsed(),
            self.fetcher.fetches(),
            self.fetcher.hits()
        );

        Ok(records)
    }

    /// Runner URLs listed on one listing page
    pub async fn fetch_links(&self, request: &CrawlRequest) -> Result<Vec<String>, CrawlError> {
        let url = self.layout.listing_url(request)?;

        match self.layout.cache_unit {
            CacheUnit::Document => {
                let html: String = self.fetcher.cached_fetch(&url, raw_document).await?;
                Ok(self.links.extract_links(&html))
            }
            CacheUnit::Record => {
                self.fetcher
                    .cached_fetch(&url, |html| Ok(self.links.extract_links(html)))
                    .await
            }
        }
    }

    /// One runner's record
    pub async fn fetch_runner(&self, url: &str) -> Result<RunnerRecord, CrawlError> {
        match self.layout.cache_unit {
            CacheUnit::Document => {
                let html: String = self.fetcher.cached_fetch(url, raw_document).await?;
                Ok(self.runners.extract_runner(&html)?)
            }
            CacheUnit::Record => {
                self.fetcher
                    .cached_fetch(url, |html| Ok(self.runners.extract_runner(html)?))
                    .await
            }
        }
    }

    /// Network requests made so far
    pub fn fetches(&self) -> u64 {
        self.fetcher.fetches()
    }

    /// Lookups answered from the cache so far
    pub fn cache_hits(&self) -> u64 {
        self.fetcher.hits()
    }
}

fn raw_document(body: &str) -> Result<String, CrawlError> {
    Ok(body.to_string())
}

/// Runs a complete crawl of one event
///
/// # Example
///
/// ```no_run
/// use racecrawl::cache::Cache;
/// use racecrawl::config::builtin_layout;
/// use racecrawl::crawler::{run_crawl, CrawlOptions};
/// use racecrawl::EventParams;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let layout = builtin_layout("competitor")?;
/// let params = layout.event_params(&EventParams::new())?;
/// let records = run_crawl(layout, Cache::disabled(), CrawlOptions::default(), &params).await?;
/// println!("{} runners", records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    layout: SiteLayout,
    cache: Cache,
    options: CrawlOptions,
    params: &EventParams,
) -> Result<Vec<RunnerRecord>, CrawlError> {
    let coordinator = Coordinator::new(layout, cache, options)?;
    coordinator.crawl(params).await
}
