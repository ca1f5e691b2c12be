//! HTTP fetcher
//!
//! One GET per call. Anything other than `200 OK` is a [`FetchError`]
//! carrying the status and body; there are no retries and no timeout beyond
//! the transport defaults.

use crate::{CrawlError, FetchError};
use reqwest::{Client, StatusCode};

/// Default User-Agent header
pub fn default_user_agent() -> String {
    format!("racecrawl/{}", env!("CARGO_PKG_VERSION"))
}

/// Builds the HTTP client used for every request of a crawl
///
/// # Example
///
/// ```no_run
/// use racecrawl::crawler::{build_http_client, default_user_agent};
///
/// let client = build_http_client(&default_user_agent()).unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body
///
/// # Returns
///
/// * `Ok(String)` - Body of a `200 OK` response
/// * `Err(CrawlError::Fetch)` - Any other status
/// * `Err(CrawlError::Http)` - Connection or transport failure
pub async fn fetch_url(client: &Client, url: &str) -> Result<String, CrawlError> {
    let http_err = |source| CrawlError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_err)?;
    let status = response.status();
    let body = response.text().await.map_err(http_err)?;

    if status != StatusCode::OK {
        return Err(FetchError {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        }
        .into());
    }

    Ok(body)
}
