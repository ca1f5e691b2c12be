use crate::config::template::render;
use crate::config::types::SiteLayout;
use crate::record::{CrawlRequest, EventParams};
use crate::{ConfigError, ConfigResult, CrawlError};

impl SiteLayout {
    /// Resolves event parameters: layout defaults, overridden by `overrides`
    ///
    /// An override naming a parameter the layout does not declare is a
    /// configuration error.
    pub fn event_params(&self, overrides: &EventParams) -> ConfigResult<EventParams> {
        let mut params: EventParams = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.default))
            .collect();

        for (name, value) in overrides {
            match params.get_mut(name) {
                Some(slot) => *slot = *value,
                None => {
                    return Err(ConfigError::Validation(format!(
                        "site '{}' has no parameter '{}' (expected one of: {})",
                        self.name,
                        name,
                        self.param_names().join(", ")
                    )))
                }
            }
        }

        Ok(params)
    }

    /// Builds the absolute URL of one listing page
    pub fn listing_url(&self, request: &CrawlRequest) -> Result<String, CrawlError> {
        let path = render(&self.listing_path, |name| match name {
            "page" => Some(request.page.to_string()),
            "page_size" => Some(self.page_size.to_string()),
            other => request.params.get(other).map(u64::to_string),
        })
        .map_err(CrawlError::Template)?;

        let listing = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        url::Url::parse(&listing)?;
        Ok(listing)
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}
