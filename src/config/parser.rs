use crate::config::types::SiteLayout;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Layouts compiled into the binary, by site name
const BUILTIN_LAYOUTS: &[(&str, &str)] = &[
    ("competitor", include_str!("../../layouts/competitor.toml")),
    ("runrocknroll", include_str!("../../layouts/runrocknroll.toml")),
];

/// Loads and validates a site layout from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the TOML layout file
///
/// # Returns
///
/// * `Ok(SiteLayout)` - Successfully loaded and validated layout
/// * `Err(ConfigError)` - Failed to read, parse, or validate the layout
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use racecrawl::config::load_layout;
///
/// let layout = load_layout(Path::new("layouts/competitor.toml")).unwrap();
/// println!("Crawling {}", layout.base_url);
/// ```
pub fn load_layout(path: &Path) -> Result<SiteLayout, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_layout(&content)
}

/// Parses and validates a site layout from TOML text
pub fn parse_layout(content: &str) -> Result<SiteLayout, ConfigError> {
    let layout: SiteLayout = toml::from_str(content)?;
    validate(&layout)?;
    Ok(layout)
}

/// Returns one of the built-in site layouts by name
pub fn builtin_layout(name: &str) -> Result<SiteLayout, ConfigError> {
    let (_, content) = BUILTIN_LAYOUTS
        .iter()
        .find(|(site, _)| *site == name)
        .ok_or_else(|| ConfigError::UnknownSite(name.to_string()))?;

    parse_layout(content)
}

/// Names of the built-in site layouts
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_LAYOUTS.iter().map(|(name, _)| *name).collect()
}
