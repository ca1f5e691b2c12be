use crate::config::template::placeholders;
use crate::config::types::{FieldSpec, LabelGroup, SiteLayout};
use crate::extract::{LinkExtractor, RunnerExtractor};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Placeholders every listing template may use without declaring them
const BUILTIN_PLACEHOLDERS: &[&str] = &["page", "page_size"];

/// Validates the entire layout
pub fn validate(layout: &SiteLayout) -> Result<(), ConfigError> {
    validate_identity(layout)?;
    validate_listing(layout)?;
    validate_fields(&layout.fields)?;
    validate_groups(&layout.groups)?;

    // Compiling the extractors checks every selector and the link pattern
    LinkExtractor::from_layout(layout)?;
    RunnerExtractor::from_layout(layout)?;

    Ok(())
}

/// Validates the site name and base URL
fn validate_identity(layout: &SiteLayout) -> Result<(), ConfigError> {
    if layout.name.is_empty() {
        return Err(ConfigError::Validation("name cannot be empty".to_string()));
    }

    let base = Url::parse(&layout.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            layout.base_url
        )));
    }

    if base.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            layout.base_url
        )));
    }

    Ok(())
}

/// Validates the listing template and its parameters
fn validate_listing(layout: &SiteLayout) -> Result<(), ConfigError> {
    if layout.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page-size must be >= 1, got {}",
            layout.page_size
        )));
    }

    let mut declared = HashSet::new();
    for param in &layout.params {
        if BUILTIN_PLACEHOLDERS.contains(&param.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "parameter name '{}' is reserved",
                param.name
            )));
        }
        if !declared.insert(param.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "parameter '{}' is declared twice",
                param.name
            )));
        }
    }

    let used = placeholders(&layout.listing_path).map_err(ConfigError::Validation)?;

    if !used.iter().any(|name| name == "page") {
        return Err(ConfigError::Validation(
            "listing-path must contain a {page} placeholder".to_string(),
        ));
    }

    for name in &used {
        if !BUILTIN_PLACEHOLDERS.contains(&name.as_str()) && !declared.contains(name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "listing-path uses undeclared parameter '{}'",
                name
            )));
        }
    }

    Ok(())
}

/// Validates the runner field map
fn validate_fields(fields: &[FieldSpec]) -> Result<(), ConfigError> {
    if fields.is_empty() {
        return Err(ConfigError::Validation(
            "a layout needs at least one field".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for field in fields {
        validate_column_name(&field.name)?;

        if !seen.insert(field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "field '{}' is declared twice",
                field.name
            )));
        }

        if field.after.as_deref() == Some("") {
            return Err(ConfigError::Validation(format!(
                "field '{}' has an empty 'after' delimiter",
                field.name
            )));
        }
    }

    Ok(())
}

/// Validates label groups
fn validate_groups(groups: &[LabelGroup]) -> Result<(), ConfigError> {
    for group in groups {
        if let Some(columns) = group.columns() {
            if columns.is_empty() {
                return Err(ConfigError::Validation(
                    "group 'columns' cannot be an empty list".to_string(),
                ));
            }
            for column in columns {
                validate_column_name(column)?;
            }
        }

        for target in group.rename().values() {
            validate_column_name(target)?;
        }
    }

    Ok(())
}

/// Column names are non-empty and free of whitespace
fn validate_column_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "column name cannot be empty".to_string(),
        ));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "column name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}
