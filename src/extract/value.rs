//! Text cleanup shared by the extractors

use scraper::ElementRef;

/// What the results sites render for a value they do not have
pub const PLACEHOLDER: &str = "-";

/// Concatenated text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Trims a raw value and maps placeholders to `None`
///
/// Some pages leak escaped newlines (a literal backslash followed by `n`)
/// into their text; those are dropped before trimming.
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = raw.replace("\\n", "");
    let trimmed = cleaned.trim();

    if trimmed.is_empty() || trimmed == PLACEHOLDER {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Turns a label such as `"Chip Time "` into a column name (`chip_time`)
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
