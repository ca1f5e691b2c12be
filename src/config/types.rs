use serde::Deserialize;
use std::collections::BTreeMap;

fn default_page_size() -> u32 {
    100
}

/// Everything the crawler needs to know about one results site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteLayout {
    /// Short name used on the command line (e.g. "competitor")
    pub name: String,

    /// Scheme and host every listing and runner URL lives under
    pub base_url: String,

    /// Listing URL path and query, with `{page}`, `{page_size}` and
    /// parameter placeholders
    pub listing_path: String,

    /// Rows requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// CSS selector of the container holding the runner links
    pub results_selector: String,

    /// Regex a resolved runner URL must match to be followed
    #[serde(default)]
    pub runner_link_pattern: Option<String>,

    /// What gets stored in the cache for each fetched URL
    #[serde(default)]
    pub cache_unit: CacheUnit,

    /// Event identifiers the listing template expects
    #[serde(default)]
    pub params: Vec<ParamSpec>,

    /// Named fields read from the runner detail page
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    /// Label/value groups read from the runner detail page (splits, timings)
    #[serde(default)]
    pub groups: Vec<LabelGroup>,
}

/// Granularity of cached values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheUnit {
    /// Raw HTML of listing and runner pages
    #[default]
    Document,

    /// Extracted link lists and finished runner records
    Record,
}

/// An event identifier with the value used when none is given
#[derive(Debug, Clone, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub default: u64,
}

/// How a field value is typed in the output record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
}

/// Location of one named field in a runner detail page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldSpec {
    /// Output column name
    pub name: String,

    /// CSS selector; the field is read from one of its matches
    pub selector: String,

    /// Which match to read; negative values count from the last match
    #[serde(default)]
    pub index: i32,

    /// Read this attribute instead of the element text
    #[serde(default)]
    pub attr: Option<String>,

    /// Keep only this whitespace-separated word of the value
    #[serde(default)]
    pub word: Option<usize>,

    /// Keep only the text after the last occurrence of this delimiter
    #[serde(default)]
    pub after: Option<String>,

    #[serde(default)]
    pub kind: FieldKind,

    /// A missing element or placeholder becomes null instead of an error
    #[serde(default)]
    pub optional: bool,
}

/// A run of labels paired with their values
///
/// Labels are normalized to lower-case, underscore-separated column names
/// and then passed through `rename`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum LabelGroup {
    /// Labels and values live in two parallel lists
    Zip {
        labels: String,
        values: String,
        #[serde(default)]
        columns: Option<Vec<String>>,
        #[serde(default)]
        rename: BTreeMap<String, String>,
    },

    /// One list whose matches alternate label, value
    Pairs {
        items: String,
        #[serde(default)]
        columns: Option<Vec<String>>,
        #[serde(default)]
        rename: BTreeMap<String, String>,
    },
}

impl LabelGroup {
    /// Fixed output columns, if the group declares them
    pub fn columns(&self) -> Option<&[String]> {
        match self {
            Self::Zip { columns, .. } | Self::Pairs { columns, .. } => columns.as_deref(),
        }
    }

    pub fn rename(&self) -> &BTreeMap<String, String> {
        match self {
            Self::Zip { rename, .. } | Self::Pairs { rename, .. } => rename,
        }
    }

    /// Every selector the group reads
    pub fn selectors(&self) -> Vec<&str> {
        match self {
            Self::Zip { labels, values, .. } => vec![labels.as_str(), values.as_str()],
            Self::Pairs { items, .. } => vec![items.as_str()],
        }
    }
}
