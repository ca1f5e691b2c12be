//! Crawl request and runner record types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Site-specific event identifiers, e.g. `city_id`/`year_id`/`event_id`
pub type EventParams = BTreeMap<String, u64>;

/// Identifies one listing page of one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub params: EventParams,
    /// 1-based page number
    pub page: u32,
}

impl CrawlRequest {
    pub fn new(params: EventParams, page: u32) -> Self {
        Self { params, page }
    }
}

impl fmt::Display for CrawlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.params {
            write!(f, "{}={} ", name, value)?;
        }
        write!(f, "page={}", self.page)
    }
}

/// One runner's extracted fields, in extraction order
///
/// Values are JSON scalars: strings, integers, or `null` where the site
/// renders a placeholder dash. The record serializes as a plain JSON object,
/// which is also the format it is cached in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunnerRecord {
    fields: Map<String, Value>,
}

impl RunnerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, keeping the position of an existing key
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders a field as a CSV cell; absent and null fields become empty
    pub fn cell(&self, name: &str) -> String {
        match self.fields.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
