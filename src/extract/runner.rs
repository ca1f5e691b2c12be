//! Runner record extraction from detail pages
//!
//! Fields are located through the layout's declarative field map rather than
//! hard-coded offsets. An element that is not where the map says it is
//! surfaces as a [`FieldParseError`] naming the field, not as a panic or a
//! silently shifted column.

use crate::config::{FieldKind, FieldSpec, LabelGroup, SiteLayout};
use crate::extract::compile_selector;
use crate::extract::value::{clean_text, element_text, normalize_label};
use crate::record::RunnerRecord;
use crate::{ConfigError, FieldParseError};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;

struct CompiledField {
    spec: FieldSpec,
    selector: Selector,
}

enum Source {
    Zip { labels: Selector, values: Selector },
    Pairs { items: Selector },
}

struct CompiledGroup {
    source: Source,
    columns: Option<Vec<String>>,
    rename: BTreeMap<String, String>,
}

/// Extracts one [`RunnerRecord`] per runner detail page
pub struct RunnerExtractor {
    fields: Vec<CompiledField>,
    groups: Vec<CompiledGroup>,
}

impl RunnerExtractor {
    /// Compiles every selector in the layout's field map and label groups
    pub fn from_layout(layout: &SiteLayout) -> Result<Self, ConfigError> {
        let fields = layout
            .fields
            .iter()
            .map(|spec| {
                Ok(CompiledField {
                    selector: compile_selector(&spec.selector)?,
                    spec: spec.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let groups = layout
            .groups
            .iter()
            .map(compile_group)
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { fields, groups })
    }

    /// Reads every mapped field and label group from a runner page
    ///
    /// Field order in the record follows the field map, then the groups.
    pub fn extract_runner(&self, html: &str) -> Result<RunnerRecord, FieldParseError> {
        let document = Html::parse_document(html);
        let mut record = RunnerRecord::new();

        for field in &self.fields {
            let value = read_field(&document, field)?;
            record.insert(field.spec.name.clone(), value);
        }

        for group in &self.groups {
            for (column, value) in read_group(&document, group) {
                if record.contains(&column) {
                    tracing::debug!("Label '{}' already extracted, keeping first value", column);
                    continue;
                }
                record.insert(column, value);
            }
        }

        Ok(record)
    }
}

fn compile_group(group: &LabelGroup) -> Result<CompiledGroup, ConfigError> {
    let source = match group {
        LabelGroup::Zip { labels, values, .. } => Source::Zip {
            labels: compile_selector(labels)?,
            values: compile_selector(values)?,
        },
        LabelGroup::Pairs { items, .. } => Source::Pairs {
            items: compile_selector(items)?,
        },
    };

    Ok(CompiledGroup {
        source,
        columns: group.columns().map(<[String]>::to_vec),
        rename: group.rename().clone(),
    })
}

/// Picks a match by index; negative indices count back from the last match
fn pick<'a>(matches: &[ElementRef<'a>], index: i32) -> Option<ElementRef<'a>> {
    let position = if index < 0 {
        matches.len().checked_sub(index.unsigned_abs() as usize)?
    } else {
        index as usize
    };
    matches.get(position).copied()
}

fn read_field(document: &Html, field: &CompiledField) -> Result<Value, FieldParseError> {
    let spec = &field.spec;
    let missing = || {
        if spec.optional {
            Ok(Value::Null)
        } else {
            Err(FieldParseError::Missing {
                field: spec.name.clone(),
            })
        }
    };

    let matches: Vec<ElementRef> = document.select(&field.selector).collect();
    let Some(element) = pick(&matches, spec.index) else {
        return missing();
    };

    let raw = match &spec.attr {
        Some(attr) => match element.value().attr(attr) {
            Some(value) => value.to_string(),
            None => return missing(),
        },
        None => element_text(element),
    };

    let mut text = clean_text(&raw);

    if let Some(delimiter) = &spec.after {
        text = text.and_then(|t| t.rsplit(delimiter.as_str()).next().and_then(clean_text));
    }

    if let Some(word) = spec.word {
        text = match text {
            Some(current) => match current.split_whitespace().nth(word) {
                Some(w) => clean_text(w),
                None => return missing(),
            },
            None => None,
        };
    }

    let Some(text) = text else {
        return if spec.optional {
            Ok(Value::Null)
        } else {
            Err(FieldParseError::Placeholder {
                field: spec.name.clone(),
            })
        };
    };

    match spec.kind {
        FieldKind::Text => Ok(Value::String(text)),
        FieldKind::Integer => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| FieldParseError::NotANumber {
                field: spec.name.clone(),
                value: text,
            }),
    }
}

/// Pairs labels with values; the first occurrence of a label wins
fn read_group(document: &Html, group: &CompiledGroup) -> Vec<(String, Value)> {
    let pairs: Vec<(String, String)> = match &group.source {
        Source::Zip { labels, values } => {
            let labels = document.select(labels).map(element_text);
            let values = document.select(values).map(element_text);
            labels.zip(values).collect()
        }
        Source::Pairs { items } => {
            let items: Vec<String> = document.select(items).map(element_text).collect();
            items
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect()
        }
    };

    let mut found: Vec<(String, Value)> = Vec::new();
    for (label, value) in pairs {
        let label = normalize_label(&label);
        if label.is_empty() {
            continue;
        }
        let column = group.rename.get(&label).cloned().unwrap_or(label);
        if found.iter().any(|(existing, _)| *existing == column) {
            continue;
        }
        let value = clean_text(&value).map_or(Value::Null, Value::String);
        found.push((column, value));
    }

    match &group.columns {
        None => found,
        Some(columns) => {
            for (label, _) in found.iter().filter(|(label, _)| !columns.contains(label)) {
                // a pairs list mixes splits with other labels; a zip list holds only splits
                if matches!(group.source, Source::Zip { .. }) {
                    tracing::warn!("Label '{}' has no column in the layout, skipping", label);
                } else {
                    tracing::trace!("Label '{}' has no column, skipping", label);
                }
            }
            project_columns(columns, found)
        }
    }
}

fn project_columns(columns: &[String], found: Vec<(String, Value)>) -> Vec<(String, Value)> {
    columns
        .iter()
        .map(|column| {
            let value = found
                .iter()
                .find(|(name, _)| name == column)
                .map_or(Value::Null, |(_, v)| v.clone());
            (column.clone(), value)
        })
        .collect()
}
