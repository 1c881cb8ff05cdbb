//! Frontmatter parsing for content files.
//!
//! A content file may open with a YAML block fenced by `---` lines. The recognized keys are
//! promoted to typed fields; everything else is kept verbatim for templates.

use std::{collections::BTreeMap, path::Path};

use chrono::NaiveDate;
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// Fence line opening and closing a frontmatter block.
pub const DELIMITER: &str = "---";

/// Calendar format accepted by the `date` key.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Frontmatter metadata for content files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    /// Page title, when given and non-empty.
    pub title: Option<String>,

    /// Template to use for rendering.
    pub template: Option<String>,

    /// Publication date. `None` when absent or unparseable.
    pub date: Option<NaiveDate>,

    /// Tags for the page, string entries only.
    pub tags: Vec<String>,

    /// Whether this is a draft.
    pub draft: bool,

    /// Every key not promoted above, in key order.
    pub extra: BTreeMap<String, Value>,
}

impl Frontmatter {
    /// Build typed frontmatter from a decoded YAML document.
    ///
    /// Type mismatches on recognized keys never fail: a non-string title is ignored, a bad date
    /// reads as absent, non-string tags are dropped and a non-boolean draft flag reads as `false`.
    pub fn from_value(value: Value, path: &Path) -> Result<Self> {
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(CoreError::frontmatter(
                    path,
                    format!("expected a mapping, found {}", kind_of(&other)),
                ));
            }
        };

        let mut fm = Self::default();

        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => {
                    tracing::warn!(
                        path = %path.display(),
                        kind = kind_of(&other),
                        "Skipping front matter key that is not a scalar"
                    );
                    continue;
                }
            };

            match key.as_str() {
                "title" => fm.title = non_empty_string(value),
                "template" => fm.template = non_empty_string(value),
                "date" => {
                    fm.date = value
                        .as_str()
                        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok());
                }
                "tags" => {
                    if let Value::Sequence(items) = value {
                        fm.tags = items
                            .into_iter()
                            .filter_map(|item| match item {
                                Value::String(s) => Some(s),
                                _ => None,
                            })
                            .collect();
                    }
                }
                "draft" => fm.draft = value.as_bool().unwrap_or(false),
                _ => {
                    fm.extra.insert(key, value);
                }
            }
        }

        Ok(fm)
    }
}

fn non_empty_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Split content into frontmatter and body.
///
/// The first line must be exactly `---` and a later line must be exactly `---` as well; otherwise
/// there is no frontmatter and `None` is returned. The body is everything after the closing line.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let (first, mut rest) = match content.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (content, ""),
    };
    if first.trim_end_matches('\r') != DELIMITER {
        return None;
    }

    let block_start = content.len() - rest.len();
    loop {
        let line_start = content.len() - rest.len();
        let (line, next) = match rest.split_once('\n') {
            Some((line, next)) => (line, Some(next)),
            None => (rest, None),
        };

        if line.trim_end_matches('\r') == DELIMITER {
            let block = &content[block_start..line_start];
            let body = next.unwrap_or("");
            return Some((block, body));
        }

        rest = next?;
    }
}

/// Parse frontmatter from a string.
///
/// Returns the typed frontmatter and the body with surrounding whitespace trimmed. Content
/// without a complete frontmatter block is all body.
pub fn parse_frontmatter<'a>(content: &'a str, path: &Path) -> Result<(Frontmatter, &'a str)> {
    let Some((block, body)) = split_frontmatter(content) else {
        return Ok((Frontmatter::default(), content.trim()));
    };

    let value: Value = if block.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(block).map_err(|e| CoreError::frontmatter(path, e.to_string()))?
    };

    Ok((Frontmatter::from_value(value, path)?, body.trim()))
}
