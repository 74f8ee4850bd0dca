//! Key template language: `/.../type/$type_id/.../health`.
//!
//! Placeholders are `$` followed by `[A-Za-z0-9_]+`. The same template is
//! used to build full keys for writes and truncated prefixes for scans.

use std::collections::BTreeMap;
use std::fmt;

use ha_core::constants::PLACEHOLDER_MARKER;
use ha_core::errors::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed key template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl KeyTemplate {
    /// Parse a template. A placeholder must be followed by `/` or end the
    /// template so that ids can be recovered from concrete keys.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if c != PLACEHOLDER_MARKER {
                literal.push(c);
                continue;
            }
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                return Err(SchemaError::Malformed {
                    message: format!("empty placeholder in key template {raw}"),
                });
            }
            if let Some(&next) = chars.peek() {
                if next != '/' {
                    return Err(SchemaError::Malformed {
                        message: format!("placeholder ${name} must be followed by '/' in {raw}"),
                    });
                }
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(name));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in template order.
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute ids left to right. On the first placeholder with no id,
    /// stop and return the prefix up to (excluding) that placeholder.
    pub fn substitute(&self, ids: &BTreeMap<String, String>) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match ids.get(name) {
                    Some(value) if !value.is_empty() => out.push_str(value),
                    _ => return out,
                },
            }
        }
        out
    }

    /// Full key, or `None` if any placeholder is missing.
    pub fn resolve(&self, ids: &BTreeMap<String, String>) -> Option<String> {
        let complete = self
            .placeholders()
            .iter()
            .all(|p| ids.get(*p).is_some_and(|v| !v.is_empty()));
        complete.then(|| self.substitute(ids))
    }

    /// Recover placeholder values from a concrete key. Returns `None` when
    /// the key does not have this template's exact shape.
    pub fn capture(&self, key: &str) -> Option<BTreeMap<String, String>> {
        let mut ids = BTreeMap::new();
        let mut rest = key;
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rest = rest.strip_prefix(text.as_str())?,
                Segment::Placeholder(name) => {
                    let end = rest.find('/').unwrap_or(rest.len());
                    if end == 0 {
                        return None;
                    }
                    ids.insert(name.clone(), rest[..end].to_string());
                    rest = &rest[end..];
                }
            }
        }
        rest.is_empty().then_some(ids)
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
