//! Typed view over the free-form `attributes` column of a product.
//!
//! Products store their attributes as serialized JSON text. Only two keys
//! carry meaning for the storefront: `brand` (a string) and `tags` (a list of
//! strings). Everything else is preserved opaquely in [`ProductAttributes::extra`].

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

const BRAND_KEY: &str = "brand";
const TAGS_KEY: &str = "tags";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Malformed attribute payload: {0}")]
    MalformedData(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductAttributes {
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
    pub extra: Map<String, Value>,
}

impl ProductAttributes {
    /// Parses the stored text. Missing or blank text yields an empty mapping.
    pub fn parse(raw: Option<&str>) -> Result<Self, AttributeError> {
        let raw = match raw.map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(Self::default()),
        };

        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AttributeError::MalformedData(e.to_string()))?;

        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(AttributeError::MalformedData(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Like [`parse`](Self::parse) but substitutes an empty mapping for malformed input.
    pub fn parse_or_empty(raw: Option<&str>) -> Self {
        Self::parse(raw).unwrap_or_else(|err| {
            debug!(error = %err, "treating product attributes as empty");
            Self::default()
        })
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut attributes = Self::default();
        for (key, value) in map {
            match (key.as_str(), value) {
                (BRAND_KEY, Value::String(brand)) => attributes.brand = Some(brand),
                (TAGS_KEY, Value::Array(items)) => {
                    attributes.tags = Some(
                        items
                            .into_iter()
                            .filter_map(|item| match item {
                                Value::String(tag) => Some(tag),
                                _ => None,
                            })
                            .collect(),
                    );
                }
                (_, value) => {
                    attributes.extra.insert(key, value);
                }
            }
        }
        attributes
    }

    /// True when the source object had no keys at all.
    pub fn is_empty(&self) -> bool {
        self.brand.is_none() && self.tags.is_none() && self.extra.is_empty()
    }

    /// Brand equality wins first; otherwise the tag lists must share an element.
    pub fn is_similar_to(&self, other: &ProductAttributes) -> bool {
        if let Some(brand) = &self.brand {
            if other.brand.as_ref() == Some(brand) {
                return true;
            }
        }

        match (&self.tags, &other.tags) {
            (Some(mine), Some(theirs)) => mine.iter().any(|tag| theirs.contains(tag)),
            _ => false,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
