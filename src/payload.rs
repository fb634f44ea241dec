//! Conversion of declarative `key=value` field tables into request payloads.
//!
//! Scenarios describe the resource under test as a block of `key=value`
//! lines. The builder applies field-specific coercion (integers, nested tags,
//! defaulted cloud fields) and passes unknown keys through untouched so new
//! API fields can be exercised without code changes.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Fallback provider when neither the table nor the context supplies one.
pub const DEFAULT_PROVIDER: &str = "aws";

/// Fallback region when neither the table nor the context supplies one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Context key under which the effective region is remembered.
pub const REGION_KEY: &str = "region";

const ACCOUNT_ID_FIELD: &str = "cloudAccountId";
const PROVIDER_FIELD: &str = "cloudProvider";
const REGION_FIELD: &str = "cloudRegion";
const RESOURCE_GROUP_FIELD: &str = "cloudResourceGroup";
const TAG_NAME_FIELD: &str = "tagName";
const TAGS_FIELD: &str = "tags";

/// Errors raised while parsing or converting a field table.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PayloadError {
    /// Raised when the source text contains no `key=value` lines.
    #[error("field table is empty: expected at least one key=value line")]
    MalformedFieldTable,
    /// Raised when an integer-typed field holds a non-integer value.
    #[error("field {field} must be an integer, got '{value}'")]
    InvalidInteger {
        /// Field name.
        field: String,
        /// Raw value found in the table.
        value: String,
    },
}

/// Parsed `key=value` pairs describing one resource.
///
/// Keys are unique; a repeated key keeps the last value at the position of
/// its first occurrence.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldTable {
    entries: Vec<(String, String)>,
}

impl FieldTable {
    /// Parses a line-oriented block. Lines without `=` or with an empty key
    /// are skipped, keys and values are trimmed, and blank values are kept.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::MalformedFieldTable`] when no line contains `=`.
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let mut table = Self::default();
        for line in text.lines() {
            let Some((raw_key, value)) = line.split_once('=') else {
                continue;
            };
            let key = raw_key.trim();
            if key.is_empty() {
                continue;
            }
            table.insert(key, value.trim());
        }
        if table.is_empty() {
            return Err(PayloadError::MalformedFieldTable);
        }
        Ok(table)
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let owned_key = key.into();
        let owned_value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == owned_key) {
            slot.1 = owned_value;
        } else {
            self.entries.push((owned_key, owned_value));
        }
    }

    /// Returns the raw value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of distinct keys.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates fields in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Values shared between the steps of a single scenario instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriorContext {
    /// Account id used when the table leaves `cloudAccountId` blank.
    pub account_id: i64,
    values: BTreeMap<String, String>,
}

impl Default for PriorContext {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PriorContext {
    /// Creates a context with the given default account id.
    #[must_use]
    pub const fn new(account_id: i64) -> Self {
        Self {
            account_id,
            values: BTreeMap::new(),
        }
    }

    /// Seeds a named value, returning the updated context.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Stores a named value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Reads a named value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Region remembered from an earlier step.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.get(REGION_KEY)
    }
}

/// Request body produced from a [`FieldTable`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestPayload(Map<String, Value>);

impl RequestPayload {
    /// Returns a field of the payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a string field of the payload.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `tags.<name>` when present.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.0
            .get(TAGS_FIELD)
            .and_then(Value::as_object)
            .and_then(|tags| tags.get(name))
            .and_then(Value::as_str)
    }

    /// Whether a top-level key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the payload into a JSON value for transport.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Applies the field coercion and defaulting rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Parses `text` and builds the payload in one step.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when the text has no fields or a typed field
    /// cannot be coerced.
    pub fn build_from_text(
        text: &str,
        context: &mut PriorContext,
    ) -> Result<RequestPayload, PayloadError> {
        let table = FieldTable::parse(text)?;
        Self::build(&table, context)
    }

    /// Converts a table into a payload. The effective region is written back
    /// into `context` so later steps (such as deletion) reuse it.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::MalformedFieldTable`] for an empty table and
    /// [`PayloadError::InvalidInteger`] when `cloudAccountId` is not numeric.
    pub fn build(
        table: &FieldTable,
        context: &mut PriorContext,
    ) -> Result<RequestPayload, PayloadError> {
        if table.is_empty() {
            return Err(PayloadError::MalformedFieldTable);
        }

        let mut body = Map::new();
        for (key, value) in table.iter() {
            match key {
                ACCOUNT_ID_FIELD => {
                    let account = parse_account_id(value, context.account_id)?;
                    body.insert(key.to_owned(), Value::from(account));
                }
                TAG_NAME_FIELD => {
                    let tags = body
                        .entry(TAGS_FIELD)
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(map) = tags {
                        map.insert(String::from("Name"), Value::from(value));
                    }
                }
                PROVIDER_FIELD if value.is_empty() => {
                    body.insert(key.to_owned(), Value::from(DEFAULT_PROVIDER));
                }
                REGION_FIELD if value.is_empty() => {}
                REGION_FIELD => {
                    body.insert(key.to_owned(), Value::from(value));
                    context.set(REGION_KEY, value);
                }
                _ => {
                    body.insert(key.to_owned(), Value::from(value));
                }
            }
        }

        body.entry(ACCOUNT_ID_FIELD)
            .or_insert_with(|| Value::from(context.account_id));
        body.entry(PROVIDER_FIELD)
            .or_insert_with(|| Value::from(DEFAULT_PROVIDER));
        body.entry(RESOURCE_GROUP_FIELD)
            .or_insert_with(|| Value::from(""));
        let region = body
            .entry(REGION_FIELD)
            .or_insert_with(|| Value::from(context.region().unwrap_or(DEFAULT_REGION)))
            .as_str()
            .unwrap_or(DEFAULT_REGION)
            .to_owned();
        context.set(REGION_KEY, region);

        Ok(RequestPayload(body))
    }
}

fn parse_account_id(raw: &str, fallback: i64) -> Result<i64, PayloadError> {
    if raw.is_empty() {
        return Ok(fallback);
    }
    raw.parse::<i64>()
        .map_err(|_| PayloadError::InvalidInteger {
            field: ACCOUNT_ID_FIELD.to_owned(),
            value: raw.to_owned(),
        })
}
