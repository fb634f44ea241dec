//! Identifier extraction from loosely structured response bodies.

use serde_json::{Map, Value};

use super::ClassifyError;
use crate::executor::ApiOutcome;

const ID_FIELD: &str = "id";
const RESOURCE_ID_FIELDS: [&str; 2] = ["vpcId", "subnetId"];
const FALLBACK_FIELDS: [&str; 2] = ["id", "vpcId"];
const DATA_FIELD: &str = "data";

/// Where in the body an identifier was found.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub enum IdentifierSource {
    /// Top-level `id`.
    DirectId,
    /// Top-level `vpcId` or `subnetId`.
    DirectVpcId,
    /// `data.id`.
    NestedDataId,
    /// `data.vpcId` or `data.subnetId`.
    NestedDataVpcId,
    /// No known field held a usable value.
    NotFound,
}

impl IdentifierSource {
    /// Short description used in logs and diagnostics.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::DirectId => "direct 'id' field",
            Self::DirectVpcId => "direct 'vpcId'/'subnetId' field",
            Self::NestedDataId => "nested 'data.id' field",
            Self::NestedDataVpcId => "nested 'data.vpcId'/'data.subnetId' field",
            Self::NotFound => "not found",
        }
    }
}

impl std::fmt::Display for IdentifierSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Identifier recovered from a response together with its location.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtractedIdentifier {
    /// Trimmed identifier, empty when not found.
    pub value: String,
    /// Location the value came from.
    pub source: IdentifierSource,
}

impl ExtractedIdentifier {
    /// Identifier that was not found.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            value: String::new(),
            source: IdentifierSource::NotFound,
        }
    }

    /// Whether a value was recovered.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.source != IdentifierSource::NotFound
    }

    /// The identifier, or `None` when it was not found.
    #[must_use]
    pub fn found(&self) -> Option<&str> {
        self.is_found().then_some(self.value.as_str())
    }
}

type Extractor = fn(&Map<String, Value>) -> Option<ExtractedIdentifier>;

/// Ordered strategies; the first to return a value wins.
const STRATEGIES: [(&str, Extractor); 5] = [
    ("id", direct_id),
    ("vpcId/subnetId", direct_resource_id),
    ("data.id", nested_id),
    ("data.vpcId/data.subnetId", nested_resource_id),
    ("fallback id/vpcId scan", fallback_scan),
];

/// Names of the strategies in the order they are attempted.
#[must_use]
pub fn strategy_names() -> Vec<&'static str> {
    STRATEGIES.iter().map(|(name, _)| *name).collect()
}

/// Runs the extraction strategies over the outcome's body.
///
/// # Errors
///
/// Returns [`ClassifyError::NonJsonResponse`] when the body is not JSON.
pub fn extract_identifier(outcome: &ApiOutcome) -> Result<ExtractedIdentifier, ClassifyError> {
    let Some(json) = outcome.json.as_ref() else {
        return Err(ClassifyError::NonJsonResponse {
            body: outcome.body.clone(),
        });
    };
    let Value::Object(body) = json else {
        return Ok(ExtractedIdentifier::not_found());
    };
    Ok(STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(body))
        .unwrap_or_else(ExtractedIdentifier::not_found))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(number) => Some(number.to_string()),
        other => non_empty_str(Some(other)),
    }
}

fn data(body: &Map<String, Value>) -> Option<&Map<String, Value>> {
    body.get(DATA_FIELD).and_then(Value::as_object)
}

fn found(value: String, source: IdentifierSource) -> ExtractedIdentifier {
    ExtractedIdentifier { value, source }
}

fn direct_id(body: &Map<String, Value>) -> Option<ExtractedIdentifier> {
    non_empty_str(body.get(ID_FIELD)).map(|id| found(id, IdentifierSource::DirectId))
}

fn direct_resource_id(body: &Map<String, Value>) -> Option<ExtractedIdentifier> {
    RESOURCE_ID_FIELDS
        .iter()
        .find_map(|field| non_empty_str(body.get(*field)))
        .map(|id| found(id, IdentifierSource::DirectVpcId))
}

fn nested_id(body: &Map<String, Value>) -> Option<ExtractedIdentifier> {
    non_empty_str(data(body)?.get(ID_FIELD)).map(|id| found(id, IdentifierSource::NestedDataId))
}

fn nested_resource_id(body: &Map<String, Value>) -> Option<ExtractedIdentifier> {
    let nested = data(body)?;
    RESOURCE_ID_FIELDS
        .iter()
        .find_map(|field| non_empty_str(nested.get(*field)))
        .map(|id| found(id, IdentifierSource::NestedDataVpcId))
}

/// Last resort: re-scans `id`/`vpcId` at both levels.
///
/// This widens the strategies above, which take non-empty strings only: a
/// numeric id such as `{"id": 5}` is accepted here and rendered as text.
/// Shape checks are left to [`IdentifierFormat`].
fn fallback_scan(body: &Map<String, Value>) -> Option<ExtractedIdentifier> {
    FALLBACK_FIELDS.iter().find_map(|field| {
        let (direct, nested) = if *field == ID_FIELD {
            (IdentifierSource::DirectId, IdentifierSource::NestedDataId)
        } else {
            (
                IdentifierSource::DirectVpcId,
                IdentifierSource::NestedDataVpcId,
            )
        };
        scalar(body.get(*field))
            .map(|id| found(id, direct))
            .or_else(|| scalar(data(body)?.get(*field)).map(|id| found(id, nested)))
    })
}

/// Provider-specific identifier shape.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IdentifierFormat {
    /// Required prefix, such as `vpc-`.
    pub prefix: &'static str,
    /// Minimum number of characters after the prefix.
    pub min_suffix_len: usize,
}

impl IdentifierFormat {
    /// AWS VPC ids: `vpc-` followed by at least eight characters.
    pub const VPC: Self = Self {
        prefix: "vpc-",
        min_suffix_len: 8,
    };

    /// Whether `identifier` matches this shape.
    #[must_use]
    pub fn matches(&self, identifier: &str) -> bool {
        identifier
            .strip_prefix(self.prefix)
            .is_some_and(|suffix| suffix.chars().count() >= self.min_suffix_len)
    }

    /// Checks `identifier` against this shape.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::IdentifierMalformed`] when it does not match.
    pub fn validate(&self, identifier: &str) -> Result<(), ClassifyError> {
        if self.matches(identifier) {
            Ok(())
        } else {
            Err(ClassifyError::IdentifierMalformed {
                identifier: identifier.to_owned(),
                expected: self.to_string(),
            })
        }
    }
}

impl std::fmt::Display for IdentifierFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}<{}+ characters>",
            self.prefix, self.min_suffix_len
        )
    }
}
