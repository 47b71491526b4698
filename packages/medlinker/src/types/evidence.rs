//! Evidence model - citations linking claims back to source text.

use serde::{Deserialize, Serialize};

/// Capability fields a citation may support.
pub const CAPABILITY_FIELDS: &[&str] = &[
    "services",
    "equipment",
    "staffing",
    "hours",
    "referral_capacity",
    "emergency_capability",
];

/// Reserved field name for citations synthesized from a region summary
/// rather than quoted from source text.
pub const REGION_SUMMARY_FIELD: &str = "region_summary";

/// Evidence snippet tied to a specific capability field.
///
/// Citations are never mutated after creation; they are owned by the stage
/// that produced them and referenced by downstream consumers that need to
/// display provenance. `start_char`/`end_char` are offsets into the source
/// text and are absent for synthetic, aggregate-level citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Opaque identifier of the originating text blob.
    pub source_id: String,

    /// URL of the source, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Verbatim excerpt supporting the claim (or a formatted summary for
    /// aggregate-level citations).
    pub snippet: String,

    /// Name of the capability field this citation supports.
    pub field: String,

    /// Start offset into the source text, absent for synthetic citations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_char: Option<usize>,

    /// End offset into the source text, absent for synthetic citations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_char: Option<usize>,
}

impl Citation {
    /// Create a citation with recorded character offsets.
    pub fn with_offsets(
        source_id: impl Into<String>,
        snippet: impl Into<String>,
        field: impl Into<String>,
        start_char: usize,
        end_char: usize,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_url: None,
            snippet: snippet.into(),
            field: field.into(),
            start_char: Some(start_char),
            end_char: Some(end_char),
        }
    }

    /// Create a synthetic citation with no offsets (aggregate-level claims).
    pub fn synthetic(
        source_id: impl Into<String>,
        snippet: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_url: None,
            snippet: snippet.into(),
            field: field.into(),
            start_char: None,
            end_char: None,
        }
    }

    /// Set the source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Whether `field` names an existing capability-set attribute.
    pub fn is_capability_field(&self) -> bool {
        CAPABILITY_FIELDS.contains(&self.field.as_str())
    }

    /// Whether the offsets form a valid range (`start < end`), or are absent.
    pub fn has_valid_range(&self) -> bool {
        match (self.start_char, self.end_char) {
            (Some(start), Some(end)) => start < end,
            (None, None) => true,
            _ => false,
        }
    }
}

/// Count the distinct capability fields covered by a set of citations.
pub fn distinct_cited_fields(citations: &[Citation]) -> usize {
    let mut fields: Vec<&str> = citations
        .iter()
        .filter(|c| c.is_capability_field())
        .map(|c| c.field.as_str())
        .collect();
    fields.sort_unstable();
    fields.dedup();
    fields.len()
}
