//! Facility input and output record types.

use serde::{Deserialize, Serialize};

use crate::types::capability::CapabilitySet;
use crate::types::evidence::Citation;

/// Kind of source a facility document came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Scraped or submitted website text.
    Website,

    /// Narrative assessment report.
    Report,

    /// Text extracted from a PDF.
    Pdf,

    /// A row from a tabular dataset.
    #[default]
    DatasetRow,
}

/// Raw input document for a healthcare facility.
///
/// Messy, unstructured text from various sources that needs to be
/// extracted and verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityDoc {
    /// Globally unique id, format `<country>-<region>-<seq>`.
    pub facility_id: String,

    /// Facility display name.
    pub facility_name: String,

    /// Country code.
    pub country: String,

    /// Region code within the country.
    pub region: String,

    /// Opaque identifier of the source text blob.
    pub source_id: String,

    /// Kind of source the text came from.
    #[serde(default)]
    pub source_type: SourceType,

    /// The unstructured source text.
    pub source_text: String,

    /// URL of the source, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Geocoordinates, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// ISO 8601 capture timestamp, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl FacilityDoc {
    /// Create a document with the required fields; optional fields via
    /// struct update or the builder setters.
    pub fn new(
        facility_id: impl Into<String>,
        facility_name: impl Into<String>,
        country: impl Into<String>,
        region: impl Into<String>,
        source_id: impl Into<String>,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            facility_id: facility_id.into(),
            facility_name: facility_name.into(),
            country: country.into(),
            region: region.into(),
            source_id: source_id.into(),
            source_type: SourceType::default(),
            source_text: source_text.into(),
            source_url: None,
            latitude: None,
            longitude: None,
            timestamp: None,
        }
    }

    /// Set the source type.
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Set the source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Whether the facility id follows the `<country>-<region>-<seq>` format.
    pub fn has_well_formed_id(&self) -> bool {
        let mut parts = self.facility_id.splitn(3, '-');
        matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(country), Some(region), Some(seq))
                if !country.is_empty() && !region.is_empty() && !seq.is_empty()
        )
    }
}

/// Verification status of a facility's capability claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// No rule fired; claims are internally consistent and complete.
    Verified,

    /// Completeness gaps only.
    Incomplete,

    /// At least one consistency rule fired; `reasons` is non-empty.
    Suspicious,
}

impl VerificationStatus {
    /// Stable wire label for tallies and search text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Incomplete => "INCOMPLETE",
            Self::Suspicious => "SUSPICIOUS",
        }
    }
}

/// Confidence derived from citation density and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Complete analysis result for one facility.
///
/// Created by extraction, mutated exactly once by verification
/// (status/confidence/reasons), thereafter immutable; consumed by
/// aggregation and question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Globally unique id, format `<country>-<region>-<seq>`.
    pub facility_id: String,

    /// Facility display name.
    pub facility_name: String,

    /// Country code.
    pub country: String,

    /// Region code within the country.
    pub region: String,

    /// Geocoordinates, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Extracted capability claims.
    pub capabilities: CapabilitySet,

    /// Verification status.
    pub status: VerificationStatus,

    /// Confidence in the analysis.
    pub confidence: Confidence,

    /// Human-readable explanations for a non-VERIFIED status, in
    /// rule-definition order.
    #[serde(default)]
    pub reasons: Vec<String>,

    /// Supporting citations, in emission order.
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Groups the spans emitted while processing this facility.
    pub trace_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_id_format() {
        let doc = FacilityDoc::new("KE-nairobi-001", "Clinic", "KE", "nairobi", "src-1", "text");
        assert!(doc.has_well_formed_id());

        let bad = FacilityDoc::new("nairobi001", "Clinic", "KE", "nairobi", "src-1", "text");
        assert!(!bad.has_well_formed_id());

        let empty_part = FacilityDoc::new("KE--001", "Clinic", "KE", "nairobi", "src-1", "text");
        assert!(!empty_part.has_well_formed_id());
    }

    #[test]
    fn test_status_serde_labels() {
        let json = serde_json::to_string(&VerificationStatus::Suspicious).unwrap();
        assert_eq!(json, "\"SUSPICIOUS\"");
        assert_eq!(VerificationStatus::Suspicious.as_str(), "SUSPICIOUS");
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }
}
