//! Capability types - the structured output of the extraction stage.

use serde::{Deserialize, Serialize};

/// Operating hours as stated by the source.
///
/// Absence is the `UNKNOWN` token, never an empty string; the wire form
/// is a plain string either way so stored records stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Hours {
    /// Hours were stated (e.g., "24/7", "Mon-Fri 8am-5pm").
    Known(String),

    /// The source never stated operating hours.
    Unknown,
}

impl Hours {
    /// Whether hours were never stated.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Hours::Unknown)
    }

    /// Whether the facility claims round-the-clock operation.
    pub fn is_around_the_clock(&self) -> bool {
        match self {
            Hours::Known(text) => {
                let lower = text.to_lowercase();
                lower.contains("24/7") || lower.contains("24 hours")
            }
            Hours::Unknown => false,
        }
    }
}

impl Default for Hours {
    fn default() -> Self {
        Self::Unknown
    }
}

impl From<String> for Hours {
    fn from(value: String) -> Self {
        if value.trim().is_empty() || value == "UNKNOWN" {
            Hours::Unknown
        } else {
            Hours::Known(value)
        }
    }
}

impl From<Hours> for String {
    fn from(hours: Hours) -> Self {
        match hours {
            Hours::Known(text) => text,
            Hours::Unknown => "UNKNOWN".to_string(),
        }
    }
}

/// Referral capacity as an ordinal scale.
///
/// Derives `Ord` so rule checks can compare levels directly
/// (`None < Basic < Intermediate < Advanced`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferralCapacity {
    /// No referral handling inferred.
    #[default]
    None,

    /// Can refer or transfer patients onward.
    Basic,

    /// Handles incoming referrals for common procedures.
    Intermediate,

    /// Tertiary-level referral center (surgery + ICU + specialists).
    Advanced,
}

/// Whether the facility offers emergency services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmergencyCapability {
    /// An emergency-service keyword matched, with a citation.
    Yes,

    /// The source explicitly addressed emergency care as absent.
    No,

    /// The source never mentions emergency services.
    #[default]
    Unknown,
}

/// Normalized structured facility capability fields.
///
/// Produced once per facility by extraction; read-only afterward. The
/// verification verdict (status/confidence) is stored alongside it on the
/// [`FacilityRecord`](crate::types::FacilityRecord), not inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Clinical services offered (e.g., "Surgery", "Maternity").
    #[serde(default)]
    pub services: Vec<String>,

    /// Equipment on site (e.g., "Ultrasound", "X-Ray").
    #[serde(default)]
    pub equipment: Vec<String>,

    /// Staffing roles present (e.g., "Midwife", "Anesthetist").
    #[serde(default)]
    pub staffing: Vec<String>,

    /// Operating hours, `UNKNOWN` when never stated.
    #[serde(default)]
    pub hours: Hours,

    /// Inferred referral capacity.
    #[serde(default)]
    pub referral_capacity: ReferralCapacity,

    /// Emergency-service capability.
    #[serde(default)]
    pub emergency_capability: EmergencyCapability,
}

impl CapabilitySet {
    /// Create an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim, drop empties, and deduplicate the list fields in place,
    /// preserving first-seen order.
    pub fn dedupe_and_trim(&mut self) {
        for list in [&mut self.services, &mut self.equipment, &mut self.staffing] {
            let mut seen = std::collections::HashSet::new();
            let mut cleaned = Vec::with_capacity(list.len());
            for item in list.drain(..) {
                let trimmed = item.trim().to_string();
                if !trimmed.is_empty() && seen.insert(trimmed.clone()) {
                    cleaned.push(trimmed);
                }
            }
            *list = cleaned;
        }
    }

    /// Whether any capability claim is present.
    ///
    /// An all-default set (no lists, unknown hours, no referral, unknown
    /// emergency) represents "nothing claimed".
    pub fn has_any_claim(&self) -> bool {
        !self.services.is_empty()
            || !self.equipment.is_empty()
            || !self.staffing.is_empty()
            || !self.hours.is_unknown()
            || self.referral_capacity != ReferralCapacity::None
            || self.emergency_capability != EmergencyCapability::Unknown
    }

    /// All list-field entries, paired with their category name.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.services
            .iter()
            .map(|s| ("services", s.as_str()))
            .chain(self.equipment.iter().map(|e| ("equipment", e.as_str())))
            .chain(self.staffing.iter().map(|s| ("staffing", s.as_str())))
    }
}
