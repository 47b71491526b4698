//! Static vocabulary and rule tables.
//!
//! Adding a capability, synonym, or critical entry is a data change here,
//! not a logic change in the stages. All matching is case-insensitive and
//! word-boundary based.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::types::ReferralCapacity;

/// Capability category names used in citations and coverage maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Services,
    Equipment,
    Staffing,
}

impl Category {
    /// Field/coverage-map name for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Equipment => "equipment",
            Self::Staffing => "staffing",
        }
    }
}

/// Service vocabulary for keyword extraction.
pub const SERVICE_KEYWORDS: &[&str] = &[
    "c-section",
    "cesarean",
    "surgery",
    "surgical",
    "ultrasound",
    "x-ray",
    "immunization",
    "vaccination",
    "laboratory",
    "lab services",
    "pharmacy",
    "dialysis",
    "emergency",
    "maternity",
    "pediatric",
    "outpatient",
    "inpatient",
    "consultation",
    "wound care",
    "family planning",
];

/// Equipment vocabulary for keyword extraction.
pub const EQUIPMENT_KEYWORDS: &[&str] = &[
    "ultrasound",
    "x-ray",
    "ecg",
    "ventilator",
    "oxygen",
    "ct scanner",
    "ct scan",
    "mri",
    "icu",
    "intensive care",
    "operating theater",
    "operating theatre",
    "anesthesia machine",
    "vaccine refrigerator",
];

/// Staffing vocabulary for keyword extraction.
pub const STAFFING_KEYWORDS: &[&str] = &[
    "obstetrician",
    "gynecologist",
    "midwife",
    "midwives",
    "anesthetist",
    "anesthesiologist",
    "surgeon",
    "radiologist",
    "nurse",
    "nurses",
    "doctor",
    "doctors",
    "physician",
    "specialist",
    "pediatrician",
    "laboratory technician",
    "radiographer",
];

/// Operating-hours patterns, tried in order; the first match wins.
pub static HOURS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)24/7",
        r"(?i)24\s*hours",
        r"(?i)mon(?:day)?\s*[-\u{2013}]\s*fri(?:day)?[:\s]*\d{1,2}(?::\d{2})?\s*(?:am|pm)?\s*[-\u{2013}]\s*\d{1,2}(?::\d{2})?\s*(?:am|pm)?",
        r"(?i)\d{1,2}(?::\d{2})?\s*(?:am|pm)\s*[-\u{2013}]\s*\d{1,2}(?::\d{2})?\s*(?:am|pm)",
        r"(?i)weekdays?\s+\d{1,2}(?::\d{2})?\s*(?:am|pm)?\s*[-\u{2013}]\s*\d{1,2}(?::\d{2})?\s*(?:am|pm)?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("hours pattern compiles"))
    .collect()
});

/// Keywords whose presence (outside a negation) means emergency services
/// are offered.
pub const EMERGENCY_KEYWORDS: &[&str] = &["emergency", "a&e", "accident & emergency", "casualty"];

/// Patterns that explicitly address emergency care as absent.
pub static EMERGENCY_NEGATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bno\s+emergency\b",
        r"(?i)\bwithout\s+(?:an?\s+)?emergency\b",
        r"(?i)\bemergency\s+(?:services?\s+|care\s+)?(?:are\s+|is\s+)?not\s+(?:offered|available|provided)\b",
        r"(?i)\blacks?\s+emergency\b",
        r"(?i)\bdoes\s+not\s+(?:offer|provide)\s+emergency\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("negation pattern compiles"))
    .collect()
});

/// Conservative synonym map onto canonical capability names.
pub static SYNONYM_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // C-section variations
        ("cesarean", "c-section"),
        ("caesarean", "c-section"),
        ("c section", "c-section"),
        // Surgery variations
        ("surgical", "surgery"),
        ("surgeries", "surgery"),
        // Emergency variations
        ("accident & emergency", "emergency"),
        ("accident and emergency", "emergency"),
        ("a&e", "emergency"),
        ("er", "emergency"),
        ("casualty", "emergency"),
        // X-ray variations
        ("xray", "x-ray"),
        ("x ray", "x-ray"),
        // Ultrasound variations
        ("ultra sound", "ultrasound"),
        // Laboratory variations
        ("lab", "laboratory"),
        ("lab services", "laboratory"),
        // Equipment variations
        ("intensive care", "icu"),
        ("operating theatre", "operating theater"),
        ("theatre", "operating theater"),
        // Staffing variations
        ("midwives", "midwife"),
        ("doctors", "doctor"),
        ("physician", "doctor"),
        ("physicians", "doctor"),
        ("nurses", "nurse"),
        ("anesthesiologist", "anesthetist"),
        ("anaesthetist", "anesthetist"),
    ])
});

/// Lowercase, strip, and collapse internal whitespace.
pub fn normalize_term(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a term and map it onto its canonical form.
pub fn canonical_term(text: &str) -> String {
    let normalized = normalize_term(text);
    SYNONYM_MAP
        .get(normalized.as_str())
        .map(|s| s.to_string())
        .unwrap_or(normalized)
}

/// One entry of the critical-capability registry.
#[derive(Debug, Clone, Copy)]
pub struct CriticalCapability {
    /// Coverage category the capability is counted under.
    pub category: Category,

    /// Canonical capability name.
    pub name: &'static str,

    /// Severity weight; the registry's weights sum to 1.
    pub weight: f64,
}

impl CriticalCapability {
    /// Token form used in `missing_critical`, e.g. `service:c-section`.
    pub fn token(&self) -> String {
        let category = match self.category {
            Category::Services => "service",
            Category::Equipment => "equipment",
            Category::Staffing => "staffing",
        };
        format!("{category}:{}", self.name)
    }
}

/// Critical capabilities whose absence counts toward the desert score.
///
/// Weights are equal (1/6 each); unequal severity would be a data change
/// here, nothing else.
pub const CRITICAL_CAPABILITIES: &[CriticalCapability] = &[
    CriticalCapability {
        category: Category::Services,
        name: "emergency",
        weight: 1.0 / 6.0,
    },
    CriticalCapability {
        category: Category::Services,
        name: "surgery",
        weight: 1.0 / 6.0,
    },
    CriticalCapability {
        category: Category::Services,
        name: "c-section",
        weight: 1.0 / 6.0,
    },
    CriticalCapability {
        category: Category::Services,
        name: "ultrasound",
        weight: 1.0 / 6.0,
    },
    CriticalCapability {
        category: Category::Services,
        name: "x-ray",
        weight: 1.0 / 6.0,
    },
    CriticalCapability {
        category: Category::Services,
        name: "laboratory",
        weight: 1.0 / 6.0,
    },
];

/// One requirement group of a referral rule: satisfied when at least one
/// of `any_of` (canonical terms) was matched in one of `categories`.
#[derive(Debug, Clone, Copy)]
pub struct RequirementGroup {
    /// Categories the terms may come from.
    pub categories: &'static [Category],

    /// Canonical terms, any one of which satisfies the group. Empty means
    /// "any matched term in one of the categories".
    pub any_of: &'static [&'static str],
}

/// A referral-capacity inference rule: the level applies only when every
/// requirement group is satisfied.
#[derive(Debug, Clone, Copy)]
pub struct ReferralRule {
    /// The capacity level this rule grants.
    pub level: ReferralCapacity,

    /// All groups must be satisfied.
    pub requirements: &'static [RequirementGroup],
}

/// Referral rules, highest capacity first; evaluation falls to the next
/// lower level when a rule is not fully satisfied.
pub const REFERRAL_RULES: &[ReferralRule] = &[
    ReferralRule {
        level: ReferralCapacity::Advanced,
        requirements: &[
            RequirementGroup {
                categories: &[Category::Services],
                any_of: &["surgery", "c-section"],
            },
            RequirementGroup {
                categories: &[Category::Equipment],
                any_of: &["icu", "ventilator"],
            },
            RequirementGroup {
                categories: &[Category::Staffing],
                any_of: &["surgeon", "anesthetist", "specialist"],
            },
        ],
    },
    ReferralRule {
        level: ReferralCapacity::Intermediate,
        requirements: &[
            RequirementGroup {
                categories: &[Category::Services],
                any_of: &["surgery", "c-section", "emergency"],
            },
            RequirementGroup {
                categories: &[Category::Equipment],
                any_of: &["x-ray", "ultrasound", "operating theater"],
            },
        ],
    },
    ReferralRule {
        level: ReferralCapacity::Basic,
        requirements: &[
            RequirementGroup {
                categories: &[Category::Services],
                any_of: &[],
            },
            RequirementGroup {
                categories: &[Category::Equipment, Category::Staffing],
                any_of: &[],
            },
        ],
    },
];

/// Surgical-service terms used by verification rules.
pub const SURGICAL_TERMS: &[&str] = &["surgery", "c-section"];

/// Anesthesia-capable staffing terms.
pub const ANESTHESIA_TERMS: &[&str] = &["anesthetist", "surgeon"];

/// Emergency-capable staffing terms.
pub const EMERGENCY_STAFF_TERMS: &[&str] = &["doctor", "nurse", "surgeon", "specialist"];

/// Advanced-equipment terms that are implausible without any staffing.
pub const ADVANCED_EQUIPMENT_TERMS: &[&str] = &["ct scan", "ct scanner", "mri", "ventilator", "icu"];

/// Display form for a matched keyword: each word capitalized, including
/// after hyphens and slashes ("c-section" -> "C-Section").
pub fn display_term(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    let mut at_word_start = true;
    for ch in keyword.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
