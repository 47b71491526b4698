//! Rule-based verification of extracted capability claims.
//!
//! An ordered ruleset evaluates one facility's capability set and
//! citations into findings; consistency violations outrank completeness
//! gaps when deriving the status. Pure function of its inputs - never
//! fails on well-formed input.

use crate::types::{
    distinct_cited_fields, CapabilitySet, Citation, Confidence, EmergencyCapability,
    ReferralCapacity, VerificationStatus, VerifyConfig,
};
use crate::vocab::{
    canonical_term, ADVANCED_EQUIPMENT_TERMS, ANESTHESIA_TERMS, EMERGENCY_STAFF_TERMS,
    SURGICAL_TERMS,
};

/// What kind of problem a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Claims that contradict each other or strain plausibility.
    Consistency,

    /// Information that is missing rather than contradictory.
    Completeness,
}

/// One fired rule: its kind plus the human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: RuleKind,
    pub message: String,
}

/// The verification outcome for one facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerificationStatus,
    pub confidence: Confidence,
    /// Messages of every fired rule, in rule-definition order.
    pub reasons: Vec<String>,
}

struct Rule {
    kind: RuleKind,
    message: &'static str,
    check: fn(&CapabilitySet, &[Citation]) -> bool,
}

/// The ordered verification rule table.
///
/// Rules are data: adding one is a new entry here, and `reasons` ordering
/// follows this table, not severity.
pub struct Ruleset {
    rules: Vec<Rule>,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            rules: vec![
                Rule {
                    kind: RuleKind::Consistency,
                    message: "Surgical services are claimed but no anesthesia-capable staffing is listed; the claim may be inconsistent.",
                    check: |caps, _| {
                        has_term(&caps.services, SURGICAL_TERMS)
                            && !has_term(&caps.staffing, ANESTHESIA_TERMS)
                    },
                },
                Rule {
                    kind: RuleKind::Consistency,
                    message: "Emergency capability is claimed but hours are not around-the-clock and no emergency-capable staffing is listed.",
                    check: |caps, _| {
                        caps.emergency_capability == EmergencyCapability::Yes
                            && !caps.hours.is_around_the_clock()
                            && !has_term(&caps.staffing, EMERGENCY_STAFF_TERMS)
                    },
                },
                Rule {
                    kind: RuleKind::Consistency,
                    message: "Advanced equipment is listed but no staffing is provided; the claim may be implausible.",
                    check: |caps, _| {
                        has_term(&caps.equipment, ADVANCED_EQUIPMENT_TERMS)
                            && caps.staffing.is_empty()
                    },
                },
                Rule {
                    kind: RuleKind::Completeness,
                    message: "Hours are not specified and referral capacity could not be inferred; availability is unclear.",
                    check: |caps, _| {
                        caps.hours.is_unknown()
                            && caps.referral_capacity == ReferralCapacity::None
                    },
                },
                Rule {
                    kind: RuleKind::Completeness,
                    message: "Staffing information is missing; capability claims cannot be fully corroborated.",
                    check: |caps, _| caps.staffing.is_empty(),
                },
                Rule {
                    kind: RuleKind::Completeness,
                    message: "Emergency capability is not documented; availability in emergencies is unclear.",
                    check: |caps, _| {
                        caps.emergency_capability == EmergencyCapability::Unknown
                    },
                },
                Rule {
                    kind: RuleKind::Completeness,
                    message: "One or more capability claims have no supporting citation.",
                    check: |caps, citations| has_uncited_claim(caps, citations),
                },
            ],
        }
    }
}

impl Ruleset {
    /// Run every rule, collecting findings in definition order.
    pub fn evaluate(&self, capabilities: &CapabilitySet, citations: &[Citation]) -> Vec<Finding> {
        self.rules
            .iter()
            .filter(|rule| (rule.check)(capabilities, citations))
            .map(|rule| Finding {
                kind: rule.kind,
                message: rule.message.to_string(),
            })
            .collect()
    }
}

/// Verify one facility's capability claims against its citations.
pub fn verify_capabilities(
    capabilities: &CapabilitySet,
    citations: &[Citation],
    config: &VerifyConfig,
) -> Verdict {
    let findings = Ruleset::default().evaluate(capabilities, citations);

    let any_consistency = findings.iter().any(|f| f.kind == RuleKind::Consistency);
    let status = if any_consistency {
        VerificationStatus::Suspicious
    } else if !findings.is_empty() {
        VerificationStatus::Incomplete
    } else {
        VerificationStatus::Verified
    };

    let reasons: Vec<String> = findings.into_iter().map(|f| f.message).collect();
    let confidence = derive_confidence(status, citations, config);

    Verdict {
        status,
        confidence,
        reasons,
    }
}

fn derive_confidence(
    status: VerificationStatus,
    citations: &[Citation],
    config: &VerifyConfig,
) -> Confidence {
    if status == VerificationStatus::Suspicious || citations.len() <= config.low_max_citations {
        Confidence::Low
    } else if status == VerificationStatus::Verified
        && citations.len() >= config.high_min_citations
        && distinct_cited_fields(citations) >= config.high_min_fields
    {
        Confidence::High
    } else {
        Confidence::Medium
    }
}

fn has_term(items: &[String], terms: &[&str]) -> bool {
    items
        .iter()
        .any(|item| terms.contains(&canonical_term(item).as_str()))
}

/// True when some non-empty claim has no citation naming its field.
fn has_uncited_claim(capabilities: &CapabilitySet, citations: &[Citation]) -> bool {
    let cited = |field: &str| citations.iter().any(|c| c.field == field);

    for (category, items) in [
        ("services", &capabilities.services),
        ("equipment", &capabilities.equipment),
        ("staffing", &capabilities.staffing),
    ] {
        if !items.is_empty() && !cited(category) {
            return true;
        }
    }
    if !capabilities.hours.is_unknown() && !cited("hours") {
        return true;
    }
    if capabilities.emergency_capability != EmergencyCapability::Unknown
        && !cited("emergency_capability")
    {
        return true;
    }
    if capabilities.referral_capacity != ReferralCapacity::None && !cited("referral_capacity") {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::extract_capabilities;
    use crate::types::{ExtractConfig, FacilityDoc, Hours};

    fn config() -> VerifyConfig {
        VerifyConfig::default()
    }

    fn extract(text: &str) -> (CapabilitySet, Vec<Citation>) {
        let doc = FacilityDoc::new("KE-nairobi-001", "Clinic", "KE", "nairobi", "src-1", text);
        extract_capabilities(&doc, &ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_fully_evidenced_facility_is_verified_high() {
        let (caps, citations) = extract(
            "Open 24/7 with emergency care, surgery, ultrasound and x-ray, \
             staffed by a surgeon, anesthetist and nurses.",
        );
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Verified);
        assert_eq!(verdict.confidence, Confidence::High);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_surgery_without_anesthesia_staffing_is_suspicious() {
        let (caps, citations) = extract("Surgery and Emergency 24/7 available here.");
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Suspicious);
        assert!(verdict
            .reasons
            .iter()
            .any(|r| r.contains("anesthesia-capable staffing")));
        assert_eq!(verdict.confidence, Confidence::Low);
    }

    #[test]
    fn test_suspicious_implies_reasons_non_empty() {
        let (caps, citations) = extract("Surgery offered daily.");
        let verdict = verify_capabilities(&caps, &citations, &config());

        if verdict.status == VerificationStatus::Suspicious {
            assert!(!verdict.reasons.is_empty());
        }
    }

    #[test]
    fn test_emergency_without_hours_or_staff_is_suspicious() {
        let caps = CapabilitySet {
            services: vec!["Emergency".to_string()],
            emergency_capability: EmergencyCapability::Yes,
            referral_capacity: ReferralCapacity::Basic,
            ..Default::default()
        };
        let citations = vec![
            Citation::synthetic("src-1", "emergency care", "services"),
            Citation::synthetic("src-1", "emergency care", "emergency_capability"),
            Citation::synthetic("src-1", "emergency care", "referral_capacity"),
        ];
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Suspicious);
        assert!(verdict
            .reasons
            .iter()
            .any(|r| r.contains("around-the-clock")));
    }

    #[test]
    fn test_advanced_equipment_without_staffing_is_suspicious() {
        let caps = CapabilitySet {
            equipment: vec!["Ventilator".to_string()],
            hours: Hours::Known("24/7".to_string()),
            referral_capacity: ReferralCapacity::Basic,
            ..Default::default()
        };
        let citations = vec![
            Citation::synthetic("src-1", "a ventilator", "equipment"),
            Citation::synthetic("src-1", "open 24/7", "hours"),
            Citation::synthetic("src-1", "a ventilator", "referral_capacity"),
        ];
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Suspicious);
        assert!(verdict.reasons.iter().any(|r| r.contains("Advanced equipment")));
    }

    #[test]
    fn test_missing_hours_and_referral_is_incomplete() {
        let caps = CapabilitySet {
            staffing: vec!["Nurse".to_string()],
            ..Default::default()
        };
        let citations = vec![
            Citation::synthetic("src-1", "a nurse", "staffing"),
            Citation::synthetic("src-1", "a nurse on duty", "staffing"),
        ];
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Incomplete);
        assert!(verdict.reasons.iter().any(|r| r.contains("Hours")));
        assert_eq!(verdict.confidence, Confidence::Medium);
    }

    #[test]
    fn test_uncited_claim_blocks_verified_status() {
        let caps = CapabilitySet {
            services: vec!["Laboratory".to_string()],
            staffing: vec!["Nurse".to_string()],
            hours: Hours::Known("24/7".to_string()),
            referral_capacity: ReferralCapacity::Basic,
            ..Default::default()
        };
        // No citation for the services claim.
        let citations = vec![
            Citation::synthetic("src-1", "a nurse", "staffing"),
            Citation::synthetic("src-1", "open 24/7", "hours"),
            Citation::synthetic("src-1", "a nurse", "referral_capacity"),
        ];
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Incomplete);
        assert!(verdict
            .reasons
            .iter()
            .any(|r| r.contains("no supporting citation")));
    }

    #[test]
    fn test_unknown_emergency_capability_is_incomplete() {
        // Every claim cited, hours and referral present; only emergency
        // capability is undocumented.
        let caps = CapabilitySet {
            services: vec!["Laboratory".to_string()],
            staffing: vec!["Nurse".to_string()],
            hours: Hours::Known("24/7".to_string()),
            referral_capacity: ReferralCapacity::Basic,
            emergency_capability: EmergencyCapability::Unknown,
            ..Default::default()
        };
        let citations = vec![
            Citation::synthetic("src-1", "a laboratory", "services"),
            Citation::synthetic("src-1", "a nurse", "staffing"),
            Citation::synthetic("src-1", "open 24/7", "hours"),
            Citation::synthetic("src-1", "a nurse", "referral_capacity"),
        ];
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Incomplete);
        assert!(verdict
            .reasons
            .iter()
            .any(|r| r.contains("Emergency capability is not documented")));
    }

    #[test]
    fn test_empty_staffing_alone_is_incomplete() {
        let caps = CapabilitySet {
            hours: Hours::Known("24/7".to_string()),
            referral_capacity: ReferralCapacity::Basic,
            emergency_capability: EmergencyCapability::No,
            ..Default::default()
        };
        let citations = vec![
            Citation::synthetic("src-1", "open 24/7", "hours"),
            Citation::synthetic("src-1", "no emergency services", "emergency_capability"),
            Citation::synthetic("src-1", "referrals accepted", "referral_capacity"),
        ];
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.status, VerificationStatus::Incomplete);
        assert!(verdict
            .reasons
            .iter()
            .any(|r| r.contains("Staffing information")));
    }

    #[test]
    fn test_near_zero_citations_cap_confidence_at_low() {
        let caps = CapabilitySet {
            staffing: vec!["Nurse".to_string()],
            ..Default::default()
        };
        let citations = vec![Citation::synthetic("src-1", "a nurse", "staffing")];
        let verdict = verify_capabilities(&caps, &citations, &config());

        assert_eq!(verdict.confidence, Confidence::Low);
    }

    #[test]
    fn test_reasons_follow_rule_definition_order() {
        // Fires the surgery rule (consistency), the staffing rule and the
        // hours+referral rule (completeness); order must match the table.
        let caps = CapabilitySet {
            services: vec!["Surgery".to_string()],
            referral_capacity: ReferralCapacity::None,
            ..Default::default()
        };
        let verdict = verify_capabilities(&caps, &[], &config());

        assert_eq!(verdict.status, VerificationStatus::Suspicious);
        let anesthesia = verdict
            .reasons
            .iter()
            .position(|r| r.contains("anesthesia"))
            .unwrap();
        let hours = verdict
            .reasons
            .iter()
            .position(|r| r.contains("Hours"))
            .unwrap();
        let staffing = verdict
            .reasons
            .iter()
            .position(|r| r.contains("Staffing information"))
            .unwrap();
        assert!(anesthesia < hours && hours < staffing);
    }

    #[test]
    fn test_verification_is_deterministic() {
        let (caps, citations) = extract("Emergency 24/7 with surgery and an ICU.");
        let first = verify_capabilities(&caps, &citations, &config());
        let second = verify_capabilities(&caps, &citations, &config());
        assert_eq!(first, second);
    }
}
