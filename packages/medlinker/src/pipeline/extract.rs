//! Deterministic capability extraction with citation offsets.
//!
//! Keyword/phrase matching against the fixed vocabulary tables in
//! [`crate::vocab`]; each match's surrounding text window becomes the
//! citation snippet with recorded character offsets. Pure function of its
//! inputs plus the rule tables - identical input always yields identical
//! output.

use regex::Regex;

use crate::error::{PipelineError, Result};
use crate::traits::Enrichment;
use crate::types::{
    CapabilitySet, Citation, EmergencyCapability, ExtractConfig, FacilityDoc, Hours,
    ReferralCapacity,
};
use crate::vocab::{
    canonical_term, Category, EMERGENCY_KEYWORDS, EMERGENCY_NEGATION_PATTERNS, EQUIPMENT_KEYWORDS,
    HOURS_PATTERNS, REFERRAL_RULES, SERVICE_KEYWORDS, STAFFING_KEYWORDS,
};

/// Extract a capability set and its citations from one facility document.
///
/// Never fails for "no matches" - that yields an empty capability set.
/// Fails with [`PipelineError::InvalidInput`] on a missing `source_id` or
/// empty source text (caller contract violation).
pub fn extract_capabilities(
    doc: &FacilityDoc,
    config: &ExtractConfig,
) -> Result<(CapabilitySet, Vec<Citation>)> {
    if doc.source_id.trim().is_empty() {
        return Err(PipelineError::invalid_input("source_id must not be empty"));
    }
    if doc.source_text.trim().is_empty() {
        return Err(PipelineError::invalid_input(
            "source_text must not be empty",
        ));
    }

    let text = doc.source_text.as_str();
    let mut citations = Vec::new();

    let services = extract_list_field(text, SERVICE_KEYWORDS, "services", doc, config, &mut citations);
    let equipment =
        extract_list_field(text, EQUIPMENT_KEYWORDS, "equipment", doc, config, &mut citations);
    let staffing =
        extract_list_field(text, STAFFING_KEYWORDS, "staffing", doc, config, &mut citations);

    let hours = extract_hours(text, doc, config, &mut citations);
    let emergency_capability = extract_emergency(text, doc, config, &mut citations);

    let mut capabilities = CapabilitySet {
        services,
        equipment,
        staffing,
        hours,
        referral_capacity: ReferralCapacity::None,
        emergency_capability,
    };
    capabilities.dedupe_and_trim();
    capabilities.referral_capacity = infer_referral_capacity(&capabilities);

    if capabilities.referral_capacity != ReferralCapacity::None {
        // Inferred from the matched superset; back it with the evidence of
        // the first contributing service/equipment match.
        if let Some(basis) = citations
            .iter()
            .find(|c| c.field == "services" || c.field == "equipment")
        {
            let mut derived = basis.clone();
            derived.field = "referral_capacity".to_string();
            citations.push(derived);
        }
    }

    Ok((capabilities, citations))
}

/// Infer referral capacity from the matched capability superset.
///
/// Rules are evaluated highest capacity first; a level applies only when
/// every requirement group is fully satisfied, otherwise evaluation falls
/// to the next lower level.
pub fn infer_referral_capacity(capabilities: &CapabilitySet) -> ReferralCapacity {
    let canon = |items: &[String]| -> Vec<String> {
        items.iter().map(|i| canonical_term(i)).collect()
    };
    let services = canon(&capabilities.services);
    let equipment = canon(&capabilities.equipment);
    let staffing = canon(&capabilities.staffing);

    for rule in REFERRAL_RULES {
        let satisfied = rule.requirements.iter().all(|group| {
            group.categories.iter().any(|&category| {
                let terms: &[String] = match category {
                    Category::Services => &services,
                    Category::Equipment => &equipment,
                    Category::Staffing => &staffing,
                };
                if group.any_of.is_empty() {
                    !terms.is_empty()
                } else {
                    terms.iter().any(|t| group.any_of.contains(&t.as_str()))
                }
            })
        });
        if satisfied {
            return rule.level;
        }
    }
    ReferralCapacity::None
}

/// Validate enricher output against the source text.
///
/// Mirrors the deterministic path's contract: citation fields must name
/// capability attributes with sane offsets, snippets must be verbatim
/// excerpts, and non-empty claims need at least one surviving citation.
/// Citations with fabricated snippets are discarded; if every citation was
/// fabricated the whole enrichment is rejected.
pub fn validate_enrichment(mut enrichment: Enrichment, source_text: &str) -> Result<Enrichment> {
    for citation in &enrichment.citations {
        if !citation.is_capability_field() {
            return Err(PipelineError::invalid_input(format!(
                "enrichment citation field '{}' does not name a capability attribute",
                citation.field
            )));
        }
        if !citation.has_valid_range() {
            return Err(PipelineError::invalid_input(
                "enrichment citation has an invalid offset range",
            ));
        }
    }

    let before = enrichment.citations.len();
    enrichment
        .citations
        .retain(|c| source_text.contains(c.snippet.as_str()));

    if before > 0 && enrichment.citations.is_empty() {
        return Err(PipelineError::invalid_input(
            "all enrichment citations contained snippets not found in source text",
        ));
    }

    enrichment.capabilities.dedupe_and_trim();
    if enrichment.capabilities.has_any_claim() && enrichment.citations.is_empty() {
        return Err(PipelineError::invalid_input(
            "enrichment claims capabilities but provides no valid citations",
        ));
    }

    Ok(enrichment)
}

fn extract_list_field(
    text: &str,
    keywords: &[&str],
    field: &str,
    doc: &FacilityDoc,
    config: &ExtractConfig,
    citations: &mut Vec<Citation>,
) -> Vec<String> {
    let mut found = Vec::new();
    for keyword in keywords {
        let Some((start, end)) = find_keyword(text, keyword) else {
            continue;
        };
        let item = crate::vocab::display_term(keyword);
        if found.contains(&item) {
            continue;
        }
        found.push(item);
        citations.push(make_citation(text, field, doc, config, start, end));
    }
    found
}

fn extract_hours(
    text: &str,
    doc: &FacilityDoc,
    config: &ExtractConfig,
    citations: &mut Vec<Citation>,
) -> Hours {
    for pattern in HOURS_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            citations.push(make_citation(text, "hours", doc, config, m.start(), m.end()));
            return Hours::Known(m.as_str().to_string());
        }
    }
    Hours::Unknown
}

fn extract_emergency(
    text: &str,
    doc: &FacilityDoc,
    config: &ExtractConfig,
    citations: &mut Vec<Citation>,
) -> EmergencyCapability {
    // Negation wins over a positive keyword inside the negated phrase.
    for pattern in EMERGENCY_NEGATION_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            citations.push(make_citation(
                text,
                "emergency_capability",
                doc,
                config,
                m.start(),
                m.end(),
            ));
            return EmergencyCapability::No;
        }
    }
    for keyword in EMERGENCY_KEYWORDS {
        if let Some((start, end)) = find_keyword(text, keyword) {
            citations.push(make_citation(
                text,
                "emergency_capability",
                doc,
                config,
                start,
                end,
            ));
            return EmergencyCapability::Yes;
        }
    }
    EmergencyCapability::Unknown
}

/// First case-insensitive word-boundary match of `keyword` in `text`.
fn find_keyword(text: &str, keyword: &str) -> Option<(usize, usize)> {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
    // Vocabulary keywords are fixed literals; escaping keeps this infallible.
    let re = Regex::new(&pattern).ok()?;
    re.find(text).map(|m| (m.start(), m.end()))
}

fn make_citation(
    text: &str,
    field: &str,
    doc: &FacilityDoc,
    config: &ExtractConfig,
    start: usize,
    end: usize,
) -> Citation {
    let snippet = context_snippet(text, start, end, config);
    let mut citation = Citation::with_offsets(doc.source_id.clone(), snippet, field, start, end);
    if let Some(url) = &doc.source_url {
        citation = citation.with_source_url(url.clone());
    }
    citation
}

/// Snippet around `[start, end)` with `snippet_radius` context on each
/// side, trimmed and capped at `max_snippet_len`.
fn context_snippet(text: &str, start: usize, end: usize, config: &ExtractConfig) -> String {
    let window_start = floor_char_boundary(text, start.saturating_sub(config.snippet_radius));
    let window_end = ceil_char_boundary(text, (end + config.snippet_radius).min(text.len()));
    let mut snippet = text[window_start..window_end].trim().to_string();
    if snippet.len() > config.max_snippet_len {
        let cut = floor_char_boundary(&snippet, config.max_snippet_len.saturating_sub(3));
        snippet.truncate(cut);
        snippet.push_str("...");
    }
    snippet
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;

    fn doc(text: &str) -> FacilityDoc {
        FacilityDoc::new(
            "KE-nairobi-001",
            "Nairobi General",
            "KE",
            "nairobi",
            "src-001",
            text,
        )
        .with_source_type(SourceType::Report)
    }

    fn extract(text: &str) -> (CapabilitySet, Vec<Citation>) {
        extract_capabilities(&doc(text), &ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_source_id_is_invalid_input() {
        let mut d = doc("some text");
        d.source_id = "  ".to_string();
        let err = extract_capabilities(&d, &ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }

    #[test]
    fn test_empty_text_is_invalid_input() {
        let err = extract_capabilities(&doc("   "), &ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }

    #[test]
    fn test_no_matches_yields_empty_set_not_error() {
        let (caps, citations) = extract("The weather was pleasant all week.");
        assert!(!caps.has_any_claim());
        assert!(citations.is_empty());
    }

    #[test]
    fn test_keyword_matches_carry_offsets_and_snippets() {
        let text = "The clinic offers surgery and has an ultrasound machine on site.";
        let (caps, citations) = extract(text);

        assert!(caps.services.contains(&"Surgery".to_string()));
        assert!(caps.equipment.contains(&"Ultrasound".to_string()));

        let surgery = citations
            .iter()
            .find(|c| c.field == "services" && c.snippet.contains("surgery"))
            .unwrap();
        let (start, end) = (surgery.start_char.unwrap(), surgery.end_char.unwrap());
        assert_eq!(&text[start..end], "surgery");
        assert!(text.contains(surgery.snippet.as_str()));
    }

    #[test]
    fn test_every_claim_has_citation_for_its_field() {
        let text = "Emergency services 24/7. Surgery by our surgeon; x-ray and laboratory open Mon-Fri 8am-5pm.";
        let (caps, citations) = extract(text);

        for (category, _) in caps.entries() {
            assert!(
                citations.iter().any(|c| c.field == category),
                "missing citation for {category}"
            );
        }
        assert!(citations.iter().any(|c| c.field == "hours"));
        assert!(citations.iter().any(|c| c.field == "emergency_capability"));
    }

    #[test]
    fn test_hours_absent_yields_unknown() {
        let (caps, _) = extract("Surgery offered.");
        assert!(caps.hours.is_unknown());
    }

    #[test]
    fn test_hours_pattern_match() {
        let (caps, citations) = extract("Open Mon-Fri 8am-5pm for outpatient consultation.");
        assert_eq!(caps.hours, Hours::Known("Mon-Fri 8am-5pm".to_string()));
        assert!(citations.iter().any(|c| c.field == "hours"));
    }

    #[test]
    fn test_emergency_yes_with_citation() {
        let (caps, citations) = extract("Emergency department open to all.");
        assert_eq!(caps.emergency_capability, EmergencyCapability::Yes);
        assert!(citations.iter().any(|c| c.field == "emergency_capability"));
    }

    #[test]
    fn test_emergency_explicit_negation_is_no() {
        let (caps, _) = extract("The clinic has no emergency department.");
        assert_eq!(caps.emergency_capability, EmergencyCapability::No);
    }

    #[test]
    fn test_emergency_never_mentioned_is_unknown() {
        let (caps, _) = extract("Pharmacy and consultation available.");
        assert_eq!(caps.emergency_capability, EmergencyCapability::Unknown);
    }

    #[test]
    fn test_referral_advanced_requires_full_rule() {
        let (caps, citations) =
            extract("Surgery with ICU beds and a ventilator, staffed by a surgeon and anesthetist.");
        assert_eq!(caps.referral_capacity, ReferralCapacity::Advanced);
        assert!(citations.iter().any(|c| c.field == "referral_capacity"));
    }

    #[test]
    fn test_referral_falls_to_lower_level_when_rule_partial() {
        // Surgery + imaging but no ICU-tier equipment or specialist staff:
        // Advanced is not fully satisfied, Intermediate is.
        let (caps, _) = extract("Surgery and x-ray services available.");
        assert_eq!(caps.referral_capacity, ReferralCapacity::Intermediate);
    }

    #[test]
    fn test_referral_basic() {
        let (caps, _) = extract("Outpatient consultation with a nurse on duty.");
        assert_eq!(caps.referral_capacity, ReferralCapacity::Basic);
    }

    #[test]
    fn test_referral_none_when_nothing_supports_it() {
        let (caps, _) = extract("A nurse visits weekly.");
        assert_eq!(caps.referral_capacity, ReferralCapacity::None);
    }

    #[test]
    fn test_determinism() {
        let text = "Emergency 24/7, surgery, ultrasound, staffed by doctors and midwives.";
        let first = extract(text);
        let second = extract(text);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn test_snippet_respects_radius_and_cap() {
        let long_tail = "x".repeat(700);
        let text = format!("surgery {long_tail}");
        let config = ExtractConfig {
            snippet_radius: 600,
            max_snippet_len: 100,
        };
        let (_, citations) = extract_capabilities(&doc(&text), &config).unwrap();
        let snippet = &citations[0].snippet;
        assert!(snippet.len() <= 100);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_validate_enrichment_discards_fabricated_snippets() {
        let source = "The clinic offers surgery.";
        let enrichment = Enrichment {
            capabilities: CapabilitySet {
                services: vec!["Surgery".to_string()],
                ..Default::default()
            },
            citations: vec![
                Citation::with_offsets("src", "offers surgery", "services", 11, 25),
                Citation::with_offsets("src", "invented text", "services", 0, 13),
            ],
        };
        let cleaned = validate_enrichment(enrichment, source).unwrap();
        assert_eq!(cleaned.citations.len(), 1);
    }

    #[test]
    fn test_validate_enrichment_rejects_claims_without_citations() {
        let enrichment = Enrichment {
            capabilities: CapabilitySet {
                services: vec!["Surgery".to_string()],
                ..Default::default()
            },
            citations: vec![],
        };
        assert!(validate_enrichment(enrichment, "anything").is_err());
    }

    #[test]
    fn test_validate_enrichment_rejects_unknown_fields() {
        let enrichment = Enrichment {
            capabilities: CapabilitySet::default(),
            citations: vec![Citation::synthetic("src", "text", "not_a_field")],
        };
        assert!(validate_enrichment(enrichment, "text").is_err());
    }

    #[test]
    fn test_validate_enrichment_rejects_all_fabricated() {
        let enrichment = Enrichment {
            capabilities: CapabilitySet::default(),
            citations: vec![Citation::with_offsets("src", "nowhere", "services", 0, 7)],
        };
        assert!(validate_enrichment(enrichment, "different text").is_err());
    }
}
