//! Regional aggregation and medical desert scoring.
//!
//! A pure batch fold over facility records: group by `(country, region)`,
//! tally statuses, count capability coverage, and score critical gaps.
//! Coverage counts the presence of claims, not trust - a SUSPICIOUS
//! facility's claimed capability still counts.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

use crate::types::{FacilityRecord, RegionSummary, VerificationStatus};
use crate::vocab::{canonical_term, CRITICAL_CAPABILITIES};

const STATUS_LABELS: [VerificationStatus; 3] = [
    VerificationStatus::Verified,
    VerificationStatus::Incomplete,
    VerificationStatus::Suspicious,
];

const CATEGORIES: [&str; 3] = ["services", "equipment", "staffing"];

/// Fold facility records into one summary per `(country, region)` group.
///
/// Output is ordered by desert score descending, ties by
/// `(country, region)` ascending, regardless of input order; an empty
/// input yields an empty output, never an error. Every summary carries
/// the run-level `trace_id`.
pub fn aggregate_regions(records: &[FacilityRecord], trace_id: &str) -> Vec<RegionSummary> {
    let mut groups: BTreeMap<(String, String), Vec<&FacilityRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.country.clone(), record.region.clone()))
            .or_default()
            .push(record);
    }

    let mut summaries: Vec<RegionSummary> = groups
        .into_iter()
        .map(|((country, region), members)| summarize_region(&country, &region, &members, trace_id))
        .collect();
    // The fold already yields (country, region) ascending; a stable sort
    // on score keeps that as the tiebreak.
    summaries.sort_by(|a, b| b.desert_score.cmp(&a.desert_score));
    summaries
}

/// Build the summary for one region group.
///
/// An empty group scores 100 with every critical capability missing:
/// absence of data is a desert signal, not "unknown".
pub fn summarize_region(
    country: &str,
    region: &str,
    members: &[&FacilityRecord],
    trace_id: &str,
) -> RegionSummary {
    let mut status_counts = IndexMap::new();
    for status in STATUS_LABELS {
        let count = members.iter().filter(|m| m.status == status).count();
        status_counts.insert(status.as_str().to_string(), count);
    }

    let coverage = coverage_counts(members);
    let (missing_critical, desert_score) = score_critical_gaps(&coverage);

    let mut supporting_facility_ids: Vec<String> = members
        .iter()
        .filter(|m| m.capabilities.has_any_claim())
        .map(|m| m.facility_id.clone())
        .collect();
    supporting_facility_ids.sort();
    supporting_facility_ids.dedup();

    RegionSummary {
        country: country.to_string(),
        region: region.to_string(),
        total_facilities: members.len(),
        facilities_analyzed: members.len(),
        status_counts,
        coverage,
        missing_critical,
        desert_score,
        supporting_facility_ids,
        trace_id: trace_id.to_string(),
    }
}

/// Per-category counts of facilities claiming each canonical capability.
///
/// A facility counts once per capability even when it lists synonyms that
/// collapse to the same canonical name. Names are emitted sorted so the
/// maps are identical across input orders.
fn coverage_counts(members: &[&FacilityRecord]) -> IndexMap<String, IndexMap<String, usize>> {
    let mut counts: BTreeMap<&str, BTreeMap<String, usize>> = BTreeMap::new();

    for member in members {
        for (category, items) in [
            ("services", &member.capabilities.services),
            ("equipment", &member.capabilities.equipment),
            ("staffing", &member.capabilities.staffing),
        ] {
            let canonical: BTreeSet<String> = items.iter().map(|i| canonical_term(i)).collect();
            for name in canonical {
                *counts
                    .entry(category)
                    .or_default()
                    .entry(name)
                    .or_insert(0) += 1;
            }
        }
    }

    let mut coverage = IndexMap::new();
    for category in CATEGORIES {
        let names: IndexMap<String, usize> = counts
            .remove(category)
            .map(|m| m.into_iter().collect())
            .unwrap_or_default();
        coverage.insert(category.to_string(), names);
    }
    coverage
}

/// Missing-critical tokens (registry order) and the weighted desert score.
fn score_critical_gaps(
    coverage: &IndexMap<String, IndexMap<String, usize>>,
) -> (Vec<String>, u8) {
    let mut missing = Vec::new();
    let mut missing_weight = 0.0;

    for critical in CRITICAL_CAPABILITIES {
        let count = coverage
            .get(critical.category.as_str())
            .and_then(|names| names.get(critical.name))
            .copied()
            .unwrap_or(0);
        if count == 0 {
            missing.push(critical.token());
            missing_weight += critical.weight;
        }
    }

    let score = (100.0 * missing_weight).round() as u8;
    (missing, score.min(100))
}
