//! Regional aggregation summary with medical desert scoring.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Aggregated facility data for one `(country, region)` group.
///
/// Created fresh on every aggregation run; never incrementally updated.
/// Coverage maps are insertion-ordered (`IndexMap`) so serialized output is
/// deterministic for a given input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Country code.
    pub country: String,

    /// Region code within the country.
    pub region: String,

    /// Facilities in this group.
    pub total_facilities: usize,

    /// Facilities with a verification verdict (all of them, batch mode).
    pub facilities_analyzed: usize,

    /// Tally of verification statuses, keyed by wire label.
    #[serde(default)]
    pub status_counts: IndexMap<String, usize>,

    /// Capability coverage: category -> canonical name -> count of
    /// facilities claiming it. Counts presence of claims, not trust:
    /// a SUSPICIOUS facility's claims still count.
    #[serde(default)]
    pub coverage: IndexMap<String, IndexMap<String, usize>>,

    /// `"category:name"` tokens for critical capabilities with zero
    /// coverage, in registry order.
    #[serde(default)]
    pub missing_critical: Vec<String>,

    /// Medical desert score, 0-100; higher means more critical gaps.
    pub desert_score: u8,

    /// Facilities that contributed at least one non-empty capability,
    /// sorted ascending by facility id.
    #[serde(default)]
    pub supporting_facility_ids: Vec<String>,

    /// Groups the `aggregate` spans of the run that produced this summary.
    pub trace_id: String,
}

impl RegionSummary {
    /// Region key as `<country>-<region>`.
    pub fn region_code(&self) -> String {
        format!("{}-{}", self.country, self.region)
    }

    /// Coverage count for a canonical capability name within a category.
    pub fn coverage_count(&self, category: &str, name: &str) -> usize {
        self.coverage
            .get(category)
            .and_then(|names| names.get(name))
            .copied()
            .unwrap_or(0)
    }

    /// Whether any category covers the canonical capability name.
    pub fn covers(&self, name: &str) -> bool {
        self.coverage
            .values()
            .any(|names| names.get(name).copied().unwrap_or(0) > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RegionSummary {
        let mut coverage = IndexMap::new();
        let mut services = IndexMap::new();
        services.insert("surgery".to_string(), 2);
        coverage.insert("services".to_string(), services);

        RegionSummary {
            country: "KE".to_string(),
            region: "nairobi".to_string(),
            total_facilities: 3,
            facilities_analyzed: 3,
            status_counts: IndexMap::new(),
            coverage,
            missing_critical: vec!["service:c-section".to_string()],
            desert_score: 17,
            supporting_facility_ids: vec![],
            trace_id: "t-1".to_string(),
        }
    }

    #[test]
    fn test_region_code() {
        assert_eq!(summary().region_code(), "KE-nairobi");
    }

    #[test]
    fn test_coverage_lookup() {
        let s = summary();
        assert_eq!(s.coverage_count("services", "surgery"), 2);
        assert_eq!(s.coverage_count("services", "c-section"), 0);
        assert_eq!(s.coverage_count("equipment", "surgery"), 0);
        assert!(s.covers("surgery"));
        assert!(!s.covers("c-section"));
    }
}
