//! Intent-classified question answering over stored analysis results.
//!
//! Questions are routed through ordered keyword-pattern rules to a fixed
//! intent set; each intent retrieves from the facility records and region
//! summaries and fills a deterministic answer template. Citations are
//! synthesized from the retrieved records themselves; an optional
//! retriever can upgrade them to verbatim source quotes afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PipelineError, Result};
use crate::traits::Snippet;
use crate::types::{
    Citation, FacilityRecord, QaConfig, RegionSummary, VerificationStatus, REGION_SUMMARY_FIELD,
};
use crate::vocab::{
    canonical_term, EQUIPMENT_KEYWORDS, SERVICE_KEYWORDS, STAFFING_KEYWORDS,
};

/// The fixed question-intent set, checked in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Rank regions by desert score.
    DesertRanking,

    /// Filter facilities by verification status.
    StatusFilter,

    /// Look up coverage of one named capability.
    CapabilityLookup,

    /// Fallback: aggregate counts over the whole dataset.
    GenericSummary,
}

impl Intent {
    /// Stable label recorded in trace spans.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DesertRanking => "DESERT_RANKING",
            Self::StatusFilter => "STATUS_FILTER",
            Self::CapabilityLookup => "CAPABILITY_LOOKUP",
            Self::GenericSummary => "GENERIC_SUMMARY",
        }
    }
}

/// A composed answer: template text plus the citations backing it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub intent: Intent,
    pub text: String,
    pub citations: Vec<Citation>,
    /// Trace id of the `ask` span; filled by the pipeline facade, empty
    /// when the stage function is called directly.
    pub trace_id: String,
}

static TOP_K_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btop\s+(\d{1,3})\b").expect("top-k pattern compiles"));

/// Classify a question into an intent.
///
/// First matching pattern wins, so a desert-ranking phrasing outranks a
/// bare capability keyword appearing in the same question.
pub fn classify_intent(question: &str) -> Intent {
    let lower = question.to_lowercase();

    if lower.contains("desert")
        || (lower.contains("underserved") && lower.contains("region"))
        || (lower.contains("worst") && lower.contains("region"))
    {
        return Intent::DesertRanking;
    }
    if parse_status(&lower).is_some() {
        return Intent::StatusFilter;
    }
    if find_capability_token(&lower).is_some() {
        return Intent::CapabilityLookup;
    }
    Intent::GenericSummary
}

/// Answer a free-text question against the stored records and summaries.
///
/// Fails only on an empty or whitespace-only question; an unmatched intent
/// falls back to the generic summary, never an error.
pub fn answer_question(
    question: &str,
    records: &[FacilityRecord],
    summaries: &[RegionSummary],
    config: &QaConfig,
) -> Result<Answer> {
    if question.trim().is_empty() {
        return Err(PipelineError::invalid_input(
            "question must not be empty or whitespace-only",
        ));
    }

    let lower = question.to_lowercase();
    let intent = classify_intent(question);
    let answer = match intent {
        Intent::DesertRanking => desert_ranking(&lower, summaries, config),
        Intent::StatusFilter => status_filter(&lower, records, config),
        Intent::CapabilityLookup => capability_lookup(&lower, summaries),
        Intent::GenericSummary => generic_summary(records, summaries, config),
    };
    Ok(answer)
}

/// Replace synthetic citations' snippets with retrieved verbatim quotes.
///
/// Pairs citations with snippets by position; factual content and citation
/// count never change, only verbatim-ness and offsets.
pub fn upgrade_citations(citations: &mut [Citation], snippets: &[Snippet]) {
    for (citation, snippet) in citations
        .iter_mut()
        .filter(|c| c.start_char.is_none())
        .zip(snippets)
    {
        citation.source_id = snippet.source_id.clone();
        citation.snippet = snippet.text.clone();
        citation.start_char = Some(snippet.start_char);
        citation.end_char = Some(snippet.end_char);
        citation.source_url = snippet.source_url.clone();
    }
}

fn desert_ranking(lower: &str, summaries: &[RegionSummary], config: &QaConfig) -> Answer {
    let k = TOP_K_PATTERN
        .captures(lower)
        .and_then(|c| c[1].parse::<usize>().ok())
        .unwrap_or(config.default_top_k);

    let mut ranked: Vec<&RegionSummary> = summaries.iter().collect();
    ranked.sort_by(|a, b| {
        b.desert_score
            .cmp(&a.desert_score)
            .then_with(|| a.region_code().cmp(&b.region_code()))
    });
    ranked.truncate(k);

    if ranked.is_empty() {
        return Answer {
            intent: Intent::DesertRanking,
            trace_id: String::new(),
            text: "No region summaries are available to rank.".to_string(),
            citations: vec![],
        };
    }

    let mut lines = vec![format!(
        "Top {} regions by medical desert score:",
        ranked.len()
    )];
    for (i, summary) in ranked.iter().enumerate() {
        lines.push(format!(
            "{}. {} - desert score {} ({} facilities; missing critical: {})",
            i + 1,
            summary.region_code(),
            summary.desert_score,
            summary.total_facilities,
            missing_list(summary),
        ));
    }

    Answer {
        intent: Intent::DesertRanking,
        trace_id: String::new(),
        text: lines.join("\n"),
        citations: ranked.iter().map(|s| region_citation(s)).collect(),
    }
}

fn capability_lookup(lower: &str, summaries: &[RegionSummary]) -> Answer {
    // Classification guarantees a token is present.
    let token = find_capability_token(lower).unwrap_or_default();
    let negative = ["lack", "without", "missing"]
        .iter()
        .any(|w| lower.contains(w));

    let selected: Vec<&RegionSummary> = summaries
        .iter()
        .filter(|s| s.covers(&token) != negative)
        .collect();

    let text = if selected.is_empty() {
        if negative {
            format!("All summarized regions report {token} capability.")
        } else {
            format!("No summarized region reports {token} capability.")
        }
    } else {
        let mut lines = vec![if negative {
            format!("Regions lacking {token} capability:")
        } else {
            format!("Regions with {token} capability:")
        }];
        for summary in &selected {
            if negative {
                lines.push(format!(
                    "- {} ({} facilities, desert score {})",
                    summary.region_code(),
                    summary.total_facilities,
                    summary.desert_score,
                ));
            } else {
                lines.push(format!(
                    "- {} ({} of {} facilities claim it)",
                    summary.region_code(),
                    max_coverage(summary, &token),
                    summary.total_facilities,
                ));
            }
        }
        lines.join("\n")
    };

    Answer {
        intent: Intent::CapabilityLookup,
        trace_id: String::new(),
        text,
        citations: selected.iter().map(|s| region_citation(s)).collect(),
    }
}

fn status_filter(lower: &str, records: &[FacilityRecord], config: &QaConfig) -> Answer {
    // Classification guarantees a status word is present.
    let status = parse_status(lower).unwrap_or(VerificationStatus::Suspicious);
    let matching: Vec<&FacilityRecord> =
        records.iter().filter(|r| r.status == status).collect();

    if matching.is_empty() {
        return Answer {
            intent: Intent::StatusFilter,
            trace_id: String::new(),
            text: format!("No facilities have status {}.", status.as_str()),
            citations: vec![],
        };
    }

    let shown = matching.len().min(config.retrieval_k);
    let mut lines = vec![format!(
        "{} facilities have status {}:",
        matching.len(),
        status.as_str()
    )];
    for record in &matching[..shown] {
        let reason = record
            .reasons
            .first()
            .map(String::as_str)
            .unwrap_or("no reasons recorded");
        lines.push(format!(
            "- {} ({}): {}",
            record.facility_id, record.facility_name, reason
        ));
    }
    if matching.len() > shown {
        lines.push(format!("... and {} more.", matching.len() - shown));
    }

    // Cite each listed facility through its own first piece of evidence.
    let citations = matching[..shown]
        .iter()
        .filter_map(|r| r.citations.first().cloned())
        .collect();

    Answer {
        intent: Intent::StatusFilter,
        trace_id: String::new(),
        text: lines.join("\n"),
        citations,
    }
}

fn generic_summary(
    records: &[FacilityRecord],
    summaries: &[RegionSummary],
    config: &QaConfig,
) -> Answer {
    let count_of = |status: VerificationStatus| {
        records.iter().filter(|r| r.status == status).count()
    };
    let mut text = format!(
        "Dataset summary: {} facilities across {} regions. Status counts: VERIFIED {}, INCOMPLETE {}, SUSPICIOUS {}.",
        records.len(),
        summaries.len(),
        count_of(VerificationStatus::Verified),
        count_of(VerificationStatus::Incomplete),
        count_of(VerificationStatus::Suspicious),
    );
    if let Some(worst) = summaries.iter().max_by(|a, b| {
        a.desert_score
            .cmp(&b.desert_score)
            .then_with(|| b.region_code().cmp(&a.region_code()))
    }) {
        text.push_str(&format!(
            " Highest desert score: {} at {}.",
            worst.region_code(),
            worst.desert_score
        ));
    }

    let citations = summaries
        .iter()
        .take(config.default_top_k)
        .map(region_citation)
        .collect();

    Answer {
        intent: Intent::GenericSummary,
        trace_id: String::new(),
        text,
        citations,
    }
}

/// First capability keyword mentioned in the question, canonicalized.
fn find_capability_token(lower: &str) -> Option<String> {
    for keyword in SERVICE_KEYWORDS
        .iter()
        .chain(EQUIPMENT_KEYWORDS)
        .chain(STAFFING_KEYWORDS)
    {
        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        if let Ok(re) = Regex::new(&pattern) {
            if re.is_match(lower) {
                return Some(canonical_term(keyword));
            }
        }
    }
    None
}

fn parse_status(lower: &str) -> Option<VerificationStatus> {
    // Whole-word matching; "unverified" must not read as "verified".
    let has_word = |word: &str| {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| token == word)
    };

    if has_word("suspicious") {
        Some(VerificationStatus::Suspicious)
    } else if has_word("incomplete") {
        Some(VerificationStatus::Incomplete)
    } else if has_word("verified") {
        Some(VerificationStatus::Verified)
    } else {
        None
    }
}

fn missing_list(summary: &RegionSummary) -> String {
    if summary.missing_critical.is_empty() {
        "none".to_string()
    } else {
        summary.missing_critical.join(", ")
    }
}

fn max_coverage(summary: &RegionSummary, token: &str) -> usize {
    summary
        .coverage
        .values()
        .filter_map(|names| names.get(token))
        .copied()
        .max()
        .unwrap_or(0)
}

/// Synthetic region-level citation; no raw source text is being quoted,
/// so offsets stay absent.
fn region_citation(summary: &RegionSummary) -> Citation {
    Citation::synthetic(
        format!("region:{}", summary.region_code()),
        format!(
            "Region {}: {} facilities, desert score {}, missing critical: {}",
            summary.region_code(),
            summary.total_facilities,
            summary.desert_score,
            missing_list(summary),
        ),
        REGION_SUMMARY_FIELD,
    )
}
