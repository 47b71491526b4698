//! Pipeline facade wiring the stages, collaborators, and trace store.
//!
//! Stage logic lives in the submodules as pure functions; this module owns
//! the crosscutting concerns: trace-span emission, collaborator timeouts,
//! and the fallback to the deterministic path when a collaborator fails.

pub mod aggregate;
pub mod answer;
pub mod extract;
pub mod verify;

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::Result;
use crate::trace::{summary, TraceSpan, TraceStore};
use crate::traits::{Enricher, Enrichment, NoopEnricher, NoopRetriever, Retriever, Snippet};
use crate::types::{
    CapabilitySet, Citation, FacilityDoc, FacilityRecord, PipelineConfig, RegionSummary,
};

pub use aggregate::{aggregate_regions, summarize_region};
pub use answer::{answer_question, classify_intent, Answer, Intent};
pub use extract::{extract_capabilities, infer_referral_capacity, validate_enrichment};
pub use verify::{verify_capabilities, Finding, RuleKind, Ruleset, Verdict};

/// The analysis pipeline: extraction, verification, aggregation, and
/// question answering, with an append-only trace of every run.
///
/// Collaborators default to no-ops; the deterministic path is always the
/// authority and every collaborator call is bounded by the configured
/// timeout.
pub struct Pipeline {
    enricher: Arc<dyn Enricher>,
    retriever: Arc<dyn Retriever>,
    config: PipelineConfig,
    trace: TraceStore,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    /// Create a pipeline with no collaborators configured.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            enricher: Arc::new(NoopEnricher),
            retriever: Arc::new(NoopRetriever),
            config,
            trace: TraceStore::new(),
        }
    }

    /// Install an enrichment collaborator.
    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = enricher;
        self
    }

    /// Install a retrieval collaborator.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = retriever;
        self
    }

    /// The trace store, for external debugging interfaces.
    pub fn trace_store(&self) -> &TraceStore {
        &self.trace
    }

    /// Spans recorded under a trace id.
    pub fn get_trace(&self, trace_id: &str) -> Result<Vec<TraceSpan>> {
        self.trace.get_trace(trace_id)
    }

    /// Extract capabilities and citations from one document.
    ///
    /// Returns the trace id of the recorded `extract` span alongside the
    /// results, so standalone runs stay auditable via [`Self::get_trace`].
    pub async fn extract(
        &self,
        doc: &FacilityDoc,
    ) -> Result<(CapabilitySet, Vec<Citation>, String)> {
        let trace_id = TraceStore::new_trace_id();
        let (capabilities, citations) = self.extract_traced(doc, &trace_id).await?;
        Ok((capabilities, citations, trace_id))
    }

    /// Verify one facility's capability claims.
    ///
    /// Returns the trace id of the recorded `verify` span alongside the
    /// verdict.
    pub fn verify(&self, capabilities: &CapabilitySet, citations: &[Citation]) -> (Verdict, String) {
        let trace_id = TraceStore::new_trace_id();
        let verdict = self.verify_traced(capabilities, citations, &trace_id);
        (verdict, trace_id)
    }

    /// Run extraction and verification end to end for one facility.
    ///
    /// Both spans share one trace id, carried on the returned record.
    pub async fn process(&self, doc: &FacilityDoc) -> Result<FacilityRecord> {
        if !doc.has_well_formed_id() {
            warn!(facility_id = %doc.facility_id, "facility id does not follow <country>-<region>-<seq>");
        }
        let trace_id = TraceStore::new_trace_id();
        let (capabilities, citations) = self.extract_traced(doc, &trace_id).await?;
        let verdict = self.verify_traced(&capabilities, &citations, &trace_id);

        Ok(FacilityRecord {
            facility_id: doc.facility_id.clone(),
            facility_name: doc.facility_name.clone(),
            country: doc.country.clone(),
            region: doc.region.clone(),
            latitude: doc.latitude,
            longitude: doc.longitude,
            capabilities,
            status: verdict.status,
            confidence: verdict.confidence,
            reasons: verdict.reasons,
            citations,
            trace_id,
        })
    }

    /// Fold facility records into region summaries.
    ///
    /// One run-level trace id is shared by every summary and span of the
    /// run; an empty input yields an empty output.
    pub fn aggregate(&self, records: &[FacilityRecord]) -> Vec<RegionSummary> {
        let trace_id = TraceStore::new_trace_id();
        let summaries = aggregate_regions(records, &trace_id);

        for region in &summaries {
            self.trace.append(TraceSpan::new(
                trace_id.as_str(),
                "aggregate",
                summary(&[("facilities", json!(region.total_facilities))]),
                summary(&[
                    ("region", json!(region.region_code())),
                    ("desert_score", json!(region.desert_score)),
                    ("missing_critical_count", json!(region.missing_critical.len())),
                ]),
                0,
            ));
        }
        summaries
    }

    /// Answer a free-text question against stored records and summaries.
    pub async fn answer(
        &self,
        question: &str,
        records: &[FacilityRecord],
        summaries: &[RegionSummary],
    ) -> Result<Answer> {
        let trace_id = TraceStore::new_trace_id();
        let mut answer = answer_question(question, records, summaries, &self.config.qa)?;

        let mut retrieved = false;
        if self.retriever.is_enabled() && !answer.citations.is_empty() {
            if let Some(snippets) = self.retrieve_snippets(question).await {
                answer::upgrade_citations(&mut answer.citations, &snippets);
                retrieved = true;
            }
        }

        self.trace.append(TraceSpan::new(
            trace_id.as_str(),
            "ask",
            summary(&[("question_chars", json!(question.len()))]),
            summary(&[
                ("intent", json!(answer.intent.as_str())),
                ("retrieved", json!(retrieved)),
            ]),
            answer.citations.len(),
        ));
        answer.trace_id = trace_id;
        Ok(answer)
    }

    async fn extract_traced(
        &self,
        doc: &FacilityDoc,
        trace_id: &str,
    ) -> Result<(CapabilitySet, Vec<Citation>)> {
        let (mut capabilities, mut citations) =
            extract::extract_capabilities(doc, &self.config.extract)?;

        let mut enriched = false;
        if self.enricher.is_enabled() {
            if let Some(enrichment) = self.enrich_with_fallback(&doc.source_text).await {
                merge_enrichment(&mut capabilities, &mut citations, enrichment);
                enriched = true;
            }
        }

        self.trace.append(TraceSpan::new(
            trace_id,
            "extract",
            summary(&[
                ("facility_id", json!(doc.facility_id)),
                ("source_chars", json!(doc.source_text.len())),
            ]),
            summary(&[
                ("services_count", json!(capabilities.services.len())),
                ("equipment_count", json!(capabilities.equipment.len())),
                ("staffing_count", json!(capabilities.staffing.len())),
                ("hours_known", json!(!capabilities.hours.is_unknown())),
                ("enriched", json!(enriched)),
            ]),
            citations.len(),
        ));
        Ok((capabilities, citations))
    }

    fn verify_traced(
        &self,
        capabilities: &CapabilitySet,
        citations: &[Citation],
        trace_id: &str,
    ) -> Verdict {
        let verdict = verify::verify_capabilities(capabilities, citations, &self.config.verify);

        self.trace.append(TraceSpan::new(
            trace_id,
            "verify",
            summary(&[("citations_count", json!(citations.len()))]),
            summary(&[
                ("status", json!(verdict.status.as_str())),
                ("reasons_count", json!(verdict.reasons.len())),
                ("confidence", json!(format!("{:?}", verdict.confidence))),
            ]),
            citations.len(),
        ));
        verdict
    }

    /// Call the enricher under the configured timeout and validate its
    /// output; any failure means "no enrichment", never a pipeline error.
    async fn enrich_with_fallback(&self, source_text: &str) -> Option<Enrichment> {
        let timeout = self.config.collaborator_timeout.duration();
        match tokio::time::timeout(timeout, self.enricher.enrich(source_text)).await {
            Ok(Ok(enrichment)) => match extract::validate_enrichment(enrichment, source_text) {
                Ok(valid) => Some(valid),
                Err(error) => {
                    warn!(%error, "discarding invalid enrichment output");
                    None
                }
            },
            Ok(Err(error)) => {
                warn!(%error, "enricher failed; using deterministic extraction only");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.collaborator_timeout.as_millis(),
                    "enricher timed out; using deterministic extraction only"
                );
                None
            }
        }
    }

    /// Call the retriever under the configured timeout.
    async fn retrieve_snippets(&self, query: &str) -> Option<Vec<Snippet>> {
        let timeout = self.config.collaborator_timeout.duration();
        match tokio::time::timeout(timeout, self.retriever.retrieve(query)).await {
            Ok(Ok(snippets)) => {
                debug!(count = snippets.len(), "retrieved snippets for answer");
                Some(snippets)
            }
            Ok(Err(error)) => {
                warn!(%error, "retriever failed; keeping synthetic citations");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.collaborator_timeout.as_millis(),
                    "retriever timed out; keeping synthetic citations"
                );
                None
            }
        }
    }
}

/// Merge validated enrichment into the deterministic result.
///
/// The deterministic path stays authoritative: enrichment only adds list
/// items not already present, fills hours/emergency when the deterministic
/// path found nothing, and appends its citations. Referral capacity is
/// re-inferred over the merged set so it can only rise.
fn merge_enrichment(
    capabilities: &mut CapabilitySet,
    citations: &mut Vec<Citation>,
    enrichment: Enrichment,
) {
    let enriched = enrichment.capabilities;
    capabilities.services.extend(enriched.services);
    capabilities.equipment.extend(enriched.equipment);
    capabilities.staffing.extend(enriched.staffing);
    capabilities.dedupe_and_trim();

    if capabilities.hours.is_unknown() {
        capabilities.hours = enriched.hours;
    }
    if capabilities.emergency_capability == crate::types::EmergencyCapability::Unknown {
        capabilities.emergency_capability = enriched.emergency_capability;
    }

    let inferred = extract::infer_referral_capacity(capabilities);
    if inferred > capabilities.referral_capacity {
        capabilities.referral_capacity = inferred;
    }

    citations.extend(enrichment.citations);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmergencyCapability, Hours, ReferralCapacity};

    #[test]
    fn test_merge_keeps_deterministic_values_authoritative() {
        let mut capabilities = CapabilitySet {
            services: vec!["Surgery".to_string()],
            hours: Hours::Known("24/7".to_string()),
            emergency_capability: EmergencyCapability::Yes,
            referral_capacity: ReferralCapacity::Basic,
            ..Default::default()
        };
        let mut citations = vec![Citation::with_offsets("src", "surgery", "services", 0, 7)];

        let enrichment = Enrichment {
            capabilities: CapabilitySet {
                services: vec!["Surgery".to_string(), "Maternity".to_string()],
                hours: Hours::Known("Mon-Fri".to_string()),
                emergency_capability: EmergencyCapability::No,
                ..Default::default()
            },
            citations: vec![Citation::with_offsets("src", "maternity", "services", 20, 29)],
        };
        merge_enrichment(&mut capabilities, &mut citations, enrichment);

        assert_eq!(capabilities.services, vec!["Surgery", "Maternity"]);
        assert_eq!(capabilities.hours, Hours::Known("24/7".to_string()));
        assert_eq!(capabilities.emergency_capability, EmergencyCapability::Yes);
        assert_eq!(citations.len(), 2);
    }

    #[test]
    fn test_merge_fills_gaps_and_reinfers_referral() {
        let mut capabilities = CapabilitySet {
            services: vec!["Surgery".to_string()],
            referral_capacity: ReferralCapacity::None,
            ..Default::default()
        };
        let mut citations = vec![Citation::with_offsets("src", "surgery", "services", 0, 7)];

        let enrichment = Enrichment {
            capabilities: CapabilitySet {
                equipment: vec!["X-Ray".to_string()],
                hours: Hours::Known("Mon-Fri 8am-5pm".to_string()),
                ..Default::default()
            },
            citations: vec![Citation::with_offsets("src", "x-ray", "equipment", 10, 15)],
        };
        merge_enrichment(&mut capabilities, &mut citations, enrichment);

        assert_eq!(capabilities.hours, Hours::Known("Mon-Fri 8am-5pm".to_string()));
        assert_eq!(capabilities.referral_capacity, ReferralCapacity::Intermediate);
    }
}
