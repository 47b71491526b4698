//! Medical Facility Analysis Pipeline
//!
//! Turns messy facility descriptions into verified, citation-backed
//! capability data and regional medical-desert scores.
//!
//! # Design Philosophy
//!
//! **Deterministic first, collaborators optional**
//!
//! - Keyword/rule tables are data, not scattered branches
//! - Every claim is grounded in a citation back to the source text
//! - Optional LLM/retrieval backends are injectable strategies with
//!   bounded timeouts and a deterministic fallback
//! - Identical input always yields identical output with collaborators
//!   disabled
//!
//! # Usage
//!
//! ```rust,ignore
//! use medlinker::{FacilityDoc, Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//!
//! // One facility: extract, then verify, under a single trace id.
//! let record = pipeline.process(&doc).await?;
//!
//! // All facilities: fold into region summaries with desert scores.
//! let summaries = pipeline.aggregate(&records);
//!
//! // Grounded question answering over the results.
//! let answer = pipeline.answer("Which regions lack c-section capability?", &records, &summaries).await?;
//!
//! // Audit what happened.
//! let spans = pipeline.get_trace(&record.trace_id)?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (Enricher, Retriever)
//! - [`types`] - Data model (citations, capability sets, records, summaries)
//! - [`pipeline`] - The four stages and the facade that wires them
//! - [`vocab`] - Static vocabulary and rule tables
//! - [`trace`] - Append-only trace recording
//! - [`testing`] - Mock collaborators for tests

pub mod error;
pub mod pipeline;
pub mod testing;
pub mod trace;
pub mod traits;
pub mod types;
pub mod vocab;

// Re-export core types at crate root
pub use error::{PipelineError, Result};
pub use trace::{TraceSpan, TraceStore};
pub use traits::{Enricher, Enrichment, NoopEnricher, NoopRetriever, Retriever, Snippet};
pub use types::{
    CapabilitySet, Citation, CollaboratorTimeout, Confidence, EmergencyCapability, ExtractConfig,
    FacilityDoc, FacilityRecord, Hours, PipelineConfig, QaConfig, ReferralCapacity, RegionSummary,
    SourceType, VerificationStatus, VerifyConfig,
};

// Re-export the facade and stage entry points
pub use pipeline::{
    aggregate_regions, answer_question, classify_intent, extract_capabilities,
    infer_referral_capacity, summarize_region, verify_capabilities, Answer, Finding, Intent,
    Pipeline, RuleKind, Ruleset, Verdict,
};

// Re-export testing utilities
pub use testing::{MockEnricher, MockRetriever};
