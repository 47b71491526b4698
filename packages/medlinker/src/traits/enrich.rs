//! Enricher trait for optional LLM-backed extraction.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CapabilitySet, Citation};

/// Output of an enrichment call: capabilities in the pipeline schema plus
/// the citations backing them.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// Extracted capability claims.
    pub capabilities: CapabilitySet,

    /// Citations whose snippets must be verbatim excerpts of the source
    /// text handed to [`Enricher::enrich`].
    pub citations: Vec<Citation>,
}

/// Optional collaborator that normalizes free text into the capability
/// schema (typically an LLM backend).
///
/// When absent or disabled, the deterministic keyword path is the sole and
/// authoritative behavior. Enricher output is validated against the source
/// text before use; invalid output falls back to the deterministic path.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Extract capabilities and citations from unstructured source text.
    async fn enrich(&self, source_text: &str) -> Result<Enrichment>;

    /// Whether this implementation does anything; the pipeline skips the
    /// call entirely (and its timeout) when false.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Deterministic no-op enricher; the pipeline treats it as "no enrichment
/// backend configured".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnricher;

#[async_trait]
impl Enricher for NoopEnricher {
    async fn enrich(&self, _source_text: &str) -> Result<Enrichment> {
        Ok(Enrichment::default())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
