//! Collaborator trait abstractions.
//!
//! Optional backends (LLM enrichment, retrieval search) are injectable
//! strategies with deterministic no-op fallbacks, never conditional
//! imports.

pub mod enrich;
pub mod retrieve;

pub use enrich::{Enricher, Enrichment, NoopEnricher};
pub use retrieve::{NoopRetriever, Retriever, Snippet};
