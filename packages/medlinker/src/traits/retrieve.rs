//! Retriever trait for optional context-widening search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A snippet of real source text returned by a retriever, with offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    /// Identifier of the source text blob the snippet comes from.
    pub source_id: String,

    /// Verbatim excerpt.
    pub text: String,

    /// Offset of the excerpt in the source text.
    pub start_char: usize,

    /// End offset of the excerpt in the source text.
    pub end_char: usize,

    /// URL of the source, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Optional collaborator for vector/keyword search over stored source text.
///
/// Question answering consults it to recover citations with real offsets
/// instead of synthetic ones; its absence never changes an answer's
/// factual content, only citation verbatim-ness.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Find snippets of source text relevant to the query.
    async fn retrieve(&self, query: &str) -> Result<Vec<Snippet>>;

    /// Whether this implementation does anything; the pipeline skips the
    /// call entirely (and its timeout) when false.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Deterministic no-op retriever; answers keep their synthetic citations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRetriever;

#[async_trait]
impl Retriever for NoopRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Snippet>> {
        Ok(Vec::new())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
