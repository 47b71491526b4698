//! Mock collaborators for exercising pipeline fallback behavior in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PipelineError, Result};
use crate::traits::{Enricher, Enrichment, Retriever, Snippet};

enum MockBehavior {
    Succeed,
    Fail,
    /// Sleep past any reasonable timeout before responding.
    Stall(Duration),
}

/// Scripted [`Enricher`] that tracks how often it was called.
pub struct MockEnricher {
    enrichment: Enrichment,
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockEnricher {
    /// An enricher that always returns the given output.
    pub fn returning(enrichment: Enrichment) -> Self {
        Self {
            enrichment,
            behavior: MockBehavior::Succeed,
            calls: AtomicUsize::new(0),
        }
    }

    /// An enricher whose every call errors.
    pub fn failing() -> Self {
        Self {
            enrichment: Enrichment::default(),
            behavior: MockBehavior::Fail,
            calls: AtomicUsize::new(0),
        }
    }

    /// An enricher that stalls for `delay` before answering.
    pub fn stalling(delay: Duration, enrichment: Enrichment) -> Self {
        Self {
            enrichment,
            behavior: MockBehavior::Stall(delay),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `enrich` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Enricher for MockEnricher {
    async fn enrich(&self, _source_text: &str) -> Result<Enrichment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Succeed => Ok(self.enrichment.clone()),
            MockBehavior::Fail => Err(PipelineError::Collaborator("mock enricher failure".into())),
            MockBehavior::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(self.enrichment.clone())
            }
        }
    }
}

/// Scripted [`Retriever`] that tracks how often it was called.
pub struct MockRetriever {
    snippets: Vec<Snippet>,
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockRetriever {
    /// A retriever that always returns the given snippets.
    pub fn returning(snippets: Vec<Snippet>) -> Self {
        Self {
            snippets,
            behavior: MockBehavior::Succeed,
            calls: AtomicUsize::new(0),
        }
    }

    /// A retriever whose every call errors.
    pub fn failing() -> Self {
        Self {
            snippets: Vec::new(),
            behavior: MockBehavior::Fail,
            calls: AtomicUsize::new(0),
        }
    }

    /// A retriever that stalls for `delay` before answering.
    pub fn stalling(delay: Duration, snippets: Vec<Snippet>) -> Self {
        Self {
            snippets,
            behavior: MockBehavior::Stall(delay),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `retrieve` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Snippet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Succeed => Ok(self.snippets.clone()),
            MockBehavior::Fail => Err(PipelineError::Collaborator("mock retriever failure".into())),
            MockBehavior::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(self.snippets.clone())
            }
        }
    }
}
