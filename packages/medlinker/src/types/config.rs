//! Pipeline configuration with sensible defaults.
//!
//! Every threshold the stages use lives here; the rule tables themselves
//! are static data in [`crate::vocab`].

use std::time::Duration;

/// Configuration for the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Characters of surrounding context captured on each side of a
    /// keyword match when building the citation snippet.
    pub snippet_radius: usize,

    /// Hard cap on snippet length; longer snippets are truncated with an
    /// ellipsis.
    pub max_snippet_len: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            snippet_radius: 50,
            max_snippet_len: 500,
        }
    }
}

/// Configuration for the verification stage.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Minimum citations for HIGH confidence (together with status
    /// VERIFIED and the distinct-field floor).
    pub high_min_citations: usize,

    /// Minimum distinct cited capability fields for HIGH confidence.
    pub high_min_fields: usize,

    /// At or below this citation count, confidence is LOW regardless of
    /// status.
    pub low_max_citations: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            high_min_citations: 3,
            high_min_fields: 2,
            low_max_citations: 1,
        }
    }
}

/// Configuration for the question-answering stage.
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// How many facilities and regions keyword retrieval selects.
    pub retrieval_k: usize,

    /// Default top-K for ranking answers when the question doesn't name one.
    pub default_top_k: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            retrieval_k: 8,
            default_top_k: 5,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Extraction thresholds.
    pub extract: ExtractConfig,

    /// Verification thresholds.
    pub verify: VerifyConfig,

    /// Question-answering thresholds.
    pub qa: QaConfig,

    /// Bound on every optional collaborator call; on expiry the
    /// deterministic path is used.
    pub collaborator_timeout: CollaboratorTimeout,
}

/// Bounded timeout for collaborator calls.
#[derive(Debug, Clone)]
pub struct CollaboratorTimeout(pub Duration);

impl Default for CollaboratorTimeout {
    fn default() -> Self {
        Self(Duration::from_secs(10))
    }
}

impl CollaboratorTimeout {
    /// The bound as a `Duration`.
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// The bound in milliseconds, for error reporting.
    pub fn as_millis(&self) -> u64 {
        self.0.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.extract.snippet_radius, 50);
        assert_eq!(config.extract.max_snippet_len, 500);
        assert_eq!(config.verify.high_min_citations, 3);
        assert_eq!(config.verify.high_min_fields, 2);
        assert_eq!(config.qa.retrieval_k, 8);
        assert_eq!(config.collaborator_timeout.duration(), Duration::from_secs(10));
    }
}
