//! Typed errors for the pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during pipeline operations.
///
/// Absence of data is never an error: a record with no keyword matches
/// yields an empty [`CapabilitySet`](crate::types::CapabilitySet), and an
/// empty facility list aggregates to an empty summary list.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or empty input to a stage (caller contract violation).
    ///
    /// Surfaced immediately, never retried internally.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Trace lookup miss, distinct from a processing error.
    #[error("trace not found: {trace_id}")]
    TraceNotFound { trace_id: String },

    /// Optional collaborator (enricher/retriever) failed.
    ///
    /// Caught at the point of use; causes silent fallback to the
    /// deterministic path rather than a pipeline failure.
    #[error("collaborator error: {0}")]
    Collaborator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Optional collaborator exceeded its bounded timeout.
    #[error("collaborator timed out after {timeout_ms}ms")]
    CollaboratorTimeout { timeout_ms: u64 },
}

impl PipelineError {
    /// Build an input-validation error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary collaborator failure.
    pub fn collaborator<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Collaborator(Box::new(err))
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
