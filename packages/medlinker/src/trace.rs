//! Append-only trace recording for pipeline auditability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// One recorded step of pipeline execution.
///
/// Summaries carry scalars and length counts only, never raw payloads.
/// Spans are appended under a trace id, never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpan {
    /// Groups all spans of one facility or one question.
    pub trace_id: String,

    /// Stage name: `extract`, `verify`, `aggregate`, or `ask`.
    pub step_name: String,

    /// Shallow summary of inputs.
    pub inputs_summary: Map<String, Value>,

    /// Shallow summary of outputs.
    pub outputs_summary: Map<String, Value>,

    /// Count of citations produced or consulted.
    pub evidence_refs: usize,

    /// When the span was recorded.
    pub timestamp: DateTime<Utc>,
}

impl TraceSpan {
    /// Create a span stamped with the current time.
    pub fn new(
        trace_id: impl Into<String>,
        step_name: impl Into<String>,
        inputs_summary: Map<String, Value>,
        outputs_summary: Map<String, Value>,
        evidence_refs: usize,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            step_name: step_name.into(),
            inputs_summary,
            outputs_summary,
            evidence_refs,
            timestamp: Utc::now(),
        }
    }
}

/// Process-wide, per-request append-only span log keyed by trace id.
///
/// The only shared mutable resource in the pipeline; appends take the
/// write lock briefly, readers get a snapshot rather than a live stream.
pub struct TraceStore {
    traces: RwLock<HashMap<String, Vec<TraceSpan>>>,
    // Insertion order of trace ids, for recent_traces.
    order: RwLock<Vec<String>>,
}

impl Default for TraceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            traces: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Mint a fresh trace id.
    pub fn new_trace_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Append a span to its trace, creating the trace on first use.
    pub fn append(&self, span: TraceSpan) {
        let mut traces = self.traces.write().unwrap();
        let entry = traces.entry(span.trace_id.clone()).or_insert_with(|| {
            self.order.write().unwrap().push(span.trace_id.clone());
            Vec::new()
        });
        entry.push(span);
    }

    /// Snapshot of all spans for a trace id.
    ///
    /// Fails with [`PipelineError::TraceNotFound`] when the id is unknown.
    pub fn get_trace(&self, trace_id: &str) -> Result<Vec<TraceSpan>> {
        self.traces
            .read()
            .unwrap()
            .get(trace_id)
            .cloned()
            .ok_or_else(|| PipelineError::TraceNotFound {
                trace_id: trace_id.to_string(),
            })
    }

    /// Most recent trace ids, newest first.
    pub fn recent_traces(&self, limit: usize) -> Vec<String> {
        let order = self.order.read().unwrap();
        order.iter().rev().take(limit).cloned().collect()
    }

    /// Number of traces recorded.
    pub fn trace_count(&self) -> usize {
        self.traces.read().unwrap().len()
    }
}

/// Build a span summary map from key/value pairs.
///
/// Accepts anything `serde_json::Value` can be built from, so callers can
/// mix counts, labels, and booleans.
pub fn summary(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn span(trace_id: &str, step: &str) -> TraceSpan {
        TraceSpan::new(
            trace_id,
            step,
            summary(&[("facility_id", json!("KE-nairobi-001"))]),
            summary(&[("services_count", json!(2))]),
            3,
        )
    }

    #[test]
    fn test_append_and_get() {
        let store = TraceStore::new();
        store.append(span("t-1", "extract"));
        store.append(span("t-1", "verify"));

        let spans = store.get_trace("t-1").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].step_name, "extract");
        assert_eq!(spans[1].step_name, "verify");
    }

    #[test]
    fn test_unknown_trace_is_not_found() {
        let store = TraceStore::new();
        let err = store.get_trace("missing").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TraceNotFound { trace_id } if trace_id == "missing"
        ));
    }

    #[test]
    fn test_spans_are_append_only_snapshots() {
        let store = TraceStore::new();
        store.append(span("t-1", "extract"));

        let snapshot = store.get_trace("t-1").unwrap();
        store.append(span("t-1", "verify"));

        // Earlier snapshot is unaffected by later appends.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get_trace("t-1").unwrap().len(), 2);
    }

    #[test]
    fn test_recent_traces_newest_first() {
        let store = TraceStore::new();
        store.append(span("t-1", "extract"));
        store.append(span("t-2", "extract"));
        store.append(span("t-3", "extract"));
        store.append(span("t-1", "verify")); // existing trace, order unchanged

        assert_eq!(store.recent_traces(2), vec!["t-3", "t-2"]);
        assert_eq!(store.trace_count(), 3);
    }
}
