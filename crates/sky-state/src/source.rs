//! Source reducer
//!
//! Transition table for the `source` slice:
//!
//! | Outcome | Result |
//! |---|---|
//! | `FETCH_LOADED_SOURCE_OK` (object) | fields replaced, identity from `id`, error cleared |
//! | `FETCH_LOADED_SOURCE_ERROR` | error set to server message |
//! | `FETCH_LOADED_SOURCE_FAIL` | error set to [`LOAD_FAILURE_MESSAGE`] |
//! | anything else | unchanged |
//!
//! Mutations (comments, classifications, follow-up requests) are not folded
//! here. Their effect shows up through the re-fetch a refresh notification
//! triggers.

use crate::reducer::Reducer;
use crate::snapshot::{LoadError, SourceSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sky_protocol::action::FETCH_LOADED_SOURCE;
use sky_protocol::{OperationEnvelope, Resolution};
use std::sync::Arc;

/// Slice name the source reducer is installed under
pub const SOURCE_SLICE: &str = "source";

/// Error shown when a fetch produced no usable server response
pub const LOAD_FAILURE_MESSAGE: &str = "Unknown error while loading source";

/// Which fetch outcome wins when several are in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOrdering {
    /// Last arriving outcome wins; pending fetches are not tracked
    #[default]
    ArrivalOrder,
    /// Outcomes of fetches older than the latest issued one are dropped
    IssueOrder,
}

/// Reducer for the currently displayed source
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceReducer {
    ordering: FetchOrdering,
}

impl SourceReducer {
    /// Create reducer with arrival-order semantics
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With ordering mode
    #[inline]
    #[must_use]
    pub fn with_ordering(mut self, ordering: FetchOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Get ordering mode
    #[inline]
    #[must_use]
    pub fn ordering(&self) -> FetchOrdering {
        self.ordering
    }

    /// Issue-order bookkeeping; `Some` short-circuits the transition
    fn order_gate(
        &self,
        state: &Arc<SourceSnapshot>,
        action: &OperationEnvelope,
    ) -> Option<Arc<SourceSnapshot>> {
        if self.ordering != FetchOrdering::IssueOrder {
            return None;
        }

        let latest = state.latest_issued;
        match action.resolution {
            Resolution::Pending => {
                if latest.is_some_and(|seq| action.sequence <= seq) {
                    return Some(Arc::clone(state));
                }
                let mut next = SourceSnapshot::clone(state);
                next.latest_issued = Some(action.sequence);
                Some(Arc::new(next))
            }
            _ if latest.is_some_and(|seq| action.sequence < seq) => Some(Arc::clone(state)),
            _ => None,
        }
    }
}

impl Reducer for SourceReducer {
    type State = SourceSnapshot;

    fn reduce(
        &self,
        state: &Arc<SourceSnapshot>,
        action: &OperationEnvelope,
    ) -> Arc<SourceSnapshot> {
        if action.action != FETCH_LOADED_SOURCE {
            return Arc::clone(state);
        }
        if let Some(gated) = self.order_gate(state, action) {
            return gated;
        }

        match &action.resolution {
            Resolution::Ok(Value::Object(fields)) => Arc::new(SourceSnapshot {
                identity: identity_of(fields).or_else(|| action.target.clone()),
                fields: fields.clone(),
                load_error: LoadError::Cleared,
                latest_issued: state.latest_issued,
            }),
            Resolution::ApplicationError(message) => with_error(state, message),
            Resolution::TransportFailure => with_error(state, LOAD_FAILURE_MESSAGE),
            // Success without an object payload keeps the displayed fields
            Resolution::Ok(_) => cleared(state),
            Resolution::Pending => Arc::clone(state),
        }
    }
}

fn with_error(state: &Arc<SourceSnapshot>, message: &str) -> Arc<SourceSnapshot> {
    let mut next = SourceSnapshot::clone(state);
    next.load_error = LoadError::Message(message.to_string());
    Arc::new(next)
}

fn cleared(state: &Arc<SourceSnapshot>) -> Arc<SourceSnapshot> {
    if state.load_error == LoadError::Cleared {
        return Arc::clone(state);
    }
    let mut next = SourceSnapshot::clone(state);
    next.load_error = LoadError::Cleared;
    Arc::new(next)
}

fn identity_of(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sky_protocol::action::{ADD_COMMENT, FETCH_GROUPS};

    fn fold(reducer: &SourceReducer, envelopes: &[OperationEnvelope]) -> Arc<SourceSnapshot> {
        envelopes
            .iter()
            .fold(Arc::new(SourceSnapshot::default()), |state, env| {
                reducer.reduce(&state, env)
            })
    }

    fn fetched(id: &str, extra: Value) -> OperationEnvelope {
        let mut data = json!({"id": id});
        data.as_object_mut()
            .unwrap()
            .extend(extra.as_object().cloned().unwrap());
        OperationEnvelope::ok(FETCH_LOADED_SOURCE, data)
    }

    #[test]
    fn fetch_ok_replaces_fields_wholesale() {
        let reducer = SourceReducer::new();
        let state = fold(
            &reducer,
            &[
                fetched("S1", json!({"ra": 1.0, "comments": []})),
                fetched("S2", json!({"dec": -3.0})),
            ],
        );

        assert_eq!(state.identity.as_deref(), Some("S2"));
        assert_eq!(state.field("ra"), None);
        assert_eq!(state.field("dec"), Some(&json!(-3.0)));
        assert_eq!(state.load_error, LoadError::Cleared);
    }

    #[test]
    fn application_error_keeps_fields() {
        let reducer = SourceReducer::new();
        let state = fold(
            &reducer,
            &[
                fetched("S1", json!({"ra": 1.0})),
                OperationEnvelope::application_error(FETCH_LOADED_SOURCE, "Source not found"),
            ],
        );

        assert_eq!(state.load_error.message(), Some("Source not found"));
        assert_eq!(state.identity.as_deref(), Some("S1"));
        assert_eq!(state.field("ra"), Some(&json!(1.0)));
    }

    #[test]
    fn transport_failure_uses_fixed_message() {
        let reducer = SourceReducer::new();
        let state = fold(
            &reducer,
            &[OperationEnvelope::transport_failure(FETCH_LOADED_SOURCE)],
        );

        assert_eq!(state.load_error.message(), Some(LOAD_FAILURE_MESSAGE));
        assert!(state.fields.is_empty());
    }

    #[test]
    fn later_success_clears_error() {
        let reducer = SourceReducer::new();
        let state = fold(
            &reducer,
            &[
                OperationEnvelope::transport_failure(FETCH_LOADED_SOURCE),
                fetched("S1", json!({})),
            ],
        );
        assert_eq!(state.load_error, LoadError::Cleared);
    }

    #[test]
    fn empty_success_clears_error_and_keeps_fields() {
        let reducer = SourceReducer::new();
        let state = fold(
            &reducer,
            &[
                fetched("S1", json!({"ra": 1.0})),
                OperationEnvelope::application_error(FETCH_LOADED_SOURCE, "Source not found"),
                OperationEnvelope::ok(FETCH_LOADED_SOURCE, Value::Null),
            ],
        );

        assert_eq!(state.load_error, LoadError::Cleared);
        assert_eq!(state.identity.as_deref(), Some("S1"));
        assert_eq!(state.field("ra"), Some(&json!(1.0)));
    }

    #[test]
    fn unrecognized_outcomes_return_same_arc() {
        let reducer = SourceReducer::new();
        let state = Arc::new(SourceSnapshot::default());

        for env in [
            OperationEnvelope::ok(ADD_COMMENT, json!({"comment_id": 1})),
            OperationEnvelope::transport_failure(FETCH_GROUPS),
            OperationEnvelope::pending(FETCH_LOADED_SOURCE),
        ] {
            let next = reducer.reduce(&state, &env);
            assert!(Arc::ptr_eq(&state, &next), "{} changed state", env.label());
        }
    }

    #[test]
    fn numeric_id_and_target_fallback() {
        let reducer = SourceReducer::new();

        let numeric = fold(
            &reducer,
            &[OperationEnvelope::ok(FETCH_LOADED_SOURCE, json!({"id": 17}))],
        );
        assert_eq!(numeric.identity.as_deref(), Some("17"));

        let targeted = fold(
            &reducer,
            &[OperationEnvelope::ok(FETCH_LOADED_SOURCE, json!({"ra": 2.0})).with_target("S9")],
        );
        assert_eq!(targeted.identity.as_deref(), Some("S9"));
    }

    #[test]
    fn arrival_order_lets_stale_fetch_win() {
        let reducer = SourceReducer::new();
        let state = fold(
            &reducer,
            &[
                OperationEnvelope::pending(FETCH_LOADED_SOURCE).with_sequence(1),
                OperationEnvelope::pending(FETCH_LOADED_SOURCE).with_sequence(2),
                fetched("S2", json!({})).with_sequence(2),
                fetched("S1", json!({})).with_sequence(1),
            ],
        );
        assert_eq!(state.identity.as_deref(), Some("S1"));
        assert_eq!(state.latest_issued, None);
    }

    #[test]
    fn issue_order_drops_superseded_fetch() {
        let reducer = SourceReducer::new().with_ordering(FetchOrdering::IssueOrder);
        let state = fold(
            &reducer,
            &[
                OperationEnvelope::pending(FETCH_LOADED_SOURCE).with_sequence(1),
                OperationEnvelope::pending(FETCH_LOADED_SOURCE).with_sequence(2),
                fetched("S2", json!({})).with_sequence(2),
                fetched("S1", json!({})).with_sequence(1),
                OperationEnvelope::transport_failure(FETCH_LOADED_SOURCE).with_sequence(1),
            ],
        );
        assert_eq!(state.identity.as_deref(), Some("S2"));
        assert_eq!(state.load_error, LoadError::Cleared);
        assert_eq!(state.latest_issued, Some(2));
    }

    #[test]
    fn issue_order_accepts_in_order_results() {
        let reducer = SourceReducer::new().with_ordering(FetchOrdering::IssueOrder);
        let state = fold(
            &reducer,
            &[
                OperationEnvelope::pending(FETCH_LOADED_SOURCE).with_sequence(1),
                fetched("S1", json!({})).with_sequence(1),
                OperationEnvelope::pending(FETCH_LOADED_SOURCE).with_sequence(2),
                OperationEnvelope::application_error(FETCH_LOADED_SOURCE, "gone")
                    .with_sequence(2),
            ],
        );
        assert_eq!(state.identity.as_deref(), Some("S1"));
        assert_eq!(state.load_error.message(), Some("gone"));
    }
}
