//! Generic fetch slices
//!
//! Startup data (system info, groups, instruments, ...) is fetched once and
//! displayed as-is. One [`ResourceReducer`] per fetch keeps the last payload
//! and the last error.

use crate::reducer::Reducer;
use serde::Serialize;
use serde_json::Value;
use sky_protocol::{ActionType, OperationEnvelope, Resolution};
use std::sync::Arc;

/// State of one fetched resource
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceSlice {
    /// Last OK payload
    pub data: Option<Value>,
    /// Last error message
    pub error: Option<String>,
    /// A fetch is in flight
    pub loading: bool,
}

/// Reducer for a slice fed by a single fetch action
#[derive(Debug, Clone, Copy)]
pub struct ResourceReducer {
    action: ActionType,
}

impl ResourceReducer {
    /// Create reducer listening to `action`
    #[inline]
    #[must_use]
    pub fn new(action: ActionType) -> Self {
        Self { action }
    }

    /// Get action this reducer folds
    #[inline]
    #[must_use]
    pub fn action(&self) -> ActionType {
        self.action
    }
}

impl Reducer for ResourceReducer {
    type State = ResourceSlice;

    fn reduce(&self, state: &Arc<ResourceSlice>, action: &OperationEnvelope) -> Arc<ResourceSlice> {
        if action.action != self.action {
            return Arc::clone(state);
        }

        let next = match &action.resolution {
            Resolution::Pending => ResourceSlice {
                loading: true,
                ..ResourceSlice::clone(state)
            },
            Resolution::Ok(data) => ResourceSlice {
                data: Some(data.clone()),
                error: None,
                loading: false,
            },
            Resolution::ApplicationError(message) => ResourceSlice {
                error: Some(message.clone()),
                loading: false,
                ..ResourceSlice::clone(state)
            },
            Resolution::TransportFailure => ResourceSlice {
                error: Some(format!("Unknown error while fetching {}", self.action)),
                loading: false,
                ..ResourceSlice::clone(state)
            },
        };
        Arc::new(next)
    }
}
