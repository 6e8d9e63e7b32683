//! Request dispatch
//!
//! [`Dispatcher`] turns an [`ApiRequest`] into exactly two store dispatches:
//! the PENDING envelope before the transport is awaited and exactly one
//! terminal envelope after. The terminal envelope is also returned to the
//! caller, so mutation outcomes reach the UI without being folded anywhere.

use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use sky_protocol::{ActionType, ApiRequest, OperationEnvelope, Resolution};
use sky_state::Store;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues remote operations and reports their outcome
#[async_trait]
pub trait RequestInitiator: Send + Sync {
    /// Issue one operation, returning its single terminal envelope
    async fn issue(&self, request: ApiRequest) -> OperationEnvelope;

    /// GET
    async fn get(&self, path: String, action: ActionType) -> OperationEnvelope {
        self.issue(ApiRequest::get(path, action)).await
    }

    /// POST with optional body
    async fn post(
        &self,
        path: String,
        action: ActionType,
        payload: Option<Value>,
    ) -> OperationEnvelope {
        self.issue(ApiRequest::post(path, action, payload)).await
    }

    /// PUT with body
    async fn put(&self, path: String, action: ActionType, payload: Value) -> OperationEnvelope {
        self.issue(ApiRequest::put(path, action, payload)).await
    }

    /// DELETE
    async fn delete(&self, path: String, action: ActionType) -> OperationEnvelope {
        self.issue(ApiRequest::delete(path, action)).await
    }
}

/// Store-backed request initiator
#[derive(Clone)]
pub struct Dispatcher {
    store: Store,
    transport: Arc<dyn Transport>,
    sequence: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Create dispatcher folding outcomes into `store`
    #[must_use]
    pub fn new(store: Store, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            transport,
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Get store outcomes are folded into
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestInitiator for Dispatcher {
    async fn issue(&self, request: ApiRequest) -> OperationEnvelope {
        let mut pending =
            OperationEnvelope::pending(request.action).with_sequence(self.next_sequence());
        pending.target = request.target.clone();

        tracing::debug!(
            id = %pending.id,
            sequence = pending.sequence,
            verb = %request.verb,
            path = %request.path,
            label = %pending.label(),
            "issuing"
        );
        self.store.dispatch(&pending);

        let resolution = match self.transport.send(&request).await {
            Ok(response) => response.into_resolution(),
            Err(err) => {
                tracing::warn!(
                    id = %pending.id,
                    path = %request.path,
                    error = %err,
                    "transport failure"
                );
                Resolution::TransportFailure
            }
        };

        let outcome = pending.resolve(resolution);
        tracing::debug!(
            id = %outcome.id,
            sequence = outcome.sequence,
            label = %outcome.label(),
            "resolved"
        );
        self.store.dispatch(&outcome);
        outcome
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("store", &self.store)
            .field("next_sequence", &self.sequence.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
