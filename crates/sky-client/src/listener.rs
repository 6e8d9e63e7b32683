//! Push notifications
//!
//! The server pushes `{"actionType": ..., "payload": ...}` frames. A
//! [`MessageRouter`] hands each frame to every registered
//! [`MessageHandler`]; the [`InvalidationListener`] is the handler that
//! re-fetches the displayed source when the server says it changed.

use crate::actions::SourceActions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sky_protocol::action::REFRESH_SOURCE;
use sky_protocol::OperationEnvelope;
use sky_state::Store;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// One push frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub action_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl PushMessage {
    /// Create message
    #[must_use]
    pub fn new(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }

    /// `REFRESH_SOURCE` for `obj_id`
    #[must_use]
    pub fn refresh_source(obj_id: impl Into<String>) -> Self {
        Self::new(
            REFRESH_SOURCE.name(),
            serde_json::json!({ "obj_id": obj_id.into() }),
        )
    }

    /// Parse a JSON frame
    ///
    /// # Errors
    /// Returns the parse error if the frame is not a push message.
    pub fn from_json(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// `payload.obj_id` as a string; numeric ids are accepted
    #[must_use]
    pub fn obj_id(&self) -> Option<String> {
        match self.payload.get("obj_id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// Receives every routed push message
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &PushMessage);
}

/// In-process push fan-out
#[derive(Clone, Default)]
pub struct MessageRouter {
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl MessageRouter {
    /// Create router without handlers
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register handler
    pub fn add(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handlers.push(handler);
    }

    /// Number of registered handlers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handler is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke every handler once
    pub async fn route(&self, message: &PushMessage) {
        for handler in &self.handlers {
            handler.handle(message).await;
        }
    }

    /// Pump `messages` until the channel closes
    ///
    /// Each message is routed on its own task so a slow fetch never stalls
    /// delivery of the next frame. Returns the number of messages routed,
    /// once every routing task has finished.
    pub async fn run(self, mut messages: mpsc::Receiver<PushMessage>) -> usize {
        let router = Arc::new(self);
        let mut tasks = JoinSet::new();
        let mut routed = 0;

        while let Some(message) = messages.recv().await {
            let router = Arc::clone(&router);
            routed += 1;
            tasks.spawn(async move { router.route(&message).await });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "routing task failed");
            }
        }
        tracing::debug!(routed, "push channel closed");
        routed
    }
}

impl fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRouter")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Why a push message caused no fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// Not a refresh notification
    OtherAction,
    /// Refresh without `obj_id`
    MissingObjectId,
    /// No source is displayed
    NothingLoaded,
    /// Refresh for a source other than the displayed one
    OtherSource,
    /// Displayed identity cannot be used in a path
    Unaddressable,
}

/// What the listener did with one message
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerDecision {
    Refetched(OperationEnvelope),
    Discarded(DiscardReason),
}

impl ListenerDecision {
    /// Check if a fetch was issued
    #[inline]
    #[must_use]
    pub fn is_refetch(&self) -> bool {
        matches!(self, Self::Refetched(_))
    }
}

/// Re-fetches the displayed source on `REFRESH_SOURCE`
#[derive(Debug, Clone)]
pub struct InvalidationListener {
    store: Store,
    actions: SourceActions,
}

impl InvalidationListener {
    /// Create listener reading `store` and fetching through `actions`
    #[must_use]
    pub fn new(store: Store, actions: SourceActions) -> Self {
        Self { store, actions }
    }

    /// Decide on one message, fetching at most once
    ///
    /// The displayed identity is read when the message is processed, not
    /// when it was sent.
    pub async fn on_message(&self, message: &PushMessage) -> ListenerDecision {
        if message.action_type != REFRESH_SOURCE.name() {
            return ListenerDecision::Discarded(DiscardReason::OtherAction);
        }
        let Some(obj_id) = message.obj_id() else {
            return ListenerDecision::Discarded(DiscardReason::MissingObjectId);
        };
        let Some(loaded) = self.store.source().and_then(|s| s.identity.clone()) else {
            return ListenerDecision::Discarded(DiscardReason::NothingLoaded);
        };
        if loaded != obj_id {
            tracing::trace!(%obj_id, %loaded, "refresh for another source");
            return ListenerDecision::Discarded(DiscardReason::OtherSource);
        }

        match self.actions.fetch_source(&loaded).await {
            Ok(envelope) => {
                tracing::debug!(%obj_id, label = %envelope.label(), "source refetched");
                ListenerDecision::Refetched(envelope)
            }
            Err(err) => {
                tracing::warn!(%obj_id, error = %err, "cannot refetch source");
                ListenerDecision::Discarded(DiscardReason::Unaddressable)
            }
        }
    }
}

#[async_trait]
impl MessageHandler for InvalidationListener {
    async fn handle(&self, message: &PushMessage) {
        self.on_message(message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RequestInitiator;
    use parking_lot::Mutex;
    use serde_json::json;
    use sky_protocol::action::FETCH_LOADED_SOURCE;
    use sky_protocol::{ApiRequest, Resolution};
    use sky_state::{SourceReducer, SOURCE_SLICE};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Paths(Mutex<Vec<String>>);

    #[async_trait]
    impl RequestInitiator for Paths {
        async fn issue(&self, request: ApiRequest) -> OperationEnvelope {
            self.0.lock().push(request.path.clone());
            OperationEnvelope::pending(request.action).resolve(Resolution::Ok(json!({})))
        }
    }

    fn listener(loaded: Option<&str>) -> (InvalidationListener, Arc<Paths>) {
        let store = Store::new();
        store.inject_reducer(SOURCE_SLICE, SourceReducer::new()).unwrap();
        if let Some(id) = loaded {
            store.dispatch(&OperationEnvelope::ok(FETCH_LOADED_SOURCE, json!({"id": id})));
        }
        let paths = Arc::new(Paths::default());
        let actions = SourceActions::new(paths.clone());
        (InvalidationListener::new(store, actions), paths)
    }

    #[test]
    fn frame_parses_camel_case() {
        let frame = r#"{"actionType": "skyportal/REFRESH_SOURCE", "payload": {"obj_id": 42}}"#;
        let message = PushMessage::from_json(frame).unwrap();
        assert_eq!(message.action_type, "skyportal/REFRESH_SOURCE");
        assert_eq!(message.obj_id().as_deref(), Some("42"));
        assert!(PushMessage::from_json(r#"{"payload": {}}"#).is_err());
    }

    #[tokio::test]
    async fn matching_refresh_fetches_once() {
        let (listener, paths) = listener(Some("S1"));

        let decision = listener.on_message(&PushMessage::refresh_source("S1")).await;

        assert!(decision.is_refetch());
        assert_eq!(*paths.0.lock(), vec!["/api/sources/S1".to_string()]);
    }

    #[tokio::test]
    async fn other_source_discarded() {
        let (listener, paths) = listener(Some("S1"));

        let decision = listener.on_message(&PushMessage::refresh_source("S2")).await;

        assert_eq!(decision, ListenerDecision::Discarded(DiscardReason::OtherSource));
        assert!(paths.0.lock().is_empty());
    }

    #[tokio::test]
    async fn nothing_loaded_discarded() {
        let (listener, paths) = listener(None);

        let decision = listener.on_message(&PushMessage::refresh_source("S1")).await;

        assert_eq!(decision, ListenerDecision::Discarded(DiscardReason::NothingLoaded));
        assert!(paths.0.lock().is_empty());
    }

    #[tokio::test]
    async fn other_messages_discarded() {
        let (listener, _) = listener(Some("S1"));

        let other = PushMessage::new("baselayer/SHOW_NOTIFICATION", json!({"obj_id": "S1"}));
        assert_eq!(
            listener.on_message(&other).await,
            ListenerDecision::Discarded(DiscardReason::OtherAction)
        );

        let bare = PushMessage::new(REFRESH_SOURCE.name(), json!({}));
        assert_eq!(
            listener.on_message(&bare).await,
            ListenerDecision::Discarded(DiscardReason::MissingObjectId)
        );
    }

    #[tokio::test]
    async fn duplicates_are_not_coalesced() {
        let (listener, paths) = listener(Some("S1"));

        listener.on_message(&PushMessage::refresh_source("S1")).await;
        listener.on_message(&PushMessage::refresh_source("S1")).await;

        assert_eq!(paths.0.lock().len(), 2);
    }

    struct Counter(AtomicUsize);

    #[async_trait]
    impl MessageHandler for Counter {
        async fn handle(&self, _message: &PushMessage) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn router_delivers_to_every_handler() {
        let first = Arc::new(Counter(AtomicUsize::new(0)));
        let second = Arc::new(Counter(AtomicUsize::new(0)));
        let mut router = MessageRouter::new();
        router.add(first.clone());
        router.add(second.clone());

        let (tx, rx) = mpsc::channel(8);
        for n in 0..3 {
            tx.send(PushMessage::refresh_source(format!("S{n}"))).await.unwrap();
        }
        drop(tx);

        assert_eq!(router.run(rx).await, 3);
        assert_eq!(first.0.load(Ordering::SeqCst), 3);
        assert_eq!(second.0.load(Ordering::SeqCst), 3);
    }
}
