//! Application wiring
//!
//! A [`Session`] is built once at startup and owns every component: the
//! store, the dispatcher, the source actions, the hydration orchestrator
//! and the push router with the invalidation listener registered on it.
//! Nothing is registered implicitly.

use crate::actions::SourceActions;
use crate::config::ClientConfig;
use crate::dispatch::{Dispatcher, RequestInitiator};
use crate::error::ClientError;
use crate::hydrate::{HydrationOrchestrator, HydrationReport};
use crate::listener::{InvalidationListener, MessageRouter, PushMessage};
use crate::transport::{HttpTransport, Transport};
use sky_protocol::action::FETCH_SYSINFO;
use sky_protocol::{path, OperationEnvelope, Resolution};
use sky_state::{SourceReducer, SourceSnapshot, Store, StoreEvent, SOURCE_SLICE};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;

/// Wired client
#[derive(Debug, Clone)]
pub struct Session {
    config: ClientConfig,
    store: Store,
    dispatcher: Dispatcher,
    actions: SourceActions,
    hydration: HydrationOrchestrator,
    listener: Arc<InvalidationListener>,
    router: MessageRouter,
}

impl Session {
    /// Connect over HTTP
    ///
    /// No request is sent; see [`Session::probe`].
    ///
    /// # Errors
    /// - `ClientError::Config` if the configuration is invalid
    /// - `ClientError::Transport` if the HTTP client cannot be built
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = HttpTransport::new(&config.api)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Wire every component over `transport`
    ///
    /// # Errors
    /// - `ClientError::Store` if slice registration fails
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let store = Store::new();
        store.inject_reducer(
            SOURCE_SLICE,
            SourceReducer::new().with_ordering(config.consistency),
        )?;
        HydrationOrchestrator::install_slices(&store)?;

        let dispatcher = Dispatcher::new(store.clone(), transport);
        let initiator: Arc<dyn RequestInitiator> = Arc::new(dispatcher.clone());
        let actions = SourceActions::new(Arc::clone(&initiator));
        let hydration = HydrationOrchestrator::new(initiator);

        let listener = Arc::new(InvalidationListener::new(store.clone(), actions.clone()));
        let mut router = MessageRouter::new();
        router.add(listener.clone());

        tracing::info!(
            base_url = %config.api.base_url,
            consistency = ?config.consistency,
            "session ready"
        );
        Ok(Self {
            config,
            store,
            dispatcher,
            actions,
            hydration,
            listener,
            router,
        })
    }

    /// Wait until the server answers `GET /api/sysinfo`
    ///
    /// Tries `connect_retries` times, sleeping `retry_delay_ms` between
    /// attempts. Returns the number of attempts used.
    ///
    /// # Errors
    /// - `ClientError::Rejected` if the server answers with an error
    /// - `ClientError::Unreachable` if no attempt got an answer
    pub async fn probe(&self) -> Result<u32, ClientError> {
        let attempts = self.config.api.connect_retries.max(1);
        for attempt in 1..=attempts {
            let outcome = self
                .dispatcher
                .get(path::SYSINFO.to_string(), FETCH_SYSINFO)
                .await;
            match outcome.resolution {
                Resolution::Ok(_) => {
                    tracing::info!(attempt, "server reachable");
                    return Ok(attempt);
                }
                Resolution::ApplicationError(message) => {
                    return Err(ClientError::Rejected(message));
                }
                Resolution::Pending | Resolution::TransportFailure => {
                    tracing::warn!(attempt, attempts, "server not reachable");
                    if attempt < attempts {
                        tokio::time::sleep(self.config.api.retry_delay()).await;
                    }
                }
            }
        }
        Err(ClientError::Unreachable { attempts })
    }

    /// Fetch a source into the store
    ///
    /// # Errors
    /// - `ClientError::Protocol` if `id` is not a valid path segment
    pub async fn load_source(&self, id: &str) -> Result<OperationEnvelope, ClientError> {
        self.actions.fetch_source(id).await
    }

    /// Run the startup fetches
    pub async fn hydrate(&self) -> HydrationReport {
        self.hydration.hydrate().await
    }

    /// Route push frames from `messages` until the channel closes
    pub async fn listen(&self, messages: mpsc::Receiver<PushMessage>) -> usize {
        self.router.clone().run(messages).await
    }

    /// Report the source snapshot after every change to it
    ///
    /// Events already queued when `stop` resolves are still reported. A
    /// lagging receiver reports the current snapshot once and keeps
    /// following. Returns the number of reports.
    pub async fn follow_source<F>(
        &self,
        mut events: broadcast::Receiver<StoreEvent>,
        stop: impl Future<Output = ()>,
        mut on_change: F,
    ) -> usize
    where
        F: FnMut(&SourceSnapshot),
    {
        let mut stop = std::pin::pin!(stop);
        let mut reports = 0;
        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(event) if !event.touched(SOURCE_SLICE) => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "source follower lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                () = &mut stop => break,
            }
            on_change(&self.snapshot());
            reports += 1;
        }
        reports
    }

    /// Current source snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<SourceSnapshot> {
        self.store.source().unwrap_or_default()
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get dispatcher
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Get source actions
    #[inline]
    #[must_use]
    pub fn actions(&self) -> &SourceActions {
        &self.actions
    }

    /// Get hydration orchestrator
    #[inline]
    #[must_use]
    pub fn hydration(&self) -> &HydrationOrchestrator {
        &self.hydration
    }

    /// Get invalidation listener
    #[inline]
    #[must_use]
    pub fn listener(&self) -> &InvalidationListener {
        &self.listener
    }

    /// Get push router
    #[inline]
    #[must_use]
    pub fn router(&self) -> &MessageRouter {
        &self.router
    }
}
