//! Process-wide state registry
//!
//! Provides [`Store`], the single owner of every reducer slice.
//!
//! # Lifecycle
//! - Constructed once at startup and passed by reference (clone the handle)
//!   to every component that reads or dispatches.
//! - Slices are installed with [`Store::inject_reducer`].
//! - State changes only inside [`Store::dispatch`], which routes an envelope
//!   to every installed reducer.
//! - Readers take a consistent [`AppState`] snapshot with [`Store::state`].

use crate::error::StoreError;
use crate::reducer::{ErasedReducer, Reducer, SliceState};
use crate::snapshot::SourceSnapshot;
use crate::source::SOURCE_SLICE;
use indexmap::IndexMap;
use parking_lot::RwLock;
use sky_protocol::OperationEnvelope;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

/// Change notification sent to observers after each dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Store version after the dispatch
    pub version: u64,
    /// Label of the dispatched envelope
    pub label: String,
    /// Slices whose state changed
    pub changed: Vec<String>,
}

impl StoreEvent {
    /// Check if `slice` changed
    #[inline]
    #[must_use]
    pub fn touched(&self, slice: &str) -> bool {
        self.changed.iter().any(|name| name == slice)
    }
}

struct Slice {
    reducer: Box<dyn ErasedReducer>,
    state: SliceState,
}

struct StoreInner {
    slices: RwLock<IndexMap<String, Slice>>,
    version: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
}

/// Handle to the state registry
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create empty store
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                slices: RwLock::new(IndexMap::new()),
                version: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Install a reducer under a slice name
    ///
    /// The slice starts at `R::State::default()`.
    ///
    /// # Errors
    /// - `StoreError::SliceAlreadyRegistered` if the name is taken
    pub fn inject_reducer<R: Reducer>(
        &self,
        name: impl Into<String>,
        reducer: R,
    ) -> Result<(), StoreError> {
        let name = name.into();
        let mut slices = self.inner.slices.write();
        if slices.contains_key(&name) {
            return Err(StoreError::SliceAlreadyRegistered(name));
        }

        let state = reducer.initial();
        tracing::debug!(slice = %name, "reducer installed");
        slices.insert(
            name,
            Slice {
                reducer: Box::new(reducer),
                state,
            },
        );
        Ok(())
    }

    /// Route an envelope to every reducer
    ///
    /// Returns the store version after the dispatch.
    pub fn dispatch(&self, envelope: &OperationEnvelope) -> u64 {
        let mut changed = Vec::new();
        let version = {
            let mut slices = self.inner.slices.write();
            for (name, slice) in slices.iter_mut() {
                let next = slice.reducer.reduce_erased(&slice.state, envelope);
                if !Arc::ptr_eq(&next, &slice.state) {
                    slice.state = next;
                    changed.push(name.clone());
                }
            }
            self.inner.version.fetch_add(1, Ordering::SeqCst) + 1
        };

        let label = envelope.label();
        tracing::trace!(%label, version, changed = ?changed, "dispatched");

        // No receivers is fine
        let _ = self.inner.events.send(StoreEvent {
            version,
            label,
            changed,
        });
        version
    }

    /// Consistent snapshot of every slice
    #[must_use]
    pub fn state(&self) -> AppState {
        let slices = self.inner.slices.read();
        AppState {
            version: self.inner.version.load(Ordering::SeqCst),
            slices: slices
                .iter()
                .map(|(name, slice)| (name.clone(), Arc::clone(&slice.state)))
                .collect(),
        }
    }

    /// Current source snapshot, if the source slice is installed
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<Arc<SourceSnapshot>> {
        self.state().source()
    }

    /// Subscribe to change notifications
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Current version (number of dispatches so far)
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slices = self.inner.slices.read();
        f.debug_struct("Store")
            .field("version", &self.version())
            .field("slices", &slices.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Read-only view of every slice at one version
#[derive(Clone, Default)]
pub struct AppState {
    version: u64,
    slices: IndexMap<String, SliceState>,
}

impl AppState {
    /// Store version this view was taken at
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Typed slice lookup
    ///
    /// Returns `None` if the slice is missing or holds another type.
    #[must_use]
    pub fn slice<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.slices
            .get(name)
            .and_then(|state| Arc::clone(state).downcast::<T>().ok())
    }

    /// Source slice
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<Arc<SourceSnapshot>> {
        self.slice(SOURCE_SLICE)
    }

    /// Installed slice names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("version", &self.version)
            .field("slices", &self.slices.keys().collect::<Vec<_>>())
            .finish()
    }
}
