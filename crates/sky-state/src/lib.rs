//! Source sync state
//!
//! Pure reducers and the registry that owns their state.
//!
//! # Core Concepts
//!
//! - [`SourceSnapshot`]: Observable state of the currently displayed source
//! - [`SourceReducer`]: Folds fetch outcomes into the snapshot
//! - [`ResourceReducer`]: Generic slice for one startup fetch
//! - [`Reducer`]: Pure `(state, envelope) -> state` transition
//! - [`Store`]: Process-wide registry routing envelopes to every slice
//!
//! # Example
//!
//! ```rust,ignore
//! use sky_state::{Store, SourceReducer, SOURCE_SLICE};
//!
//! let store = Store::new();
//! store.inject_reducer(SOURCE_SLICE, SourceReducer::new())?;
//!
//! store.dispatch(&envelope);
//! let snapshot = store.source().unwrap();
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod reducer;
mod resource;
mod snapshot;
mod source;
mod store;

// Re-exports
pub use error::StoreError;
pub use reducer::Reducer;
pub use resource::{ResourceReducer, ResourceSlice};
pub use snapshot::{LoadError, SourceSnapshot};
pub use source::{FetchOrdering, SourceReducer, LOAD_FAILURE_MESSAGE, SOURCE_SLICE};
pub use store::{AppState, Store, StoreEvent};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
