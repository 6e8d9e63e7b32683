//! Source sync client
//!
//! Issues remote operations, folds their outcomes into a [`sky_state::Store`]
//! and keeps the displayed source fresh.
//!
//! # Components
//!
//! - [`Dispatcher`]: Issues an [`ApiRequest`](sky_protocol::ApiRequest),
//!   dispatching PENDING then exactly one terminal envelope
//! - [`HttpTransport`]: `reqwest` transport behind the [`Transport`] seam
//! - [`SourceActions`]: One method per source page endpoint
//! - [`encode_attachment`]: Inline file encoding for comments
//! - [`InvalidationListener`]: Re-fetches the displayed source on push refresh
//! - [`HydrationOrchestrator`]: Concurrent startup fetches
//! - [`Session`]: Explicit wiring of all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use sky_client::{ClientConfig, Session};
//!
//! let session = Session::connect(ClientConfig::default().apply_env_overrides())?;
//! session.probe().await?;
//! session.hydration().spawn();
//! session.load_source("ZTF21aaaaaaa").await?;
//! println!("{:?}", session.snapshot().load_error);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod actions;
pub mod attachment;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hydrate;
pub mod listener;
pub mod logging;
pub mod session;
pub mod transport;

// Re-exports
pub use actions::{CommentForm, FollowupRequestParams, SourceActions, FOLLOWUP_REQUEST_FIELDS};
pub use attachment::{
    decode_data_url, encode_attachment, Attachment, FileInput, InMemoryFile, LocalFile,
    DEFAULT_CONTENT_TYPE,
};
pub use config::{ApiConfig, ClientConfig, LogConfig};
pub use dispatch::{Dispatcher, RequestInitiator};
pub use error::{ClientError, ConfigError, EncodeError, TransportError};
pub use hydrate::{HydrationFetch, HydrationOrchestrator, HydrationReport, HYDRATION_FETCHES};
pub use listener::{
    DiscardReason, InvalidationListener, ListenerDecision, MessageHandler, MessageRouter,
    PushMessage,
};
pub use session::Session;
pub use transport::{ApiResponse, ApiStatus, HttpTransport, Transport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
