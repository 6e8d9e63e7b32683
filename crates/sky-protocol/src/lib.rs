//! Source sync protocol
//!
//! The vocabulary shared by every other crate in the workspace.
//!
//! # Core Concepts
//!
//! - [`ActionType`]: Base operation name (`skyportal/FETCH_LOADED_SOURCE`)
//! - [`OperationKind`]: Pending, OK, application error, transport failure
//! - [`OperationEnvelope`]: Correlates one issued request with its outcome
//! - [`ApiRequest`]: Verb, path, base name and optional payload
//! - [`path`]: REST path shapes and identifier validation
//!
//! # Example
//!
//! ```rust,ignore
//! use sky_protocol::{action, path, ApiRequest, OperationEnvelope, Resolution};
//!
//! let request = ApiRequest::get(path::source("ZTF21aaa")?, action::FETCH_LOADED_SOURCE)
//!     .with_target("ZTF21aaa");
//!
//! let pending = OperationEnvelope::pending(request.action);
//! let done = pending.resolve(Resolution::ApplicationError("Source not found".into()));
//! assert_eq!(done.label(), "skyportal/FETCH_LOADED_SOURCE_ERROR");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod action;
mod envelope;
mod error;
pub mod path;
mod request;

// Re-exports
pub use action::{ActionType, OperationKind, KNOWN_ACTIONS};
pub use envelope::{OperationEnvelope, OperationId, Resolution};
pub use error::ProtocolError;
pub use request::{ApiRequest, Verb};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
