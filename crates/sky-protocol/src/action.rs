//! Action identifiers
//!
//! Every operation is named by a base [`ActionType`]. The outcome of an
//! operation is labelled by appending the suffix of its [`OperationKind`]:
//!
//! - `skyportal/FETCH_LOADED_SOURCE` (pending)
//! - `skyportal/FETCH_LOADED_SOURCE_OK`
//! - `skyportal/FETCH_LOADED_SOURCE_ERROR`
//! - `skyportal/FETCH_LOADED_SOURCE_FAIL`

use crate::error::ProtocolError;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// Base operation name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionType(&'static str);

impl ActionType {
    /// Create action type from a static name
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Get base name
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0
    }

    /// Render outcome label for this action
    #[must_use]
    pub fn label(&self, kind: OperationKind) -> String {
        format!("{}{}", self.0, kind.suffix())
    }

    /// Resolve a known base name
    ///
    /// # Errors
    /// - `ProtocolError::UnknownAction` if the name is not in [`KNOWN_ACTIONS`]
    pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
        KNOWN_ACTIONS
            .iter()
            .copied()
            .find(|action| action.0 == name)
            .ok_or_else(|| ProtocolError::UnknownAction(name.to_string()))
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// Lifecycle stage of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Issued, not yet resolved
    Pending,
    /// Server accepted the request
    Ok,
    /// Server rejected the request with a message
    ApplicationError,
    /// No well-formed server response
    TransportFailure,
}

impl OperationKind {
    /// Label suffix for this kind
    #[inline]
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            OperationKind::Pending => "",
            OperationKind::Ok => "_OK",
            OperationKind::ApplicationError => "_ERROR",
            OperationKind::TransportFailure => "_FAIL",
        }
    }

    /// Check if this kind ends an operation
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, OperationKind::Pending)
    }
}

/// Push-only notification: a source changed on the server
pub const REFRESH_SOURCE: ActionType = ActionType::new("skyportal/REFRESH_SOURCE");

pub const FETCH_LOADED_SOURCE: ActionType = ActionType::new("skyportal/FETCH_LOADED_SOURCE");
pub const SAVE_SOURCE: ActionType = ActionType::new("skyportal/SAVE_SOURCE");
pub const ADD_SOURCE_VIEW: ActionType = ActionType::new("skyportal/ADD_SOURCE_VIEW");

pub const ADD_CLASSIFICATION: ActionType = ActionType::new("skyportal/ADD_CLASSIFICATION");
pub const DELETE_CLASSIFICATION: ActionType = ActionType::new("skyportal/DELETE_CLASSIFICATION");

pub const ADD_COMMENT: ActionType = ActionType::new("skyportal/ADD_COMMENT");
pub const DELETE_COMMENT: ActionType = ActionType::new("skyportal/DELETE_COMMENT");

pub const SUBMIT_FOLLOWUP_REQUEST: ActionType =
    ActionType::new("skyportal/SUBMIT_FOLLOWUP_REQUEST");
pub const EDIT_FOLLOWUP_REQUEST: ActionType = ActionType::new("skyportal/EDIT_FOLLOWUP_REQUEST");
pub const DELETE_FOLLOWUP_REQUEST: ActionType =
    ActionType::new("skyportal/DELETE_FOLLOWUP_REQUEST");

pub const UPLOAD_PHOTOMETRY: ActionType = ActionType::new("skyportal/UPLOAD_PHOTOMETRY");

// Startup hydration
pub const FETCH_SYSINFO: ActionType = ActionType::new("skyportal/FETCH_SYSINFO");
pub const FETCH_DB_INFO: ActionType = ActionType::new("skyportal/FETCH_DB_INFO");
pub const FETCH_USER_PROFILE: ActionType = ActionType::new("skyportal/FETCH_USER_PROFILE");
pub const FETCH_GROUPS: ActionType = ActionType::new("skyportal/FETCH_GROUPS");
pub const FETCH_NEWSFEED: ActionType = ActionType::new("skyportal/FETCH_NEWSFEED");
pub const FETCH_TOP_SOURCES: ActionType = ActionType::new("skyportal/FETCH_TOP_SOURCES");
pub const FETCH_INSTRUMENTS: ActionType = ActionType::new("skyportal/FETCH_INSTRUMENTS");
pub const FETCH_INSTRUMENT_OBS_PARAMS: ActionType =
    ActionType::new("skyportal/FETCH_INSTRUMENT_OBS_PARAMS");
pub const FETCH_TAXONOMIES: ActionType = ActionType::new("skyportal/FETCH_TAXONOMIES");

/// Every base name the client can issue or receive
pub const KNOWN_ACTIONS: &[ActionType] = &[
    REFRESH_SOURCE,
    FETCH_LOADED_SOURCE,
    SAVE_SOURCE,
    ADD_SOURCE_VIEW,
    ADD_CLASSIFICATION,
    DELETE_CLASSIFICATION,
    ADD_COMMENT,
    DELETE_COMMENT,
    SUBMIT_FOLLOWUP_REQUEST,
    EDIT_FOLLOWUP_REQUEST,
    DELETE_FOLLOWUP_REQUEST,
    UPLOAD_PHOTOMETRY,
    FETCH_SYSINFO,
    FETCH_DB_INFO,
    FETCH_USER_PROFILE,
    FETCH_GROUPS,
    FETCH_NEWSFEED,
    FETCH_TOP_SOURCES,
    FETCH_INSTRUMENTS,
    FETCH_INSTRUMENT_OBS_PARAMS,
    FETCH_TAXONOMIES,
];
