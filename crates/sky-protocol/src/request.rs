//! Request descriptors
//!
//! Provides [`ApiRequest`], the caller-side description of one remote
//! operation: verb, path, base name and optional JSON payload.

use crate::action::ActionType;
use crate::error::ProtocolError;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// HTTP-like verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    /// Canonical upper-case name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(ProtocolError::UnknownVerb(s.to_string())),
        }
    }
}

/// One remote operation to issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    /// Verb
    pub verb: Verb,
    /// Absolute API path, e.g. `/api/sources/ZTF21aaa`
    pub path: String,
    /// Base operation name used to label outcomes
    pub action: ActionType,
    /// JSON body
    pub payload: Option<Value>,
    /// Entity this request addresses
    pub target: Option<String>,
}

impl ApiRequest {
    /// Create request without payload
    #[inline]
    #[must_use]
    pub fn new(verb: Verb, path: impl Into<String>, action: ActionType) -> Self {
        Self {
            verb,
            path: path.into(),
            action,
            payload: None,
            target: None,
        }
    }

    /// GET request
    #[inline]
    #[must_use]
    pub fn get(path: impl Into<String>, action: ActionType) -> Self {
        Self::new(Verb::Get, path, action)
    }

    /// POST request
    #[inline]
    #[must_use]
    pub fn post(path: impl Into<String>, action: ActionType, payload: Option<Value>) -> Self {
        let mut request = Self::new(Verb::Post, path, action);
        request.payload = payload;
        request
    }

    /// PUT request
    #[inline]
    #[must_use]
    pub fn put(path: impl Into<String>, action: ActionType, payload: Value) -> Self {
        Self::new(Verb::Put, path, action).with_payload(payload)
    }

    /// DELETE request
    #[inline]
    #[must_use]
    pub fn delete(path: impl Into<String>, action: ActionType) -> Self {
        Self::new(Verb::Delete, path, action)
    }

    /// With JSON payload
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// With target entity
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}
