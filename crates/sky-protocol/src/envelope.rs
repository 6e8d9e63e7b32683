//! Operation envelopes
//!
//! An [`OperationEnvelope`] correlates one issued request with its outcome.
//! The pending envelope and the terminal envelope of the same operation share
//! `id`, `sequence`, `action` and `target`; only the [`Resolution`] differs.

use crate::action::{ActionType, OperationKind};
use serde::Serialize;
use serde_json::Value;
use ulid::Ulid;

/// Correlation id of one operation (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OperationId(pub Ulid);

impl OperationId {
    /// Generate new operation ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an operation resolved
///
/// Only `Ok` and `ApplicationError` carry data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Resolution {
    /// Still in flight
    Pending,
    /// Server data
    Ok(Value),
    /// Server-authored message, display ready
    ApplicationError(String),
    /// Request never produced a well-formed response
    TransportFailure,
}

impl Resolution {
    /// Get kind of this resolution
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Resolution::Pending => OperationKind::Pending,
            Resolution::Ok(_) => OperationKind::Ok,
            Resolution::ApplicationError(_) => OperationKind::ApplicationError,
            Resolution::TransportFailure => OperationKind::TransportFailure,
        }
    }
}

/// Correlation unit between an issued request and its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationEnvelope {
    /// Correlation id
    pub id: OperationId,
    /// Issuance order, assigned by the dispatcher
    pub sequence: u64,
    /// Base operation name
    pub action: ActionType,
    /// Entity the operation addresses, if any
    pub target: Option<String>,
    /// Outcome
    pub resolution: Resolution,
}

impl OperationEnvelope {
    /// Create envelope with a fresh id and sequence zero
    #[inline]
    #[must_use]
    pub fn new(action: ActionType, resolution: Resolution) -> Self {
        Self {
            id: OperationId::new(),
            sequence: 0,
            action,
            target: None,
            resolution,
        }
    }

    /// Create pending envelope
    #[inline]
    #[must_use]
    pub fn pending(action: ActionType) -> Self {
        Self::new(action, Resolution::Pending)
    }

    /// Create OK envelope
    #[inline]
    #[must_use]
    pub fn ok(action: ActionType, data: Value) -> Self {
        Self::new(action, Resolution::Ok(data))
    }

    /// Create application error envelope
    #[inline]
    #[must_use]
    pub fn application_error(action: ActionType, message: impl Into<String>) -> Self {
        Self::new(action, Resolution::ApplicationError(message.into()))
    }

    /// Create transport failure envelope
    #[inline]
    #[must_use]
    pub fn transport_failure(action: ActionType) -> Self {
        Self::new(action, Resolution::TransportFailure)
    }

    /// With issuance sequence
    #[inline]
    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// With target entity
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Terminal envelope for the same operation
    #[must_use]
    pub fn resolve(&self, resolution: Resolution) -> Self {
        Self {
            id: self.id,
            sequence: self.sequence,
            action: self.action,
            target: self.target.clone(),
            resolution,
        }
    }

    /// Get outcome kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.resolution.kind()
    }

    /// Get full label (`BASE`, `BASE_OK`, `BASE_ERROR`, `BASE_FAIL`)
    #[inline]
    #[must_use]
    pub fn label(&self) -> String {
        self.action.label(self.kind())
    }

    /// Check if this envelope is `action` with outcome `kind`
    #[inline]
    #[must_use]
    pub fn is(&self, action: ActionType, kind: OperationKind) -> bool {
        self.action == action && self.kind() == kind
    }

    /// Server data, present only on OK
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match &self.resolution {
            Resolution::Ok(data) => Some(data),
            _ => None,
        }
    }

    /// Server message, present only on application error
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::ApplicationError(message) => Some(message),
            _ => None,
        }
    }
}
