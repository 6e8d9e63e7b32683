//! Error types for the protocol layer
//!
//! Only descriptor construction can fail here. Remote outcomes are never
//! errors at this level; they travel as [`Resolution`](crate::Resolution)
//! values inside an envelope.

/// Errors raised while building or parsing protocol descriptors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Identifier cannot be embedded in a request path
    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier {
        /// Offending identifier
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Verb string is not one of GET, POST, PUT, DELETE
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// Action name is not a known base operation name
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl ProtocolError {
    /// Create invalid identifier error
    #[inline]
    pub fn invalid_identifier(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
            reason,
        }
    }
}
