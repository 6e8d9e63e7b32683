//! Error types for the client
//!
//! Remote rejections and unreachable servers are *outcomes*, carried by
//! [`OperationEnvelope`](sky_protocol::OperationEnvelope). The types here
//! cover what fails on this side of the wire:
//! - Building a request (bad identifiers)
//! - Reading an attachment
//! - Loading configuration
//! - Transport setup and the raw transport result

use sky_protocol::ProtocolError;
use sky_state::StoreError;
use std::path::PathBuf;

/// Main client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Request could not be described
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// State registry wiring failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Attachment could not be encoded; nothing was sent
    #[error("attachment error: {0}")]
    Encode(#[from] EncodeError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport could not be built
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Connection probe exhausted its attempts
    #[error("server unreachable after {attempts} attempts")]
    Unreachable { attempts: u32 },

    /// Server answered the probe with an error
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl ClientError {
    /// Check if re-issuing the same action may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::Network(_) | TransportError::Timeout { .. })
                | Self::Unreachable { .. }
        )
    }
}

/// Raw transport errors
///
/// The dispatcher folds every one of these into a transport failure outcome.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, reset
    #[error("network error: {0}")]
    Network(String),

    /// No response in time
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Response body is not an API envelope
    #[error("malformed response (HTTP {status}): {detail}")]
    MalformedResponse { status: u16, detail: String },
}

/// Attachment encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// File could not be read
    #[error("failed to read '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Body is not a `data:...;base64,` URL
    #[error("not a base64 data URL")]
    NotDataUrl,

    /// Body is not valid base64
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Base URL is empty or not http(s)
    #[error("invalid base url '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),

    /// Log filter directive rejected
    #[error("invalid log filter '{filter}': {detail}")]
    LogFilter { filter: String, detail: String },
}
