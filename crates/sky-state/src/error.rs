//! Error types for the state registry

/// State registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A reducer is already installed under this slice name
    #[error("slice already registered: {0}")]
    SliceAlreadyRegistered(String),
}
