//! Attachment encoding
//!
//! Files travel inline as base64 data URLs inside the JSON body. Reading the
//! file is the only suspension point; there is no retry.

use crate::error::EncodeError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Content type used when none can be determined
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A user-selected file
#[async_trait]
pub trait FileInput: Send + Sync {
    /// Original file name
    fn name(&self) -> &str;

    /// MIME type
    fn content_type(&self) -> &str {
        DEFAULT_CONTENT_TYPE
    }

    /// Read whole content
    async fn read_bytes(&self) -> std::io::Result<Vec<u8>>;
}

/// File on local disk
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    content_type: &'static str,
}

impl LocalFile {
    /// Create input for `path`; content type is inferred from the extension
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for(&path);
        Self {
            path,
            name,
            content_type,
        }
    }

    /// Get path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileInput for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        self.content_type
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// File already held in memory
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    /// Create input from bytes
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            bytes: bytes.into(),
        }
    }

    /// With explicit content type
    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

#[async_trait]
impl FileInput for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Encoded file, ready to embed in a request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// `data:<content-type>;base64,<payload>`
    pub body: String,
    /// Original file name
    pub name: String,
}

impl Attachment {
    /// JSON form `{"body": ..., "name": ...}`
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "body": self.body, "name": self.name })
    }

    /// Decoded file content
    ///
    /// # Errors
    /// See [`decode_data_url`].
    pub fn decode(&self) -> Result<Vec<u8>, EncodeError> {
        decode_data_url(&self.body)
    }
}

/// Read and encode a file
///
/// # Errors
/// - `EncodeError::Read` if the file cannot be read
pub async fn encode_attachment(file: &dyn FileInput) -> Result<Attachment, EncodeError> {
    let bytes = file.read_bytes().await.map_err(|source| EncodeError::Read {
        name: file.name().to_string(),
        source,
    })?;

    tracing::debug!(name = file.name(), size = bytes.len(), "attachment encoded");
    Ok(Attachment {
        body: format!("data:{};base64,{}", file.content_type(), STANDARD.encode(&bytes)),
        name: file.name().to_string(),
    })
}

/// Recover bytes from a base64 data URL
///
/// # Errors
/// - `EncodeError::NotDataUrl` if the prefix is not `data:...;base64,`
/// - `EncodeError::Base64` if the payload is not valid base64
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, EncodeError> {
    let rest = url.strip_prefix("data:").ok_or(EncodeError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(EncodeError::NotDataUrl)?;
    if !header.ends_with(";base64") {
        return Err(EncodeError::NotDataUrl);
    }
    Ok(STANDARD.decode(payload)?)
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" | "dat" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "fits" | "fit" => "application/fits",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
