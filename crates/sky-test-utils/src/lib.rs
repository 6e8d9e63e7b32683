//! Testing utilities for the source sync workspace
//!
//! Scripted transports, controllable file inputs and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sky_client::{ApiResponse, FileInput, Transport, TransportError};
use sky_protocol::ApiRequest;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

/// One-shot latch: tasks wait until it is opened
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, ordered record of what happened
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

/// Scripted answer to one request
#[derive(Debug, Clone)]
pub enum Reply {
    /// `{"status": "success", "data": ...}`
    Success(Value),
    /// `{"status": "error", "message": ...}`
    Error(String),
    /// Network failure
    Fail,
    /// Wait for the gate, then answer
    Gated(Gate, Box<Reply>),
}

impl Reply {
    pub fn gated(gate: &Gate, reply: Reply) -> Self {
        Reply::Gated(gate.clone(), Box::new(reply))
    }
}

/// Transport answering from per-path scripts
///
/// Requests to a path pop that path's script in FIFO order; once empty, the
/// default reply is used. Every request is logged as `"<VERB> <path>"`.
#[derive(Debug)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    default: Reply,
    log: CallLog,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default: Reply::Success(json!({})),
            log: CallLog::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_default(mut self, reply: Reply) -> Self {
        self.default = reply;
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Queue a reply for `path`
    pub fn on(self, path: &str, reply: Reply) -> Self {
        self.scripts
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.log.push(format!("{} {}", request.verb, request.path));
        self.requests.lock().push(request.clone());

        let mut reply = self
            .scripts
            .lock()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default.clone());

        loop {
            match reply {
                Reply::Success(data) => return Ok(ApiResponse::success(data)),
                Reply::Error(message) => return Ok(ApiResponse::error(message)),
                Reply::Fail => return Err(TransportError::Network("connection refused".into())),
                Reply::Gated(gate, inner) => {
                    gate.wait().await;
                    reply = *inner;
                }
            }
        }
    }
}

/// File whose read blocks until its gate opens
///
/// Logs `"read <name>"` when the read starts and `"read done <name>"` when
/// it completes.
#[derive(Debug, Clone)]
pub struct GatedFile {
    name: String,
    bytes: Vec<u8>,
    gate: Gate,
    log: CallLog,
}

impl GatedFile {
    pub fn new(name: &str, bytes: impl Into<Vec<u8>>, gate: Gate, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            bytes: bytes.into(),
            gate,
            log,
        }
    }
}

#[async_trait]
impl FileInput for GatedFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        self.log.push(format!("read {}", self.name));
        self.gate.wait().await;
        self.log.push(format!("read done {}", self.name));
        Ok(self.bytes.clone())
    }
}

/// File that cannot be read
#[derive(Debug, Clone)]
pub struct FailingFile {
    name: String,
}

impl FailingFile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl FileInput for FailingFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read denied",
        ))
    }
}

/// Source record as served by `GET /api/sources/{id}`
pub fn source_fixture(id: &str) -> Value {
    json!({
        "id": id,
        "ra": 234.22,
        "dec": -22.33,
        "redshift": 0.05,
        "comments": [],
        "classifications": [],
        "followup_requests": [],
        "groups": [{"id": 1, "name": "Program A"}],
    })
}

/// Source path for `id`
pub fn source_path(id: &str) -> String {
    format!("/api/sources/{id}")
}
