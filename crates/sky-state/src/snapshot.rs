//! Entity snapshot
//!
//! Observable state of the currently displayed source.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Load error state of the snapshot
///
/// Serializes the way dashboards expect it: `false` before any load attempt,
/// `""` after a successful load, the message otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadError {
    /// No load attempted yet
    #[default]
    NotAttempted,
    /// Last fetch succeeded
    Cleared,
    /// Last fetch failed with this message
    Message(String),
}

impl LoadError {
    /// Get message, if the last fetch failed
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            LoadError::Message(message) => Some(message),
            _ => None,
        }
    }
}

impl Serialize for LoadError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LoadError::NotAttempted => serializer.serialize_bool(false),
            LoadError::Cleared => serializer.serialize_str(""),
            LoadError::Message(message) => serializer.serialize_str(message),
        }
    }
}

/// In-memory representation of the currently displayed source
///
/// `fields` and `load_error` are independent: a stale snapshot may coexist
/// with a later error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSnapshot {
    /// Id of the loaded source
    #[serde(rename = "id")]
    pub identity: Option<String>,
    /// Every attribute of the last successful fetch
    pub fields: Map<String, Value>,
    /// Last fetch error
    pub load_error: LoadError,
    /// Sequence of the latest issued fetch (issue-order mode only)
    #[serde(skip)]
    pub latest_issued: Option<u64>,
}

impl SourceSnapshot {
    /// Check if a source is loaded
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.identity.is_some()
    }

    /// Check if `id` is the loaded source
    #[inline]
    #[must_use]
    pub fn is_showing(&self, id: &str) -> bool {
        self.identity.as_deref() == Some(id)
    }

    /// Get one attribute
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_state() {
        let snapshot = SourceSnapshot::default();
        assert!(!snapshot.is_loaded());
        assert!(!snapshot.is_showing("S1"));
        assert_eq!(snapshot.load_error, LoadError::NotAttempted);
    }

    #[test]
    fn load_error_serializes_like_dashboard_state() {
        assert_eq!(serde_json::to_value(LoadError::NotAttempted).unwrap(), json!(false));
        assert_eq!(serde_json::to_value(LoadError::Cleared).unwrap(), json!(""));
        assert_eq!(
            serde_json::to_value(LoadError::Message("Source not found".into())).unwrap(),
            json!("Source not found")
        );
    }

    #[test]
    fn snapshot_serializes_without_bookkeeping() {
        let snapshot = SourceSnapshot {
            identity: Some("S1".into()),
            fields: json!({"ra": 10.5}).as_object().cloned().unwrap(),
            load_error: LoadError::Cleared,
            latest_issued: Some(4),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({"id": "S1", "fields": {"ra": 10.5}, "loadError": ""})
        );
    }
}
