//! Source page operations
//!
//! One method per remote endpoint used by the source page. Each returns the
//! terminal [`OperationEnvelope`]; only `fetch_source` outcomes are folded
//! into the source slice, the rest are for the caller to display.

use crate::attachment::{encode_attachment, FileInput};
use crate::dispatch::RequestInitiator;
use crate::error::ClientError;
use serde_json::{Map, Value};
use sky_protocol::action::{
    ADD_CLASSIFICATION, ADD_COMMENT, ADD_SOURCE_VIEW, DELETE_CLASSIFICATION, DELETE_COMMENT,
    DELETE_FOLLOWUP_REQUEST, EDIT_FOLLOWUP_REQUEST, FETCH_LOADED_SOURCE, SAVE_SOURCE,
    SUBMIT_FOLLOWUP_REQUEST, UPLOAD_PHOTOMETRY,
};
use sky_protocol::{path, ApiRequest, OperationEnvelope};
use std::fmt;
use std::sync::Arc;

/// Fields forwarded to the follow-up request endpoints
pub const FOLLOWUP_REQUEST_FIELDS: &[&str] = &[
    "obj_id",
    "instrument_id",
    "start_date",
    "end_date",
    "filters",
    "exposure_time",
    "priority",
];

/// New comment on a source
#[derive(Clone)]
pub struct CommentForm {
    fields: Map<String, Value>,
    attachment: Option<Arc<dyn FileInput>>,
}

impl CommentForm {
    /// Create comment on `obj_id`
    #[must_use]
    pub fn new(obj_id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("obj_id".into(), Value::String(obj_id.into()));
        fields.insert("text".into(), Value::String(text.into()));
        Self {
            fields,
            attachment: None,
        }
    }

    /// With extra form field (e.g. `group_ids`)
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// With file attachment
    #[must_use]
    pub fn with_attachment(mut self, file: Arc<dyn FileInput>) -> Self {
        self.attachment = Some(file);
        self
    }

    /// Check if the form carries a file
    #[inline]
    #[must_use]
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }
}

impl fmt::Debug for CommentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentForm")
            .field("fields", &self.fields)
            .field("attachment", &self.attachment.as_ref().map(|a| a.name().to_string()))
            .finish()
    }
}

/// Parameters of a follow-up request form
///
/// The form may hold display-only fields (`instrument_name`); only
/// [`FOLLOWUP_REQUEST_FIELDS`] are sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowupRequestParams {
    fields: Map<String, Value>,
}

impl FollowupRequestParams {
    /// Create empty params
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With field
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Request body
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let payload: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(name, _)| FOLLOWUP_REQUEST_FIELDS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Value::Object(payload)
    }
}

impl From<Map<String, Value>> for FollowupRequestParams {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Source page operations over any [`RequestInitiator`]
#[derive(Clone)]
pub struct SourceActions {
    initiator: Arc<dyn RequestInitiator>,
}

impl SourceActions {
    /// Create actions issuing through `initiator`
    #[must_use]
    pub fn new(initiator: Arc<dyn RequestInitiator>) -> Self {
        Self { initiator }
    }

    /// Fetch one source; the outcome replaces the displayed snapshot
    ///
    /// # Errors
    /// - `ClientError::Protocol` if `id` is not a valid path segment
    pub async fn fetch_source(&self, id: &str) -> Result<OperationEnvelope, ClientError> {
        let request = ApiRequest::get(path::source(id)?, FETCH_LOADED_SOURCE).with_target(id);
        Ok(self.initiator.issue(request).await)
    }

    /// Save a source to groups
    pub async fn save_source(&self, payload: Value) -> OperationEnvelope {
        self.initiator
            .post(path::SOURCES.to_string(), SAVE_SOURCE, Some(payload))
            .await
    }

    /// Record a page view
    ///
    /// # Errors
    /// - `ClientError::Protocol` if `id` is not a valid path segment
    pub async fn add_source_view(&self, id: &str) -> Result<OperationEnvelope, ClientError> {
        let path = path::resource(path::SOURCE_VIEWS, id)?;
        let request = ApiRequest::post(path, ADD_SOURCE_VIEW, None).with_target(id);
        Ok(self.initiator.issue(request).await)
    }

    /// Add a classification
    pub async fn add_classification(&self, payload: Value) -> OperationEnvelope {
        self.initiator
            .post(path::CLASSIFICATION.to_string(), ADD_CLASSIFICATION, Some(payload))
            .await
    }

    /// Delete a classification
    ///
    /// # Errors
    /// - `ClientError::Protocol` if `id` is not a valid path segment
    pub async fn delete_classification(&self, id: &str) -> Result<OperationEnvelope, ClientError> {
        let path = path::resource(path::CLASSIFICATION, id)?;
        Ok(self.initiator.delete(path, DELETE_CLASSIFICATION).await)
    }

    /// Add a comment, encoding its attachment first
    ///
    /// With an attachment the POST is issued only after the file has been
    /// read; if reading fails nothing is sent.
    ///
    /// # Errors
    /// - `ClientError::Encode` if the attachment cannot be read
    pub async fn add_comment(&self, form: CommentForm) -> Result<OperationEnvelope, ClientError> {
        let CommentForm {
            mut fields,
            attachment,
        } = form;

        if let Some(file) = attachment {
            let encoded = encode_attachment(file.as_ref()).await?;
            fields.insert("attachment".into(), encoded.to_value());
        }

        Ok(self
            .initiator
            .post(path::COMMENT.to_string(), ADD_COMMENT, Some(Value::Object(fields)))
            .await)
    }

    /// Delete a comment
    ///
    /// # Errors
    /// - `ClientError::Protocol` if `id` is not a valid path segment
    pub async fn delete_comment(&self, id: &str) -> Result<OperationEnvelope, ClientError> {
        let path = path::resource(path::COMMENT, id)?;
        Ok(self.initiator.delete(path, DELETE_COMMENT).await)
    }

    /// Submit a follow-up request
    pub async fn submit_followup_request(
        &self,
        params: &FollowupRequestParams,
    ) -> OperationEnvelope {
        self.initiator
            .post(
                path::FOLLOWUP_REQUEST.to_string(),
                SUBMIT_FOLLOWUP_REQUEST,
                Some(params.to_payload()),
            )
            .await
    }

    /// Edit a follow-up request
    ///
    /// # Errors
    /// - `ClientError::Protocol` if `id` is not a valid path segment
    pub async fn edit_followup_request(
        &self,
        params: &FollowupRequestParams,
        id: &str,
    ) -> Result<OperationEnvelope, ClientError> {
        let path = path::resource(path::FOLLOWUP_REQUEST, id)?;
        Ok(self
            .initiator
            .put(path, EDIT_FOLLOWUP_REQUEST, params.to_payload())
            .await)
    }

    /// Delete a follow-up request
    ///
    /// # Errors
    /// - `ClientError::Protocol` if `id` is not a valid path segment
    pub async fn delete_followup_request(
        &self,
        id: &str,
    ) -> Result<OperationEnvelope, ClientError> {
        let path = path::resource(path::FOLLOWUP_REQUEST, id)?;
        Ok(self.initiator.delete(path, DELETE_FOLLOWUP_REQUEST).await)
    }

    /// Upload photometry points
    pub async fn upload_photometry(&self, payload: Value) -> OperationEnvelope {
        self.initiator
            .post(path::PHOTOMETRY.to_string(), UPLOAD_PHOTOMETRY, Some(payload))
            .await
    }
}

impl fmt::Debug for SourceActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceActions").finish_non_exhaustive()
    }
}
