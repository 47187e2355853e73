//! Wire envelope shared by success and failure responses.
//!
//! ```json
//! {"success": true, "data": {...}}
//! {"success": false, "error": {"id": "...", "message": "...", "meta": {...}, "trace_id": "...", "user_id": "..."}}
//! ```

use crate::error::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload of a successful response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error details of a failed response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Error section of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error key, or `internal_error` when redacted.
    pub id: String,
    /// Localized or generic message.
    pub message: String,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
    /// Correlation id of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Caller id of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Envelope {
    /// Wraps a successful payload.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Wraps an error body.
    #[must_use]
    pub fn failure(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Serializes the envelope to JSON bytes.
    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl ErrorBody {
    /// Creates an error body; empty `meta`, `trace_id` and `user_id` are
    /// dropped from the wire form.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        meta: Metadata,
        trace_id: &str,
        user_id: &str,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            meta: (!meta.is_empty()).then_some(meta),
            trace_id: (!trace_id.is_empty()).then(|| trace_id.to_string()),
            user_id: (!user_id.is_empty()).then(|| user_id.to_string()),
        }
    }
}
