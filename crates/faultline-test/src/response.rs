//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use faultline_core::{Envelope, ErrorBody};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;

/// A test response with helper methods for assertions.
///
/// Besides the usual status and header accessors it understands the
/// `{"success": ..., "data" | "error": ...}` envelope, so tests can assert on
/// `error_id()` and `error_message()` directly.
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Creates a new test response from an HTTP response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body cannot be collected.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: http_body_util::BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body: body_bytes,
        })
    }

    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the status is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns true if the status is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON Value.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Parses the body as a response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::NotEnvelope`] if the body is not an envelope.
    pub fn envelope(&self) -> Result<Envelope, TestError> {
        serde_json::from_slice(&self.body).map_err(|e| TestError::NotEnvelope(e.to_string()))
    }

    /// Returns `true` if the body is an envelope with `success: true`.
    #[must_use]
    pub fn is_success_envelope(&self) -> bool {
        self.envelope().is_ok_and(|envelope| envelope.success)
    }

    /// Returns the `data` of a success envelope.
    #[must_use]
    pub fn data(&self) -> Option<serde_json::Value> {
        self.envelope().ok().and_then(|envelope| envelope.data)
    }

    /// Returns the `error` section of a failure envelope.
    #[must_use]
    pub fn error_body(&self) -> Option<ErrorBody> {
        self.envelope().ok().and_then(|envelope| envelope.error)
    }

    /// Returns `error.id` of a failure envelope.
    #[must_use]
    pub fn error_id(&self) -> Option<String> {
        self.error_body().map(|error| error.id)
    }

    /// Returns `error.message` of a failure envelope.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error_body().map(|error| error.message)
    }

    // Assertion methods

    /// Asserts that the status code equals the expected u16 value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status.as_u16(),
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(
            actual, expected,
            "Header '{name}': expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that the body is a failure envelope with the given error id.
    ///
    /// # Panics
    ///
    /// Panics if the body is not a failure envelope or the id differs.
    pub fn assert_error_id(&self, expected: &str) -> &Self {
        let actual = self.error_id();
        assert_eq!(
            actual.as_deref(),
            Some(expected),
            "Expected error id '{expected}', body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}
