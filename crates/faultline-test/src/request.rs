//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use faultline_middleware::Request;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use http_body_util::Full;
use serde::Serialize;

/// A test request that can be sent to a [`TestClient`](crate::TestClient).
#[derive(Debug)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Converts this request to a pipeline request.
    pub fn into_http_request(self) -> Request {
        let mut request = http::Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;
        request
    }
}

/// Builder for constructing test requests.
///
/// Invalid header names or values are remembered and reported by
/// [`build`](Self::build), so the chain never panics half-way.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Sets a header on the request.
    ///
    /// # Example
    ///
    /// ```
    /// use faultline_test::TestRequest;
    ///
    /// let request = TestRequest::get("/users")
    ///     .header("X-Trace-ID", "abc")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(request.headers["x-trace-id"], "abc");
    /// ```
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => {
                self.error = Some(TestError::InvalidHeader(format!("{}: {e}", name.as_ref())));
                return self;
            }
        };
        match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => {
                self.error = Some(TestError::InvalidHeader(format!("{name}: {e}")));
            }
        }
        self
    }

    /// Sets a typed header on the request.
    pub fn header_typed(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the `X-Trace-ID` header.
    pub fn trace_id(self, trace_id: impl AsRef<str>) -> Self {
        self.header("x-trace-id", trace_id)
    }

    /// Sets the `X-User-ID` header.
    pub fn user_id(self, user_id: impl AsRef<str>) -> Self {
        self.header("x-user-id", user_id)
    }

    /// Sets the `Accept-Language` header.
    pub fn accept_language(self, language: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT_LANGUAGE.as_str(), language)
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(TestError::Json(e));
                }
                self
            }
        }
    }

    /// Builds the test request.
    ///
    /// # Errors
    ///
    /// Returns the first invalid header or body error, or an invalid URI.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
        })
    }
}
