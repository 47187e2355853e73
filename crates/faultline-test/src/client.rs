//! Test client for in-memory pipeline testing.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use faultline_core::{ApiError, RequestContext};
use faultline_middleware::{BoxFuture, Pipeline, Request, Response, ResponseEmitter};
use http::Method;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Handler function type for test client.
pub type TestHandler =
    Arc<dyn Fn(RequestContext, Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// A test client that sends requests through a [`Pipeline`] in memory.
///
/// The handler receives the [`RequestContext`] populated by the trace-context
/// stage, so it can answer with [`ResponseEmitter::respond`].
///
/// # Example
///
/// ```
/// use faultline_core::{ApiError, DefinitionCatalog, ExecutionMode, LocalizationResolver};
/// use faultline_middleware::{Pipeline, ResponseEmitter};
/// use faultline_test::TestClient;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let resolver = Arc::new(LocalizationResolver::new(Arc::new(DefinitionCatalog::new())));
/// let emitter = Arc::new(ResponseEmitter::new(resolver, ExecutionMode::Development));
/// let pipeline = Arc::new(Pipeline::builder(emitter).build());
///
/// let client = TestClient::failing(pipeline, || ApiError::not_found("user_not_found", "no such user"));
/// let response = client.get("/users/1").trace_id("abc").send().await;
///
/// assert_eq!(response.status_code(), 404);
/// assert_eq!(response.error_id().as_deref(), Some("user_not_found"));
/// # });
/// ```
#[must_use]
pub struct TestClient {
    pipeline: Arc<Pipeline>,
    handler: TestHandler,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a test client with a handler function.
    pub fn new<F, Fut>(pipeline: Arc<Pipeline>, handler: F) -> Self
    where
        F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            pipeline,
            handler: Arc::new(move |scope, request| -> BoxFuture<'static, Response> {
                Box::pin(handler(scope, request))
            }),
            default_headers: Vec::new(),
        }
    }

    /// Creates a test client whose handler always succeeds with `data`.
    pub fn succeeding<T>(pipeline: Arc<Pipeline>, data: T) -> Self
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        let emitter = Arc::clone(pipeline.emitter());
        Self::new(pipeline, move |scope, _request| {
            let response = emitter.respond::<T, ApiError>(&scope, Ok(data.clone()));
            async move { response }
        })
    }

    /// Creates a test client whose handler always fails with `make_error()`.
    pub fn failing<F>(pipeline: Arc<Pipeline>, make_error: F) -> Self
    where
        F: Fn() -> ApiError + Send + Sync + 'static,
    {
        let emitter = Arc::clone(pipeline.emitter());
        Self::new(pipeline, move |scope, _request| {
            let response = emitter.respond::<(), _>(&scope, Err(make_error()));
            async move { response }
        })
    }

    /// Creates a test client whose handler panics with `message`.
    pub fn panicking(pipeline: Arc<Pipeline>, message: &'static str) -> Self {
        Self::new(pipeline, move |_scope, _request| async move { explode(message) })
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the pipeline's emitter.
    #[must_use]
    pub fn emitter(&self) -> &Arc<ResponseEmitter> {
        self.pipeline.emitter()
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    async fn send_internal(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let handler = Arc::clone(&self.handler);
        let response = self
            .pipeline
            .handle(request.into_http_request(), move |ctx, request| {
                handler(ctx.to_request_context(), request)
            })
            .await;
        TestResponse::from_http(response).await
    }
}

fn explode(message: &str) -> Response {
    panic!("{message}")
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("pipeline", &self.pipeline)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let mut builder = builder;
        for (name, value) in &client.default_headers {
            builder = builder.header(name, value);
        }
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `X-Trace-ID` header.
    pub fn trace_id(mut self, trace_id: impl AsRef<str>) -> Self {
        self.builder = self.builder.trace_id(trace_id);
        self
    }

    /// Sets the `X-User-ID` header.
    pub fn user_id(mut self, user_id: impl AsRef<str>) -> Self {
        self.builder = self.builder.user_id(user_id);
        self
    }

    /// Sets the `Accept-Language` header.
    pub fn accept_language(mut self, language: impl AsRef<str>) -> Self {
        self.builder = self.builder.accept_language(language);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(self) -> TestResponse {
        self.try_send().await.expect("request should succeed")
    }

    /// Sends the request and returns a Result.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the request cannot be built or the body cannot
    /// be read.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send_internal(request).await
    }
}
