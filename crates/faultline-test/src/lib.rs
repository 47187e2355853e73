//! # Faultline Test
//!
//! Test utilities for Faultline: requests go through a real
//! [`Pipeline`](faultline_middleware::Pipeline) in memory, without binding a
//! port, and responses come back with envelope-aware assertions.
//!
//! ## Example
//!
//! ```ignore
//! use faultline_test::TestClient;
//!
//! #[tokio::test]
//! async fn panics_become_internal_errors() {
//!     let client = TestClient::panicking(pipeline, "boom");
//!
//!     let response = client
//!         .get("/orders")
//!         .trace_id("abc")
//!         .user_id("123")
//!         .send()
//!         .await;
//!
//!     response.assert_status_code(500).assert_error_id("internal_error");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/faultline-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, TestHandler};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
