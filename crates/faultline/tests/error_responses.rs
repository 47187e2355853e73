//! End-to-end behaviour of the assembled pipeline.

use std::sync::Arc;

use faultline::prelude::*;
use faultline_core::keys;
use faultline_test::TestClient;
use parking_lot::Mutex;
use serde_json::json;

fn teapot() -> ErrorDefinition {
    ErrorDefinition::new("teapot", 418, "I'm a teapot")
        .with_translation("en", "I'm a teapot")
        .with_translation("fr", "Je suis une théière")
        .exposed()
}

fn production() -> Faultline {
    let mut config = FaultlineConfig::default();
    config.headers.read_accept_language = true;
    Faultline::builder(config)
        .definition(teapot())
        .definition(ErrorDefinition::new("db_timeout", 503, "Database timed out"))
        .definition(ErrorDefinition::new(keys::VALIDATION_ERROR, 400, "Validation failed").exposed())
        .build()
        .unwrap()
}

#[tokio::test]
async fn handler_panic_becomes_internal_error() {
    let faultline = production();
    let client = TestClient::panicking(Arc::clone(faultline.pipeline()), "index out of bounds");

    let response = client
        .get("/orders")
        .header("X-Trace-ID", "abc")
        .header("X-User-ID", "123")
        .send()
        .await;

    response.assert_status_code(500).assert_error_id("internal_error");
    assert!(!response.is_success_envelope());

    let error = response.error_body().unwrap();
    assert_eq!(error.trace_id.as_deref(), Some("abc"));
    assert_eq!(error.user_id.as_deref(), Some("123"));
    assert_eq!(error.message, "unexpected server error");
}

#[tokio::test]
async fn teapot_is_localized_by_accept_language() {
    let faultline = production();
    let client = TestClient::failing(Arc::clone(faultline.pipeline()), || {
        ApiError::new(418, "teapot", "short and stout")
    });

    let french = client.get("/brew").accept_language("fr").send().await;
    french.assert_status_code(418).assert_error_id("teapot");
    assert_eq!(french.error_message().as_deref(), Some("Je suis une théière"));

    let german = client.get("/brew").accept_language("de").send().await;
    german.assert_status_code(418).assert_error_id("teapot");
    assert_eq!(german.error_message().as_deref(), Some("I'm a teapot"));
}

#[tokio::test]
async fn validation_error_carries_fields() {
    let faultline = production();
    let client = TestClient::failing(Arc::clone(faultline.pipeline()), || {
        ApiError::validation([("email", "required")])
    });

    let response = client.post("/users").json(&json!({})).send().await;

    response
        .assert_status_code(400)
        .assert_error_id(keys::VALIDATION_ERROR);
    let meta = response.error_body().unwrap().meta.unwrap();
    assert_eq!(meta["fields"], json!({"email": "required"}));
}

#[tokio::test]
async fn unexposed_error_is_redacted_but_keeps_status() {
    let faultline = production();
    let client = TestClient::failing(Arc::clone(faultline.pipeline()), || {
        ApiError::new(503, "db_timeout", "pool exhausted after 30s")
    });

    let response = client.get("/reports").send().await;

    response.assert_status_code(503).assert_error_id("internal_error");
    assert_eq!(
        response.error_message().as_deref(),
        Some("unexpected server error")
    );
}

#[tokio::test]
async fn development_mode_exposes_everything() {
    let faultline = Faultline::builder(FaultlineConfig::development())
        .definition(ErrorDefinition::new("db_timeout", 503, "Database timed out"))
        .build()
        .unwrap();
    let client = TestClient::failing(Arc::clone(faultline.pipeline()), || {
        ApiError::new(503, "db_timeout", "pool exhausted after 30s")
    });

    let response = client.get("/reports").send().await;

    response.assert_status_code(503).assert_error_id("db_timeout");
    assert_eq!(
        response.error_message().as_deref(),
        Some("Database timed out")
    );
}

#[tokio::test]
async fn unclassified_failure_becomes_unknown_error() {
    let faultline = Faultline::bootstrap(FaultlineConfig::development()).unwrap();
    let emitter = Arc::clone(faultline.emitter());
    let client = TestClient::new(Arc::clone(faultline.pipeline()), move |scope, _request| {
        let response =
            emitter.respond::<(), _>(&scope, Err(anyhow::anyhow!("connection reset by peer")));
        async move { response }
    });

    let response = client.get("/sync").send().await;

    response
        .assert_status_code(500)
        .assert_error_id(keys::UNKNOWN_ERROR);
}

#[tokio::test]
async fn success_is_wrapped_in_envelope() {
    let faultline = production();
    let client = TestClient::succeeding(
        Arc::clone(faultline.pipeline()),
        json!({"id": 7, "name": "kettle"}),
    );

    let response = client.get("/kettles/7").send().await;

    response.assert_status_code(200);
    assert!(response.is_success_envelope());
    assert_eq!(response.data().unwrap()["name"], "kettle");
    assert_eq!(response.content_type(), Some("application/json"));
}

#[tokio::test]
async fn observer_sees_true_key_and_status() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let faultline = Faultline::builder(FaultlineConfig::default())
        .definition(ErrorDefinition::new("db_timeout", 503, "Database timed out"))
        .observer(move |key: &str, code: u16| sink.lock().push((key.to_string(), code)))
        .build()
        .unwrap();
    let client = TestClient::failing(Arc::clone(faultline.pipeline()), || {
        ApiError::new(503, "db_timeout", "pool exhausted")
    });

    client.get("/reports").send().await.assert_error_id("internal_error");

    assert_eq!(*seen.lock(), vec![("db_timeout".to_string(), 503)]);
}

#[tokio::test]
async fn concurrent_requests_keep_their_own_context() {
    let faultline = production();
    let client = Arc::new(TestClient::failing(Arc::clone(faultline.pipeline()), || {
        ApiError::new(418, "teapot", "short and stout")
    }));

    let mut handles = Vec::new();
    for i in 0..16 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            let trace = format!("trace-{i}");
            let response = client.get("/brew").trace_id(&trace).send().await;
            (trace, response.error_body().unwrap().trace_id)
        }));
    }

    for handle in handles {
        let (sent, received) = handle.await.unwrap();
        assert_eq!(received.as_deref(), Some(sent.as_str()));
    }
}

#[test]
fn internal_error_keeps_its_cause() {
    let err = ApiError::internal(anyhow::anyhow!("disk quota exceeded"), None);

    let found = find_api_error(&err).unwrap();
    assert_eq!(found.key(), "internal_error");
    assert_eq!(found.cause().unwrap().to_string(), "disk quota exceeded");

    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "disk quota exceeded");
}

#[test]
fn wrapped_api_error_is_found_through_context() {
    let err = anyhow::Error::new(ApiError::forbidden("not your order"))
        .context("loading order 42");

    assert!(is_key(&*err, keys::FORBIDDEN));
    let api = normalize(err);
    assert_eq!(api.code(), 403);
}
