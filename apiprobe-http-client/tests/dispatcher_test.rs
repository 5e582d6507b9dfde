//! Dispatcher behavior against a local mock server.

use apiprobe_http_client::{
    Dispatcher, DispatcherConfig, HttpClientError, Method, RequestDescriptor, RetryPolicy,
    StatusCode,
};
use apiprobe_report::MemorySink;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(server: &MockServer, max_attempts: u32) -> Dispatcher {
    Dispatcher::new(
        DispatcherConfig::builder()
            .base_url(server.uri())
            .retry(RetryPolicy::new(max_attempts, Duration::from_millis(5)))
            .build(),
    )
    .unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

#[tokio::test]
async fn test_retries_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
        .mount(&server)
        .await;

    let response = dispatcher(&server, 3).get("/api/users").send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.attempts(), 3);
    assert_eq!(response.json_body(), Some(&json!({"users": []})));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server, 3);

    match dispatcher.get("/health").send().await {
        Err(HttpClientError::Status { status, body, .. }) => {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body, "busy");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(request_count(&server).await, 3);

    let response = dispatcher
        .get("/health")
        .allow_error_status()
        .send()
        .await
        .unwrap();
    assert_eq!(response.status_code(), 503);
    assert_eq!(response.attempts(), 3);
}

#[tokio::test]
async fn test_non_retryable_status_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad creds"})))
        .mount(&server)
        .await;

    let response = dispatcher(&server, 4)
        .post("/api/login")
        .json(&json!({"username": "u", "password": "wrong"}))
        .allow_error_status()
        .send()
        .await
        .unwrap();

    assert_eq!(response.status_code(), 401);
    assert_eq!(response.attempts(), 1);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_body_is_resent_on_retry() {
    let server = MockServer::start().await;
    let payload = json!({"name": "alice"});
    Mock::given(method("POST"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let response = dispatcher(&server, 2)
        .post("/api/users")
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status_code(), 201);
    assert_eq!(response.attempts(), 2);
}

#[tokio::test]
async fn test_header_merge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut dispatcher = dispatcher(&server, 1);
    dispatcher.add_header("X-Trace", "1").unwrap();

    dispatcher
        .get("/api/items")
        .header("Content-Type", "text/plain")
        .send()
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    assert_eq!(headers.get("x-trace").unwrap(), "1");
    assert!(
        headers
            .get("user-agent")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("apiprobe/")
    );
}

#[tokio::test]
async fn test_cleared_headers_are_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut dispatcher = dispatcher(&server, 1);
    dispatcher.clear_headers();
    dispatcher.get("/").send().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("x-trace").is_none());
    assert!(requests[0].headers.get("user-agent").is_none());
}

#[tokio::test]
async fn test_query_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let response = dispatcher(&server, 1)
        .get("/api/users")
        .query("page", 2)
        .bearer_auth("abc")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status_code(), 200);
    assert!(response.url().ends_with("/api/users?page=2"));
}

#[tokio::test]
async fn test_timeout_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let result = dispatcher(&server, 2)
        .get("/slow")
        .timeout(Duration::from_millis(50))
        .send()
        .await;

    let error = result.unwrap_err();
    assert!(error.is_timeout());
    assert_eq!(error.attempts(), Some(2));
}

#[tokio::test]
async fn test_default_timeout_applies_without_per_call_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(
        DispatcherConfig::builder()
            .base_url(server.uri())
            .timeout(Duration::from_millis(50))
            .retry(RetryPolicy::new(1, Duration::from_millis(5)))
            .build(),
    )
    .unwrap();

    let error = dispatcher.get("/slow").send().await.unwrap_err();
    assert!(error.is_timeout());
}

#[tokio::test]
async fn test_per_call_timeout_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(
        DispatcherConfig::builder()
            .base_url(server.uri())
            .timeout(Duration::from_millis(50))
            .retry(RetryPolicy::new(1, Duration::from_millis(5)))
            .build(),
    )
    .unwrap();

    let response = dispatcher
        .get("/slow")
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dispatcher = Dispatcher::new(
        DispatcherConfig::builder()
            .base_url(format!("http://{}", addr))
            .retry(RetryPolicy::new(3, Duration::from_millis(1)))
            .build(),
    )
    .unwrap();

    match dispatcher.send(RequestDescriptor::new(Method::GET, "/")).await {
        Err(HttpClientError::Transport { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exchange_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let dispatcher = dispatcher(&server, 1).with_sink(Arc::new(sink.clone()));

    dispatcher
        .post("/api/login")
        .json(&json!({"username": "test_user"}))
        .send()
        .await
        .unwrap();

    let names: Vec<_> = sink.take().into_iter().map(|a| a.name).collect();
    assert_eq!(
        names,
        [
            "Request URL",
            "Request method",
            "Request body",
            "Response headers",
            "Response body",
            "Response time"
        ]
    );
}
