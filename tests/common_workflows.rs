//! Integration tests for common apiprobe workflows.
//!
//! These tests verify that the most common use cases work correctly.

use apiprobe::http::RetryPolicy;
use apiprobe::prelude::*;
use apiprobe::report::Outcome;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Dispatcher
// =============================================================================

#[tokio::test]
async fn test_retry_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(
        apiprobe::DispatcherConfig::builder()
            .base_url(server.uri())
            .retry(RetryPolicy::new(3, Duration::from_millis(5)))
            .build(),
    )
    .unwrap();

    let response = dispatcher.get("/flaky").send().await.unwrap();
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.attempts(), 3);
    assertions::json_contains(&response, &json!({"ok": true})).unwrap();
}

#[tokio::test]
async fn test_header_precedence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("content-type", "text/plain"))
        .and(header("x-trace", "1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let settings = Settings::default().with_base_url(server.uri());
    let mut dispatcher = Dispatcher::from_settings(&settings).unwrap();
    dispatcher.add_header("X-Trace", "1").unwrap();

    let response = dispatcher
        .post("/echo")
        .header("Content-Type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status_code(), 200);
}

// =============================================================================
// Assertions and diff
// =============================================================================

#[test]
fn test_json_equal_order_sensitivity() {
    let expected = json!({"a": 1, "b": [1, 2]});
    let actual = json!({"a": 1, "b": [2, 1]});

    let failure = assertions::json_equal(&actual, &expected, false).unwrap_err();
    assert!(failure.diff.is_some());
    assert!(assertions::json_equal(&actual, &expected, true).is_ok());
}

#[test]
fn test_volatile_paths_ignored() {
    let expected = json!({"id": 1, "timestamp": "2024-01-01", "name": "alice"});
    let actual = json!({"id": 99, "timestamp": "2025-06-30", "name": "alice"});
    assert!(assertions::json_equal(&actual, &expected, false).is_ok());
}

// =============================================================================
// Runner and reports
// =============================================================================

#[tokio::test]
async fn test_run_and_write_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "up"})))
        .mount(&server)
        .await;

    let cases = vec![
        TestCase::new("health", |ctx| {
            Box::pin(async move {
                let response = ctx.get("/health").send().await?;
                assertions::status_code(&response, 200)?;
                assertions::json_contains(&response, &json!({"status": "up"}))?;
                Ok(())
            })
        })
        .with_tag("smoke"),
        TestCase::new("slow_path", |_ctx| Box::pin(async { Ok(()) })).with_tag("slow"),
    ];

    let settings = Settings::default().with_base_url(server.uri());
    let config = RunConfig::new().with_mark("not slow").unwrap();
    let report = Runner::new(settings, config).run(cases).await.unwrap();

    assert_eq!(report.cases[0].outcome, Outcome::Passed);
    assert_eq!(report.cases[1].outcome, Outcome::Skipped);
    assert!(report.all_passed());

    let dir = tempfile::tempdir().unwrap();
    let written = apiprobe::ReportWriter::new(dir.path())
        .write(&report, apiprobe::ReportFormat::Html)
        .unwrap();
    let html = std::fs::read_to_string(written).unwrap();
    assert!(html.contains("health"));
}
