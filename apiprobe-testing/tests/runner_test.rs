//! Runner behavior against a local mock server.

use apiprobe_config::Settings;
use apiprobe_report::Outcome;
use apiprobe_testing::prelude::*;
use apiprobe_testing::{RunConfig, Runner};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default().with_base_url(server.uri());
    settings.max_retries = 0;
    settings.backoff_base = Duration::from_millis(5);
    settings
}

async fn mock_users(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "users": [{"id": 1, "username": "admin"}]
        })))
        .mount(server)
        .await;
}

fn list_users(name: &str) -> TestCase {
    TestCase::new(name, |ctx| {
        Box::pin(async move {
            let response = ctx.get("/api/users").send().await?;
            assertions::status_code(&response, 200)?;
            assertions::json_contains(&response, &json!({"page": 1}))?;
            Ok(())
        })
    })
}

#[tokio::test]
async fn test_outcomes_and_attachments() {
    let server = MockServer::start().await;
    mock_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let cases = vec![
        list_users("list_users").with_tag("smoke"),
        TestCase::new("wrong_page", |ctx| {
            Box::pin(async move {
                let response = ctx.get("/api/users").send().await?;
                assertions::json_contains(&response, &json!({"page": 2}))?;
                Ok(())
            })
        }),
        TestCase::new("missing_resource", |ctx| {
            Box::pin(async move {
                ctx.get("/api/missing").send().await?;
                Ok(())
            })
        }),
    ];

    let report = Runner::new(settings(&server), RunConfig::new())
        .run(cases)
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.cases[0].outcome, Outcome::Passed);
    assert_eq!(report.cases[0].tags, vec!["smoke".to_string()]);
    assert_eq!(report.cases[1].outcome, Outcome::Failed);
    assert!(report.cases[1].message.as_deref().unwrap().contains("page"));
    assert_eq!(report.cases[2].outcome, Outcome::Error);
    assert!(report.cases[2].message.as_deref().unwrap().contains("404"));
    assert!(!report.all_passed());

    let names: Vec<_> = report.cases[0]
        .attachments
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert!(names.contains(&"Request URL"));
    assert!(names.contains(&"Response body"));
}

#[tokio::test]
async fn test_reruns_until_pass() {
    let server = MockServer::start().await;
    mock_users(&server).await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let flaky = TestCase::new("flaky", move |ctx| {
        let counter = counter.clone();
        Box::pin(async move {
            let response = ctx.get("/api/users").send().await?;
            let run = counter.fetch_add(1, Ordering::SeqCst);
            assertions::is_true(run >= 1, "second run")?;
            assertions::status_code(&response, 200)?;
            Ok(())
        })
    });

    let report = Runner::new(settings(&server), RunConfig::new().reruns(2))
        .run(vec![flaky])
        .await
        .unwrap();

    assert_eq!(report.cases[0].outcome, Outcome::Passed);
    assert_eq!(report.cases[0].runs, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // Only the final run's exchange is attached.
    let urls = report.cases[0]
        .attachments
        .iter()
        .filter(|a| a.name == "Request URL")
        .count();
    assert_eq!(urls, 1);
}

#[tokio::test]
async fn test_reruns_exhausted() {
    let server = MockServer::start().await;

    let always_failing = TestCase::new("always_failing", |_ctx| {
        Box::pin(async { Err(CaseError::setup("fixture unavailable")) })
    });

    let report = Runner::new(settings(&server), RunConfig::new().reruns(1))
        .run(vec![always_failing])
        .await
        .unwrap();

    assert_eq!(report.cases[0].outcome, Outcome::Error);
    assert_eq!(report.cases[0].runs, 2);
}

#[tokio::test]
async fn test_filtered_cases_are_skipped() {
    let server = MockServer::start().await;
    mock_users(&server).await;

    let cases = vec![
        list_users("list_users").with_tags(["smoke", "users"]),
        list_users("list_users_again").with_tag("users"),
        list_users("login_smoke").with_tag("smoke"),
    ];

    let config = RunConfig::new()
        .with_mark("smoke")
        .unwrap()
        .name_filter("list");
    let report = Runner::new(settings(&server), config)
        .run(cases)
        .await
        .unwrap();

    let outcomes: Vec<_> = report.cases.iter().map(|c| c.outcome).collect();
    assert_eq!(
        outcomes,
        vec![Outcome::Passed, Outcome::Skipped, Outcome::Skipped]
    );
    assert_eq!(report.cases[1].runs, 0);
    assert!(report.all_passed());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_parallel_workers_keep_registration_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"page": 1}))
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&server)
        .await;

    let cases: Vec<_> = (0..8).map(|i| list_users(&format!("case_{}", i))).collect();

    let report = Runner::new(settings(&server), RunConfig::new().workers(3))
        .run(cases)
        .await
        .unwrap();

    assert_eq!(report.passed(), 8);
    let names: Vec<_> = report.cases.iter().map(|c| c.name.clone()).collect();
    let expected: Vec<_> = (0..8).map(|i| format!("case_{}", i)).collect();
    assert_eq!(names, expected);
    assert_eq!(server.received_requests().await.unwrap().len(), 8);
}

#[tokio::test]
async fn test_header_changes_stay_within_case() {
    let server = MockServer::start().await;
    mock_users(&server).await;

    let cases = vec![
        TestCase::new("with_token", |ctx| {
            Box::pin(async move {
                ctx.dispatcher_mut()
                    .add_header("Authorization", "Bearer abc")?;
                ctx.get("/api/users").send().await?;
                Ok(())
            })
        }),
        list_users("without_token"),
    ];

    let report = Runner::new(settings(&server), RunConfig::new())
        .run(cases)
        .await
        .unwrap();
    assert!(report.all_passed());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "Bearer abc"
    );
    assert!(requests[1].headers.get("authorization").is_none());
}
