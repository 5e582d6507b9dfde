//! Suite runner
//!
//! Executes registered test cases against the active environment, optionally
//! in parallel workers, and collects a [`TestReport`].

use apiprobe_config::{EnvironmentProfile, Settings};
use apiprobe_http_client::{Dispatcher, RequestBuilder};
use apiprobe_report::{Attachment, AttachmentSink, CaseReport, MemorySink, Outcome, TestReport};
use chrono::Utc;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{CaseError, RunnerError};
use crate::filter::TagExpr;

/// Boxed future returned by test case bodies.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of one test case run.
pub type CaseResult = Result<(), CaseError>;

type CaseBody = Arc<dyn for<'a> Fn(&'a mut Context) -> BoxFuture<'a, CaseResult> + Send + Sync>;

/// A named, tagged test case.
///
/// # Examples
///
/// ```
/// use apiprobe_testing::{TestCase, assertions};
///
/// let case = TestCase::new("health", |ctx| {
///     Box::pin(async move {
///         let response = ctx.get("/health").send().await?;
///         assertions::status_code(&response, 200)?;
///         Ok(())
///     })
/// })
/// .with_tag("smoke");
///
/// assert_eq!(case.name(), "health");
/// ```
#[derive(Clone)]
pub struct TestCase {
    name: String,
    tags: Vec<String>,
    body: CaseBody,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, CaseResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            body: Arc::new(body),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// State handed to a running test case.
///
/// The dispatcher is a per-run clone of the worker's dispatcher: it shares
/// the worker's connection pool, while header changes stay local to the run.
pub struct Context {
    name: String,
    dispatcher: Dispatcher,
    settings: Arc<Settings>,
    sink: Arc<MemorySink>,
}

impl Context {
    fn new(name: &str, base: &Dispatcher, settings: Arc<Settings>) -> Self {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = base.clone().with_sink(sink.clone());
        Self {
            name: name.to_string(),
            dispatcher,
            settings,
            sink,
        }
    }

    /// Name of the running case.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Profile of the environment under test.
    pub fn profile(&self) -> &EnvironmentProfile {
        self.settings.active_profile()
    }

    /// Add an attachment to this case's report entry.
    pub fn attach(&self, attachment: Attachment) {
        self.sink.attach(attachment);
    }

    pub fn get(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.dispatcher.get(path)
    }

    pub fn post(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.dispatcher.post(path)
    }

    pub fn put(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.dispatcher.put(path)
    }

    pub fn patch(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.dispatcher.patch(path)
    }

    pub fn delete(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        self.dispatcher.delete(path)
    }
}

/// Runner configuration.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Parallel workers; 0 runs every case on the calling task.
    pub workers: usize,
    /// Extra runs allowed for a failing case.
    pub reruns: u32,
    pub tags: Option<TagExpr>,
    /// Substring filters on case names; empty selects everything.
    pub names: Vec<String>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn reruns(mut self, reruns: u32) -> Self {
        self.reruns = reruns;
        self
    }

    pub fn tags(mut self, expr: TagExpr) -> Self {
        self.tags = Some(expr);
        self
    }

    /// Parse and set a tag expression such as `smoke and not slow`.
    pub fn with_mark(self, expression: &str) -> Result<Self, RunnerError> {
        Ok(self.tags(TagExpr::parse(expression)?))
    }

    pub fn name_filter(mut self, filter: impl Into<String>) -> Self {
        self.names.push(filter.into());
        self
    }

    pub fn name_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(filters.into_iter().map(Into::into));
        self
    }

    /// Whether `case` passes both the name and tag filters.
    pub fn selects(&self, case: &TestCase) -> bool {
        let name_ok = self.names.is_empty() || self.names.iter().any(|n| case.name.contains(n));
        let tags_ok = self.tags.as_ref().is_none_or(|expr| expr.matches(&case.tags));
        name_ok && tags_ok
    }
}

/// Executes test cases and builds the run report.
pub struct Runner {
    settings: Arc<Settings>,
    config: RunConfig,
}

impl Runner {
    pub fn new(settings: Settings, config: RunConfig) -> Self {
        Self {
            settings: Arc::new(settings),
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Cases that would run, in registration order.
    pub fn select<'c>(&self, cases: &'c [TestCase]) -> Vec<&'c TestCase> {
        cases.iter().filter(|c| self.config.selects(c)).collect()
    }

    /// Run `cases` and return the report, ordered as registered.
    ///
    /// Cases excluded by the filters appear as `skipped`.
    pub async fn run(&self, cases: Vec<TestCase>) -> Result<TestReport, RunnerError> {
        let mut report = TestReport::new(self.settings.environment().as_str());
        let start = Instant::now();

        let mut results: Vec<(usize, CaseReport)> = Vec::with_capacity(cases.len());
        let mut queue = VecDeque::new();
        for (index, case) in cases.into_iter().enumerate() {
            if self.config.selects(&case) {
                queue.push_back((index, case));
            } else {
                debug!(case = %case.name, "Skipping case");
                results.push((
                    index,
                    CaseReport::new(&case.name, Outcome::Skipped)
                        .with_tags(case.tags.clone())
                        .with_runs(0),
                ));
            }
        }

        info!(
            environment = %report.environment,
            base_url = %self.settings.active_profile().base_url,
            selected = queue.len(),
            skipped = results.len(),
            workers = self.config.workers,
            "Starting test run"
        );

        if self.config.workers == 0 {
            let dispatcher = Dispatcher::from_settings(&self.settings)?;
            for (index, case) in queue {
                let case_report =
                    run_case(&case, &dispatcher, &self.settings, self.config.reruns).await;
                results.push((index, case_report));
            }
        } else {
            results.extend(self.run_parallel(queue).await?);
        }

        results.sort_by_key(|(index, _)| *index);
        for (_, case_report) in results {
            report.add(case_report);
        }
        report.duration_secs = start.elapsed().as_secs_f64();

        info!(
            total = report.total(),
            passed = report.passed(),
            failed = report.failed(),
            errors = report.errored(),
            skipped = report.skipped(),
            duration_secs = report.duration_secs,
            "Test run finished"
        );

        Ok(report)
    }

    async fn run_parallel(
        &self,
        queue: VecDeque<(usize, TestCase)>,
    ) -> Result<Vec<(usize, CaseReport)>, RunnerError> {
        let worker_count = self.config.workers.min(queue.len()).max(1);

        // Each worker owns its dispatcher and connection pool.
        let dispatchers = (0..worker_count)
            .map(|_| Dispatcher::from_settings(&self.settings))
            .collect::<Result<Vec<_>, _>>()?;

        let queue = Arc::new(Mutex::new(queue));
        let mut handles = Vec::with_capacity(worker_count);

        for (worker, dispatcher) in dispatchers.into_iter().enumerate() {
            let queue = queue.clone();
            let settings = self.settings.clone();
            let reruns = self.config.reruns;

            handles.push(tokio::spawn(async move {
                let mut done = Vec::new();
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((index, case)) = next else {
                        break;
                    };
                    debug!(worker, case = %case.name, "Worker picked case");
                    done.push((index, run_case(&case, &dispatcher, &settings, reruns).await));
                }
                done
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            let done = handle
                .await
                .map_err(|e| RunnerError::Worker(e.to_string()))?;
            results.extend(done);
        }
        Ok(results)
    }
}

async fn run_case(
    case: &TestCase,
    dispatcher: &Dispatcher,
    settings: &Arc<Settings>,
    reruns: u32,
) -> CaseReport {
    let started_at = Utc::now();
    let start = Instant::now();
    let max_runs = reruns.saturating_add(1);
    let mut runs = 0;

    let (outcome, message, attachments) = loop {
        runs += 1;
        info!(case = %case.name, run = runs, "Running case");

        let ctx = Context::new(&case.name, dispatcher, settings.clone());
        let sink = ctx.sink.clone();
        let (outcome, message) = execute(case, ctx).await;
        let attachments = sink.take();

        if outcome == Outcome::Passed || runs >= max_runs {
            break (outcome, message, attachments);
        }
        warn!(
            case = %case.name,
            run = runs,
            max_runs,
            reason = message.as_deref().unwrap_or_default(),
            "Case did not pass, rerunning"
        );
    };

    let duration = start.elapsed();
    log_outcome(&case.name, outcome, message.as_deref(), duration);

    let mut case_report = CaseReport::new(&case.name, outcome)
        .with_tags(case.tags.clone())
        .with_started_at(started_at)
        .with_duration(duration)
        .with_runs(runs)
        .with_attachments(attachments);
    if let Some(message) = message {
        case_report = case_report.with_message(message);
    }
    case_report
}

/// Run the body on its own task so a panic is reported instead of
/// tearing down the worker.
async fn execute(case: &TestCase, mut ctx: Context) -> (Outcome, Option<String>) {
    let body = case.body.clone();
    let joined = tokio::spawn(async move { body(&mut ctx).await }).await;

    match joined {
        Ok(Ok(())) => (Outcome::Passed, None),
        Ok(Err(e)) if e.is_assertion() => (Outcome::Failed, Some(e.to_string())),
        Ok(Err(e)) => (Outcome::Error, Some(e.to_string())),
        Err(e) if e.is_panic() => (
            Outcome::Error,
            Some(format!("Case panicked: {}", panic_message(e.into_panic()))),
        ),
        Err(e) => (Outcome::Error, Some(format!("Case aborted: {}", e))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn log_outcome(name: &str, outcome: Outcome, message: Option<&str>, duration: Duration) {
    let elapsed_ms = duration.as_millis() as u64;
    match outcome {
        Outcome::Passed => info!(case = %name, elapsed_ms, "PASSED"),
        Outcome::Failed => warn!(
            case = %name,
            elapsed_ms,
            reason = message.unwrap_or_default(),
            "FAILED"
        ),
        _ => error!(
            case = %name,
            elapsed_ms,
            reason = message.unwrap_or_default(),
            "ERROR"
        ),
    }
}
