//! Run and case results.

use crate::Attachment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final outcome of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// An assertion did not hold.
    Failed,
    /// The case could not run to completion (transport, setup, status errors).
    Error,
    /// Filtered out by name or tag.
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::Error => "error",
            Outcome::Skipped => "skipped",
        }
    }
}

/// Report entry for one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    /// Self-contained failure message.
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    /// Number of runs, including reruns.
    pub runs: u32,
    pub attachments: Vec<Attachment>,
}

impl CaseReport {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            outcome,
            message: None,
            started_at: Utc::now(),
            duration_secs: 0.0,
            runs: 1,
            attachments: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_secs = duration.as_secs_f64();
        self
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// End of the case in epoch milliseconds.
    pub fn stopped_at_millis(&self) -> i64 {
        self.started_at.timestamp_millis() + (self.duration_secs * 1000.0) as i64
    }
}

/// Results of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    /// Environment the run targeted.
    pub environment: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub cases: Vec<CaseReport>,
}

impl TestReport {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            started_at: Utc::now(),
            duration_secs: 0.0,
            cases: Vec::new(),
        }
    }

    pub fn add(&mut self, case: CaseReport) {
        self.cases.push(case);
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.cases.iter().filter(|c| c.outcome == outcome).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Outcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn errored(&self) -> usize {
        self.count(Outcome::Error)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// True when nothing failed or errored.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && self.errored() == 0
    }
}
