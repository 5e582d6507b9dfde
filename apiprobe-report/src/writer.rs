//! Report writers.

use crate::{CaseReport, Outcome, ReportError, Result, TestReport};
use serde_json::json;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format of a run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Single self-contained HTML page.
    #[default]
    Html,
    /// JUnit-style XML.
    Xml,
    /// Allure result directory (`*-result.json` plus attachment files).
    Allure,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "html" => Ok(ReportFormat::Html),
            "xml" | "junit" => Ok(ReportFormat::Xml),
            "allure" => Ok(ReportFormat::Allure),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Writes a [`TestReport`] into a report directory.
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write the report and return the path of the main artifact.
    pub fn write(&self, report: &TestReport, format: ReportFormat) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = match format {
            ReportFormat::Html => {
                let path = self.dir.join(format!("report_{}.html", report.environment));
                fs::write(&path, render_html(report))?;
                path
            }
            ReportFormat::Xml => {
                let path = self.dir.join(format!("report_{}.xml", report.environment));
                fs::write(&path, render_junit(report))?;
                path
            }
            ReportFormat::Allure => {
                let dir = self.dir.join("allure-results");
                write_allure(report, &dir)?;
                dir
            }
        };

        tracing::info!(path = %path.display(), "Report written");
        Ok(path)
    }
}

/// Render a self-contained HTML report.
pub fn render_html(report: &TestReport) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>API test report ({env})</title>\n\
         <style>\
         body{{font-family:sans-serif;margin:2em}}\
         table{{border-collapse:collapse;width:100%}}\
         td,th{{border:1px solid #ccc;padding:4px 8px;text-align:left;vertical-align:top}}\
         .passed{{color:#2e7d32}}.failed{{color:#c62828}}.error{{color:#ef6c00}}.skipped{{color:#757575}}\
         pre{{white-space:pre-wrap;margin:0}}\
         </style>\n</head>\n<body>\n<h1>API test report</h1>\n",
        env = escape(&report.environment)
    );
    let _ = writeln!(
        html,
        "<p>Environment: <b>{}</b> &middot; {} total, {} passed, {} failed, {} errors, {} skipped &middot; {:.2}s</p>",
        escape(&report.environment),
        report.total(),
        report.passed(),
        report.failed(),
        report.errored(),
        report.skipped(),
        report.duration_secs
    );
    html.push_str("<table>\n<tr><th>Case</th><th>Tags</th><th>Outcome</th><th>Time</th><th>Details</th></tr>\n");

    for case in &report.cases {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td class=\"{outcome}\">{outcome}</td><td>{:.3}s</td><td>",
            escape(&case.name),
            escape(&case.tags.join(", ")),
            case.duration_secs,
            outcome = case.outcome.as_str(),
        );
        if let Some(message) = &case.message {
            let _ = write!(html, "<pre>{}</pre>", escape(message));
        }
        for attachment in &case.attachments {
            let _ = write!(
                html,
                "<details><summary>{}</summary><pre>{}</pre></details>",
                escape(&attachment.name),
                escape(&attachment.body)
            );
        }
        html.push_str("</td></tr>\n");
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Render a JUnit-style XML report.
pub fn render_junit(report: &TestReport) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        xml,
        "<testsuite name=\"apiprobe.{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\" timestamp=\"{}\">",
        escape(&report.environment),
        report.total(),
        report.failed(),
        report.errored(),
        report.skipped(),
        report.duration_secs,
        report.started_at.to_rfc3339()
    );

    for case in &report.cases {
        let _ = write!(
            xml,
            "  <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\"",
            escape(&case.name),
            escape(&classname(case)),
            case.duration_secs
        );
        let message = case.message.as_deref().unwrap_or_default();
        match case.outcome {
            Outcome::Passed => xml.push_str("/>\n"),
            Outcome::Skipped => xml.push_str("><skipped/></testcase>\n"),
            Outcome::Failed | Outcome::Error => {
                let tag = if case.outcome == Outcome::Failed {
                    "failure"
                } else {
                    "error"
                };
                let first_line = message.lines().next().unwrap_or_default();
                let _ = write!(
                    xml,
                    ">\n    <{tag} message=\"{}\">{}</{tag}>\n",
                    escape(first_line),
                    escape(message)
                );
                if !case.attachments.is_empty() {
                    xml.push_str("    <system-out>");
                    for attachment in &case.attachments {
                        let _ = write!(
                            xml,
                            "{}:\n{}\n",
                            escape(&attachment.name),
                            escape(&attachment.body)
                        );
                    }
                    xml.push_str("</system-out>\n");
                }
                xml.push_str("  </testcase>\n");
            }
        }
    }

    xml.push_str("</testsuite>\n");
    xml
}

/// Write one Allure result file per case, with attachments alongside.
pub fn write_allure(report: &TestReport, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    for case in &report.cases {
        let id = uuid::Uuid::new_v4();
        let mut attachments = Vec::with_capacity(case.attachments.len());

        for attachment in &case.attachments {
            let source = format!(
                "{}-attachment.{}",
                uuid::Uuid::new_v4(),
                attachment.extension()
            );
            fs::write(dir.join(&source), &attachment.body)?;
            attachments.push(json!({
                "name": attachment.name,
                "source": source,
                "type": attachment.content_type,
            }));
        }

        let mut labels: Vec<_> = case
            .tags
            .iter()
            .map(|tag| json!({"name": "tag", "value": tag}))
            .collect();
        labels.push(json!({"name": "suite", "value": classname(case)}));

        let result = json!({
            "uuid": id.to_string(),
            "name": case.name,
            "fullName": case.name,
            "status": allure_status(case.outcome),
            "statusDetails": {"message": case.message},
            "stage": "finished",
            "start": case.started_at.timestamp_millis(),
            "stop": case.stopped_at_millis(),
            "labels": labels,
            "parameters": [{"name": "environment", "value": report.environment}],
            "attachments": attachments,
        });

        let body = serde_json::to_string_pretty(&result)?;
        fs::write(dir.join(format!("{}-result.json", id)), body)?;
    }

    Ok(())
}

fn allure_status(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "passed",
        Outcome::Failed => "failed",
        Outcome::Error => "broken",
        Outcome::Skipped => "skipped",
    }
}

/// Case names are `group::case`; the group becomes the class/suite name.
fn classname(case: &CaseReport) -> String {
    match case.name.rsplit_once("::") {
        Some((group, _)) => group.to_string(),
        None => "apiprobe".to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
