//! Report attachments and run reports for apiprobe.
//!
//! The dispatcher pushes per-request [`Attachment`]s into an
//! [`AttachmentSink`]; the runner collects them into a [`TestReport`] which
//! [`ReportWriter`] renders as HTML, JUnit XML, or an Allure result directory.

mod attachment;
mod error;
mod report;
mod writer;

pub use attachment::{Attachment, AttachmentSink, MemorySink, NullSink};
pub use error::{ReportError, Result};
pub use report::{CaseReport, Outcome, TestReport};
pub use writer::{ReportFormat, ReportWriter, render_html, render_junit, write_allure};
