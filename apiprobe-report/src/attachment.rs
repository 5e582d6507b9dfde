//! Per-request report attachments.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named artifact attached to the report of the running test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name, e.g. `Request URL`.
    pub name: String,
    /// MIME type of `body`.
    pub content_type: String,
    pub body: String,
}

impl Attachment {
    /// Plain-text attachment.
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: "text/plain".to_string(),
            body: body.into(),
        }
    }

    /// JSON attachment, pretty-printed.
    pub fn json(name: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            name: name.into(),
            content_type: "application/json".to_string(),
            body: serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        }
    }

    /// File extension matching the content type.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "application/json" => "json",
            _ => "txt",
        }
    }
}

/// Destination for report attachments.
///
/// Attaching never affects control flow; implementations must not fail.
pub trait AttachmentSink: Send + Sync {
    fn attach(&self, attachment: Attachment);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AttachmentSink for NullSink {
    fn attach(&self, _attachment: Attachment) {}
}

/// Sink that keeps attachments in memory until they are taken.
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Attachment>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything attached so far.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.entries.lock().clone()
    }

    /// Drain the buffer, leaving it empty for the next test case.
    pub fn take(&self) -> Vec<Attachment> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl AttachmentSink for MemorySink {
    fn attach(&self, attachment: Attachment) {
        self.entries.lock().push(attachment);
    }
}
