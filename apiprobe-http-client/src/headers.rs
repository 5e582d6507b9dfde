//! Process-wide header set.

use crate::{HttpClientError, Result};
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Headers sent with every request of one dispatcher.
///
/// Names are case-insensitive. Per-call headers are layered on top with
/// [`HeaderSet::merged_with`] and win on collision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderSet {
    headers: HeaderMap,
}

impl HeaderSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// `Content-Type: application/json` plus the given user agent.
    pub fn builtin(user_agent: &str) -> Result<Self> {
        let mut set = Self::new();
        set.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        set.headers.insert(USER_AGENT, parse_value(user_agent)?);
        Ok(set)
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<()> {
        self.headers.insert(parse_name(name)?, parse_value(value)?);
        Ok(())
    }

    /// Remove a header; absent names are ignored.
    pub fn remove(&mut self, name: &str) {
        if let Ok(name) = HeaderName::try_from(name) {
            self.headers.remove(name);
        }
    }

    pub fn clear(&mut self) {
        self.headers.clear();
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn as_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// This set overlaid with `overrides`.
    pub fn merged_with(&self, overrides: &HeaderMap) -> HeaderMap {
        let mut merged = self.headers.clone();
        for name in overrides.keys() {
            merged.remove(name);
        }
        for (name, value) in overrides {
            merged.append(name.clone(), value.clone());
        }
        merged
    }
}

pub(crate) fn parse_name(name: &str) -> Result<HeaderName> {
    HeaderName::try_from(name).map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))
}

pub(crate) fn parse_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::try_from(value)
        .map_err(|e| HttpClientError::InvalidHeader(format!("{value:?}: {e}")))
}

/// Header map as a name → value JSON object, for logs and attachments.
pub(crate) fn to_json(headers: &HeaderMap) -> serde_json::Value {
    let map = headers
        .iter()
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.as_str().to_string(), serde_json::Value::String(value))
        })
        .collect();
    serde_json::Value::Object(map)
}
