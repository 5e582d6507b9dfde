//! Response record.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::{HttpClientError, Result};

/// A received response, immutable once built.
///
/// The body is kept raw; a JSON parse is attempted once and a failure simply
/// leaves [`ResponseRecord::json_body`] empty.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    parsed: Option<Value>,
    elapsed: Duration,
    url: String,
    attempts: u32,
}

impl ResponseRecord {
    /// Build a record from its parts; used by the dispatcher and by tests.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let parsed = serde_json::from_slice(&body).ok();
        Self {
            status,
            headers: HeaderMap::new(),
            body,
            parsed,
            elapsed: Duration::ZERO,
            url: String::new(),
            attempts: 1,
        }
    }

    /// Record with a serialized JSON body.
    pub fn from_json(status: StatusCode, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub(crate) async fn from_reqwest(
        response: reqwest::Response,
        elapsed_since: std::time::Instant,
    ) -> std::result::Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await?;

        Ok(Self::new(status, body)
            .with_headers(headers)
            .with_url(url)
            .with_elapsed(elapsed_since.elapsed()))
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the status is a client or server error (4xx/5xx).
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Final URL, after redirects.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Time taken by the final attempt, from send to end of body.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Attempts the dispatcher made for this response.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parsed body, if it was valid JSON.
    pub fn json_body(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    /// Deserialize the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| HttpClientError::Json(e.to_string()))
    }

    /// Pretty JSON when the body parsed, raw text otherwise.
    pub fn body_display(&self) -> String {
        match &self.parsed {
            Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| self.text()),
            None => self.text(),
        }
    }

    /// Error for a 4xx/5xx status.
    pub fn error_for_status(&self) -> Option<HttpClientError> {
        self.is_error().then(|| HttpClientError::Status {
            status: self.status,
            url: self.url.clone(),
            body: self.text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_body_is_best_effort() {
        let ok = ResponseRecord::new(StatusCode::OK, r#"{"token": "abc"}"#);
        assert_eq!(ok.json_body(), Some(&json!({"token": "abc"})));

        let html = ResponseRecord::new(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(html.json_body().is_none());
        assert_eq!(html.body_display(), "<html>bad gateway</html>");
        assert!(html.json::<Value>().is_err());
    }

    #[test]
    fn test_error_for_status() {
        let record = ResponseRecord::new(StatusCode::NOT_FOUND, "missing").with_url("http://x/a");
        match record.error_for_status() {
            Some(HttpClientError::Status { status, url, body }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(url, "http://x/a");
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(ResponseRecord::new(StatusCode::CREATED, "").error_for_status().is_none());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "42".parse().unwrap());
        let record = ResponseRecord::new(StatusCode::OK, "").with_headers(headers);
        assert_eq!(record.header("X-Request-Id"), Some("42"));
    }
}
