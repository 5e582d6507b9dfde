//! Dispatcher implementation.

use apiprobe_config::Settings;
use apiprobe_report::{Attachment, AttachmentSink, NullSink};
use bytes::Bytes;
use http::{HeaderMap, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::headers::{self, HeaderSet};
use crate::{
    DispatcherConfig, HttpClientError, RequestBody, RequestBuilder, RequestDescriptor,
    ResponseRecord, Result,
};

/// Sends requests against one base URL with retry, logging and report
/// attachments.
///
/// Owns one connection pool and one mutable header set. Cloning shares the
/// pool; parallel workers should each build their own dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    inner: reqwest::Client,
    config: DispatcherConfig,
    headers: HeaderSet,
    sink: Arc<dyn AttachmentSink>,
}

impl Dispatcher {
    /// Create a dispatcher with the given configuration.
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .build()
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
        let headers = HeaderSet::builtin(&config.user_agent)?;

        Ok(Self {
            inner,
            config,
            headers,
            sink: Arc::new(NullSink),
        })
    }

    /// Dispatcher for the active profile of `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(DispatcherConfig::from_settings(settings))
    }

    /// Send attachments to `sink` instead of dropping them.
    pub fn with_sink(mut self, sink: Arc<dyn AttachmentSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn set_sink(&mut self, sink: Arc<dyn AttachmentSink>) {
        self.sink = sink;
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Add or replace a header for all later requests.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.headers.insert(name, value)
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    /// Drop every header, built-in ones included.
    pub fn clear_headers(&mut self) {
        self.headers.clear();
    }

    pub fn get(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, path.into())
    }

    pub fn post(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, path.into())
    }

    pub fn put(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, path.into())
    }

    pub fn patch(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PATCH, path.into())
    }

    pub fn delete(&self, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, path.into())
    }

    /// Create a request builder with a custom method.
    pub fn request(&self, method: Method, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, method, path.into())
    }

    /// Send a request, retrying per the configured policy.
    ///
    /// Returns the record of the last attempt. Fails with
    /// [`HttpClientError::Transport`] when no attempt produced a response and
    /// with [`HttpClientError::Status`] when the final status is 4xx/5xx and
    /// status raising is on for this call.
    pub async fn send(&self, request: RequestDescriptor) -> Result<ResponseRecord> {
        let url = self.url_for(&request.path, &request.query)?;
        let headers = self.headers.merged_with(&request.headers);
        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let body = request.body.as_ref().map(RequestBody::to_bytes);

        self.log_request(&request, &url, &headers);

        let started = Instant::now();
        let record = self
            .execute_with_retry(&request.method, &url, &headers, body, timeout)
            .await?;

        self.log_response(&record, started.elapsed());
        self.attach_exchange(&request, &url, &record);

        let raise = request
            .raise_for_status
            .unwrap_or(self.config.raise_for_status);
        if raise && let Some(error) = record.error_for_status() {
            return Err(error);
        }
        Ok(record)
    }

    /// Resolve `path` against the base URL and append query parameters.
    fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = match Url::parse(path) {
            Ok(url) => url,
            Err(_) => {
                let base = self.config.base_url.trim_end_matches('/');
                let joined = if path.is_empty() || path.starts_with('/') {
                    format!("{}{}", base, path)
                } else {
                    format!("{}/{}", base, path)
                };
                Url::parse(&joined)
                    .map_err(|e| HttpClientError::InvalidUrl(format!("{joined}: {e}")))?
            }
        };

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn execute_with_retry(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<Bytes>,
        timeout: Duration,
    ) -> Result<ResponseRecord> {
        let policy = &self.config.retry;
        let mut attempt = 1;

        loop {
            match self
                .execute_once(method, url, headers, body.clone(), timeout)
                .await
            {
                Ok(record) => {
                    if policy.should_retry_status(record.status_code())
                        && policy.has_attempts_left(attempt)
                    {
                        let delay = policy.delay_for_attempt(attempt);
                        warn!(
                            attempt,
                            status = record.status_code(),
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request due to status code"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(record.with_attempts(attempt));
                }
                Err(e) => {
                    if policy.should_retry_error(&e) && policy.has_attempts_left(attempt) {
                        let delay = policy.delay_for_attempt(attempt);
                        warn!(
                            attempt,
                            error = %e,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request due to error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    tracing::error!(attempts = attempt, error = %e, url = %url, "Request failed");
                    return Err(HttpClientError::Transport {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    /// One attempt; the body is re-sent from the descriptor every time.
    async fn execute_once(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<Bytes>,
        timeout: Duration,
    ) -> std::result::Result<ResponseRecord, reqwest::Error> {
        let mut builder = self
            .inner
            .request(method.clone(), url.clone())
            .headers(headers.clone())
            .timeout(timeout);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = builder.send().await?;
        ResponseRecord::from_reqwest(response, started).await
    }

    fn log_request(&self, request: &RequestDescriptor, url: &Url, headers: &HeaderMap) {
        info!(method = %request.method, url = %url, "Sending request");
        debug!(
            method = %request.method,
            url = %url,
            headers = %headers::to_json(headers),
            params = ?request.query,
            body = %request.body.as_ref().map(RequestBody::display).unwrap_or_default(),
            "Request details"
        );
    }

    fn log_response(&self, record: &ResponseRecord, total: Duration) {
        info!(
            status = record.status_code(),
            elapsed_secs = record.elapsed().as_secs_f64(),
            attempts = record.attempts(),
            total_secs = total.as_secs_f64(),
            "Received response"
        );
        debug!(body = %record.body_display(), "Response body");
    }

    fn attach_exchange(&self, request: &RequestDescriptor, url: &Url, record: &ResponseRecord) {
        self.sink.attach(Attachment::text("Request URL", url.as_str()));
        self.sink
            .attach(Attachment::text("Request method", request.method.as_str()));
        match &request.body {
            Some(RequestBody::Json(value)) => {
                self.sink.attach(Attachment::json("Request body", value))
            }
            Some(body @ RequestBody::Raw(_)) => {
                self.sink.attach(Attachment::text("Request body", body.display()))
            }
            None => {}
        }
        self.sink.attach(Attachment::json(
            "Response headers",
            &headers::to_json(record.headers()),
        ));
        match record.json_body() {
            Some(value) => self.sink.attach(Attachment::json("Response body", value)),
            None => self.sink.attach(Attachment::text("Response body", record.text())),
        }
        self.sink.attach(Attachment::text(
            "Response time",
            format!("{:.2}s", record.elapsed().as_secs_f64()),
        ));
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetryPolicy;

    fn dispatcher(base_url: &str) -> Dispatcher {
        Dispatcher::new(DispatcherConfig::builder().base_url(base_url).build()).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let d = dispatcher("http://test.api.example.com/");
        assert_eq!(
            d.url_for("/api/login", &[]).unwrap().as_str(),
            "http://test.api.example.com/api/login"
        );
        assert_eq!(
            d.url_for("api/users", &[("page".into(), "1".into())])
                .unwrap()
                .as_str(),
            "http://test.api.example.com/api/users?page=1"
        );
        assert_eq!(
            d.url_for("https://other.example.com/x", &[]).unwrap().as_str(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let d = dispatcher("not a url");
        assert!(matches!(
            d.url_for("/x", &[]),
            Err(HttpClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_header_mutation() {
        let mut d = dispatcher("http://localhost");
        assert_eq!(d.headers().get("content-type"), Some("application/json"));

        d.add_header("X-Trace", "1").unwrap();
        assert_eq!(d.headers().get("x-trace"), Some("1"));

        d.remove_header("Content-Type");
        assert_eq!(d.headers().get("content-type"), None);

        d.clear_headers();
        assert!(d.headers().is_empty());
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings::default();
        let d = Dispatcher::from_settings(&settings).unwrap();
        assert_eq!(d.base_url(), "http://test.api.example.com");
        assert_eq!(d.config().retry, RetryPolicy::from_max_retries(3, Duration::from_secs(1)));
    }
}
