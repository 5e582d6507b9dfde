//! Request descriptor and builder.

use crate::headers::{parse_name, parse_value};
use crate::{Dispatcher, HttpClientError, ResponseRecord, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, header};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document, serialized on send.
    Json(Value),
    /// Raw bytes.
    Raw(Bytes),
}

impl RequestBody {
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Json(value) => Bytes::from(value.to_string()),
            Self::Raw(bytes) => bytes.clone(),
        }
    }

    /// Text form for logs and attachments.
    pub fn display(&self) -> String {
        match self {
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Everything needed to (re)send one request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the dispatcher base URL, or an absolute URL.
    pub path: String,
    /// Per-call headers; they win over the dispatcher header set.
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Per-call timeout; the dispatcher default applies when unset.
    pub timeout: Option<Duration>,
    /// Per-call override of the dispatcher's status raising.
    pub raise_for_status: Option<bool>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            raise_for_status: None,
        }
    }
}

/// Fluent builder for one request, bound to a dispatcher.
///
/// Invalid input (a bad header, an unserializable body) is remembered and
/// reported by [`RequestBuilder::send`].
pub struct RequestBuilder<'a> {
    dispatcher: &'a Dispatcher,
    request: RequestDescriptor,
    error: Option<HttpClientError>,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher, method: Method, path: String) -> Self {
        Self {
            dispatcher,
            request: RequestDescriptor::new(method, path),
            error: None,
        }
    }

    fn fail(mut self, error: HttpClientError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match (parse_name(name.as_ref()), parse_value(value.as_ref())) {
            (Ok(name), Ok(value)) => {
                self.request.headers.insert(name, value);
                self
            }
            (Err(e), _) | (_, Err(e)) => self.fail(e),
        }
    }

    /// Add multiple headers to the request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.request.headers.extend(headers);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.request.query.push((key.into(), value.to_string()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (k, v) in params {
            self.request.query.push((k.into(), v.to_string()));
        }
        self
    }

    /// Set the request body as raw bytes.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = Some(RequestBody::Raw(body.into()));
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        match serde_json::to_value(json) {
            Ok(value) => {
                self.request.body = Some(RequestBody::Json(value));
                self
            }
            Err(e) => self.fail(HttpClientError::Json(e.to_string())),
        }
    }

    /// Set the request body as form data.
    pub fn form<T: Serialize + ?Sized>(mut self, form: &T) -> Self {
        match serde_urlencoded::to_string(form) {
            Ok(encoded) => {
                self.request.headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                self.request.body = Some(RequestBody::Raw(Bytes::from(encoded)));
                self
            }
            Err(e) => self.fail(HttpClientError::RequestBuild(e.to_string())),
        }
    }

    /// Set a custom timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl std::fmt::Display) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Set basic authentication.
    pub fn basic_auth(self, username: impl std::fmt::Display, password: Option<&str>) -> Self {
        use base64::Engine;
        let credentials = format!("{}:{}", username, password.unwrap_or_default());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header("Authorization", format!("Basic {}", encoded))
    }

    /// Return 4xx/5xx responses as records instead of errors.
    pub fn allow_error_status(mut self) -> Self {
        self.request.raise_for_status = Some(false);
        self
    }

    /// The descriptor built so far.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.request
    }

    /// Send the request.
    pub async fn send(self) -> Result<ResponseRecord> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.dispatcher.send(self.request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispatcherConfig;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(DispatcherConfig::builder().base_url("http://localhost").build()).unwrap()
    }

    #[test]
    fn test_builder_collects_descriptor() {
        let dispatcher = dispatcher();
        let builder = dispatcher
            .post("/login")
            .json(&json!({"username": "a"}))
            .query("page", 2)
            .header("X-Trace", "1")
            .timeout(Duration::from_secs(3))
            .allow_error_status();

        let request = builder.descriptor();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/login");
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(request.headers["x-trace"], "1");
        assert_eq!(request.body, Some(RequestBody::Json(json!({"username": "a"}))));
        assert_eq!(request.timeout, Some(Duration::from_secs(3)));
        assert_eq!(request.raise_for_status, Some(false));
    }

    #[test]
    fn test_auth_headers() {
        let dispatcher = dispatcher();
        let bearer = dispatcher.get("/users").bearer_auth("t0k");
        assert_eq!(bearer.descriptor().headers["authorization"], "Bearer t0k");

        let basic = dispatcher.get("/users").basic_auth("user", Some("pass"));
        assert_eq!(basic.descriptor().headers["authorization"], "Basic dXNlcjpwYXNz");
    }

    #[tokio::test]
    async fn test_invalid_header_surfaces_on_send() {
        let dispatcher = dispatcher();
        let result = dispatcher.get("/users").header("bad header", "x").send().await;
        assert!(matches!(result, Err(HttpClientError::InvalidHeader(_))));
    }

    #[test]
    fn test_body_display() {
        assert_eq!(RequestBody::Raw(Bytes::from("plain")).display(), "plain");
        assert_eq!(
            RequestBody::Json(json!({"a": 1})).to_bytes(),
            Bytes::from(r#"{"a":1}"#)
        );
    }
}
