//! Assertions for responses and plain values.
//!
//! Every check returns `Err(AssertionFailure)` instead of panicking, so test
//! cases can propagate failures with `?` and the runner can report them.

use apiprobe_http_client::ResponseRecord;
use serde_json::Value;
use std::fmt::{self, Debug};

use crate::diff::{DiffOptions, DiffResult, diff};

/// Result of a single check.
pub type AssertResult = Result<(), AssertionFailure>;

/// A failed check, with both sides rendered when they are known.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionFailure {
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    /// Structured differences, for JSON comparisons.
    pub diff: Option<DiffResult>,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
            diff: None,
        }
    }

    /// Failure carrying the expected and actual values.
    pub fn mismatch(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            expected: Some(expected.into()),
            actual: Some(actual.into()),
            ..Self::new(message)
        }
    }

    /// Schema validation failure with the validator's diagnostics.
    pub fn schema(diagnostics: impl Into<String>) -> Self {
        Self::new(format!("JSON schema validation failed: {}", diagnostics.into()))
    }

    pub fn with_diff(mut self, diff: DiffResult) -> Self {
        self.diff = Some(diff);
        self
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(expected) = &self.expected {
            write!(f, "\n  expected: {}", expected)?;
        }
        if let Some(actual) = &self.actual {
            write!(f, "\n  actual:   {}", actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for AssertionFailure {}

fn label_prefix(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("{}: ", label)
    }
}

fn parsed_body(response: &ResponseRecord) -> Result<&Value, AssertionFailure> {
    response.json_body().ok_or_else(|| {
        AssertionFailure::mismatch("Response body is not JSON", "JSON body", response.text())
    })
}

/// Assert that a response has a specific status code.
pub fn status_code(response: &ResponseRecord, expected: u16) -> AssertResult {
    let actual = response.status_code();
    if actual == expected {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("Expected status {}, got {}", expected, actual),
        expected.to_string(),
        actual.to_string(),
    ))
}

/// Assert that the response arrived within `max_seconds` (inclusive).
pub fn response_time(response: &ResponseRecord, max_seconds: f64) -> AssertResult {
    let actual = response.elapsed().as_secs_f64();
    if actual <= max_seconds {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("Response took {:.3}s, limit is {}s", actual, max_seconds),
        format!("<= {}s", max_seconds),
        format!("{:.3}s", actual),
    ))
}

/// Assert that every key of `expected` is present in the JSON body with an
/// equal value. Extra keys in the body are ignored.
pub fn json_contains(response: &ResponseRecord, expected: &Value) -> AssertResult {
    let Some(expected_map) = expected.as_object() else {
        return Err(AssertionFailure::new(format!(
            "Expected subset must be a JSON object, got {}",
            expected
        )));
    };
    let actual = parsed_body(response)?;
    let Some(actual_map) = actual.as_object() else {
        return Err(AssertionFailure::mismatch(
            "Response body is not a JSON object",
            expected.to_string(),
            actual.to_string(),
        ));
    };

    let mut problems = Vec::new();
    for (key, value) in expected_map {
        match actual_map.get(key) {
            None => problems.push(format!("missing key '{}'", key)),
            Some(found) if found != value => problems.push(format!(
                "key '{}': expected {}, actual {}",
                key, value, found
            )),
            Some(_) => {}
        }
    }

    if problems.is_empty() {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("JSON body does not contain expected data: {}", problems.join("; ")),
        expected.to_string(),
        actual.to_string(),
    ))
}

/// Assert that the JSON body conforms to `schema`.
pub fn json_schema(response: &ResponseRecord, schema: &Value) -> AssertResult {
    let instance = parsed_body(response)?;
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| AssertionFailure::schema(format!("invalid schema: {}", e)))?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    Err(AssertionFailure::schema(errors.join("; ")))
}

/// Deep-compare two JSON values with the default exclusions
/// (`$.timestamp`, `$.id`).
pub fn json_equal(actual: &Value, expected: &Value, ignore_order: bool) -> AssertResult {
    json_equal_with(actual, expected, &DiffOptions::default().ignore_order(ignore_order))
}

/// Deep-compare two JSON values with explicit options.
///
/// On failure the message is a pretty JSON dump of the differences.
pub fn json_equal_with(actual: &Value, expected: &Value, options: &DiffOptions) -> AssertResult {
    let result = diff(expected, actual, options);
    if result.is_empty() {
        return Ok(());
    }
    Err(
        AssertionFailure::new(format!("JSON mismatch:\n{}", result.to_pretty_json()))
            .with_diff(result),
    )
}

/// Assert that a response has a specific header.
pub fn header(response: &ResponseRecord, name: &str, expected: &str) -> AssertResult {
    let actual = response.header(name);
    if actual == Some(expected) {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("Header '{}' mismatch", name),
        expected,
        actual.map_or_else(|| "<absent>".to_string(), str::to_string),
    ))
}

/// Assert that a response is successful (2xx status).
pub fn is_success(response: &ResponseRecord) -> AssertResult {
    if response.is_success() {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("Expected successful status (2xx), got {}", response.status_code()),
        "2xx",
        response.status_code().to_string(),
    ))
}

/// Assert `actual == expected`.
pub fn equal<T>(actual: &T, expected: &T, label: &str) -> AssertResult
where
    T: PartialEq + Debug + ?Sized,
{
    if actual == expected {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("{}values differ", label_prefix(label)),
        format!("{:?}", expected),
        format!("{:?}", actual),
    ))
}

/// Assert `actual != expected`.
pub fn not_equal<T>(actual: &T, expected: &T, label: &str) -> AssertResult
where
    T: PartialEq + Debug + ?Sized,
{
    if actual != expected {
        return Ok(());
    }
    Err(AssertionFailure::new(format!(
        "{}values should differ, both are {:?}",
        label_prefix(label),
        actual
    )))
}

/// Membership test used by [`contains`] and [`not_contains`].
pub trait Container<T: ?Sized> {
    fn has(&self, item: &T) -> bool;
}

impl<T: PartialEq> Container<T> for [T] {
    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }
}

impl<T: PartialEq> Container<T> for Vec<T> {
    fn has(&self, item: &T) -> bool {
        self.as_slice().contains(item)
    }
}

impl Container<str> for str {
    fn has(&self, item: &str) -> bool {
        self.contains(item)
    }
}

impl Container<str> for String {
    fn has(&self, item: &str) -> bool {
        self.as_str().contains(item)
    }
}

/// Object key, array element or substring, depending on the value.
impl Container<str> for Value {
    fn has(&self, item: &str) -> bool {
        match self {
            Value::Object(map) => map.contains_key(item),
            Value::Array(items) => items.iter().any(|v| v.as_str() == Some(item)),
            Value::String(s) => s.contains(item),
            _ => false,
        }
    }
}

impl Container<Value> for Value {
    fn has(&self, item: &Value) -> bool {
        match (self, item) {
            (Value::Array(items), _) => items.contains(item),
            (Value::Object(map), Value::String(key)) => map.contains_key(key),
            (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
            _ => false,
        }
    }
}

/// Assert that `item` is in `container`.
pub fn contains<I, C>(item: &I, container: &C, label: &str) -> AssertResult
where
    I: Debug + ?Sized,
    C: Container<I> + Debug + ?Sized,
{
    if container.has(item) {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("{}{:?} not found in {:?}", label_prefix(label), item, container),
        format!("{:?} present", item),
        format!("{:?}", container),
    ))
}

/// Assert that `item` is not in `container`.
pub fn not_contains<I, C>(item: &I, container: &C, label: &str) -> AssertResult
where
    I: Debug + ?Sized,
    C: Container<I> + Debug + ?Sized,
{
    if !container.has(item) {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("{}{:?} should not be in {:?}", label_prefix(label), item, container),
        format!("{:?} absent", item),
        format!("{:?}", container),
    ))
}

pub fn is_true(condition: bool, label: &str) -> AssertResult {
    if condition {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("{}expected true, got false", label_prefix(label)),
        "true",
        "false",
    ))
}

pub fn is_false(condition: bool, label: &str) -> AssertResult {
    if !condition {
        return Ok(());
    }
    Err(AssertionFailure::mismatch(
        format!("{}expected false, got true", label_prefix(label)),
        "false",
        "true",
    ))
}
