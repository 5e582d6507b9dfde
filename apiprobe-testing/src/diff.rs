//! Structural diff of JSON values.
//!
//! Paths are rendered JSONPath-style: `$`, `$.key`, `$.list[2]`,
//! `$['odd key']`. Excluded paths are skipped on both sides before descent.

use serde::Serialize;
use serde_json::Value;

/// Paths ignored by [`DiffOptions::default`].
pub const DEFAULT_EXCLUDED_PATHS: [&str; 2] = ["$.timestamp", "$.id"];

/// Kind of a single difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present only in the actual value.
    Added,
    /// Present only in the expected value.
    Removed,
    /// Same JSON kind, different value.
    ValueChanged,
    /// Different JSON kinds, or integer vs float.
    TypeChanged,
}

/// One difference between expected and actual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

/// Set of differences; empty means equal under the options used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiffResult {
    changes: Vec<Change>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// The change recorded at `path`, if any.
    pub fn at(&self, path: &str) -> Option<&Change> {
        self.changes.iter().find(|c| c.path == path)
    }

    /// Pretty JSON dump, used as the assertion failure message.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self.changes))
    }
}

/// Comparison options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Compare arrays as multisets.
    pub ignore_order: bool,
    /// Exact paths skipped on both sides.
    pub exclude_paths: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_order: false,
            exclude_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_order(mut self, enable: bool) -> Self {
        self.ignore_order = enable;
        self
    }

    pub fn exclude(mut self, path: impl Into<String>) -> Self {
        self.exclude_paths.push(path.into());
        self
    }

    /// Drop all exclusions, the default ones included.
    pub fn without_exclusions(mut self) -> Self {
        self.exclude_paths.clear();
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| p == path)
    }
}

/// Diff `actual` against `expected`.
pub fn diff(expected: &Value, actual: &Value, options: &DiffOptions) -> DiffResult {
    let mut differ = Differ {
        options,
        changes: Vec::new(),
    };
    differ.walk("$", expected, actual);
    DiffResult {
        changes: differ.changes,
    }
}

struct Differ<'o> {
    options: &'o DiffOptions,
    changes: Vec<Change>,
}

impl Differ<'_> {
    fn walk(&mut self, path: &str, expected: &Value, actual: &Value) {
        if self.options.is_excluded(path) || expected == actual {
            return;
        }

        match (expected, actual) {
            (Value::Object(exp), Value::Object(act)) => {
                for (key, exp_value) in exp {
                    let child = key_path(path, key);
                    if self.options.is_excluded(&child) {
                        continue;
                    }
                    match act.get(key) {
                        Some(act_value) => self.walk(&child, exp_value, act_value),
                        None => self.push(child, ChangeKind::Removed, Some(exp_value), None),
                    }
                }
                for (key, act_value) in act {
                    if exp.contains_key(key) {
                        continue;
                    }
                    let child = key_path(path, key);
                    if !self.options.is_excluded(&child) {
                        self.push(child, ChangeKind::Added, None, Some(act_value));
                    }
                }
            }
            (Value::Array(exp), Value::Array(act)) if self.options.ignore_order => {
                self.walk_unordered(path, exp, act)
            }
            (Value::Array(exp), Value::Array(act)) => {
                for (i, exp_value) in exp.iter().enumerate() {
                    let child = index_path(path, i);
                    if self.options.is_excluded(&child) {
                        continue;
                    }
                    match act.get(i) {
                        Some(act_value) => self.walk(&child, exp_value, act_value),
                        None => self.push(child, ChangeKind::Removed, Some(exp_value), None),
                    }
                }
                for (i, act_value) in act.iter().enumerate().skip(exp.len()) {
                    let child = index_path(path, i);
                    if !self.options.is_excluded(&child) {
                        self.push(child, ChangeKind::Added, None, Some(act_value));
                    }
                }
            }
            (Value::Number(exp), Value::Number(act)) => {
                let kind = if exp.is_f64() == act.is_f64() {
                    ChangeKind::ValueChanged
                } else {
                    ChangeKind::TypeChanged
                };
                self.push(path.to_string(), kind, Some(expected), Some(actual));
            }
            _ if kind_name(expected) == kind_name(actual) => {
                self.push(path.to_string(), ChangeKind::ValueChanged, Some(expected), Some(actual));
            }
            _ => {
                self.push(path.to_string(), ChangeKind::TypeChanged, Some(expected), Some(actual));
            }
        }
    }

    /// Greedy multiset pairing: each expected element takes the first unused
    /// actual element that compares equal.
    fn walk_unordered(&mut self, path: &str, expected: &[Value], actual: &[Value]) {
        // Excluded elements drop out of both sides before pairing.
        let mut used: Vec<bool> = (0..actual.len())
            .map(|j| self.options.is_excluded(&index_path(path, j)))
            .collect();

        for (i, exp_value) in expected.iter().enumerate() {
            let child = index_path(path, i);
            if self.options.is_excluded(&child) {
                continue;
            }
            let found = actual.iter().enumerate().position(|(j, act_value)| {
                !used[j] && self.equal_at(&child, exp_value, act_value)
            });
            match found {
                Some(j) => used[j] = true,
                None => self.push(child, ChangeKind::Removed, Some(exp_value), None),
            }
        }

        for (j, act_value) in actual.iter().enumerate() {
            if !used[j] {
                self.push(index_path(path, j), ChangeKind::Added, None, Some(act_value));
            }
        }
    }

    fn equal_at(&self, path: &str, expected: &Value, actual: &Value) -> bool {
        let mut scratch = Differ {
            options: self.options,
            changes: Vec::new(),
        };
        scratch.walk(path, expected, actual);
        scratch.changes.is_empty()
    }

    fn push(
        &mut self,
        path: String,
        kind: ChangeKind,
        expected: Option<&Value>,
        actual: Option<&Value>,
    ) {
        self.changes.push(Change {
            path,
            kind,
            expected: expected.cloned(),
            actual: actual.cloned(),
        });
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `$.key` for identifier-like keys, `$['odd key']` otherwise.
pub fn key_path(parent: &str, key: &str) -> String {
    let mut chars = key.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if identifier {
        format!("{parent}.{key}")
    } else {
        let escaped = key.replace('\\', "\\\\").replace('\'', "\\'");
        format!("{parent}['{escaped}']")
    }
}

pub fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}
