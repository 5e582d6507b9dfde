//! Test data helpers.

use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::FixtureError;

/// Random ASCII letters and digits.
pub fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// `test_<8 random chars>@example.com`
pub fn random_email() -> String {
    format!("test_{}@example.com", random_string(8))
}

/// Local time as `%Y%m%d%H%M%S`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Lowercase hex MD5 digest.
pub fn md5_hex(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

/// Parse the JSON found between the first `start` marker and the next `end`
/// marker after it.
pub fn extract_json(text: &str, start: &str, end: &str) -> Result<Value, FixtureError> {
    let begin = text
        .find(start)
        .map(|i| i + start.len())
        .ok_or_else(|| FixtureError::MarkerNotFound(start.to_string()))?;
    let len = text[begin..]
        .find(end)
        .ok_or_else(|| FixtureError::MarkerNotFound(end.to_string()))?;

    Ok(serde_json::from_str(&text[begin..begin + len])?)
}

/// Poll `condition` every `interval` until it holds or `timeout` elapses.
pub async fn wait_until<F, Fut>(mut condition: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    loop {
        if condition().await {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_random_string() {
        let s = random_string(12);
        assert_eq!(s.len(), 12);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_string(32), random_string(32));
        assert!(random_string(0).is_empty());
    }

    #[test]
    fn test_random_email() {
        let email = random_email();
        assert!(email.starts_with("test_"));
        assert!(email.ends_with("@example.com"));
        assert_eq!(email.len(), "test_".len() + 8 + "@example.com".len());
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_md5() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex("admin123"), "0192023a7bbd73250516f069df18b500");
    }

    #[test]
    fn test_extract_json() {
        let text = r#"<script>var data = {"user": {"id": 7}};</script>"#;
        assert_eq!(
            extract_json(text, "var data = ", ";</script>").unwrap(),
            json!({"user": {"id": 7}})
        );

        assert!(matches!(
            extract_json(text, "missing", ";"),
            Err(FixtureError::MarkerNotFound(_))
        ));
        assert!(matches!(
            extract_json("a[1, b", "a", "b"),
            Err(FixtureError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_wait_until() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let ready = wait_until(
            move || {
                let counter = counter.clone();
                async move { counter.fetch_add(1, Ordering::SeqCst) >= 2 }
            },
            Duration::from_secs(1),
            Duration::from_millis(1),
        )
        .await;
        assert!(ready);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let never = wait_until(
            || async { false },
            Duration::from_millis(20),
            Duration::from_millis(5),
        )
        .await;
        assert!(!never);
    }
}
