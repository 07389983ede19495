//! Retry on API throttling.
//!
//! The Koho API answers `{"throttle": true, ...}` when a client sends
//! requests too fast. The controller waits a constant delay and reissues the
//! request until the API stops throttling or the budget is used up.

use std::future::Future;

use bytes::Bytes;
use serde_json::Value;
use tracing::warn;

use crate::config::ThrottleConfig;
use crate::error::{Error, ErrorKind, Result};

/// A decoded response that can report throttling.
pub trait ThrottleSignal {
    /// Returns true if the API asked the client to slow down.
    fn is_throttled(&self) -> bool;
}

impl ThrottleSignal for Value {
    fn is_throttled(&self) -> bool {
        self.get("throttle").and_then(Value::as_bool) == Some(true)
    }
}

impl ThrottleSignal for String {
    fn is_throttled(&self) -> bool {
        json_object_is_throttled(self.as_bytes())
    }
}

impl ThrottleSignal for Bytes {
    fn is_throttled(&self) -> bool {
        json_object_is_throttled(self)
    }
}

// Only bodies that look like a JSON object are parsed.
fn json_object_is_throttled(body: &[u8]) -> bool {
    let starts_with_brace = body
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');

    starts_with_brace
        && serde_json::from_slice::<Value>(body).is_ok_and(|value| value.is_throttled())
}

/// Reissues throttled requests with a constant delay.
#[derive(Debug, Clone)]
pub struct ThrottleController {
    config: Option<ThrottleConfig>,
}

impl ThrottleController {
    /// Create a controller; `None` never retries.
    pub fn new(config: Option<ThrottleConfig>) -> Self {
        Self { config }
    }

    /// The policy in use.
    pub fn config(&self) -> Option<&ThrottleConfig> {
        self.config.as_ref()
    }

    /// Run `operation`, retrying up to `max_retries` times while it reports throttling.
    ///
    /// Errors from `operation` are returned immediately. Once the budget is
    /// used up the last throttled result is returned, unless the policy asks
    /// to fail with `ThrottleExceeded`.
    pub async fn run<T, F, Fut>(&self, max_retries: u32, mut operation: F) -> Result<T>
    where
        T: ThrottleSignal,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut remaining = max_retries;
        let mut attempts = 0u32;

        loop {
            let result = operation().await?;
            attempts += 1;

            let config = match &self.config {
                Some(config) if config.enabled && result.is_throttled() => config,
                _ => return Ok(result),
            };

            if remaining == 0 {
                if config.fail_on_exhausted {
                    return Err(Error::new(ErrorKind::ThrottleExceeded { attempts }));
                }
                warn!(attempts, "Throttle retries exhausted, returning throttled response");
                return Ok(result);
            }

            warn!(
                attempt = attempts,
                remaining,
                delay_ms = config.delay.as_millis() as u64,
                "Request throttled, retrying"
            );
            tokio::time::sleep(config.delay).await;
            remaining -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    fn policy(max_retries: u32, delay_ms: u64, enabled: bool) -> ThrottleConfig {
        ThrottleConfig {
            max_retries,
            delay: Duration::from_millis(delay_ms),
            enabled,
            fail_on_exhausted: false,
        }
    }

    #[tokio::test]
    async fn test_retries_until_not_throttled() {
        let config = policy(3, 10, true);
        let controller = ThrottleController::new(Some(config.clone()));
        let calls = &AtomicU32::new(0);

        let started = Instant::now();
        let result = controller
            .run(config.max_retries, || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!({"throttle": n <= 3, "call": n}))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(result["call"], 4);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_disabled_calls_once() {
        let controller = ThrottleController::new(Some(policy(3, 10, false)));
        let calls = &AtomicU32::new(0);

        let result = controller
            .run(3, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"throttle": true, "data": [1]}))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result, json!({"throttle": true, "data": [1]}));
    }

    #[tokio::test]
    async fn test_no_policy_calls_once() {
        let controller = ThrottleController::new(None);
        let calls = &AtomicU32::new(0);

        controller
            .run(5, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"throttle": true}))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_last_result() {
        let controller = ThrottleController::new(Some(policy(2, 1, true)));
        let calls = &AtomicU32::new(0);

        let result = controller
            .run(2, || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!({"throttle": true, "call": n}))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result["call"], 3);
        assert!(result.is_throttled());
    }

    #[tokio::test]
    async fn test_exhausted_budget_can_fail() {
        let mut config = policy(1, 1, true);
        config.fail_on_exhausted = true;
        let controller = ThrottleController::new(Some(config));

        let err = controller
            .run(1, || async move { Ok(json!({"throttle": true})) })
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::ThrottleExceeded { attempts: 2 }));
    }

    #[tokio::test]
    async fn test_zero_budget_calls_once() {
        let controller = ThrottleController::new(Some(policy(3, 1, true)));
        let calls = &AtomicU32::new(0);

        controller
            .run(0, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"throttle": true}))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_operation_error_is_not_retried() {
        let controller = ThrottleController::new(Some(policy(3, 1, true)));
        let calls = &AtomicU32::new(0);

        let result: Result<Value> = controller
            .run(3, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::new(ErrorKind::Timeout))
            })
            .await;

        assert!(matches!(result.unwrap_err().kind, ErrorKind::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_text_and_bytes_signals() {
        assert!(String::from(r#" {"throttle": true}"#).is_throttled());
        assert!(!String::from("id;name\n1;a").is_throttled());
        assert!(!String::from(r#"{"throttle": false}"#).is_throttled());
        assert!(Bytes::from_static(br#"{"throttle":true}"#).is_throttled());
        assert!(!Bytes::from_static(b"%PDF-1.4").is_throttled());
    }
}
