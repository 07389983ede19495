//! HTTP response handling with Koho-specific extensions.

use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};

/// Wrapper around a successful HTTP response.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Get the response body as bytes.
    pub async fn bytes(self) -> Result<Bytes> {
        self.inner.bytes().await.map_err(Into::into)
    }

    /// Decode the body as a JSON value. An empty body decodes to `null`.
    pub async fn json_value(self) -> Result<Value> {
        let body = self.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Fail with `ErrorKind::Api` when a decoded payload reports `status: "error"`.
pub fn check_api_error(value: &Value) -> Result<()> {
    if value.get("status").and_then(Value::as_str) != Some("error") {
        return Ok(());
    }

    let message = match value.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => "Unknown Koho API error".to_string(),
        Some(other) => other.to_string(),
    };

    Err(Error::new(ErrorKind::Api { message }))
}

/// Parse the Retry-After header value as seconds.
pub(crate) fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value?.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Turn a non-success response into an error.
pub(crate) fn parse_error_response(status: u16, body: &str, retry_after: Option<Duration>) -> Error {
    if status == 429 {
        return Error::new(ErrorKind::RateLimited { retry_after });
    }

    // Koho reports failures as {"status": "error", "message": "..."}
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Err(err) = check_api_error(&value) {
            return err;
        }
    }

    let sanitized = sanitize_error_message(body);
    let kind = match status {
        401 => ErrorKind::Authentication(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };

    Error::new(kind)
}

/// Sanitize an error message before it ends up in an error value.
///
/// Redacts `token=` query values and long hex/base64-looking tokens, and
/// truncates messages longer than 500 characters.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    if let Ok(pattern) = regex_lite::Regex::new(r"token=[^&\s]+") {
        sanitized = pattern.replace_all(&sanitized, "token=[REDACTED]").to_string();
    }

    if let Ok(pattern) = regex_lite::Regex::new(r"[A-Za-z0-9_\-]{40,}") {
        sanitized = pattern.replace_all(&sanitized, "[REDACTED_TOKEN]").to_string();
    }

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
