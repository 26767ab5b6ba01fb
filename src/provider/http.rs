//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};

use crate::error::ScoutError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No overall request timeout: model responses are long-lived streams, and
/// idle/tool timeouts are enforced by the agent loop.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Parse an SSE "data:" line, returning None for "[DONE]" and non-data lines.
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ScoutError {
    match status {
        401 | 403 => ScoutError::Authentication(body.to_string()),
        429 => ScoutError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => ScoutError::api(status, body),
    }
}

/// Consume a non-success response into an error.
///
/// A `retry-after` header wins over any wait hint in the body.
pub async fn response_error(resp: reqwest::Response) -> ScoutError {
    let status = resp.status().as_u16();
    let header_wait = retry_after_header_ms(resp.headers());
    let body = resp.text().await.unwrap_or_default();
    match status_to_error(status, &body) {
        ScoutError::RateLimited { retry_after_ms } => ScoutError::RateLimited {
            retry_after_ms: header_wait.or(retry_after_ms),
        },
        err => err,
    }
}

/// `retry-after` in seconds, as sent by Groq. HTTP-date values are ignored.
pub fn retry_after_header_ms(headers: &HeaderMap) -> Option<u64> {
    let secs: f64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| (secs * 1000.0) as u64)
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sse_data_handles_done_and_spacing() {
        assert_eq!(parse_sse_data("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(parse_sse_data("data:{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(parse_sse_data("data: [DONE]"), None);
        assert_eq!(parse_sse_data("event: ping"), None);
    }

    #[test]
    fn status_to_error_classifies_common_statuses() {
        assert!(matches!(
            status_to_error(401, "nope"),
            ScoutError::Authentication(_)
        ));
        assert!(matches!(
            status_to_error(429, r#"{"error":{"retry_after":1.5}}"#),
            ScoutError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
        assert!(matches!(
            status_to_error(500, "oops"),
            ScoutError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn retry_after_header_is_read_in_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(retry_after_header_ms(&headers), Some(2000));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("0.25"));
        assert_eq!(retry_after_header_ms(&headers), Some(250));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_header_ms(&headers), None);
        assert_eq!(retry_after_header_ms(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_headers_include_authorization() {
        let headers = bearer_headers("gsk-123");
        assert_eq!(headers[AUTHORIZATION], "Bearer gsk-123");
    }
}
