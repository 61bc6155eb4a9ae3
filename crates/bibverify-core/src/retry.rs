//! Transport-level retry with exponential backoff on throttling and 5xx responses.

use std::time::Duration;

use crate::http::{BoxFuture, HttpRequest, HttpResponse, Transport, TransportError};

/// Status codes that are worth retrying; every other status is terminal.
pub const RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn should_retry(&self, status: u16) -> bool {
        RETRY_STATUSES.contains(&status)
    }

    /// Backoff before retry number `attempt + 1`: the server's Retry-After if
    /// given, else exponential with jitter. Always capped at `max_delay`.
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = retry_after.unwrap_or_else(|| {
            let base_ms = self.base_delay.as_millis() as u64 * (1 << attempt.min(4)); // 1s, 2s, 4s, 8s, 16s
            let jitter_ms = fastrand::u64(0..500);
            Duration::from_millis(base_ms + jitter_ms)
        });
        backoff.min(self.max_delay)
    }
}

/// Parse a Retry-After header value (seconds or HTTP-date).
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    if let Ok(secs) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    // HTTP-date (e.g. "Wed, 21 Oct 2015 07:28:00 GMT"): use a conservative fallback
    if value.contains(',') || value.contains("GMT") {
        return Some(Duration::from_secs(5));
    }
    None
}

/// Wraps a [`Transport`] and retries responses whose status is in
/// [`RETRY_STATUSES`]. Transport errors are returned immediately.
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T: Transport> Transport for Retrying<T> {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let mut attempt = 0;
            loop {
                let response = self.inner.send(request.clone()).await?;
                if !self.policy.should_retry(response.status) || attempt >= self.policy.max_retries {
                    return Ok(response);
                }

                let retry_after = response.header("retry-after").and_then(parse_retry_after);
                let backoff = self.policy.backoff(attempt, retry_after);
                log::info!(
                    "{} {}: HTTP {}, retry {}/{} after {:.1}s",
                    request.method.as_str(),
                    request.url,
                    response.status,
                    attempt + 1,
                    self.policy.max_retries,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        })
    }
}
