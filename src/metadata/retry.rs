// bounded retries with exponential backoff; only transient failures are retried
use std::thread;
use std::time::Duration;

use tracing::warn;

use super::{FetchError, FieldSet, FileDocument, MetadataSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (zero-based): `base * 2^attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: MetadataSource> Retrying<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MetadataSource> MetadataSource for Retrying<S> {
    fn fetch(&self, file_id: &str, fields: FieldSet) -> Result<FileDocument, FetchError> {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.inner.fetch(file_id, fields) {
                Ok(doc) => return Ok(doc),
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    let delay = self.policy.delay(attempt);
                    warn!(%file_id, attempt, ?delay, error = %err, "metadata fetch failed, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
