//! Whole-operation retry on serialization conflicts.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use signoff_core::error::CoreError;

/// Maximum number of attempts, including the first.
pub const MAX_ATTEMPTS: u32 = 8;

/// Backoff before the second attempt; doubles on each further attempt.
pub const BASE_DELAY: Duration = Duration::from_millis(10);

/// Run `attempt` until it returns something other than
/// [`CoreError::TransientConflict`], or [`MAX_ATTEMPTS`] are used up.
///
/// Each call of `attempt` must start from scratch: a fresh transaction and
/// fresh reads.
pub async fn with_retry<T, F, Fut>(operation: &'static str, mut attempt: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt_no = 1;
    loop {
        match attempt().await {
            Err(err) if err.is_transient() && attempt_no < MAX_ATTEMPTS => {
                let delay = backoff(attempt_no);
                tracing::debug!(
                    operation,
                    attempt = attempt_no,
                    delay_ms = delay.as_millis() as u64,
                    "Transient conflict, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt_no += 1;
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(operation, attempts = attempt_no, "Retries exhausted");
                return Err(err);
            }
            other => return other,
        }
    }
}

/// Exponential backoff with up to 100% additive jitter.
fn backoff(attempt_no: u32) -> Duration {
    let exp = BASE_DELAY * 2u32.pow(attempt_no.saturating_sub(1));
    let max_jitter = exp.as_millis() as u64;
    let jitter = rand::rng().random_range(0..=max_jitter);
    exp + Duration::from_millis(jitter)
}
