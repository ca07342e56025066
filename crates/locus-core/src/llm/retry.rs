//! Deadline-bounded retry for generations that come back empty.
//!
//! Vision models occasionally answer with an empty message. The call is
//! repeated immediately (no backoff) until it produces text or the deadline
//! passes. Each attempt is bounded by the time left, so a hung call also ends
//! in a timeout. Errors from the call itself are not retried.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::PipelineError;

/// Call `attempt` until it returns non-blank text.
///
/// The deadline is checked before every attempt, so a zero timeout makes no
/// calls at all. `attempt` receives the 1-based attempt number.
pub async fn until_non_empty<F, Fut>(
    service: &str,
    timeout: Duration,
    mut attempt: F,
) -> Result<String, PipelineError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<String, PipelineError>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    while let Some(remaining) = timeout.checked_sub(start.elapsed()).filter(|r| !r.is_zero()) {
        attempts += 1;
        let Ok(result) = tokio::time::timeout(remaining, attempt(attempts)).await else {
            tracing::warn!("{service} attempt {attempts} ran past the deadline");
            break;
        };
        let text = result?;
        if !text.trim().is_empty() {
            return Ok(text);
        }
        tracing::warn!("{service} returned an empty response (attempt {attempts}), trying again");
    }

    Err(PipelineError::GenerationTimeout {
        service: service.to_string(),
        timeout_ms: timeout.as_millis() as u64,
        attempts,
    })
}
