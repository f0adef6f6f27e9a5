use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

const BASE_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 30;

/// Exponential backoff for `attempt`, capped at [`MAX_BACKOFF_SECS`].
fn backoff(attempt: u32) -> Duration {
    let secs = BASE_BACKOFF_SECS
        .checked_shl(attempt)
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

/// `Retry-After` in whole seconds when the server sends one, backoff otherwise.
pub(crate) fn retry_delay(response: &reqwest::Response, attempt: u32) -> Duration {
    if let Some(val) = response.headers().get(reqwest::header::RETRY_AFTER)
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.trim().parse::<u64>()
    {
        return Duration::from_secs(secs.min(MAX_BACKOFF_SECS));
    }
    backoff(attempt)
}

/// Send a request, retrying up to `max_retries` times while the server answers 429.
///
/// `f` must build and send a fresh request on every call. Non-429 responses, including
/// other error statuses, are handed back to the caller untouched.
///
/// # Errors
///
/// Returns `LlmError::RateLimited` once every attempt was rate limited, or
/// `LlmError::Http` when the transport fails.
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &'static str,
    max_retries: u32,
    mut f: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..=max_retries {
        let response = f().await?;
        if response.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }
        if attempt == max_retries {
            break;
        }
        let delay = retry_delay(&response, attempt);
        tracing::warn!(
            provider = provider_name,
            attempt = attempt + 1,
            max_retries,
            "rate limited, retrying in {}s",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    Err(LlmError::RateLimited)
}
