use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

use crate::config::RequestPolicy;
use crate::error::{PulseError, Result};

pub fn http_client(policy: &RequestPolicy) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(policy.timeout)
        .build()
        .map_err(|e| PulseError::transport("http client", e))
}

fn retry_strategy(policy: &RequestPolicy) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(policy.backoff_base_ms)
        .factor(1)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(policy.max_retries)
}

/// Runs `action`, retrying transient failures according to `policy`.
pub async fn with_retry<T, A, F>(
    policy: &RequestPolicy,
    what: &'static str,
    mut action: A,
) -> Result<T>
where
    A: FnMut() -> F,
    F: Future<Output = Result<T>>,
{
    RetryIf::start(
        retry_strategy(policy),
        || action(),
        |err: &PulseError| {
            let transient = err.is_transient();
            if transient {
                warn!("{} failed, retrying: {}", what, err);
            }
            transient
        },
    )
    .await
}
