use std::future::Future;

use super::policy::{classify, RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the policy says to stop, sleeping the
/// policy delay between attempts. Returns the last error.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut f: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, classify(&e)) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    tracing::debug!(attempt, "send failed, retrying in {:?}: {:#}", d, e);
                    tokio::time::sleep(d).await;
                    attempt += 1;
                }
            },
        }
    }
}
