use crate::core::AcquireError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Bounded retries with a constant delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total runs = 1 initial + `max_retries`.
    pub max_retries: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Runs `operation` until it yields a value accepted by `accept`.
    ///
    /// A rejected value counts as [`AcquireError::NoDataFound`]. Results of
    /// separate attempts are never merged.
    pub async fn attempt<F, Fut, T, P>(
        &self,
        source_name: &str,
        mut operation: F,
        accept: P,
    ) -> Result<T, AcquireError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AcquireError>>,
        P: Fn(&T) -> bool,
    {
        let total = self.max_retries + 1;
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(val) if accept(&val) => return Ok(val),
                Ok(_) => AcquireError::NoDataFound {
                    source_name: source_name.to_string(),
                },
                Err(err) => err,
            };

            if attempt >= total {
                return Err(AcquireError::ExhaustedRetries {
                    source_name: source_name.to_string(),
                    attempts: attempt,
                    last_error: Box::new(err),
                });
            }
            debug!(
                "Attempt {}/{} for {} failed: {}. Retrying...",
                attempt, total, source_name, err
            );
            attempt += 1;
            tokio::time::sleep(self.delay).await;
        }
    }
}
