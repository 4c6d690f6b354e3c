//! Retry loop around whole transfer attempts.

use std::future::Future;

use simplebank_core::ledger::{LedgerError, RetryPolicy, TransferExecution};
use tracing::{debug, warn};

use super::context::TransferContext;

/// Runs `attempt` until it succeeds, fails with a non-transient error, or the
/// policy's budget is spent.
///
/// Each call to `attempt` receives the 1-based attempt number and must run in
/// a fresh store transaction. Between attempts the loop sleeps for the
/// policy's backoff, waking early with `Cancelled` if `ctx` fires.
pub(crate) async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    ctx: &TransferContext,
    mut attempt: F,
) -> Result<T, LedgerError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut execution = TransferExecution::new(policy.max_attempts);

    loop {
        let number = execution.begin()?;

        let err = match attempt(number).await {
            Ok(value) => {
                execution.commit()?;
                return Ok(value);
            }
            Err(err) => err,
        };
        execution.roll_back()?;

        if !err.is_retryable() {
            execution.fail()?;
            return Err(err);
        }
        // The execution owns the attempt budget.
        if !execution.retry()? {
            return Err(LedgerError::ExhaustedRetries {
                attempts: number,
                last: Box::new(err),
            });
        }

        let delay = policy.delay_for(number);
        warn!(
            attempt = number,
            max_attempts = policy.max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Transient conflict, retrying transfer"
        );

        tokio::select! {
            biased;
            () = ctx.cancelled() => {
                debug!(attempt = number, "Cancelled during backoff");
                return Err(LedgerError::Cancelled(ctx.reason().to_string()));
            }
            () = tokio::time::sleep(delay) => {}
        }
    }
}
