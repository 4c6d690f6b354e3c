//! Per-call transfer context.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied context for one `execute_transfer` call.
///
/// Carries an optional trace id for log correlation, a cancellation token and
/// an optional deadline. A fired token or passed deadline before commit makes
/// the current attempt roll back.
#[derive(Debug, Clone, Default)]
pub struct TransferContext {
    trace_id: Option<String>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl TransferContext {
    /// Context with no trace id, no deadline and a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trace/correlation id recorded on the transfer span.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Uses `token` as the cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Trace id, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the token fired or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline_passed()
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves when the token fires or the deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }

    /// Human-readable reason for a cancellation.
    pub fn reason(&self) -> &'static str {
        if self.cancel.is_cancelled() {
            "cancelled by caller"
        } else {
            "deadline exceeded"
        }
    }
}
