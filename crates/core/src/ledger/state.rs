//! Attempt state machine for one transfer execution.
//!
//! ```text
//! Pending -> InTransaction -> Committed
//!                          -> RolledBack -> Pending   (retry, budget left)
//!                                        -> Failed    (budget spent or error not retryable)
//! ```

use std::fmt;

use thiserror::Error;

/// State of one transfer execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Waiting to open a store transaction.
    Pending,
    /// A store transaction is open and the protocol is running.
    InTransaction,
    /// Terminal: all five writes committed.
    Committed,
    /// The attempt's transaction was rolled back.
    RolledBack,
    /// Terminal: no further attempt will be made.
    Failed,
}

impl TransferState {
    /// Check if this is a terminal state (no more transitions possible).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }

    /// Returns true if moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InTransaction | Self::Failed)
                | (Self::InTransaction, Self::Committed | Self::RolledBack)
                | (Self::RolledBack, Self::Pending | Self::Failed)
        )
    }

    /// Get human-readable state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InTransaction => "IN_TRANSACTION",
            Self::Committed => "COMMITTED",
            Self::RolledBack => "ROLLED_BACK",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An illegal state transition was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal transfer state transition {from} -> {to}")]
pub struct InvalidTransition {
    /// State before the request.
    pub from: TransferState,
    /// Requested state.
    pub to: TransferState,
}

/// Tracks state and attempt count across the retries of one transfer.
#[derive(Debug, Clone)]
pub struct TransferExecution {
    state: TransferState,
    attempt: u32,
    max_attempts: u32,
}

impl TransferExecution {
    /// Starts a new execution with the given attempt budget.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: TransferState::Pending,
            attempt: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TransferState {
        self.state
    }

    /// Number of attempts started so far (1-based once running).
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if another attempt fits in the budget.
    #[must_use]
    pub const fn has_budget(&self) -> bool {
        self.attempt < self.max_attempts
    }

    fn transition(&mut self, next: TransferState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// `Pending -> InTransaction`, counting a new attempt.
    pub fn begin(&mut self) -> Result<u32, InvalidTransition> {
        if !self.has_budget() {
            return Err(InvalidTransition {
                from: self.state,
                to: TransferState::InTransaction,
            });
        }
        self.transition(TransferState::InTransaction)?;
        self.attempt += 1;
        Ok(self.attempt)
    }

    /// `InTransaction -> Committed`.
    pub fn commit(&mut self) -> Result<(), InvalidTransition> {
        self.transition(TransferState::Committed)
    }

    /// `InTransaction -> RolledBack`.
    pub fn roll_back(&mut self) -> Result<(), InvalidTransition> {
        self.transition(TransferState::RolledBack)
    }

    /// After a rollback: back to `Pending` if budget remains, else `Failed`.
    ///
    /// Returns true if another attempt may start.
    pub fn retry(&mut self) -> Result<bool, InvalidTransition> {
        if self.has_budget() {
            self.transition(TransferState::Pending)?;
            Ok(true)
        } else {
            self.transition(TransferState::Failed)?;
            Ok(false)
        }
    }

    /// Ends the execution without a further attempt.
    pub fn fail(&mut self) -> Result<(), InvalidTransition> {
        self.transition(TransferState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Committed.is_terminal());
        assert!(TransferState::Failed.is_terminal());

        assert!(!TransferState::Pending.is_terminal());
        assert!(!TransferState::InTransaction.is_terminal());
        assert!(!TransferState::RolledBack.is_terminal());
    }

    #[test]
    fn test_happy_path() {
        let mut exec = TransferExecution::new(3);
        assert_eq!(exec.begin().unwrap(), 1);
        assert_eq!(exec.state(), TransferState::InTransaction);
        exec.commit().unwrap();
        assert_eq!(exec.state(), TransferState::Committed);
        assert!(exec.begin().is_err());
    }

    #[test]
    fn test_retry_until_budget_spent() {
        let mut exec = TransferExecution::new(2);

        exec.begin().unwrap();
        exec.roll_back().unwrap();
        assert!(exec.retry().unwrap());
        assert_eq!(exec.state(), TransferState::Pending);

        assert_eq!(exec.begin().unwrap(), 2);
        exec.roll_back().unwrap();
        assert!(!exec.retry().unwrap());
        assert_eq!(exec.state(), TransferState::Failed);
        assert!(exec.state().is_terminal());
    }

    #[test]
    fn test_illegal_transitions() {
        let mut exec = TransferExecution::new(1);
        assert_eq!(
            exec.commit(),
            Err(InvalidTransition {
                from: TransferState::Pending,
                to: TransferState::Committed,
            })
        );
        assert!(exec.roll_back().is_err());

        exec.begin().unwrap();
        assert!(exec.retry().is_err());
        assert!(exec.fail().is_err());
    }

    #[test]
    fn test_rolled_back_can_fail_directly() {
        let mut exec = TransferExecution::new(5);
        exec.begin().unwrap();
        exec.roll_back().unwrap();
        exec.fail().unwrap();
        assert_eq!(exec.state(), TransferState::Failed);
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferState::InTransaction.to_string(), "IN_TRANSACTION");
        assert_eq!(TransferState::RolledBack.to_string(), "ROLLED_BACK");
    }
}
