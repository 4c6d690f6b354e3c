//! Balance adjustment strategy selection.

use serde::{Deserialize, Serialize};

/// How a transfer applies its two balance adjustments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStrategy {
    /// Single-statement `balance = balance + delta` per account. No lock is
    /// held across statements, so lock order cannot produce a cycle.
    #[default]
    AtomicIncrement,
    /// `SELECT ... FOR UPDATE` both rows in ascending id order, then write the
    /// computed balances. For stores without an atomic increment.
    OrderedLocking,
}

impl BalanceStrategy {
    /// Returns the configuration name of the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AtomicIncrement => "atomic_increment",
            Self::OrderedLocking => "ordered_locking",
        }
    }
}

impl std::fmt::Display for BalanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_atomic_increment() {
        assert_eq!(BalanceStrategy::default(), BalanceStrategy::AtomicIncrement);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&BalanceStrategy::OrderedLocking).unwrap();
        assert_eq!(json, "\"ordered_locking\"");
        let parsed: BalanceStrategy = serde_json::from_str("\"atomic_increment\"").unwrap();
        assert_eq!(parsed, BalanceStrategy::AtomicIncrement);
        assert_eq!(BalanceStrategy::OrderedLocking.to_string(), "ordered_locking");
    }
}
