//! Transaction, subscription, and vendor-mode enums plus the transaction
//! state machine.
//!
//! Transaction status is a closed enum: `open` may move to any of the four
//! terminal states, terminal states accept only an identical replay (webhook
//! notifications are retried liberally by the vendor, so replays must be
//! safe no-ops).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Open,
    Paid,
    Canceled,
    Expired,
    Failed,
}

impl TransactionStatus {
    /// Terminal states are final; nothing transitions out of them.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Open)
    }

    /// Whether a transition from `self` to `to` is legal.
    ///
    /// `open` may move to any state. A terminal state accepts only an
    /// idempotent re-application of itself.
    pub fn can_transition(self, to: TransactionStatus) -> bool {
        self == TransactionStatus::Open || self == to
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Open => "open",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Canceled => "canceled",
            TransactionStatus::Expired => "expired",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SequenceType
// ---------------------------------------------------------------------------

/// Classifies a transaction within a payment series.
///
/// `First` is assigned at creation time to the transaction that will spawn a
/// subscription once paid. `Recurring` is reserved for renewal transactions
/// created out-of-band by the vendor itself and is never assigned locally at
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceType {
    Oneoff,
    First,
    Recurring,
}

impl SequenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SequenceType::Oneoff => "oneoff",
            SequenceType::First => "first",
            SequenceType::Recurring => "recurring",
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// VendorMode
// ---------------------------------------------------------------------------

/// Which vendor environment a record belongs to.
///
/// Donors are unique per `(email, mode)` pair so sandbox records never
/// pollute live totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorMode {
    Test,
    Live,
}

impl VendorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            VendorMode::Test => "test",
            VendorMode::Live => "live",
        }
    }
}

impl fmt::Display for VendorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SubscriptionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::TransactionStatus::*;

    #[test]
    fn open_reaches_every_terminal_state() {
        for to in [Paid, Canceled, Expired, Failed] {
            assert!(Open.can_transition(to));
        }
    }

    #[test]
    fn terminal_states_refuse_other_targets() {
        assert!(!Paid.can_transition(Open));
        assert!(!Paid.can_transition(Canceled));
        assert!(!Expired.can_transition(Paid));
        assert!(!Failed.can_transition(Open));
    }

    #[test]
    fn identical_replay_is_always_legal() {
        for status in [Open, Paid, Canceled, Expired, Failed] {
            assert!(status.can_transition(status));
        }
    }

    #[test]
    fn only_open_is_non_terminal() {
        assert!(!Open.is_terminal());
        for status in [Paid, Canceled, Expired, Failed] {
            assert!(status.is_terminal());
        }
    }
}
