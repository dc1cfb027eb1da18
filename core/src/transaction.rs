//! Transactions: externally verified payments tied to one event join.

use crate::error::{DomainError, DomainResult};
use crate::types::{AccountId, EventId, Money, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settlement state of a recorded transaction.
///
/// The enumeration mirrors the gateway vocabulary and the database check
/// constraint, but this service only ever records `Complete` rows —
/// asynchronous confirmation has no update path and is deliberately
/// unsupported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Awaiting settlement.
    Pending,
    /// Settled.
    Complete,
    /// Settlement failed.
    Failed,
}

impl TransactionStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        }
    }

    /// Parses the database representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] for an unknown value.
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETE" => Ok(Self::Complete),
            "FAILED" => Ok(Self::Failed),
            _ => Err(DomainError::Storage(format!(
                "unknown transaction status: {s}"
            ))),
        }
    }
}

/// A recorded, externally verified payment.
///
/// Immutable once created; the external `ref_id` is globally unique and is
/// the sole replay-prevention mechanism.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier.
    pub id: TransactionId,
    /// The event this payment buys into.
    pub event_id: EventId,
    /// The paying account.
    pub payer_id: AccountId,
    /// Amount paid.
    pub amount: Money,
    /// External gateway reference code; globally unique, case-sensitive.
    pub ref_id: String,
    /// Settlement state.
    pub status: TransactionStatus,
    /// Recording timestamp.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds the record for a gateway-verified payment.
    #[must_use]
    pub fn verified(
        event_id: EventId,
        payer_id: AccountId,
        amount: Money,
        ref_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            event_id,
            payer_id,
            amount,
            ref_id,
            status: TransactionStatus::Complete,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_db_strings() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Complete,
            TransactionStatus::Failed,
        ] {
            assert!(matches!(
                TransactionStatus::parse(status.as_str()),
                Ok(s) if s == status
            ));
        }
        assert!(TransactionStatus::parse("SETTLED").is_err());
    }
}
