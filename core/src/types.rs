//! Identifier newtypes and shared value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner `Uuid`.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an account.
    AccountId
}

uuid_id! {
    /// Unique identifier for an event.
    EventId
}

uuid_id! {
    /// Unique identifier for a recorded payment transaction.
    TransactionId
}

uuid_id! {
    /// Unique identifier for a notification history record.
    NotificationId
}

/// A monetary amount in minor currency units (cents).
///
/// Stored and compared as an integer; rendered as `major.minor` on wire
/// boundaries that want a decimal (the payment gateway's `total_amount`
/// query parameter).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units (cents).
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from major units.
    #[must_use]
    pub const fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whether the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_as_decimal() {
        assert_eq!(Money::from_cents(1250).to_string(), "12.50");
        assert_eq!(Money::from_major(7).to_string(), "7.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-130).to_string(), "-1.30");
    }

    #[test]
    fn ids_round_trip_through_serde() {
        let id = EventId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    mod properties {
        use super::super::Money;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn money_always_renders_two_fraction_digits(cents in -10_000_000_i64..10_000_000) {
                let rendered = Money::from_cents(cents).to_string();
                let (_, fraction) = rendered.split_once('.').unwrap();
                prop_assert_eq!(fraction.len(), 2);
            }
        }
    }
}
