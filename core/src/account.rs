//! Accounts: registered users who host and attend events.

use crate::types::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
///
/// Points only ever grow, and only through completion awards. The password
/// hash is a PHC string produced by the server's credential module; this
/// crate treats it as opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Unique email address.
    pub email: String,
    /// Opaque credential hash (PHC string).
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Accumulated loyalty points.
    pub points: i64,
    /// Push delivery address, if the client registered one.
    pub push_token: Option<String>,
    /// External identity linkage (federated accounts); never set by this
    /// service, kept so federated rows round-trip.
    pub external_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last successful signin, if any.
    pub last_login: Option<DateTime<Utc>>,
}

/// Input for creating an account.
#[derive(Clone, Debug)]
pub struct NewAccount {
    /// Unique email address.
    pub email: String,
    /// Opaque credential hash.
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl Account {
    /// Builds a fresh account from signup input.
    #[must_use]
    pub fn create(new: NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            points: 0,
            push_token: None,
            external_id: None,
            created_at: now,
            last_login: None,
        }
    }

    /// The projection of an account other users may see.
    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The slice of an account exposed when resolving hosts and participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Account identifier.
    pub id: AccountId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
}
