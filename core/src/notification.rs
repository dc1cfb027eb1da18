//! Notification history records.

use crate::types::{AccountId, NotificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who a notification was addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "account_id")]
pub enum Audience {
    /// Every account with a registered push token.
    Broadcast,
    /// One account.
    Account(AccountId),
}

/// A durable record of a dispatched notification.
///
/// Written synchronously before any delivery attempt; delivery outcome never
/// changes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Record identifier.
    pub id: NotificationId,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Addressee.
    pub audience: Audience,
    /// Dispatch timestamp.
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Builds a history record stamped `now`.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        audience: Audience,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            title: title.into(),
            body: body.into(),
            audience,
            created_at: now,
        }
    }
}
