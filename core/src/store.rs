//! Storage ports.
//!
//! One trait per record type, mirroring the three persisted collections plus
//! the ambient session and notification stores. Operations that enforce an
//! invariant (set-semantics joins, capacity bounds, idempotent completion,
//! replay-safe payment recording) are single trait methods so that every
//! implementation must provide them atomically: PostgreSQL does it with
//! row locks and transactions, the in-memory test store with one mutex.

use crate::account::{Account, NewAccount};
use crate::error::DomainResult;
use crate::event::{CompletionOutcome, Event, EventDetails, EventQuery, Page};
use crate::notification::{Audience, NotificationRecord};
use crate::transaction::Transaction;
use crate::types::{AccountId, EventId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bearer session: opaque token resolved to an account on every request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The opaque bearer token.
    pub token: Uuid,
    /// The authenticated account.
    pub account_id: AccountId,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry; the session is invalid afterwards.
    pub expires_at: DateTime<Utc>,
}

/// Persistence for accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::EmailTaken`] if the email is already registered;
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn insert(&self, new: NewAccount) -> DomainResult<Account>;

    /// Fetches an account by id.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn find(&self, id: AccountId) -> DomainResult<Option<Account>>;

    /// Fetches an account by email (exact match).
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>>;

    /// Refreshes the last-login timestamp.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> DomainResult<()>;

    /// Sets or clears the push delivery address.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::NotFound`] if the account does not exist;
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn set_push_token(&self, id: AccountId, token: Option<String>) -> DomainResult<()>;

    /// Resolves an audience to the push tokens it reaches.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn push_tokens(&self, audience: &Audience) -> DomainResult<Vec<String>>;
}

/// Persistence for events and their participant sets.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persists a freshly created event.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn insert(&self, event: &Event) -> DomainResult<()>;

    /// Fetches the bare entity.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn fetch(&self, id: EventId) -> DomainResult<Option<Event>>;

    /// Fetches an event with host and participants resolved.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn fetch_details(&self, id: EventId) -> DomainResult<Option<EventDetails>>;

    /// Lists events matching `query`, ordered by start time.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn list(&self, query: &EventQuery) -> DomainResult<Page<EventDetails>>;

    /// Adds `account` to the participant set.
    ///
    /// Membership check, capacity check, and insert happen atomically with
    /// respect to concurrent joins of the same event.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::NotFound`] if the event does not exist,
    /// [`crate::DomainError::EventCompleted`] if it is finalized,
    /// [`crate::DomainError::AlreadyJoined`] on a repeat join,
    /// [`crate::DomainError::CapacityExceeded`] when full,
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn join(&self, id: EventId, account: AccountId) -> DomainResult<()>;

    /// Finalizes an event and distributes the attendance award.
    ///
    /// The completion flag flips false→true at most once; the award applies
    /// only to `attended` ids that are in the participant set, and flag plus
    /// award commit together. Repeat calls return
    /// `newly_completed == false` and award nothing.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::NotFound`] if no such event exists under
    /// `host` (non-hosts cannot distinguish existence);
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn complete(
        &self,
        id: EventId,
        host: AccountId,
        attended: &[AccountId],
        award: i64,
    ) -> DomainResult<CompletionOutcome>;
}

/// Persistence for verified payment transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Whether a transaction with this reference code exists.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn ref_exists(&self, ref_id: &str) -> DomainResult<bool>;

    /// Records a verified payment and adds the payer to the event's
    /// participant set as one atomic unit.
    ///
    /// The reference-code uniqueness constraint is enforced by the same
    /// atomic unit, so concurrent submissions of one reference produce
    /// exactly one record. Capacity is enforced like a free join; a payer
    /// who is already a participant keeps set semantics while the
    /// transaction row is still recorded.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::DuplicateReference`] on a replayed reference,
    /// [`crate::DomainError::NotFound`] if the event does not exist,
    /// [`crate::DomainError::EventCompleted`] if it is finalized,
    /// [`crate::DomainError::CapacityExceeded`] when full,
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn record_paid_join(&self, transaction: Transaction) -> DomainResult<Transaction>;

    /// Lists transactions recorded for an event, oldest first.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn list_for_event(&self, event: EventId) -> DomainResult<Vec<Transaction>>;
}

/// Persistence for notification history.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Appends a history record.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn insert(&self, record: &NotificationRecord) -> DomainResult<()>;

    /// Returns the most recent records, newest first.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn recent(&self, limit: u32) -> DomainResult<Vec<NotificationRecord>>;
}

/// Persistence for bearer sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Issues a session for `account` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn create(&self, account: AccountId, ttl: Duration) -> DomainResult<Session>;

    /// Resolves a bearer token to its account, if the session exists and has
    /// not expired.
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::Storage`] on persistence failure.
    async fn validate(&self, token: Uuid) -> DomainResult<Option<AccountId>>;
}
