//! In-memory implementation of every storage port.
//!
//! All records live behind one mutex, so multi-record operations (paid
//! joins, completion awards) are atomic exactly the way the PostgreSQL
//! implementations make them atomic with transactions — concurrent callers
//! observe the same all-or-nothing behavior the invariants demand.

#![allow(clippy::unwrap_used)] // Test infrastructure; lock poisoning aborts the test
#![allow(clippy::missing_panics_doc)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gatherly_core::account::{Account, NewAccount};
use gatherly_core::error::{DomainError, DomainResult};
use gatherly_core::event::{CompletionOutcome, Event, EventDetails, EventQuery, Page};
use gatherly_core::notification::{Audience, NotificationRecord};
use gatherly_core::store::{
    AccountStore, EventStore, NotificationStore, Session, SessionStore, TransactionStore,
};
use gatherly_core::transaction::Transaction;
use gatherly_core::types::{AccountId, EventId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct MemDb {
    accounts: HashMap<AccountId, Account>,
    events: HashMap<EventId, Event>,
    participants: HashMap<EventId, Vec<AccountId>>,
    transactions: Vec<Transaction>,
    notifications: Vec<NotificationRecord>,
    sessions: HashMap<Uuid, Session>,
}

/// One struct implementing all five storage ports over a shared mutex.
///
/// Clones share the same underlying state, so a test can hand the same
/// store to the lifecycle manager, the dispatcher, and its own assertions.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    db: Arc<Mutex<MemDb>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemDb> {
        self.db.lock().unwrap()
    }

    /// Current participant ids of an event, in join order.
    #[must_use]
    pub fn participants_of(&self, event: EventId) -> Vec<AccountId> {
        self.lock().participants.get(&event).cloned().unwrap_or_default()
    }

    /// Points balance of an account, `0` if absent.
    #[must_use]
    pub fn points_of(&self, account: AccountId) -> i64 {
        self.lock().accounts.get(&account).map_or(0, |a| a.points)
    }

    /// Number of recorded transactions.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.lock().transactions.len()
    }

    /// Number of notification history records.
    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.lock().notifications.len()
    }
}

fn details(db: &MemDb, event: &Event) -> DomainResult<EventDetails> {
    let host = db
        .accounts
        .get(&event.host)
        .ok_or_else(|| DomainError::Storage(format!("host {} missing", event.host)))?
        .summary();
    let participants = db
        .participants
        .get(&event.id)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|id| db.accounts.get(id).map(Account::summary))
        .collect();
    Ok(EventDetails {
        event: event.clone(),
        host,
        participants,
    })
}

/// The join checks shared by free and paid joins. Caller holds the lock, so
/// the whole check-then-insert sequence is atomic.
fn join_locked(db: &mut MemDb, id: EventId, account: AccountId) -> DomainResult<()> {
    let event = db
        .events
        .get(&id)
        .ok_or_else(|| DomainError::not_found("event", id))?;
    if event.is_completed {
        return Err(DomainError::EventCompleted);
    }
    let members = db.participants.entry(id).or_default();
    if members.contains(&account) {
        return Err(DomainError::AlreadyJoined);
    }
    if members.len() as u32 >= event.max_participants {
        return Err(DomainError::CapacityExceeded);
    }
    members.push(account);
    Ok(())
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert(&self, new: NewAccount) -> DomainResult<Account> {
        let mut db = self.lock();
        if db.accounts.values().any(|a| a.email == new.email) {
            return Err(DomainError::EmailTaken);
        }
        let account = Account::create(new, Utc::now());
        db.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find(&self, id: AccountId) -> DomainResult<Option<Account>> {
        Ok(self.lock().accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> DomainResult<()> {
        if let Some(account) = self.lock().accounts.get_mut(&id) {
            account.last_login = Some(at);
        }
        Ok(())
    }

    async fn set_push_token(&self, id: AccountId, token: Option<String>) -> DomainResult<()> {
        let mut db = self.lock();
        let account = db
            .accounts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("account", id))?;
        account.push_token = token;
        Ok(())
    }

    async fn push_tokens(&self, audience: &Audience) -> DomainResult<Vec<String>> {
        let db = self.lock();
        let tokens = match audience {
            Audience::Broadcast => db
                .accounts
                .values()
                .filter_map(|a| a.push_token.clone())
                .collect(),
            Audience::Account(id) => db
                .accounts
                .get(id)
                .and_then(|a| a.push_token.clone())
                .into_iter()
                .collect(),
        };
        Ok(tokens)
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn insert(&self, event: &Event) -> DomainResult<()> {
        let mut db = self.lock();
        db.events.insert(event.id, event.clone());
        db.participants.entry(event.id).or_default();
        Ok(())
    }

    async fn fetch(&self, id: EventId) -> DomainResult<Option<Event>> {
        Ok(self.lock().events.get(&id).cloned())
    }

    async fn fetch_details(&self, id: EventId) -> DomainResult<Option<EventDetails>> {
        let db = self.lock();
        db.events.get(&id).map(|e| details(&db, e)).transpose()
    }

    async fn list(&self, query: &EventQuery) -> DomainResult<Page<EventDetails>> {
        let db = self.lock();
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<&Event> = db
            .events
            .values()
            .filter(|e| query.include_completed || !e.is_completed)
            .filter(|e| query.category.is_none_or(|c| e.category == c))
            .filter(|e| query.host.is_none_or(|h| e.host == h))
            .filter(|e| {
                query.participant.is_none_or(|p| {
                    db.participants
                        .get(&e.id)
                        .is_some_and(|members| members.contains(&p))
                })
            })
            .filter(|e| {
                needle.as_ref().is_none_or(|n| {
                    e.title.to_lowercase().contains(n)
                        || e.description.to_lowercase().contains(n)
                })
            })
            .collect();
        matching.sort_by_key(|e| e.start_time);

        let total = matching.len() as u64;
        let offset = (query.page as usize).saturating_mul(query.limit as usize);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .map(|e| details(&db, e))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn join(&self, id: EventId, account: AccountId) -> DomainResult<()> {
        join_locked(&mut self.lock(), id, account)
    }

    async fn complete(
        &self,
        id: EventId,
        host: AccountId,
        attended: &[AccountId],
        award: i64,
    ) -> DomainResult<CompletionOutcome> {
        let mut db = self.lock();
        let event = db
            .events
            .get_mut(&id)
            .filter(|e| e.host == host)
            .ok_or_else(|| DomainError::not_found("event", id))?;
        if event.is_completed {
            return Ok(CompletionOutcome {
                newly_completed: false,
                awarded: Vec::new(),
            });
        }
        event.is_completed = true;

        let members = db.participants.get(&id).cloned().unwrap_or_default();
        let mut awarded = Vec::new();
        for account in attended {
            if members.contains(account) && !awarded.contains(account) {
                awarded.push(*account);
            }
        }
        for account in &awarded {
            if let Some(a) = db.accounts.get_mut(account) {
                a.points += award;
            }
        }
        Ok(CompletionOutcome {
            newly_completed: true,
            awarded,
        })
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn ref_exists(&self, ref_id: &str) -> DomainResult<bool> {
        Ok(self.lock().transactions.iter().any(|t| t.ref_id == ref_id))
    }

    async fn record_paid_join(&self, transaction: Transaction) -> DomainResult<Transaction> {
        let mut db = self.lock();
        if db.transactions.iter().any(|t| t.ref_id == transaction.ref_id) {
            return Err(DomainError::DuplicateReference);
        }
        match join_locked(&mut db, transaction.event_id, transaction.payer_id) {
            // A payer who already joined keeps set semantics; the payment is
            // still recorded.
            Ok(()) | Err(DomainError::AlreadyJoined) => {}
            Err(other) => return Err(other),
        }
        db.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn list_for_event(&self, event: EventId) -> DomainResult<Vec<Transaction>> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .filter(|t| t.event_id == event)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert(&self, record: &NotificationRecord) -> DomainResult<()> {
        self.lock().notifications.push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: u32) -> DomainResult<Vec<NotificationRecord>> {
        let db = self.lock();
        Ok(db
            .notifications
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create(&self, account: AccountId, ttl: Duration) -> DomainResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            account_id: account,
            created_at: now,
            expires_at: now + ttl,
        };
        self.lock().sessions.insert(session.token, session.clone());
        Ok(session)
    }

    async fn validate(&self, token: Uuid) -> DomainResult<Option<AccountId>> {
        let db = self.lock();
        Ok(db
            .sessions
            .get(&token)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.account_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatherly_core::event::{EventCategory, Location, NewEvent, PaymentTerms};

    fn new_event() -> NewEvent {
        let start = Utc::now();
        NewEvent {
            title: "Board games".into(),
            description: "Casual evening".into(),
            location: Location {
                address: "Cafe Meeple".into(),
                lat: None,
                lng: None,
            },
            start_time: start,
            end_time: start + Duration::hours(3),
            max_participants: 2,
            category: EventCategory::Social,
            payment: PaymentTerms::default(),
            image_url: None,
        }
    }

    fn account(n: u32) -> NewAccount {
        NewAccount {
            email: format!("user{n}@example.com"),
            password_hash: "$argon2id$stub".into(),
            first_name: "Test".into(),
            last_name: format!("User{n}"),
        }
    }

    #[tokio::test]
    async fn join_enforces_set_semantics_and_capacity() {
        let store = InMemoryStore::new();
        let host = AccountStore::insert(&store, account(0)).await.unwrap();
        let a = AccountStore::insert(&store, account(1)).await.unwrap();
        let b = AccountStore::insert(&store, account(2)).await.unwrap();
        let c = AccountStore::insert(&store, account(3)).await.unwrap();
        let event = Event::create(host.id, new_event(), Utc::now()).unwrap();
        EventStore::insert(&store, &event).await.unwrap();

        store.join(event.id, a.id).await.unwrap();
        assert!(matches!(
            store.join(event.id, a.id).await,
            Err(DomainError::AlreadyJoined)
        ));
        store.join(event.id, b.id).await.unwrap();
        assert!(matches!(
            store.join(event.id, c.id).await,
            Err(DomainError::CapacityExceeded)
        ));
        assert_eq!(store.participants_of(event.id).len(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        AccountStore::insert(&store, account(1)).await.unwrap();
        assert!(matches!(
            AccountStore::insert(&store, account(1)).await,
            Err(DomainError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn expired_sessions_do_not_validate() {
        let store = InMemoryStore::new();
        let id = AccountId::new();
        let session = SessionStore::create(&store, id, Duration::seconds(-1))
            .await
            .unwrap();
        assert_eq!(store.validate(session.token).await.unwrap(), None);
    }
}
