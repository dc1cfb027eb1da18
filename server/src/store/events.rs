//! Event persistence and the participant set.
//!
//! The event row is the unit of concurrency control: `join` and `complete`
//! take a row lock before checking anything, so concurrent requests against
//! the same event serialize and the capacity/membership/completion checks
//! cannot race.

use super::storage_err;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatherly_core::account::AccountSummary;
use gatherly_core::error::{DomainError, DomainResult};
use gatherly_core::event::{
    CompletionOutcome, Event, EventCategory, EventDetails, EventQuery, Location, Page,
    PaymentMethod, PaymentTerms,
};
use gatherly_core::store::EventStore;
use gatherly_core::types::{AccountId, EventId, Money};
use sqlx::{PgPool, Postgres, Transaction as PgTx};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

type EventRow = (
    Uuid,
    String,
    String,
    Uuid,
    String,
    Option<f64>,
    Option<f64>,
    DateTime<Utc>,
    DateTime<Utc>,
    i32,
    String,
    String,
    i64,
    Option<String>,
    bool,
    DateTime<Utc>,
);

const EVENT_COLUMNS: &str = "id, title, description, host_id, address, lat, lng, start_time, \
     end_time, max_participants, category, payment_method, payment_amount, image_url, \
     is_completed, created_at";

fn event_from_row(row: EventRow) -> DomainResult<Event> {
    let (
        id,
        title,
        description,
        host_id,
        address,
        lat,
        lng,
        start_time,
        end_time,
        max_participants,
        category,
        payment_method,
        payment_amount,
        image_url,
        is_completed,
        created_at,
    ) = row;
    #[allow(clippy::cast_sign_loss)] // capacity is checked positive at the schema
    Ok(Event {
        id: EventId::from_uuid(id),
        title,
        description,
        host: AccountId::from_uuid(host_id),
        location: Location { address, lat, lng },
        start_time,
        end_time,
        max_participants: max_participants as u32,
        category: EventCategory::parse(&category)?,
        payment: PaymentTerms {
            method: PaymentMethod::parse(&payment_method)?,
            amount: Money::from_cents(payment_amount),
        },
        image_url,
        is_completed,
        created_at,
    })
}

type SummaryRow = (Uuid, String, String, String);

fn summary_from_row(row: SummaryRow) -> AccountSummary {
    let (id, first_name, last_name, email) = row;
    AccountSummary {
        id: AccountId::from_uuid(id),
        first_name,
        last_name,
        email,
    }
}

/// Locks an event row and reports `(is_completed, capacity, member_count)`.
///
/// Shared by the free-join path here and the paid-join path in the
/// transaction store; both run it inside the SQL transaction that performs
/// the participant insert.
pub(crate) async fn lock_event_row(
    tx: &mut PgTx<'_, Postgres>,
    id: EventId,
) -> DomainResult<Option<(bool, i32, i64)>> {
    sqlx::query_as(
        "SELECT e.is_completed, e.max_participants,
                (SELECT COUNT(*) FROM event_participants p WHERE p.event_id = e.id)
         FROM events e
         WHERE e.id = $1
         FOR UPDATE OF e",
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(storage_err)
}

/// Membership + capacity checks and the participant insert. The caller has
/// already locked the event row via [`lock_event_row`].
pub(crate) async fn insert_participant(
    tx: &mut PgTx<'_, Postgres>,
    id: EventId,
    account: AccountId,
    capacity: i32,
    member_count: i64,
) -> DomainResult<()> {
    let (already,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM event_participants WHERE event_id = $1 AND account_id = $2)",
    )
    .bind(id.as_uuid())
    .bind(account.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(storage_err)?;
    if already {
        return Err(DomainError::AlreadyJoined);
    }
    if member_count >= i64::from(capacity) {
        return Err(DomainError::CapacityExceeded);
    }

    sqlx::query(
        "INSERT INTO event_participants (event_id, account_id, joined_at) VALUES ($1, $2, NOW())",
    )
    .bind(id.as_uuid())
    .bind(account.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;
    Ok(())
}

/// PostgreSQL-backed event store.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn resolve_details(&self, events: Vec<Event>) -> DomainResult<Vec<EventDetails>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let host_ids: Vec<Uuid> = events.iter().map(|e| *e.host.as_uuid()).collect();
        let host_rows: Vec<SummaryRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, email FROM accounts WHERE id = ANY($1)",
        )
        .bind(&host_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        let hosts: HashMap<Uuid, AccountSummary> = host_rows
            .into_iter()
            .map(|row| (row.0, summary_from_row(row)))
            .collect();

        let event_ids: Vec<Uuid> = events.iter().map(|e| *e.id.as_uuid()).collect();
        let member_rows: Vec<(Uuid, Uuid, String, String, String)> = sqlx::query_as(
            "SELECT p.event_id, a.id, a.first_name, a.last_name, a.email
             FROM event_participants p
             JOIN accounts a ON a.id = p.account_id
             WHERE p.event_id = ANY($1)
             ORDER BY p.joined_at",
        )
        .bind(&event_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        let mut members: HashMap<Uuid, Vec<AccountSummary>> = HashMap::new();
        for (event_id, id, first_name, last_name, email) in member_rows {
            members
                .entry(event_id)
                .or_default()
                .push(summary_from_row((id, first_name, last_name, email)));
        }

        events
            .into_iter()
            .map(|event| {
                let host = hosts
                    .get(event.host.as_uuid())
                    .cloned()
                    .ok_or_else(|| DomainError::Storage(format!("host {} missing", event.host)))?;
                let participants = members.remove(event.id.as_uuid()).unwrap_or_default();
                Ok(EventDetails {
                    event,
                    host,
                    participants,
                })
            })
            .collect()
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: &Event) -> DomainResult<()> {
        let capacity = i32::try_from(event.max_participants)
            .map_err(|_| DomainError::validation("max_participants out of range"))?;
        sqlx::query(
            "INSERT INTO events (id, title, description, host_id, address, lat, lng, start_time,
                                 end_time, max_participants, category, payment_method,
                                 payment_amount, image_url, is_completed, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.host.as_uuid())
        .bind(&event.location.address)
        .bind(event.location.lat)
        .bind(event.location.lng)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(capacity)
        .bind(event.category.as_str())
        .bind(event.payment.method.as_str())
        .bind(event.payment.amount.cents())
        .bind(&event.image_url)
        .bind(event.is_completed)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn fetch(&self, id: EventId) -> DomainResult<Option<Event>> {
        let row: Option<EventRow> =
            sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;
        row.map(event_from_row).transpose()
    }

    async fn fetch_details(&self, id: EventId) -> DomainResult<Option<EventDetails>> {
        let Some(event) = self.fetch(id).await? else {
            return Ok(None);
        };
        let mut details = self.resolve_details(vec![event]).await?;
        Ok(details.pop())
    }

    async fn list(&self, query: &EventQuery) -> DomainResult<Page<EventDetails>> {
        let category = query.category.map(|c| c.as_str().to_string());
        let host = query.host.map(|h| *h.as_uuid());
        let participant = query.participant.map(|p| *p.as_uuid());

        const FILTER: &str = "($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL
                   OR title ILIKE '%' || $2 || '%'
                   OR description ILIKE '%' || $2 || '%')
              AND ($3::bool OR NOT is_completed)
              AND ($4::uuid IS NULL OR host_id = $4)
              AND ($5::uuid IS NULL OR EXISTS (
                       SELECT 1 FROM event_participants p
                       WHERE p.event_id = events.id AND p.account_id = $5))";

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM events WHERE {FILTER}"
        ))
        .bind(&category)
        .bind(&query.search)
        .bind(query.include_completed)
        .bind(host)
        .bind(participant)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE {FILTER}
             ORDER BY start_time ASC
             LIMIT $6 OFFSET $7"
        ))
        .bind(&category)
        .bind(&query.search)
        .bind(query.include_completed)
        .bind(host)
        .bind(participant)
        .bind(i64::from(query.limit))
        .bind(i64::from(query.page) * i64::from(query.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let events = rows
            .into_iter()
            .map(event_from_row)
            .collect::<DomainResult<Vec<_>>>()?;
        let items = self.resolve_details(events).await?;

        #[allow(clippy::cast_sign_loss)] // COUNT(*) is never negative
        Ok(Page {
            items,
            total: total as u64,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn join(&self, id: EventId, account: AccountId) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let (is_completed, capacity, member_count) = lock_event_row(&mut tx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("event", id))?;
        if is_completed {
            return Err(DomainError::EventCompleted);
        }
        insert_participant(&mut tx, id, account, capacity, member_count).await?;

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn complete(
        &self,
        id: EventId,
        host: AccountId,
        attended: &[AccountId],
        award: i64,
    ) -> DomainResult<CompletionOutcome> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let flipped: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE events SET is_completed = TRUE
             WHERE id = $1 AND host_id = $2 AND NOT is_completed
             RETURNING id",
        )
        .bind(id.as_uuid())
        .bind(host.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;

        if flipped.is_none() {
            // Distinguish "already completed" (idempotent no-op) from
            // "not yours / doesn't exist".
            let (owned,): (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM events WHERE id = $1 AND host_id = $2)",
            )
            .bind(id.as_uuid())
            .bind(host.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_err)?;
            if owned {
                return Ok(CompletionOutcome {
                    newly_completed: false,
                    awarded: Vec::new(),
                });
            }
            return Err(DomainError::not_found("event", id));
        }

        let attended_ids: Vec<Uuid> = attended.iter().map(|a| *a.as_uuid()).collect();
        let awarded_rows: Vec<(Uuid,)> = sqlx::query_as(
            "UPDATE accounts SET points = points + $3
             WHERE id IN (
                 SELECT account_id FROM event_participants
                 WHERE event_id = $1 AND account_id = ANY($2)
             )
             RETURNING id",
        )
        .bind(id.as_uuid())
        .bind(&attended_ids)
        .bind(award)
        .fetch_all(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;

        let awarded_set: HashSet<Uuid> = awarded_rows.into_iter().map(|(id,)| id).collect();
        let mut awarded = Vec::new();
        for account in attended {
            if awarded_set.contains(account.as_uuid()) && !awarded.contains(account) {
                awarded.push(*account);
            }
        }
        Ok(CompletionOutcome {
            newly_completed: true,
            awarded,
        })
    }
}
