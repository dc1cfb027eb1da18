//! Transaction persistence and the paid-join path.
//!
//! `record_paid_join` is the one multi-record write in the system: the
//! transaction row and the participant insert commit together, with the
//! event row locked, so a replayed reference, a full event, or a crash can
//! never leave a recorded payment without its join (or vice versa).

use super::events::{insert_participant, lock_event_row};
use super::storage_err;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatherly_core::error::{DomainError, DomainResult};
use gatherly_core::store::TransactionStore;
use gatherly_core::transaction::{Transaction, TransactionStatus};
use gatherly_core::types::{AccountId, EventId, Money, TransactionId};
use sqlx::PgPool;
use uuid::Uuid;

type TransactionRow = (Uuid, Uuid, Uuid, i64, String, String, DateTime<Utc>);

fn transaction_from_row(row: TransactionRow) -> DomainResult<Transaction> {
    let (id, event_id, payer_id, amount, ref_id, status, created_at) = row;
    Ok(Transaction {
        id: TransactionId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        payer_id: AccountId::from_uuid(payer_id),
        amount: Money::from_cents(amount),
        ref_id,
        status: TransactionStatus::parse(&status)?,
        created_at,
    })
}

/// PostgreSQL-backed transaction store.
#[derive(Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn ref_exists(&self, ref_id: &str) -> DomainResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM transactions WHERE ref_id = $1)")
                .bind(ref_id)
                .fetch_one(&self.pool)
                .await
                .map_err(storage_err)?;
        Ok(exists)
    }

    async fn record_paid_join(&self, transaction: Transaction) -> DomainResult<Transaction> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let (is_completed, capacity, member_count) =
            lock_event_row(&mut tx, transaction.event_id)
                .await?
                .ok_or_else(|| DomainError::not_found("event", transaction.event_id))?;
        if is_completed {
            return Err(DomainError::EventCompleted);
        }

        // The unique index arbitrates concurrent replays: the loser's insert
        // conflicts and returns no row.
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO transactions (id, event_id, payer_id, amount, ref_id, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (ref_id) DO NOTHING
             RETURNING id",
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.event_id.as_uuid())
        .bind(transaction.payer_id.as_uuid())
        .bind(transaction.amount.cents())
        .bind(&transaction.ref_id)
        .bind(transaction.status.as_str())
        .bind(transaction.created_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;
        if inserted.is_none() {
            return Err(DomainError::DuplicateReference);
        }

        match insert_participant(
            &mut tx,
            transaction.event_id,
            transaction.payer_id,
            capacity,
            member_count,
        )
        .await
        {
            // A payer who already joined keeps set semantics; the payment is
            // still recorded.
            Ok(()) | Err(DomainError::AlreadyJoined) => {}
            Err(other) => return Err(other),
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(transaction)
    }

    async fn list_for_event(&self, event: EventId) -> DomainResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT id, event_id, payer_id, amount, ref_id, status, created_at
             FROM transactions
             WHERE event_id = $1
             ORDER BY created_at",
        )
        .bind(event.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows.into_iter().map(transaction_from_row).collect()
    }
}
