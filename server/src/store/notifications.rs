//! Notification history persistence.

use super::storage_err;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatherly_core::error::{DomainError, DomainResult};
use gatherly_core::notification::{Audience, NotificationRecord};
use gatherly_core::store::NotificationStore;
use gatherly_core::types::{AccountId, NotificationId};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed notification history.
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn audience_from_row(audience: &str, account_id: Option<Uuid>) -> DomainResult<Audience> {
    match (audience, account_id) {
        ("broadcast", _) => Ok(Audience::Broadcast),
        ("account", Some(id)) => Ok(Audience::Account(AccountId::from_uuid(id))),
        _ => Err(DomainError::Storage(format!(
            "inconsistent notification audience: {audience}"
        ))),
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, record: &NotificationRecord) -> DomainResult<()> {
        let (audience, account_id) = match record.audience {
            Audience::Broadcast => ("broadcast", None),
            Audience::Account(id) => ("account", Some(*id.as_uuid())),
        };
        sqlx::query(
            "INSERT INTO notifications (id, title, body, audience, account_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.as_uuid())
        .bind(&record.title)
        .bind(&record.body)
        .bind(audience)
        .bind(account_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn recent(&self, limit: u32) -> DomainResult<Vec<NotificationRecord>> {
        let rows: Vec<(Uuid, String, String, String, Option<Uuid>, DateTime<Utc>)> =
            sqlx::query_as(
                "SELECT id, title, body, audience, account_id, created_at
                 FROM notifications
                 ORDER BY created_at DESC
                 LIMIT $1",
            )
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.into_iter()
            .map(|(id, title, body, audience, account_id, created_at)| {
                Ok(NotificationRecord {
                    id: NotificationId::from_uuid(id),
                    title,
                    body,
                    audience: audience_from_row(&audience, account_id)?,
                    created_at,
                })
            })
            .collect()
    }
}
