//! Session persistence.

use super::storage_err;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use gatherly_core::error::DomainResult;
use gatherly_core::store::{Session, SessionStore};
use gatherly_core::types::AccountId;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed session store.
///
/// Tokens are opaque UUIDs; expiry is checked on every validation rather
/// than reaped, so a restarted server honors exactly the sessions the table
/// says are live.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, account: AccountId, ttl: Duration) -> DomainResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            account_id: account,
            created_at: now,
            expires_at: now + ttl,
        };
        sqlx::query(
            "INSERT INTO sessions (token, account_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(session.token)
        .bind(session.account_id.as_uuid())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(session)
    }

    async fn validate(&self, token: Uuid) -> DomainResult<Option<AccountId>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT account_id FROM sessions WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(row.map(|(id,)| AccountId::from_uuid(id)))
    }
}
