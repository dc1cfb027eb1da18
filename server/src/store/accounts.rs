//! Account persistence.

use super::storage_err;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatherly_core::account::{Account, NewAccount};
use gatherly_core::error::{DomainError, DomainResult};
use gatherly_core::notification::Audience;
use gatherly_core::store::AccountStore;
use gatherly_core::types::AccountId;
use sqlx::PgPool;
use uuid::Uuid;

type AccountRow = (
    Uuid,
    String,
    String,
    String,
    String,
    i64,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

fn account_from_row(row: AccountRow) -> Account {
    let (id, email, password_hash, first_name, last_name, points, push_token, external_id, created_at, last_login) =
        row;
    Account {
        id: AccountId::from_uuid(id),
        email,
        password_hash,
        first_name,
        last_name,
        points,
        push_token,
        external_id,
        created_at,
        last_login,
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, first_name, last_name, points, \
     push_token, external_id, created_at, last_login";

/// PostgreSQL-backed account store.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, new: NewAccount) -> DomainResult<Account> {
        let account = Account::create(new, Utc::now());
        let result = sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, first_name, last_name, points, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(account.id.as_uuid())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.points)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::EmailTaken)
            }
            Err(error) => Err(storage_err(error)),
        }
    }

    async fn find(&self, id: AccountId) -> DomainResult<Option<Account>> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;
        Ok(row.map(account_from_row))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;
        Ok(row.map(account_from_row))
    }

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> DomainResult<()> {
        sqlx::query("UPDATE accounts SET last_login = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn set_push_token(&self, id: AccountId, token: Option<String>) -> DomainResult<()> {
        let result = sqlx::query("UPDATE accounts SET push_token = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("account", id));
        }
        Ok(())
    }

    async fn push_tokens(&self, audience: &Audience) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> = match audience {
            Audience::Broadcast => sqlx::query_as(
                "SELECT push_token FROM accounts
                 WHERE push_token IS NOT NULL AND push_token <> ''",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?,
            Audience::Account(id) => sqlx::query_as(
                "SELECT push_token FROM accounts
                 WHERE id = $1 AND push_token IS NOT NULL AND push_token <> ''",
            )
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?,
        };
        Ok(rows.into_iter().map(|(token,)| token).collect())
    }
}
