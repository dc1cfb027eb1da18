//! Payment endpoint.
//!
//! `POST /api/v1/payment/verify-manual` gates event participation on an
//! externally verified payment reference.

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use gatherly_core::transaction::{Transaction, TransactionStatus};
use gatherly_core::types::{AccountId, EventId, Money, TransactionId};
use serde::{Deserialize, Serialize};

/// Manual payment verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyManualRequest {
    /// Gateway reference code the participant submitted.
    pub ref_id: String,
    /// The event being paid for.
    pub event_id: EventId,
    /// The paying account.
    pub user_id: AccountId,
    /// Amount paid, in minor units; must match the gateway's record.
    pub amount: i64,
}

/// The recorded transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction id.
    pub transaction_id: TransactionId,
    /// The event joined.
    pub event_id: EventId,
    /// The payer.
    pub payer_id: AccountId,
    /// Amount recorded.
    pub amount: Money,
    /// Gateway reference code.
    pub ref_id: String,
    /// Settlement state; always `COMPLETE` for recorded transactions.
    pub status: TransactionStatus,
    /// Recording timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            transaction_id: t.id,
            event_id: t.event_id,
            payer_id: t.payer_id,
            amount: t.amount,
            ref_id: t.ref_id,
            status: t.status,
            created_at: t.created_at,
        }
    }
}

/// Verify a manual payment and join the payer to the event.
///
/// The `user_id` in the body must be the authenticated account — nobody
/// buys participation on someone else's behalf.
pub async fn verify_manual(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<VerifyManualRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    if request.user_id != user.account_id {
        return Err(gatherly_core::DomainError::Forbidden(
            "payer must match the authenticated account".into(),
        )
        .into());
    }
    let transaction = state
        .lifecycle
        .verify_manual_payment(
            &request.ref_id,
            request.event_id,
            request.user_id,
            Money::from_cents(request.amount),
        )
        .await?;
    Ok(Json(transaction.into()))
}
