//! Notification endpoints: history read and manual broadcast.

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::notify::BroadcastReport;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use gatherly_core::DomainError;
use gatherly_core::notification::{Audience, NotificationRecord};
use gatherly_core::store::NotificationStore;
use gatherly_core::types::NotificationId;
use serde::{Deserialize, Serialize};

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum records to return (default 50, max 200).
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

const fn default_history_limit() -> u32 {
    50
}

/// One history record.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Record id.
    pub id: NotificationId,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
    /// Addressee.
    pub audience: Audience,
    /// Dispatch timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRecord> for NotificationResponse {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            body: record.body,
            audience: record.audience,
            created_at: record.created_at,
        }
    }
}

/// Manual broadcast request.
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

/// Notification history, newest first.
pub async fn list_notifications(
    _user: CurrentUser,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let records = state
        .notifications
        .recent(query.limit.clamp(1, 200))
        .await?;
    Ok(Json(
        records.into_iter().map(NotificationResponse::from).collect(),
    ))
}

/// Persist and fan out a broadcast, reporting delivery counts.
pub async fn send_notification(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<BroadcastReport>, ApiError> {
    if request.title.trim().is_empty() || request.body.trim().is_empty() {
        return Err(DomainError::validation("title and body are required").into());
    }
    let report = state
        .dispatcher
        .broadcast(&request.title, &request.body)
        .await?;
    Ok(Json(report))
}
