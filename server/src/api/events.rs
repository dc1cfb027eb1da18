//! Event endpoints.
//!
//! - `POST /api/v1/events` — create (requires auth)
//! - `GET  /api/v1/events` — paginated listing with category/search filters
//! - `GET  /api/v1/events/joined|hosted|ongoing` — caller-scoped listings
//! - `GET  /api/v1/events/:id` — details with host/participants resolved
//! - `POST /api/v1/events/:id/join` — capacity-bounded join
//! - `POST /api/v1/events/:id/complete` — host-only finalize + awards

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use gatherly_core::account::AccountSummary;
use gatherly_core::event::{
    ATTENDANCE_AWARD, DEFAULT_CAPACITY, EventCategory, EventDetails, EventQuery, Location,
    NewEvent, Page, PaymentMethod, PaymentTerms,
};
use gatherly_core::store::EventStore;
use gatherly_core::types::{AccountId, EventId, Money};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Location accepted either as a bare address string or a structured object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LocationBody {
    /// `"location": "Riverside park"`
    Address(String),
    /// `"location": {"address": "...", "lat": ..., "lng": ...}`
    Full {
        /// Free-text address.
        address: String,
        /// Optional latitude.
        #[serde(default)]
        lat: Option<f64>,
        /// Optional longitude.
        #[serde(default)]
        lng: Option<f64>,
    },
}

impl From<LocationBody> for Location {
    fn from(body: LocationBody) -> Self {
        match body {
            LocationBody::Address(address) => Self {
                address,
                lat: None,
                lng: None,
            },
            LocationBody::Full { address, lat, lng } => Self { address, lat, lng },
        }
    }
}

/// Request to create a new event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Venue.
    pub location: LocationBody,
    /// Start time; defaults to now.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// End time; defaults to the start time.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Capacity; defaults to 50.
    #[serde(default)]
    pub max_participants: Option<u32>,
    /// Category; defaults to `other`.
    #[serde(default)]
    pub category: Option<EventCategory>,
    /// Payment method; defaults to `bank_transfer`.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Fee per participant in minor units; defaults to 0.
    #[serde(default)]
    pub price: Option<i64>,
    /// Optional cover-image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// An event with host and participants resolved.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event id.
    pub id: EventId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Resolved host.
    pub host: AccountSummary,
    /// Venue.
    pub location: Location,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// End time.
    pub end_time: DateTime<Utc>,
    /// Capacity.
    pub max_participants: u32,
    /// Category.
    pub category: EventCategory,
    /// Payment terms.
    pub payment: PaymentTerms,
    /// Cover-image URL, if any.
    pub image_url: Option<String>,
    /// Whether the event is finalized.
    pub is_completed: bool,
    /// Resolved participants, in join order.
    pub participants: Vec<AccountSummary>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<EventDetails> for EventResponse {
    fn from(details: EventDetails) -> Self {
        let event = details.event;
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            host: details.host,
            location: event.location,
            start_time: event.start_time,
            end_time: event.end_time,
            max_participants: event.max_participants,
            category: event.category,
            payment: event.payment,
            image_url: event.image_url,
            is_completed: event.is_completed,
            participants: details.participants,
            created_at: event.created_at,
        }
    }
}

/// Query parameters for listings.
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Filter by category.
    #[serde(default)]
    pub category: Option<EventCategory>,
    /// Case-insensitive substring search over title and description.
    #[serde(default)]
    pub search: Option<String>,
    /// Zero-indexed page.
    #[serde(default)]
    pub page: u32,
    /// Page size (default 20, max 100).
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn default_limit() -> u32 {
    20
}

/// One page of events.
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    /// Events on this page.
    pub events: Vec<EventResponse>,
    /// Total matches across pages.
    pub total: u64,
    /// Zero-indexed page.
    pub page: u32,
    /// Page size used.
    pub limit: u32,
}

impl From<Page<EventDetails>> for ListEventsResponse {
    fn from(page: Page<EventDetails>) -> Self {
        Self {
            events: page.items.into_iter().map(EventResponse::from).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}

/// Request to finalize an event.
#[derive(Debug, Deserialize)]
pub struct CompleteEventRequest {
    /// Accounts the host marks as attended. Non-participants are ignored.
    #[serde(default)]
    pub attended_account_ids: Vec<AccountId>,
}

/// Outcome of a completion request.
#[derive(Debug, Serialize)]
pub struct CompleteEventResponse {
    /// Whether this call performed the transition (false on repeats).
    pub newly_completed: bool,
    /// Accounts that received the award.
    pub awarded: Vec<AccountId>,
    /// Points granted to each awarded account.
    pub award: i64,
}

// ============================================================================
// Handlers
// ============================================================================

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, 100)
}

/// Create a new event. The authenticated caller becomes the host.
pub async fn create_event(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let start_time = request.start_time.unwrap_or_else(Utc::now);
    let new = NewEvent {
        title: request.title,
        description: request.description,
        location: request.location.into(),
        start_time,
        end_time: request.end_time.unwrap_or(start_time),
        max_participants: request.max_participants.unwrap_or(DEFAULT_CAPACITY),
        category: request.category.unwrap_or_default(),
        payment: PaymentTerms {
            method: request.payment_method.unwrap_or_default(),
            amount: Money::from_cents(request.price.unwrap_or(0)),
        },
        image_url: request.image_url,
    };

    let details = state.lifecycle.create_event(user.account_id, new).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// List not-completed events with pagination and filters. Public.
pub async fn list_events(
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let page = state
        .events
        .list(&EventQuery {
            category: query.category,
            search: query.search,
            page: query.page,
            limit: clamp_limit(query.limit),
            ..EventQuery::default()
        })
        .await?;
    Ok(Json(page.into()))
}

/// Events the caller has joined, completed ones included.
pub async fn joined_events(
    user: CurrentUser,
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let page = state
        .events
        .list(&EventQuery {
            participant: Some(user.account_id),
            include_completed: true,
            category: query.category,
            search: query.search,
            page: query.page,
            limit: clamp_limit(query.limit),
            ..EventQuery::default()
        })
        .await?;
    Ok(Json(page.into()))
}

/// Events the caller hosts, completed ones included.
pub async fn hosted_events(
    user: CurrentUser,
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let page = state
        .events
        .list(&EventQuery {
            host: Some(user.account_id),
            include_completed: true,
            category: query.category,
            search: query.search,
            page: query.page,
            limit: clamp_limit(query.limit),
            ..EventQuery::default()
        })
        .await?;
    Ok(Json(page.into()))
}

/// Events the caller hosts that are still open.
pub async fn ongoing_events(
    user: CurrentUser,
    Query(query): Query<ListEventsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let page = state
        .events
        .list(&EventQuery {
            host: Some(user.account_id),
            category: query.category,
            search: query.search,
            page: query.page,
            limit: clamp_limit(query.limit),
            ..EventQuery::default()
        })
        .await?;
    Ok(Json(page.into()))
}

/// Fetch one event with host and participants resolved. Public.
pub async fn get_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<EventResponse>, ApiError> {
    let details = state
        .events
        .fetch_details(EventId::from_uuid(event_id))
        .await?
        .ok_or_else(|| ApiError::from(gatherly_core::DomainError::not_found("event", event_id)))?;
    Ok(Json(details.into()))
}

/// Join an event.
pub async fn join_event(
    user: CurrentUser,
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<EventResponse>, ApiError> {
    let details = state
        .lifecycle
        .join_event(EventId::from_uuid(event_id), user.account_id)
        .await?;
    Ok(Json(details.into()))
}

/// Finalize an event and distribute attendance awards. Host only.
pub async fn complete_event(
    user: CurrentUser,
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CompleteEventRequest>,
) -> Result<Json<CompleteEventResponse>, ApiError> {
    let outcome = state
        .lifecycle
        .complete_event(
            EventId::from_uuid(event_id),
            user.account_id,
            &request.attended_account_ids,
        )
        .await?;
    Ok(Json(CompleteEventResponse {
        newly_completed: outcome.newly_completed,
        awarded: outcome.awarded,
        award: ATTENDANCE_AWARD,
    }))
}
