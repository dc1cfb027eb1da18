//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints under `/api/v1` and
//! health checks at the root.

use crate::api::{events, health, notifications, payments, users};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Protected routes authenticate through the `CurrentUser` extractor; the
/// listing, single-event, signup/signin, and health endpoints are public.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Accounts & sessions
        .route("/user/signup", post(users::signup))
        .route("/user/signin", post(users::signin))
        .route("/user/profile", get(users::profile))
        .route("/user/push-token", put(users::register_push_token))
        // Event lifecycle
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/joined", get(events::joined_events))
        .route("/events/hosted", get(events::hosted_events))
        .route("/events/ongoing", get(events::ongoing_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/join", post(events::join_event))
        .route("/events/:id/complete", post(events::complete_event))
        // Payments
        .route("/payment/verify-manual", post(payments::verify_manual))
        // Notifications
        .route(
            "/notifications",
            get(notifications::list_notifications),
        )
        .route("/notifications/send", post(notifications::send_notification));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
