//! Gatherly HTTP service.
//!
//! Serves the event-discovery and attendance API:
//!
//! - **Accounts & sessions** — signup/signin with argon2 credential hashes
//!   and opaque bearer session tokens
//! - **Event lifecycle** — creation, capacity-bounded joining, payment-gated
//!   joining, host-only completion with attendance awards
//! - **Notifications** — durable history plus best-effort push fan-out
//!
//! Domain rules live in `gatherly-core`; this crate provides the axum
//! handlers, the PostgreSQL implementations of the storage ports, the HTTP
//! clients for the payment and push gateways, and the wiring that holds it
//! all together. Every dependency is constructed once at startup and shared
//! by reference through [`state::AppState`] — there are no process-wide
//! singletons.

#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod payment_gateway;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
