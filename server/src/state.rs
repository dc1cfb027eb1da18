//! Application state shared across HTTP handlers.

use crate::lifecycle::EventLifecycle;
use crate::notify::NotificationDispatcher;
use chrono::Duration;
use gatherly_core::store::{AccountStore, EventStore, NotificationStore, SessionStore, TransactionStore};
use std::sync::Arc;

/// Everything a handler can reach: the lifecycle manager for commands, the
/// stores for queries, the dispatcher for manual sends.
///
/// Cloned (cheaply, all `Arc`s) for each request. Constructed once at
/// bootstrap — handlers never look anything up ambiently.
#[derive(Clone)]
pub struct AppState {
    /// The event lifecycle manager.
    pub lifecycle: Arc<EventLifecycle>,
    /// Notification dispatcher, for the manual broadcast endpoint.
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Account persistence.
    pub accounts: Arc<dyn AccountStore>,
    /// Event persistence (read side of listings).
    pub events: Arc<dyn EventStore>,
    /// Transaction persistence.
    pub transactions: Arc<dyn TransactionStore>,
    /// Notification history.
    pub notifications: Arc<dyn NotificationStore>,
    /// Session persistence.
    pub sessions: Arc<dyn SessionStore>,
    /// Lifetime of newly issued sessions.
    pub session_ttl: Duration,
}
