//! PostgreSQL implementations of the storage ports.
//!
//! Invariant-bearing operations run inside SQL transactions with the event
//! row locked (`SELECT … FOR UPDATE`), so joins, paid joins, and completion
//! serialize per event: the check-then-act sequences the ports promise to be
//! atomic really are. Enum columns are TEXT with check constraints, parsed
//! through the domain enums' `as_str`/`parse` pairs.

mod accounts;
mod events;
mod notifications;
mod sessions;
mod transactions;

pub use accounts::PgAccountStore;
pub use events::PgEventStore;
pub use notifications::PgNotificationStore;
pub use sessions::PgSessionStore;
pub use transactions::PgTransactionStore;

use gatherly_core::DomainError;

/// Folds a driver error into the storage variant; details go to logs, not
/// clients.
pub(crate) fn storage_err(error: sqlx::Error) -> DomainError {
    DomainError::Storage(error.to_string())
}
