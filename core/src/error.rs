//! The domain error taxonomy.
//!
//! One variant per business rule or failure class. The server crate maps
//! each variant to an HTTP status and a stable machine-readable code; this
//! crate knows nothing about transports.

use crate::payment::{GatewayError, PaymentStatus};
use thiserror::Error;

/// Result alias used throughout the domain.
pub type DomainResult<T> = Result<T, DomainError>;

/// Everything that can go wrong inside a domain operation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed shape or range validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced entity does not exist (or is not visible to the caller).
    #[error("{resource} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"event"`.
        resource: &'static str,
        /// Rendered identifier.
        id: String,
    },

    /// The caller is authenticated but not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The account is already in the event's participant set.
    #[error("already joined this event")]
    AlreadyJoined,

    /// The participant set has reached the event's capacity.
    #[error("event is full")]
    CapacityExceeded,

    /// The event is completed; it accepts no further joins or awards.
    #[error("event is already completed")]
    EventCompleted,

    /// The payment reference code has already been recorded.
    #[error("payment reference already used")]
    DuplicateReference,

    /// The gateway answered, but not with a completed payment.
    #[error("payment not verified (gateway status: {0})")]
    PaymentNotVerified(PaymentStatus),

    /// The gateway call itself failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Signup with an email that is already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Signin with an unknown email or a wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The persistence layer failed; details are for the logs, not clients.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    /// Convenience constructor for [`DomainError::NotFound`].
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`DomainError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
