//! Gatherly domain core.
//!
//! This crate contains everything the platform knows about its domain and
//! nothing about how it is served or stored:
//!
//! - **Entities**: [`account::Account`], [`event::Event`],
//!   [`transaction::Transaction`], [`notification::NotificationRecord`]
//! - **Commands**: validated inputs such as [`event::NewEvent`]
//! - **Error taxonomy**: [`error::DomainError`], one variant per business
//!   rule, mapped to transport codes by the server crate
//! - **Ports**: storage traits in [`store`], the payment-verifier contract
//!   in [`payment`], and the push-gateway contract in [`push`]
//!
//! The server crate provides PostgreSQL and HTTP implementations of the
//! ports; the testing crate provides in-memory ones. Domain rules that need
//! atomicity (capacity-bounded joins, idempotent completion, replay-safe
//! payment recording) are expressed as single port operations so every
//! implementation has to provide them atomically — there is no check-then-act
//! sequence for callers to get wrong.

#![forbid(unsafe_code)]

pub mod account;
pub mod error;
pub mod event;
pub mod notification;
pub mod payment;
pub mod push;
pub mod store;
pub mod transaction;
pub mod types;

pub use error::{DomainError, DomainResult};
pub use types::{AccountId, EventId, Money, NotificationId, TransactionId};
