//! Testing utilities for Gatherly.
//!
//! Provides in-memory implementations of every port trait in
//! `gatherly-core`, plus scriptable mocks for the external gateways:
//!
//! - [`memory::InMemoryStore`] — one struct implementing all five storage
//!   ports over a single mutex, which gives it the same cross-record
//!   atomicity the PostgreSQL implementations get from SQL transactions
//! - [`gateways::StubPaymentVerifier`] — per-reference scripted statuses
//! - [`gateways::RecordingPushGateway`] — captures fan-outs, optionally fails
//!
//! Integration tests in the server crate run entirely against these, so the
//! lifecycle invariants (capacity bounds, set-semantics joins, idempotent
//! completion, replay-safe payments) are exercised without a database.

#![forbid(unsafe_code)]

pub mod gateways;
pub mod memory;

pub use gateways::{RecordingPushGateway, StubPaymentVerifier};
pub use memory::InMemoryStore;
