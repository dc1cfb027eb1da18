//! Payment-verifier port.
//!
//! Abstraction over the external payment gateway's status endpoint. The
//! lifecycle manager treats only [`PaymentStatus::Complete`] as success;
//! everything else rejects the join attempt and is never retried.

use crate::types::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Settlement status reported by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// The payment settled.
    Complete,
    /// The payment is still in flight.
    Pending,
    /// The payment failed or the reference is unknown to the gateway.
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => f.write_str("COMPLETE"),
            Self::Pending => f.write_str("PENDING"),
            Self::Failed => f.write_str("FAILED"),
        }
    }
}

/// The gateway call itself failed — distinct from the gateway answering
/// with a non-complete status.
#[derive(Clone, Debug, Error)]
pub enum GatewayError {
    /// Transport failure: DNS, connect, timeout.
    #[error("payment gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway answered with a non-2xx status.
    #[error("payment gateway returned HTTP {0}")]
    Status(u16),

    /// The gateway answered 2xx but the body could not be decoded.
    #[error("payment gateway response malformed: {0}")]
    Malformed(String),
}

/// Contract for checking a payment's settlement status.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Looks up the status of `(ref_id, amount)` at the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the call fails outright; a reachable
    /// gateway always yields a [`PaymentStatus`], even for unknown
    /// references.
    async fn status(&self, ref_id: &str, amount: Money) -> Result<PaymentStatus, GatewayError>;
}
