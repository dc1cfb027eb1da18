//! Push-gateway port.
//!
//! Abstraction over the external messaging service that delivers push
//! notifications to devices. Delivery is best-effort by contract: the
//! dispatcher persists history first and swallows every error from this
//! port.

use async_trait::async_trait;
use thiserror::Error;

/// Delivery counts reported by the gateway for one fan-out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushReceipt {
    /// Tokens the gateway accepted.
    pub delivered: u32,
    /// Tokens the gateway rejected.
    pub failed: u32,
}

/// A push delivery attempt failed wholesale.
#[derive(Clone, Debug, Error)]
pub enum PushError {
    /// Transport failure: DNS, connect, timeout.
    #[error("push gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway answered with a non-2xx status.
    #[error("push gateway returned HTTP {0}")]
    Status(u16),
}

/// Contract for delivering a notification to a set of device tokens.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Attempts delivery of `title`/`body` to every token.
    ///
    /// # Errors
    ///
    /// Returns [`PushError`] when the gateway cannot be reached or rejects
    /// the request wholesale; per-token rejections are reported in the
    /// receipt instead.
    async fn send(&self, tokens: &[String], title: &str, body: &str)
    -> Result<PushReceipt, PushError>;
}
