//! HTTP payment-verifier client.
//!
//! Queries the external gateway's transaction-status endpoint:
//! `GET {base}/api/epay/txn/status?product_code=…&total_amount=…&transaction_uuid=…`
//! and maps the reported status onto [`PaymentStatus`]. Anything that stops
//! a status from being read — transport failure, non-2xx, undecodable body —
//! is a [`GatewayError`], distinct from a readable-but-unverified status.

use async_trait::async_trait;
use gatherly_core::payment::{GatewayError, PaymentStatus, PaymentVerifier};
use gatherly_core::types::Money;
use serde::Deserialize;
use std::time::Duration;

/// Client for the gateway's status API.
pub struct HttpPaymentVerifier {
    http: reqwest::Client,
    base_url: String,
    product_code: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
}

impl HttpPaymentVerifier {
    /// Builds a client for `base_url` with the given merchant code and
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unreachable`] if the HTTP client cannot be
    /// constructed.
    pub fn new(
        base_url: impl Into<String>,
        product_code: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            product_code: product_code.into(),
        })
    }
}

#[async_trait]
impl PaymentVerifier for HttpPaymentVerifier {
    async fn status(&self, ref_id: &str, amount: Money) -> Result<PaymentStatus, GatewayError> {
        let url = format!("{}/api/epay/txn/status", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("product_code", self.product_code.as_str()),
                ("total_amount", &amount.to_string()),
                ("transaction_uuid", ref_id),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        tracing::debug!(ref_id, gateway_status = %parsed.status, "payment status looked up");

        // Unknown strings mean "not settled", not "gateway broken": the
        // gateway answered, just not with a completed payment.
        Ok(match parsed.status.as_str() {
            "COMPLETE" => PaymentStatus::Complete,
            "PENDING" | "AMBIGUOUS" => PaymentStatus::Pending,
            _ => PaymentStatus::Failed,
        })
    }
}
