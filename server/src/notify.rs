//! Notification dispatch.
//!
//! The dispatcher persists a history record synchronously, then attempts
//! push delivery on a detached task. Delivery failure is logged and never
//! reaches the caller; domain operations call [`NotificationDispatcher::notify`]
//! strictly after their own writes have committed.

use async_trait::async_trait;
use chrono::Utc;
use gatherly_core::DomainResult;
use gatherly_core::notification::{Audience, NotificationRecord};
use gatherly_core::push::{PushError, PushGateway, PushReceipt};
use gatherly_core::store::{AccountStore, NotificationStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a synchronous broadcast (the manual send endpoint).
#[derive(Clone, Copy, Debug, Serialize)]
pub struct BroadcastReport {
    /// Tokens the fan-out targeted.
    pub attempted: usize,
    /// Deliveries the gateway accepted.
    pub delivered: u32,
    /// Deliveries the gateway rejected.
    pub failed: u32,
}

/// Best-effort notification fan-out with a durable history trail.
pub struct NotificationDispatcher {
    history: Arc<dyn NotificationStore>,
    accounts: Arc<dyn AccountStore>,
    push: Arc<dyn PushGateway>,
}

impl NotificationDispatcher {
    /// Wires the dispatcher to its stores and gateway.
    #[must_use]
    pub fn new(
        history: Arc<dyn NotificationStore>,
        accounts: Arc<dyn AccountStore>,
        push: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            history,
            accounts,
            push,
        }
    }

    /// Records the notification and fires delivery in the background.
    ///
    /// Never fails: every error is logged and swallowed here, so callers
    /// cannot accidentally couple a domain operation to delivery.
    pub async fn notify(&self, audience: Audience, title: &str, body: &str) {
        let record = NotificationRecord::new(title, body, audience, Utc::now());
        if let Err(error) = self.history.insert(&record).await {
            tracing::warn!(%error, title, "notification history write failed");
        }

        let tokens = match self.accounts.push_tokens(&audience).await {
            Ok(tokens) => tokens,
            Err(error) => {
                tracing::warn!(%error, title, "push target resolution failed");
                return;
            }
        };
        if tokens.is_empty() {
            tracing::debug!(title, "no push targets registered, history only");
            return;
        }

        let push = Arc::clone(&self.push);
        let title = title.to_owned();
        let body = body.to_owned();
        tokio::spawn(async move {
            match push.send(&tokens, &title, &body).await {
                Ok(receipt) => tracing::debug!(
                    delivered = receipt.delivered,
                    failed = receipt.failed,
                    title,
                    "push delivery finished"
                ),
                Err(error) => tracing::warn!(%error, title, "push delivery failed"),
            }
        });
    }

    /// Broadcast and wait for the delivery outcome.
    ///
    /// Used by the manual send endpoint, which reports counts back to the
    /// operator. The history record is still written first and survives a
    /// failed fan-out.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the history write fails; push failures are
    /// folded into the report instead.
    pub async fn broadcast(&self, title: &str, body: &str) -> DomainResult<BroadcastReport> {
        let record = NotificationRecord::new(title, body, Audience::Broadcast, Utc::now());
        self.history.insert(&record).await?;

        let tokens = self.accounts.push_tokens(&Audience::Broadcast).await?;
        if tokens.is_empty() {
            return Ok(BroadcastReport {
                attempted: 0,
                delivered: 0,
                failed: 0,
            });
        }

        match self.push.send(&tokens, title, body).await {
            Ok(receipt) => Ok(BroadcastReport {
                attempted: tokens.len(),
                delivered: receipt.delivered,
                failed: receipt.failed,
            }),
            Err(error) => {
                tracing::warn!(%error, title, "manual broadcast delivery failed");
                #[allow(clippy::cast_possible_truncation)] // bounded by token count
                Ok(BroadcastReport {
                    attempted: tokens.len(),
                    delivered: 0,
                    failed: tokens.len() as u32,
                })
            }
        }
    }
}

/// HTTP push-gateway client.
///
/// Posts a multicast message to the configured endpoint and reads the
/// delivery counts back. The wire shape follows the common
/// `registration_ids` / `notification` message format.
pub struct HttpPushGateway {
    http: reqwest::Client,
    endpoint: String,
    server_key: Option<String>,
}

#[derive(Serialize)]
struct PushMessage<'a> {
    registration_ids: &'a [String],
    notification: PushPayload<'a>,
}

#[derive(Serialize)]
struct PushPayload<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct PushResponse {
    #[serde(default)]
    success: u32,
    #[serde(default)]
    failure: u32,
}

impl HttpPushGateway {
    /// Builds a client for `endpoint` with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Unreachable`] if the HTTP client cannot be
    /// constructed.
    pub fn new(
        endpoint: impl Into<String>,
        server_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushError::Unreachable(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            server_key,
        })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<PushReceipt, PushError> {
        let message = PushMessage {
            registration_ids: tokens,
            notification: PushPayload { title, body },
        };

        let mut request = self.http.post(&self.endpoint).json(&message);
        if let Some(key) = &self.server_key {
            request = request.header("Authorization", format!("key={key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }

        // A 2xx with an undecodable body still delivered; count everything
        // as accepted rather than failing the fan-out.
        #[allow(clippy::cast_possible_truncation)]
        let receipt = match response.json::<PushResponse>().await {
            Ok(parsed) => PushReceipt {
                delivered: parsed.success,
                failed: parsed.failure,
            },
            Err(_) => PushReceipt {
                delivered: tokens.len() as u32,
                failed: 0,
            },
        };
        Ok(receipt)
    }
}
