//! Scriptable mocks for the external gateways.

#![allow(clippy::unwrap_used)] // Test infrastructure; lock poisoning aborts the test
#![allow(clippy::missing_panics_doc)]

use async_trait::async_trait;
use gatherly_core::payment::{GatewayError, PaymentStatus, PaymentVerifier};
use gatherly_core::push::{PushError, PushGateway, PushReceipt};
use gatherly_core::types::Money;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Payment verifier with per-reference scripted outcomes.
///
/// Unscripted references answer with the default status. Clones share
/// state, so a test can script references after handing the verifier to the
/// lifecycle manager.
#[derive(Clone)]
pub struct StubPaymentVerifier {
    inner: Arc<Mutex<StubInner>>,
}

struct StubInner {
    default: Result<PaymentStatus, GatewayError>,
    by_ref: HashMap<String, Result<PaymentStatus, GatewayError>>,
    calls: u32,
}

impl StubPaymentVerifier {
    /// A verifier that reports every payment as settled.
    #[must_use]
    pub fn completing() -> Self {
        Self::with_status(PaymentStatus::Complete)
    }

    /// A verifier whose default answer is `status`.
    #[must_use]
    pub fn with_status(status: PaymentStatus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StubInner {
                default: Ok(status),
                by_ref: HashMap::new(),
                calls: 0,
            })),
        }
    }

    /// A verifier whose default answer is a gateway failure.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StubInner {
                default: Err(GatewayError::Unreachable("scripted outage".into())),
                by_ref: HashMap::new(),
                calls: 0,
            })),
        }
    }

    /// Scripts the status for one reference.
    pub fn script(&self, ref_id: impl Into<String>, status: PaymentStatus) {
        self.inner
            .lock()
            .unwrap()
            .by_ref
            .insert(ref_id.into(), Ok(status));
    }

    /// Scripts a gateway failure for one reference.
    pub fn script_error(&self, ref_id: impl Into<String>, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .by_ref
            .insert(ref_id.into(), Err(error));
    }

    /// How many status lookups were made.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.inner.lock().unwrap().calls
    }
}

#[async_trait]
impl PaymentVerifier for StubPaymentVerifier {
    async fn status(&self, ref_id: &str, _amount: Money) -> Result<PaymentStatus, GatewayError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        inner
            .by_ref
            .get(ref_id)
            .unwrap_or(&inner.default)
            .clone()
    }
}

/// One captured push fan-out.
#[derive(Clone, Debug)]
pub struct RecordedPush {
    /// Tokens targeted.
    pub tokens: Vec<String>,
    /// Title sent.
    pub title: String,
    /// Body sent.
    pub body: String,
}

/// Push gateway that records every send; optionally fails them all.
#[derive(Clone, Default)]
pub struct RecordingPushGateway {
    inner: Arc<Mutex<PushInner>>,
}

#[derive(Default)]
struct PushInner {
    sends: Vec<RecordedPush>,
    failing: bool,
}

impl RecordingPushGateway {
    /// A gateway that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that rejects every fan-out with a transport error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PushInner {
                sends: Vec::new(),
                failing: true,
            })),
        }
    }

    /// Everything sent so far.
    #[must_use]
    pub fn sends(&self) -> Vec<RecordedPush> {
        self.inner.lock().unwrap().sends.clone()
    }

    /// Number of fan-outs attempted.
    #[must_use]
    pub fn send_count(&self) -> usize {
        self.inner.lock().unwrap().sends.len()
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<PushReceipt, PushError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sends.push(RecordedPush {
            tokens: tokens.to_vec(),
            title: title.to_string(),
            body: body.to_string(),
        });
        if inner.failing {
            return Err(PushError::Unreachable("scripted failure".into()));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(PushReceipt {
            delivered: tokens.len() as u32,
            failed: 0,
        })
    }
}
