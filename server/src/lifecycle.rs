//! The event lifecycle manager.
//!
//! Orchestrates the legal state transitions of an event — creation,
//! capacity-bounded joining, payment-gated joining, and host-only completion
//! with attendance awards — plus their notification side effects.
//!
//! Invariant enforcement is delegated to single atomic store operations
//! ([`EventStore::join`], [`EventStore::complete`],
//! [`TransactionStore::record_paid_join`]); this type sequences them,
//! validates input, consults the payment verifier, and fires notifications
//! strictly after the domain write has committed.

use crate::notify::NotificationDispatcher;
use chrono::Utc;
use gatherly_core::error::{DomainError, DomainResult};
use gatherly_core::event::{ATTENDANCE_AWARD, CompletionOutcome, Event, EventDetails, NewEvent};
use gatherly_core::notification::Audience;
use gatherly_core::payment::{PaymentStatus, PaymentVerifier};
use gatherly_core::store::{EventStore, TransactionStore};
use gatherly_core::transaction::Transaction;
use gatherly_core::types::{AccountId, EventId, Money};
use std::sync::Arc;

/// Coordinates event state transitions and their side effects.
pub struct EventLifecycle {
    events: Arc<dyn EventStore>,
    transactions: Arc<dyn TransactionStore>,
    verifier: Arc<dyn PaymentVerifier>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl EventLifecycle {
    /// Wires the manager to its collaborators.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventStore>,
        transactions: Arc<dyn TransactionStore>,
        verifier: Arc<dyn PaymentVerifier>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            events,
            transactions,
            verifier,
            dispatcher,
        }
    }

    /// Creates an event hosted by `host`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for a rejected draft and storage
    /// errors from persistence.
    pub async fn create_event(&self, host: AccountId, new: NewEvent) -> DomainResult<EventDetails> {
        let event = Event::create(host, new, Utc::now())?;
        self.events.insert(&event).await?;
        tracing::info!(event_id = %event.id, %host, title = %event.title, "event created");

        self.dispatcher
            .notify(
                Audience::Broadcast,
                &format!("New event: {}", event.title),
                &event.description,
            )
            .await;

        self.details_of(event.id).await
    }

    /// Adds `account` to the event's participant set.
    ///
    /// # Errors
    ///
    /// [`DomainError::NotFound`], [`DomainError::EventCompleted`],
    /// [`DomainError::AlreadyJoined`], [`DomainError::CapacityExceeded`],
    /// or a storage error.
    pub async fn join_event(
        &self,
        event_id: EventId,
        account: AccountId,
    ) -> DomainResult<EventDetails> {
        self.events.join(event_id, account).await?;
        tracing::info!(%event_id, %account, "participant joined");

        let details = self.details_of(event_id).await?;
        self.dispatcher
            .notify(
                Audience::Account(account),
                "You're in!",
                &format!("You joined \"{}\"", details.event.title),
            )
            .await;
        self.dispatcher
            .notify(
                Audience::Account(details.event.host),
                "New attendee",
                &format!("Someone joined \"{}\"", details.event.title),
            )
            .await;

        Ok(details)
    }

    /// Verifies a manual payment against the gateway and, on a settled
    /// payment, records the transaction and joins the payer in one atomic
    /// unit.
    ///
    /// # Errors
    ///
    /// [`DomainError::Validation`] for an empty reference or negative
    /// amount, [`DomainError::DuplicateReference`] for a replayed one,
    /// [`DomainError::PaymentNotVerified`] when the gateway reports anything
    /// but a settled payment, [`DomainError::Gateway`] when the gateway
    /// cannot be read, plus the join errors of
    /// [`TransactionStore::record_paid_join`].
    pub async fn verify_manual_payment(
        &self,
        ref_id: &str,
        event_id: EventId,
        payer: AccountId,
        amount: Money,
    ) -> DomainResult<Transaction> {
        if ref_id.trim().is_empty() {
            return Err(DomainError::validation("ref_id must not be empty"));
        }
        if amount.is_negative() {
            return Err(DomainError::validation("amount must not be negative"));
        }

        // Fast-fail replays before paying for a gateway round trip. The
        // unique constraint inside record_paid_join is the real guard.
        if self.transactions.ref_exists(ref_id).await? {
            return Err(DomainError::DuplicateReference);
        }

        let status = self.verifier.status(ref_id, amount).await?;
        if status != PaymentStatus::Complete {
            tracing::info!(ref_id, %status, "payment rejected by gateway status");
            return Err(DomainError::PaymentNotVerified(status));
        }

        let transaction =
            Transaction::verified(event_id, payer, amount, ref_id.to_string(), Utc::now());
        let transaction = self.transactions.record_paid_join(transaction).await?;
        tracing::info!(
            transaction_id = %transaction.id,
            %event_id,
            %payer,
            ref_id,
            "verified payment recorded, payer joined"
        );

        let body = match self.events.fetch(event_id).await? {
            Some(event) => format!("You joined \"{}\"", event.title),
            None => "You joined an event".to_string(),
        };
        self.dispatcher
            .notify(Audience::Account(payer), "Payment confirmed", &body)
            .await;

        Ok(transaction)
    }

    /// Finalizes an event and distributes attendance awards.
    ///
    /// Idempotent: a second call reports `newly_completed == false` and
    /// awards nothing. Award recipients are restricted to the participant
    /// set regardless of what the host submits.
    ///
    /// # Errors
    ///
    /// [`DomainError::NotFound`] when the event does not exist under this
    /// host, or a storage error.
    pub async fn complete_event(
        &self,
        event_id: EventId,
        host: AccountId,
        attended: &[AccountId],
    ) -> DomainResult<CompletionOutcome> {
        let outcome = self
            .events
            .complete(event_id, host, attended, ATTENDANCE_AWARD)
            .await?;

        if outcome.newly_completed {
            tracing::info!(
                %event_id,
                %host,
                awarded = outcome.awarded.len(),
                "event completed, awards distributed"
            );
            self.dispatcher
                .notify(
                    Audience::Broadcast,
                    "Event finalized",
                    "An event you follow has wrapped up",
                )
                .await;
        } else {
            tracing::debug!(%event_id, "repeat completion ignored");
        }

        Ok(outcome)
    }

    async fn details_of(&self, event_id: EventId) -> DomainResult<EventDetails> {
        self.events
            .fetch_details(event_id)
            .await?
            .ok_or_else(|| DomainError::not_found("event", event_id))
    }
}
