//! Events: hosted gatherings with capacity, schedule, and payment terms.

use crate::account::AccountSummary;
use crate::error::{DomainError, DomainResult};
use crate::types::{AccountId, EventId, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity applied when the host does not pick one.
pub const DEFAULT_CAPACITY: u32 = 50;

/// Points granted to each attendee when the host finalizes an event.
pub const ATTENDANCE_AWARD: i64 = 50;

/// Closed set of event categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Sports and fitness.
    Sports,
    /// Social gatherings.
    Social,
    /// Classes, talks, workshops.
    Education,
    /// Networking and professional events.
    Business,
    /// Everything else.
    #[default]
    Other,
}

impl EventCategory {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sports => "sports",
            Self::Social => "social",
            Self::Education => "education",
            Self::Business => "business",
            Self::Other => "other",
        }
    }

    /// Parses the database representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] for an unknown value — categories are
    /// a closed enumeration, so anything else is a corrupt row.
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "sports" => Ok(Self::Sports),
            "social" => Ok(Self::Social),
            "education" => Ok(Self::Education),
            "business" => Ok(Self::Business),
            "other" => Ok(Self::Other),
            _ => Err(DomainError::Storage(format!("unknown event category: {s}"))),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How participation is paid for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Manual bank transfer verified against the gateway.
    #[default]
    BankTransfer,
    /// Mobile wallet payment verified against the gateway.
    Wallet,
    /// Cash at the door; nothing to verify.
    Cash,
}

impl PaymentMethod {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::Wallet => "wallet",
            Self::Cash => "cash",
        }
    }

    /// Parses the database representation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] for an unknown value.
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "bank_transfer" => Ok(Self::BankTransfer),
            "wallet" => Ok(Self::Wallet),
            "cash" => Ok(Self::Cash),
            _ => Err(DomainError::Storage(format!("unknown payment method: {s}"))),
        }
    }
}

/// Payment terms attached to an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTerms {
    /// Accepted payment method.
    pub method: PaymentMethod,
    /// Fee per participant; zero means free.
    pub amount: Money,
}

/// Where an event takes place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Free-text address.
    pub address: String,
    /// Optional latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Optional longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// A hosted gathering.
///
/// The participant set lives beside the entity (it is a separate relation
/// with set semantics); [`EventDetails`] carries the resolved view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Hosting account.
    pub host: AccountId,
    /// Venue.
    pub location: Location,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end; never before `start_time`.
    pub end_time: DateTime<Utc>,
    /// Participant capacity; always positive.
    pub max_participants: u32,
    /// Category.
    pub category: EventCategory,
    /// Payment terms.
    pub payment: PaymentTerms,
    /// Optional cover-image URL.
    pub image_url: Option<String>,
    /// One-way completion flag.
    pub is_completed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating an event.
#[derive(Clone, Debug)]
pub struct NewEvent {
    /// Title; must be non-empty.
    pub title: String,
    /// Description; must be non-empty.
    pub description: String,
    /// Venue; address must be non-empty.
    pub location: Location,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Capacity; defaults to [`DEFAULT_CAPACITY`] at the API boundary.
    pub max_participants: u32,
    /// Category.
    pub category: EventCategory,
    /// Payment terms.
    pub payment: PaymentTerms,
    /// Optional cover-image URL.
    pub image_url: Option<String>,
}

impl NewEvent {
    /// Checks the creation invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the title, description, or
    /// location address is blank, the capacity is zero, the end precedes the
    /// start, or the fee is negative.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description must not be empty"));
        }
        if self.location.address.trim().is_empty() {
            return Err(DomainError::validation("location address must not be empty"));
        }
        if self.max_participants == 0 {
            return Err(DomainError::validation("max_participants must be positive"));
        }
        if self.end_time < self.start_time {
            return Err(DomainError::validation("end_time must not precede start_time"));
        }
        if self.payment.amount.is_negative() {
            return Err(DomainError::validation("payment amount must not be negative"));
        }
        Ok(())
    }
}

impl Event {
    /// Materializes a validated [`NewEvent`] into a persistable entity.
    ///
    /// # Errors
    ///
    /// Propagates the validation errors of [`NewEvent::validate`].
    pub fn create(host: AccountId, new: NewEvent, now: DateTime<Utc>) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            id: EventId::new(),
            title: new.title,
            description: new.description,
            host,
            location: new.location,
            start_time: new.start_time,
            end_time: new.end_time,
            max_participants: new.max_participants,
            category: new.category,
            payment: new.payment,
            image_url: new.image_url,
            is_completed: false,
            created_at: now,
        })
    }
}

/// An event with host and participants resolved to summaries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventDetails {
    /// The event itself.
    pub event: Event,
    /// Resolved host.
    pub host: AccountSummary,
    /// Resolved participant set, in join order.
    pub participants: Vec<AccountSummary>,
}

/// Outcome of a completion attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Whether this call performed the false→true transition. A repeat call
    /// returns `false` and awards nothing.
    pub newly_completed: bool,
    /// Accounts that received the attendance award, in request order.
    pub awarded: Vec<AccountId>,
}

/// Filters and paging for event listings.
#[derive(Clone, Debug, Default)]
pub struct EventQuery {
    /// Restrict to one category.
    pub category: Option<EventCategory>,
    /// Case-insensitive substring match over title and description.
    pub search: Option<String>,
    /// Restrict to events hosted by this account.
    pub host: Option<AccountId>,
    /// Restrict to events this account has joined.
    pub participant: Option<AccountId>,
    /// Include completed events; listings default to upcoming only.
    pub include_completed: bool,
    /// Zero-indexed page.
    pub page: u32,
    /// Page size; callers clamp this before building the query.
    pub limit: u32,
}

/// One page of a listing.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    /// Items on this page, ordered by start time.
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub total: u64,
    /// Zero-indexed page number.
    pub page: u32,
    /// Page size used.
    pub limit: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> NewEvent {
        let start = Utc::now();
        NewEvent {
            title: "Morning run".into(),
            description: "Easy 5k along the river".into(),
            location: Location {
                address: "Riverside park".into(),
                lat: None,
                lng: None,
            },
            start_time: start,
            end_time: start + Duration::hours(2),
            max_participants: DEFAULT_CAPACITY,
            category: EventCategory::Sports,
            payment: PaymentTerms::default(),
            image_url: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn blank_fields_are_rejected() {
        for field in ["title", "description", "address"] {
            let mut new = draft();
            match field {
                "title" => new.title = "  ".into(),
                "description" => new.description = String::new(),
                _ => new.location.address = "\t".into(),
            }
            assert!(
                matches!(new.validate(), Err(DomainError::Validation(_))),
                "blank {field} should fail validation"
            );
        }
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut new = draft();
        new.end_time = new.start_time - Duration::minutes(1);
        assert!(matches!(new.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut new = draft();
        new.max_participants = 0;
        assert!(matches!(new.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn create_starts_open_and_empty() {
        let host = AccountId::new();
        let event = Event::create(host, draft(), Utc::now()).unwrap();
        assert_eq!(event.host, host);
        assert!(!event.is_completed);
    }

    #[test]
    fn category_round_trips_through_db_strings() {
        for cat in [
            EventCategory::Sports,
            EventCategory::Social,
            EventCategory::Education,
            EventCategory::Business,
            EventCategory::Other,
        ] {
            assert_eq!(EventCategory::parse(cat.as_str()).unwrap(), cat);
        }
        assert!(EventCategory::parse("karaoke").is_err());
    }
}
