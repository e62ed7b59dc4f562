use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::{EventId, Owner, SeatId, SectionId, TicketId};

/// Reason stamped on tickets invalidated by an event cancellation.
pub const EVENT_CANCELLED_REASON: &str = "The Event has been cancelled";

/// Lifecycle status of a ticket.
///
/// Only `Issued` blocks the seat. `Revoked` and `Invalid` tickets stay in the
/// ledger as history and the seat can be claimed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Issued,
    Revoked,
    Invalid,
}

impl TicketStatus {
    /// Returns the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Issued => "Issued",
            TicketStatus::Revoked => "Revoked",
            TicketStatus::Invalid => "Invalid",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Issued" => Some(TicketStatus::Issued),
            "Revoked" => Some(TicketStatus::Revoked),
            "Invalid" => Some(TicketStatus::Invalid),
            _ => None,
        }
    }

    /// Returns true if a ticket in this status blocks its seat.
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Issued)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event and owner data copied onto every ticket of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetails {
    pub event_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
}

impl TicketDetails {
    /// Creates details with the event title and start time.
    pub fn new(event_title: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            event_title: event_title.into(),
            start_time,
            end_time: None,
            owner_email: None,
            owner_name: None,
        }
    }

    /// Sets the event end time.
    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Sets the owner's contact details.
    pub fn owner_contact(mut self, email: Option<String>, name: Option<String>) -> Self {
        self.owner_email = email;
        self.owner_name = name;
        self
    }
}

/// A seat of an event bound to an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Deterministic key `{event_id}_{seat_id}`.
    pub ticket_id: TicketId,
    pub event_id: EventId,
    pub seat_id: SeatId,
    pub section: SectionId,
    pub owner: Owner,
    pub status: TicketStatus,
    pub order_id: OrderId,
    /// Redemption token encoded in the QR code. Cleared on revoke.
    pub qr_payload: Option<String>,
    pub event_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub invalid_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Builds a freshly issued ticket.
    pub fn issue(
        event_id: EventId,
        seat_id: SeatId,
        section: SectionId,
        owner: Owner,
        order_id: OrderId,
        details: &TicketDetails,
        now: DateTime<Utc>,
    ) -> Self {
        let qr_payload = format!(
            "ticket:{}:{}:{}",
            order_id.as_str(),
            seat_id.as_str(),
            event_id.as_str()
        );

        Self {
            ticket_id: TicketId::for_seat(&event_id, &seat_id),
            event_id,
            seat_id,
            section,
            owner,
            status: TicketStatus::Issued,
            order_id,
            qr_payload: Some(qr_payload),
            event_title: details.event_title.clone(),
            start_time: details.start_time,
            end_time: details.end_time,
            owner_email: details.owner_email.clone(),
            owner_name: details.owner_name.clone(),
            invalid_reason: None,
            created_at: now,
            updated_at: now,
            revoked_at: None,
        }
    }

    /// Returns true if the ticket currently blocks its seat.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns true if the ticket was issued for this seat of this event.
    ///
    /// A document stored under a key can belong to another seat when legacy
    /// event IDs contain the key separator.
    pub fn is_for(&self, event_id: &EventId, seat_id: &SeatId) -> bool {
        &self.event_id == event_id && &self.seat_id == seat_id
    }

    /// Marks the ticket revoked and drops its redemption token.
    pub fn revoked(mut self, now: DateTime<Utc>) -> Self {
        self.status = TicketStatus::Revoked;
        self.qr_payload = None;
        self.revoked_at = Some(now);
        self.updated_at = now;
        self
    }

    /// Marks the ticket invalid with a reason.
    pub fn invalidated(mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Self {
        self.status = TicketStatus::Invalid;
        self.invalid_reason = Some(reason.into());
        self.updated_at = now;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ticket {
        let details = TicketDetails::new("CofC vs UNCW", Utc::now());
        Ticket::issue(
            EventId::new("evt1"),
            SeatId::new("110-A1"),
            SectionId::new("110"),
            Owner::user("uid-a"),
            OrderId::from_raw("ord_12345678"),
            &details,
            Utc::now(),
        )
    }

    #[test]
    fn issue_sets_key_and_qr_payload() {
        let ticket = sample();
        assert_eq!(ticket.ticket_id.as_str(), "evt1_110-A1");
        assert_eq!(ticket.status, TicketStatus::Issued);
        assert_eq!(
            ticket.qr_payload.as_deref(),
            Some("ticket:ord_12345678:110-A1:evt1")
        );
        assert!(ticket.is_active());
    }

    #[test]
    fn is_for_matches_event_and_seat() {
        let ticket = sample();
        assert!(ticket.is_for(&EventId::new("evt1"), &SeatId::new("110-A1")));
        assert!(!ticket.is_for(&EventId::new("evt2"), &SeatId::new("110-A1")));
        assert!(!ticket.is_for(&EventId::new("evt1"), &SeatId::new("110-A2")));
    }

    #[test]
    fn revoke_clears_qr_and_stamps_time() {
        let now = Utc::now();
        let ticket = sample().revoked(now);
        assert_eq!(ticket.status, TicketStatus::Revoked);
        assert!(ticket.qr_payload.is_none());
        assert_eq!(ticket.revoked_at, Some(now));
        assert!(!ticket.is_active());
    }

    #[test]
    fn invalidate_records_reason() {
        let ticket = sample().invalidated(EVENT_CANCELLED_REASON, Utc::now());
        assert_eq!(ticket.status, TicketStatus::Invalid);
        assert_eq!(ticket.invalid_reason.as_deref(), Some(EVENT_CANCELLED_REASON));
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            TicketStatus::Issued,
            TicketStatus::Revoked,
            TicketStatus::Invalid,
        ] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("Used"), None);
    }
}
