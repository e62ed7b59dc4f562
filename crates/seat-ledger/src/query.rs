use crate::{EventId, Owner, SeatId, SectionId, Ticket, TicketStatus};

/// Builder for constructing ticket queries.
///
/// Every filter left unset matches all tickets. Results are ordered by
/// creation time, then by ticket key.
#[derive(Debug, Clone, Default)]
pub struct TicketQuery {
    /// Filter by event.
    pub event_id: Option<EventId>,

    /// Filter by seat.
    pub seat_id: Option<SeatId>,

    /// Filter by section.
    pub section: Option<SectionId>,

    /// Filter by owner.
    pub owner: Option<Owner>,

    /// Filter by status.
    pub status: Option<TicketStatus>,

    /// Maximum number of tickets to return.
    pub limit: Option<usize>,

    /// Number of tickets to skip.
    pub offset: Option<usize>,
}

impl TicketQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for every ticket of an event.
    pub fn for_event(event_id: EventId) -> Self {
        Self {
            event_id: Some(event_id),
            ..Default::default()
        }
    }

    /// Creates a query for every ticket held by an owner.
    pub fn for_owner(owner: Owner) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }

    /// Filters by event.
    pub fn event_id(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    /// Filters by seat.
    pub fn seat_id(mut self, seat_id: SeatId) -> Self {
        self.seat_id = Some(seat_id);
        self
    }

    /// Filters by section.
    pub fn section(mut self, section: SectionId) -> Self {
        self.section = Some(section);
        self
    }

    /// Filters by owner.
    pub fn owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Filters by status.
    pub fn status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Only returns tickets that currently block their seat.
    pub fn active(self) -> Self {
        self.status(TicketStatus::Issued)
    }

    /// Sets the maximum number of tickets to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of tickets to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the ticket passes every filter (limit/offset excluded).
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(ref event_id) = self.event_id
            && &ticket.event_id != event_id
        {
            return false;
        }
        if let Some(ref seat_id) = self.seat_id
            && &ticket.seat_id != seat_id
        {
            return false;
        }
        if let Some(ref section) = self.section
            && &ticket.section != section
        {
            return false;
        }
        if let Some(ref owner) = self.owner
            && &ticket.owner != owner
        {
            return false;
        }
        if let Some(status) = self.status
            && ticket.status != status
        {
            return false;
        }
        true
    }
}
