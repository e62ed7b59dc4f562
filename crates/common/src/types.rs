use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Separator between the section prefix and the row/number part of a seat ID.
pub const SECTION_SEPARATOR: char = '-';

/// Separator between the event and seat parts of a ticket key.
///
/// Event IDs must not contain it, so the first occurrence in a key always
/// ends the event part.
pub const TICKET_KEY_SEPARATOR: char = '_';

/// Identifier of a venue event (a game, a concert).
///
/// Event IDs are opaque slugs assigned by the event catalog, e.g.
/// `"cofc-vs-uncw-m3k2x1"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates an event ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the event ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the ID is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns true if the ID can be embedded in a ticket key without
    /// colliding with the key of another event.
    pub fn is_key_safe(&self) -> bool {
        !self.0.contains(TICKET_KEY_SEPARATOR)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a section of the venue (e.g. `"110"`, `"SUITE"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Creates a section ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the section ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Error returned when a seat ID does not have the `section-row+number` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid seat ID '{0}': expected <section>-<row><number>")]
pub struct InvalidSeatId(pub String);

/// Identifier of a seat, composed as `section-row+number` (e.g. `"110-A1"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(String);

impl SeatId {
    /// Creates a seat ID from a string. The shape is checked by [`SeatId::section`].
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the seat ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the section from the prefix before the first separator.
    pub fn section(&self) -> Result<SectionId, InvalidSeatId> {
        match self.0.split_once(SECTION_SEPARATOR) {
            Some((section, place)) if !section.is_empty() && !place.is_empty() => {
                Ok(SectionId::new(section))
            }
            _ => Err(InvalidSeatId(self.0.clone())),
        }
    }
}

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SeatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SeatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Deterministic ticket key: `{event_id}_{seat_id}`.
///
/// Every claim of a given seat for a given event lands on the same key,
/// which is what lets the ledger serialize competing claims. The mapping is
/// only injective for event IDs that pass [`EventId::is_key_safe`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Builds the deterministic key for a seat of an event.
    pub fn for_seat(event_id: &EventId, seat_id: &SeatId) -> Self {
        Self(format!(
            "{}{TICKET_KEY_SEPARATOR}{}",
            event_id.as_str(),
            seat_id.as_str()
        ))
    }

    /// Wraps an already-built key (e.g. one read back from storage).
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Groups the tickets created by a single checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generates a fresh order ID of the form `ord_xxxxxxxx`.
    pub fn generate() -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self(format!("ord_{}", &token[..8]))
    }

    /// Wraps an existing order ID.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the order ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
