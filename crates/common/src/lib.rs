//! Identifiers and the seat owner variant shared by every crate in the workspace.

pub mod owner;
pub mod types;

pub use owner::Owner;
pub use types::{
    EventId, InvalidSeatId, OrderId, SECTION_SEPARATOR, SeatId, SectionId, TICKET_KEY_SEPARATOR,
    TicketId,
};
