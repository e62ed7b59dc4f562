//! Seat ledger: the durable, authoritative record of who holds which seat.
//!
//! - [`Ticket`] is one seat of one event bound to an [`Owner`](common::Owner)
//! - [`TicketStore`] persists tickets and offers a serializable
//!   read-then-write primitive, [`TicketStore::transact`]
//! - [`InMemoryTicketStore`] and [`PostgresTicketStore`] implement it

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;
pub mod ticket;

pub use common::{EventId, Owner, SeatId, SectionId, TicketId};
pub use error::{LedgerError, Result};
pub use memory::InMemoryTicketStore;
pub use postgres::PostgresTicketStore;
pub use query::TicketQuery;
pub use store::{MAX_BATCH_WRITES, TicketStore, TicketStoreExt, TicketStream, TicketWrite};
pub use ticket::{EVENT_CANCELLED_REASON, Ticket, TicketDetails, TicketStatus};
