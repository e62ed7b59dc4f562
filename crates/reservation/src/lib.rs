//! Seat reservation: the concurrency core of venue ticketing.
//!
//! [`ReservationService`] runs every seat operation over a
//! [`TicketStore`](seat_ledger::TicketStore) ledger and keeps the
//! [`InventoryStore`](inventory::InventoryStore) projection up to date:
//! - atomic all-or-nothing claims with full conflict reporting
//! - owner release and admin revoke
//! - event cancellation fan-out
//! - advisory availability reads
//! - projection audit and reconciliation
//! - purchase notifications through a [`TicketNotifier`]

pub mod availability;
pub mod cancellation;
pub mod claim;
pub mod error;
pub mod notify;
pub mod reconcile;
pub mod release;
pub mod service;
mod validate;

pub use cancellation::MAX_INVALIDATION_SWEEPS;
pub use claim::ClaimOutcome;
pub use error::{NotifyError, ReservationError, Result};
pub use notify::{InMemoryTicketNotifier, LogNotifier, TicketNotice, TicketNotifier};
pub use reconcile::{InventoryDrift, SectionDrift};
pub use service::{ReservationService, SeatOwnership};
