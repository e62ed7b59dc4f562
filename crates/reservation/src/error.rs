//! Reservation error types.

use common::SeatId;
use inventory::InventoryError;
use seat_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during reservation operations.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// One or more requested seats are held by another owner.
    ///
    /// Lists every conflicting seat in request order. Nothing was written.
    #[error("Seats already taken: {}", format_seats(.seats))]
    SeatConflict { seats: Vec<SeatId> },

    /// The request was malformed and rejected before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The ledger failed. No partial success may be assumed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The inventory projection failed on an operation that reads or
    /// rebuilds it directly.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

impl ReservationError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ReservationError::Validation(msg.into())
    }
}

fn format_seats(seats: &[SeatId]) -> String {
    seats
        .iter()
        .map(SeatId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A ticket notification could not be dispatched.
#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Result type for reservation operations.
pub type Result<T> = std::result::Result<T, ReservationError>;
