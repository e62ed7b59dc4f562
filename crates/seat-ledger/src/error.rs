use thiserror::Error;

use crate::TicketId;

/// Errors that can occur when interacting with the ticket ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A write batch exceeded the per-batch operation limit.
    #[error("Batch of {size} writes exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// A transaction tried to write a key it did not lock.
    #[error("Write to unlocked ticket key: {0}")]
    UnlockedWrite(TicketId),

    /// A stored row could not be mapped back to a ticket.
    #[error("Corrupt ticket record {ticket_id}: {reason}")]
    Corrupt { ticket_id: String, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
