//! Inventory projection error types.

use thiserror::Error;

/// Errors that can occur when reading or writing the inventory projection.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The caller is not allowed to write the projection.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back to an inventory entry.
    #[error("Corrupt inventory for event {event_id}: {reason}")]
    Corrupt { event_id: String, reason: String },
}

impl InventoryError {
    /// Returns true for access-control failures, as opposed to I/O failures.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, InventoryError::PermissionDenied(_))
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
