use async_trait::async_trait;
use common::EventId;

use crate::{EventInventory, InventoryDelta, Result};

/// Core trait for inventory projection backends.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Atomically increments the counters named by the delta.
    ///
    /// Creates the document and any missing section on first write. Each
    /// touched section's `total` is overwritten; counters never go below zero.
    async fn apply(&self, event_id: &EventId, delta: &InventoryDelta) -> Result<()>;

    /// Reads the current inventory document of an event.
    async fn snapshot(&self, event_id: &EventId) -> Result<Option<EventInventory>>;

    /// Overwrites the whole document of an event.
    async fn replace(&self, inventory: &EventInventory) -> Result<()>;

    /// Deletes the document of an event. Returns true if one existed.
    async fn remove(&self, event_id: &EventId) -> Result<bool>;
}
