use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::EventId;
use tokio::sync::RwLock;

use crate::{EventInventory, InventoryDelta, InventoryError, InventoryStore, Result};

/// In-memory inventory projection for tests and single-node deployments.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    inventories: Arc<RwLock<HashMap<EventId, EventInventory>>>,
    deny_writes: Arc<AtomicBool>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail with `PermissionDenied` until reset.
    pub fn fail_with_permission_denied(&self, fail: bool) {
        self.deny_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored event documents.
    pub async fn event_count(&self) -> usize {
        self.inventories.read().await.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(InventoryError::PermissionDenied(
                "inventory writes are disabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn apply(&self, event_id: &EventId, delta: &InventoryDelta) -> Result<()> {
        self.check_writable()?;
        if delta.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut inventories = self.inventories.write().await;
        inventories
            .entry(event_id.clone())
            .or_insert_with(|| EventInventory::new(event_id.clone(), now))
            .apply(delta, now);
        Ok(())
    }

    async fn snapshot(&self, event_id: &EventId) -> Result<Option<EventInventory>> {
        Ok(self.inventories.read().await.get(event_id).cloned())
    }

    async fn replace(&self, inventory: &EventInventory) -> Result<()> {
        self.check_writable()?;
        self.inventories
            .write()
            .await
            .insert(inventory.event_id.clone(), inventory.clone());
        Ok(())
    }

    async fn remove(&self, event_id: &EventId) -> Result<bool> {
        self.check_writable()?;
        Ok(self.inventories.write().await.remove(event_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Owner, SectionId};

    fn one_seat(section: &str, owner: &Owner) -> InventoryDelta {
        let mut delta = InventoryDelta::new();
        delta.add_seat(SectionId::new(section), owner, 240);
        delta
    }

    #[tokio::test]
    async fn apply_creates_document() {
        let store = InMemoryInventoryStore::new();
        let event = EventId::new("evt1");

        store
            .apply(&event, &one_seat("110", &Owner::user("uid-a")))
            .await
            .unwrap();
        store
            .apply(&event, &one_seat("110", &Owner::AdminUnavailable))
            .await
            .unwrap();

        let snapshot = store.snapshot(&event).await.unwrap().unwrap();
        let section = snapshot.section(&SectionId::new("110")).unwrap();
        assert_eq!(section.taken, 1);
        assert_eq!(section.unavailable, 1);
        assert_eq!(section.total, 240);
        assert_eq!(snapshot.total_seats_sold, 1);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_event_is_none() {
        let store = InMemoryInventoryStore::new();
        assert!(store.snapshot(&EventId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn permission_denied_injection() {
        let store = InMemoryInventoryStore::new();
        let event = EventId::new("evt1");
        store.fail_with_permission_denied(true);

        let result = store
            .apply(&event, &one_seat("110", &Owner::user("uid-a")))
            .await;
        assert!(matches!(result, Err(InventoryError::PermissionDenied(_))));
        assert_eq!(store.event_count().await, 0);

        store.fail_with_permission_denied(false);
        store
            .apply(&event, &one_seat("110", &Owner::user("uid-a")))
            .await
            .unwrap();
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn replace_and_remove() {
        let store = InMemoryInventoryStore::new();
        let event = EventId::new("evt1");
        store
            .apply(&event, &one_seat("110", &Owner::user("uid-a")))
            .await
            .unwrap();

        let fresh = EventInventory::new(event.clone(), Utc::now());
        store.replace(&fresh).await.unwrap();
        assert_eq!(store.snapshot(&event).await.unwrap(), Some(fresh));

        assert!(store.remove(&event).await.unwrap());
        assert!(!store.remove(&event).await.unwrap());
    }
}
