//! Rebuilding the inventory projection from the ledger.

use chrono::Utc;
use common::{EventId, SectionId};
use futures_util::TryStreamExt;
use inventory::{EventInventory, InventoryDelta, InventoryStore, SectionGeometry, SectionInventory};
use seat_ledger::TicketStore;
use serde::Serialize;

use crate::notify::TicketNotifier;
use crate::service::ReservationService;
use crate::{Result, validate};

/// Difference between the stored and recomputed counters of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionDrift {
    pub section: SectionId,
    /// What the projection held; `None` if the section was missing.
    pub stored: Option<SectionInventory>,
    /// What the ledger says.
    pub actual: SectionInventory,
}

/// Report comparing an event's projection with its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryDrift {
    pub event_id: EventId,
    /// Sections whose counters differ, ordered by section.
    pub sections: Vec<SectionDrift>,
    /// Stored seats sold; `None` if there was no projection document.
    pub stored_seats_sold: Option<u64>,
    pub actual_seats_sold: u64,
}

impl InventoryDrift {
    /// Compares a stored document with the recomputed one.
    pub fn between(stored: Option<&EventInventory>, actual: &EventInventory) -> Self {
        let sections = actual
            .sections
            .iter()
            .filter_map(|(section, actual_entry)| {
                let stored_entry = stored.and_then(|s| s.section(section)).copied();
                (stored_entry != Some(*actual_entry)).then(|| SectionDrift {
                    section: section.clone(),
                    stored: stored_entry,
                    actual: *actual_entry,
                })
            })
            .collect();

        Self {
            event_id: actual.event_id.clone(),
            sections,
            stored_seats_sold: stored.map(|s| s.total_seats_sold),
            actual_seats_sold: actual.total_seats_sold,
        }
    }

    /// Returns true if the projection matched the ledger.
    pub fn is_consistent(&self) -> bool {
        self.sections.is_empty() && self.stored_seats_sold.unwrap_or(0) == self.actual_seats_sold
    }
}

impl<L, I, G, N> ReservationService<L, I, G, N>
where
    L: TicketStore,
    I: InventoryStore,
    G: SectionGeometry,
    N: TicketNotifier,
{
    /// Reports how far the projection of an event has drifted, without
    /// changing it.
    #[tracing::instrument(skip(self))]
    pub async fn audit_inventory(&self, event_id: &EventId) -> Result<InventoryDrift> {
        validate::event_id(event_id)?;
        let (_, drift) = self.compare_inventory(event_id).await?;
        Ok(drift)
    }

    /// Recomputes the projection of an event from the ledger and stores it.
    ///
    /// Returns the drift that was repaired.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_inventory(&self, event_id: &EventId) -> Result<InventoryDrift> {
        validate::event_id(event_id)?;
        let (actual, drift) = self.compare_inventory(event_id).await?;

        if drift.stored_seats_sold.is_none() && actual.sections.is_empty() {
            return Ok(drift);
        }
        self.inventory.replace(&actual).await?;

        if drift.is_consistent() {
            tracing::info!(%event_id, "inventory already consistent");
        } else {
            tracing::warn!(
                %event_id,
                drifted_sections = drift.sections.len(),
                stored_seats_sold = ?drift.stored_seats_sold,
                actual_seats_sold = drift.actual_seats_sold,
                "inventory drift repaired"
            );
        }
        Ok(drift)
    }

    async fn compare_inventory(
        &self,
        event_id: &EventId,
    ) -> Result<(EventInventory, InventoryDrift)> {
        let stored = self.inventory.snapshot(event_id).await?;
        let actual = self.rebuild_inventory(event_id, stored.as_ref()).await?;
        let drift = InventoryDrift::between(stored.as_ref(), &actual);
        Ok((actual, drift))
    }

    /// Folds the issued tickets of an event into a fresh document.
    ///
    /// Sections known to the stored document but without tickets are kept
    /// with zero counters, so stale counts show up as drift.
    async fn rebuild_inventory(
        &self,
        event_id: &EventId,
        stored: Option<&EventInventory>,
    ) -> Result<EventInventory> {
        let now = Utc::now();
        let mut inventory = EventInventory::new(event_id.clone(), now);

        if let Some(stored) = stored {
            for section in stored.sections.keys() {
                let total = self.geometry.total_seats_for_section(section);
                inventory
                    .sections
                    .insert(section.clone(), SectionInventory::with_total(total));
            }
        }

        let mut tickets = self.ledger.stream_tickets_for_event(event_id).await?;
        let mut delta = InventoryDelta::new();
        while let Some(ticket) = tickets.try_next().await? {
            if !ticket.is_active() {
                continue;
            }
            let total = self.geometry.total_seats_for_section(&ticket.section);
            delta.add_seat(ticket.section, &ticket.owner, total);
        }

        inventory.apply(&delta, now);
        Ok(inventory)
    }
}
