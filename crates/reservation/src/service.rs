//! Reservation service: the entry point for every seat operation.

use std::sync::Arc;

use common::{EventId, OrderId, Owner, SeatId, SectionId};
use inventory::{EventInventory, InventoryDelta, InventoryStore, SectionGeometry};
use seat_ledger::{Ticket, TicketQuery, TicketStatus, TicketStore, TicketStoreExt};
use serde::Serialize;

use crate::notify::TicketNotifier;
use crate::{Result, validate};

/// One row of the admin seat map for a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatOwnership {
    pub seat_id: SeatId,
    pub owner: Owner,
    pub status: TicketStatus,
    pub order_id: OrderId,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
}

impl From<Ticket> for SeatOwnership {
    fn from(ticket: Ticket) -> Self {
        Self {
            seat_id: ticket.seat_id,
            owner: ticket.owner,
            status: ticket.status,
            order_id: ticket.order_id,
            owner_email: ticket.owner_email,
            owner_name: ticket.owner_name,
        }
    }
}

/// Service for claiming, releasing and revoking seats.
///
/// The ledger is the only authority on who holds a seat. The inventory
/// projection is updated after each committed ledger write and may lag.
pub struct ReservationService<L, I, G, N> {
    pub(crate) ledger: L,
    pub(crate) inventory: I,
    pub(crate) geometry: G,
    pub(crate) notifier: Arc<N>,
}

impl<L, I, G, N> ReservationService<L, I, G, N>
where
    L: TicketStore,
    I: InventoryStore,
    G: SectionGeometry,
    N: TicketNotifier,
{
    /// Creates a new reservation service.
    pub fn new(ledger: L, inventory: I, geometry: G, notifier: N) -> Self {
        Self {
            ledger,
            inventory,
            geometry,
            notifier: Arc::new(notifier),
        }
    }

    /// Returns a reference to the ticket ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns a reference to the inventory projection.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Returns a reference to the section geometry.
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Reads the aggregated inventory of an event.
    #[tracing::instrument(skip(self))]
    pub async fn inventory_snapshot(&self, event_id: &EventId) -> Result<Option<EventInventory>> {
        validate::event_id(event_id)?;
        Ok(self.inventory.snapshot(event_id).await?)
    }

    /// Lists every ticket a user has ever held, in any status.
    #[tracing::instrument(skip(self))]
    pub async fn tickets_for_user(&self, uid: &str) -> Result<Vec<Ticket>> {
        validate::owner(&Owner::user(uid))?;
        Ok(self.ledger.list_tickets_for_user(uid).await?)
    }

    /// Lists who holds each ticketed seat of a section, ordered by seat.
    #[tracing::instrument(skip(self))]
    pub async fn section_owners(
        &self,
        event_id: &EventId,
        section: &SectionId,
    ) -> Result<Vec<SeatOwnership>> {
        validate::event_id(event_id)?;
        let tickets = self
            .ledger
            .query_tickets(TicketQuery::for_event(event_id.clone()).section(section.clone()))
            .await?;

        let mut rows: Vec<SeatOwnership> = tickets.into_iter().map(Into::into).collect();
        rows.sort_by(|a, b| a.seat_id.cmp(&b.seat_id));
        Ok(rows)
    }

    /// Applies a delta to the projection, swallowing any failure.
    ///
    /// Returns whether the projection is in step with the ledger write that
    /// produced the delta.
    pub(crate) async fn sync_inventory(
        &self,
        event_id: &EventId,
        delta: &InventoryDelta,
        operation: &'static str,
    ) -> bool {
        if delta.is_empty() {
            return true;
        }

        match self.inventory.apply(event_id, delta).await {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("inventory_projection_failures_total", "operation" => operation)
                    .increment(1);
                if e.is_permission_denied() {
                    tracing::warn!(
                        %event_id,
                        operation,
                        error = %e,
                        "inventory projection write denied, counters will drift until reconciled"
                    );
                } else {
                    tracing::error!(
                        %event_id,
                        operation,
                        error = %e,
                        "inventory projection write failed, counters will drift until reconciled"
                    );
                }
                false
            }
        }
    }

    /// Builds the projection delta for seats gained or given up by `owner`.
    pub(crate) fn seat_delta<'a>(
        &self,
        seats: impl IntoIterator<Item = (&'a SectionId, &'a Owner)>,
        gained: bool,
    ) -> InventoryDelta {
        let mut delta = InventoryDelta::new();
        for (section, owner) in seats {
            let total = self.geometry.total_seats_for_section(section);
            if gained {
                delta.add_seat(section.clone(), owner, total);
            } else {
                delta.remove_seat(section.clone(), owner, total);
            }
        }
        delta
    }
}
