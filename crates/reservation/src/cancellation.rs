//! Event cancellation fan-out.

use chrono::Utc;
use common::EventId;
use inventory::{InventoryStore, SectionGeometry};
use seat_ledger::{
    EVENT_CANCELLED_REASON, MAX_BATCH_WRITES, Ticket, TicketId, TicketStatus, TicketStore,
    TicketStoreExt, TicketWrite,
};

use crate::notify::TicketNotifier;
use crate::service::ReservationService;
use crate::{Result, validate};

/// Upper bound on listing passes made by one cancellation.
pub const MAX_INVALIDATION_SWEEPS: usize = 5;

impl<L, I, G, N> ReservationService<L, I, G, N>
where
    L: TicketStore,
    I: InventoryStore,
    G: SectionGeometry,
    N: TicketNotifier,
{
    /// Marks every ticket of an event invalid and takes them off the
    /// inventory projection.
    ///
    /// Tickets are rewritten in atomic chunks of at most
    /// [`MAX_BATCH_WRITES`]. Each chunk re-reads its tickets under lock, so a
    /// ticket released meanwhile stays deleted. Tickets already invalid are
    /// left alone. Returns the number of tickets invalidated.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_all_for_event(&self, event_id: &EventId) -> Result<usize> {
        let invalidated = self.invalidate_tickets(event_id).await?;

        let delta = self.seat_delta(
            invalidated
                .iter()
                .filter(|t| t.is_active())
                .map(|t| (&t.section, &t.owner)),
            false,
        );
        self.sync_inventory(event_id, &delta, "invalidate").await;

        Ok(invalidated.len())
    }

    /// Cancels an event: invalidates its tickets, then drops its inventory.
    ///
    /// The inventory document is removed outright rather than decremented.
    /// Removing the event itself from the catalog is left to the caller and
    /// should happen after this returns; until then a claim can still land
    /// after the last sweep. Returns the number of tickets invalidated.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_event(&self, event_id: &EventId) -> Result<usize> {
        let invalidated = self.invalidate_tickets(event_id).await?.len();

        if let Err(e) = self.inventory.remove(event_id).await {
            metrics::counter!("inventory_projection_failures_total", "operation" => "cancel")
                .increment(1);
            tracing::warn!(%event_id, error = %e, "failed to remove inventory of cancelled event");
        }

        tracing::info!(%event_id, invalidated, "event cancelled");
        Ok(invalidated)
    }

    /// Sweeps the event until no ticket is left to invalidate.
    ///
    /// Each sweep lists the event's tickets and invalidates them chunk by
    /// chunk. Claims committed after a listing are caught by the next sweep.
    /// Gives up after [`MAX_INVALIDATION_SWEEPS`] while claims keep arriving.
    /// Returns the tickets as they were before invalidation.
    async fn invalidate_tickets(&self, event_id: &EventId) -> Result<Vec<Ticket>> {
        validate::event_id(event_id)?;

        let mut invalidated: Vec<Ticket> = Vec::new();
        for sweep in 1..=MAX_INVALIDATION_SWEEPS {
            let keys: Vec<TicketId> = self
                .ledger
                .list_tickets_for_event(event_id)
                .await?
                .into_iter()
                .filter(|t| t.status != TicketStatus::Invalid)
                .map(|t| t.ticket_id)
                .collect();
            if keys.is_empty() {
                break;
            }

            let mut swept = 0;
            for chunk in keys.chunks(MAX_BATCH_WRITES) {
                let previous = self.invalidate_chunk(event_id, chunk).await?;
                tracing::debug!(
                    %event_id,
                    sweep,
                    chunk = previous.len(),
                    "invalidated ticket chunk"
                );
                swept += previous.len();
                invalidated.extend(previous);
            }

            if swept == 0 {
                break;
            }
            if sweep == MAX_INVALIDATION_SWEEPS {
                tracing::warn!(
                    %event_id,
                    sweeps = sweep,
                    "invalidation stopped at the sweep limit, late claims may remain"
                );
            }
        }

        metrics::counter!("tickets_invalidated_total").increment(invalidated.len() as u64);
        tracing::info!(%event_id, invalidated = invalidated.len(), "event tickets invalidated");
        Ok(invalidated)
    }

    /// Invalidates the tickets of one chunk of keys under lock.
    async fn invalidate_chunk(
        &self,
        event_id: &EventId,
        keys: &[TicketId],
    ) -> Result<Vec<Ticket>> {
        let event = event_id.clone();
        let now = Utc::now();
        let previous = self
            .ledger
            .transact(keys, move |current| {
                let mut previous = Vec::new();
                let mut writes = Vec::new();
                for ticket in current.into_iter().flatten() {
                    if ticket.event_id != event || ticket.status == TicketStatus::Invalid {
                        continue;
                    }
                    writes.push(TicketWrite::Put(
                        ticket.clone().invalidated(EVENT_CANCELLED_REASON, now),
                    ));
                    previous.push(ticket);
                }
                (previous, writes)
            })
            .await?;
        Ok(previous)
    }
}
