//! Advisory availability reads.
//!
//! These answer "is this seat free right now" for seat pickers. The answer
//! can be stale by the time the user checks out; only a claim decides.

use std::collections::{BTreeSet, HashSet};

use common::{EventId, SeatId};
use inventory::{InventoryStore, SectionGeometry};
use seat_ledger::{TicketStore, TicketStoreExt};

use crate::notify::TicketNotifier;
use crate::service::ReservationService;
use crate::{Result, validate};

impl<L, I, G, N> ReservationService<L, I, G, N>
where
    L: TicketStore,
    I: InventoryStore,
    G: SectionGeometry,
    N: TicketNotifier,
{
    /// Returns the requested seats that currently hold an issued ticket.
    ///
    /// Keeps request order and drops duplicates.
    #[tracing::instrument(skip(self, seat_ids), fields(seats = seat_ids.len()))]
    pub async fn check_unavailable(
        &self,
        event_id: &EventId,
        seat_ids: &[SeatId],
    ) -> Result<Vec<SeatId>> {
        validate::event_id(event_id)?;
        if seat_ids.is_empty() {
            return Ok(vec![]);
        }

        let taken = self.ledger.active_seats_for_event(event_id).await?;
        let mut seen = HashSet::new();
        Ok(seat_ids
            .iter()
            .filter(|seat| taken.contains(*seat) && seen.insert(*seat))
            .cloned()
            .collect())
    }

    /// Returns every seat of an event that currently holds an issued ticket.
    #[tracing::instrument(skip(self))]
    pub async fn taken_seats(&self, event_id: &EventId) -> Result<BTreeSet<SeatId>> {
        validate::event_id(event_id)?;
        Ok(self.ledger.active_seats_for_event(event_id).await?)
    }
}
