//! Giving seats back: owner release and admin revoke.

use chrono::Utc;
use common::{EventId, Owner, SeatId, TicketId};
use inventory::{InventoryStore, SectionGeometry};
use seat_ledger::{Ticket, TicketStore, TicketWrite};

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
    /// Releases a seat held by `owner`, deleting its ticket.
    ///
    /// Returns false without writing if the seat has no issued ticket, the
    /// ticket belongs to someone else, or the document at the seat's key was
    /// issued for a different seat.
    #[tracing::instrument(skip(self))]
    pub async fn release_seat(
        &self,
        event_id: &EventId,
        seat_id: &SeatId,
        owner: &Owner,
    ) -> Result<bool> {
        validate::event_id(event_id)?;
        validate::owner(owner)?;
        validate::seat(seat_id)?;

        let key = TicketId::for_seat(event_id, seat_id);
        let (event, seat, owner) = (event_id.clone(), seat_id.clone(), owner.clone());
        let released: Option<Ticket> = self
            .ledger
            .transact(&[key.clone()], move |current| {
                match current.into_iter().next().flatten() {
                    Some(ticket)
                        if ticket.is_for(&event, &seat)
                            && ticket.is_active()
                            && ticket.owner == owner =>
                    {
                        (Some(ticket), vec![TicketWrite::Delete(key)])
                    }
                    _ => (None, vec![]),
                }
            })
            .await?;

        let Some(ticket) = released else {
            tracing::debug!(%event_id, %seat_id, "nothing to release");
            return Ok(false);
        };

        metrics::counter!("seat_releases_total").increment(1);
        let delta = self.seat_delta([(&ticket.section, &ticket.owner)], false);
        let inventory_synced = self.sync_inventory(event_id, &delta, "release").await;
        tracing::info!(%event_id, %seat_id, inventory_synced, "seat released");
        Ok(true)
    }

    /// Revokes the issued ticket on a seat, whoever holds it.
    ///
    /// The ticket stays in the ledger as `Revoked` without a QR payload and
    /// the seat becomes claimable. Returns false if there was nothing to
    /// revoke.
    #[tracing::instrument(skip(self))]
    pub async fn revoke_ticket(&self, event_id: &EventId, seat_id: &SeatId) -> Result<bool> {
        validate::event_id(event_id)?;
        validate::seat(seat_id)?;

        let key = TicketId::for_seat(event_id, seat_id);
        let (event, seat) = (event_id.clone(), seat_id.clone());
        let now = Utc::now();
        let revoked: Option<Ticket> = self
            .ledger
            .transact(&[key], move |current| {
                match current.into_iter().next().flatten() {
                    Some(ticket) if ticket.is_for(&event, &seat) && ticket.is_active() => {
                        let revoked = ticket.revoked(now);
                        (Some(revoked.clone()), vec![TicketWrite::Put(revoked)])
                    }
                    _ => (None, vec![]),
                }
            })
            .await?;

        let Some(ticket) = revoked else {
            tracing::debug!(%event_id, %seat_id, "nothing to revoke");
            return Ok(false);
        };

        metrics::counter!("ticket_revocations_total").increment(1);
        let delta = self.seat_delta([(&ticket.section, &ticket.owner)], false);
        let inventory_synced = self.sync_inventory(event_id, &delta, "revoke").await;
        tracing::info!(
            %event_id,
            %seat_id,
            owner = %ticket.owner,
            inventory_synced,
            "ticket revoked"
        );
        Ok(true)
    }
}
