//! Atomic seat claims.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{EventId, OrderId, Owner, SeatId, SectionId, TicketId};
use inventory::{InventoryStore, SectionGeometry};
use seat_ledger::{Ticket, TicketDetails, TicketStore, TicketWrite};
use serde::Serialize;

use crate::notify::{TicketNotice, TicketNotifier};
use crate::service::ReservationService;
use crate::{ReservationError, Result, validate};

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimOutcome {
    /// Groups the tickets created by this claim.
    pub order_id: OrderId,
    /// Seats that received a new ticket.
    pub created_seats: Vec<SeatId>,
    /// Seats the owner already held; left untouched.
    pub reused_seats: Vec<SeatId>,
    /// Whether the inventory projection took the update.
    pub inventory_synced: bool,
}

impl ClaimOutcome {
    /// Returns every seat the owner now holds from this request.
    pub fn seats(&self) -> impl Iterator<Item = &SeatId> {
        self.created_seats.iter().chain(self.reused_seats.iter())
    }
}

/// How a requested seat relates to the ticket currently at its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeatClaim {
    /// No blocking ticket.
    Claimable,
    /// Already held by the same owner.
    Reused,
    /// Held by someone else, or the key is occupied by another seat's ticket.
    Conflict,
}

impl SeatClaim {
    pub(crate) fn classify(
        existing: Option<&Ticket>,
        event_id: &EventId,
        seat_id: &SeatId,
        owner: &Owner,
    ) -> Self {
        match existing {
            Some(ticket) if !ticket.is_for(event_id, seat_id) => SeatClaim::Conflict,
            Some(ticket) if ticket.is_active() && &ticket.owner == owner => SeatClaim::Reused,
            Some(ticket) if ticket.is_active() => SeatClaim::Conflict,
            _ => SeatClaim::Claimable,
        }
    }
}

/// What a claim transaction decided.
#[derive(Debug)]
pub(crate) enum ClaimDecision {
    Conflict(Vec<SeatId>),
    Commit {
        created: Vec<Ticket>,
        reused: Vec<SeatId>,
    },
}

/// Everything a claim needs inside the ledger transaction.
pub(crate) struct ClaimPlan {
    pub event_id: EventId,
    pub seats: Vec<(SeatId, SectionId)>,
    pub owner: Owner,
    pub order_id: OrderId,
    pub details: TicketDetails,
    pub now: DateTime<Utc>,
}

impl ClaimPlan {
    /// Decides the claim against the current documents, one per seat.
    ///
    /// Any conflict aborts the whole claim with no writes.
    pub(crate) fn decide(self, current: Vec<Option<Ticket>>) -> (ClaimDecision, Vec<TicketWrite>) {
        let states: Vec<SeatClaim> = self
            .seats
            .iter()
            .zip(&current)
            .map(|((seat_id, _), existing)| {
                SeatClaim::classify(existing.as_ref(), &self.event_id, seat_id, &self.owner)
            })
            .collect();

        let conflicts: Vec<SeatId> = self
            .seats
            .iter()
            .zip(&states)
            .filter(|(_, state)| **state == SeatClaim::Conflict)
            .map(|((seat_id, _), _)| seat_id.clone())
            .collect();
        if !conflicts.is_empty() {
            return (ClaimDecision::Conflict(conflicts), vec![]);
        }

        let mut created = Vec::new();
        let mut reused = Vec::new();
        for ((seat_id, section), state) in self.seats.into_iter().zip(states) {
            match state {
                SeatClaim::Reused => reused.push(seat_id),
                _ => created.push(Ticket::issue(
                    self.event_id.clone(),
                    seat_id,
                    section,
                    self.owner.clone(),
                    self.order_id.clone(),
                    &self.details,
                    self.now,
                )),
            }
        }

        let writes = created.iter().cloned().map(TicketWrite::Put).collect();
        (ClaimDecision::Commit { created, reused }, writes)
    }
}

impl<L, I, G, N> ReservationService<L, I, G, N>
where
    L: TicketStore,
    I: InventoryStore,
    G: SectionGeometry,
    N: TicketNotifier,
{
    /// Claims a batch of seats for one owner, all or nothing.
    ///
    /// Seats already held by the same owner are reported as reused. If any
    /// seat is held by another owner the claim fails with
    /// [`ReservationError::SeatConflict`] listing every such seat, and nothing
    /// is written.
    #[tracing::instrument(skip(self, seat_ids, details), fields(seats = seat_ids.len()))]
    pub async fn claim_seats(
        &self,
        event_id: &EventId,
        seat_ids: &[SeatId],
        owner: Owner,
        details: TicketDetails,
    ) -> Result<ClaimOutcome> {
        let (outcome, _) = self.claim(event_id, seat_ids, owner, details).await?;
        Ok(outcome)
    }

    /// Places an administrative hold on a batch of seats.
    #[tracing::instrument(skip(self, seat_ids, details), fields(seats = seat_ids.len()))]
    pub async fn hold_seats(
        &self,
        event_id: &EventId,
        seat_ids: &[SeatId],
        owner: Owner,
        details: TicketDetails,
    ) -> Result<ClaimOutcome> {
        if !owner.is_sentinel() {
            return Err(ReservationError::validation(
                "holds must use an admin owner",
            ));
        }
        let (outcome, _) = self.claim(event_id, seat_ids, owner, details).await?;
        Ok(outcome)
    }

    /// Claims seats for a purchaser and notifies them of the new tickets.
    ///
    /// The notification is dispatched in the background; its outcome never
    /// affects the purchase.
    #[tracing::instrument(skip(self, seat_ids, details), fields(seats = seat_ids.len()))]
    pub async fn checkout(
        &self,
        event_id: &EventId,
        seat_ids: &[SeatId],
        uid: &str,
        details: TicketDetails,
    ) -> Result<ClaimOutcome> {
        let event_title = details.event_title.clone();
        let (outcome, created) = self
            .claim(event_id, seat_ids, Owner::user(uid), details)
            .await?;

        if !created.is_empty() {
            let notice = TicketNotice {
                uid: uid.to_string(),
                tickets: created,
                event_title,
                order_id: outcome.order_id.clone(),
            };
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                let order_id = notice.order_id.clone();
                if let Err(e) = notifier.notify(notice).await {
                    tracing::warn!(%order_id, error = %e, "ticket notification failed");
                }
            });
        }

        Ok(outcome)
    }

    async fn claim(
        &self,
        event_id: &EventId,
        seat_ids: &[SeatId],
        owner: Owner,
        details: TicketDetails,
    ) -> Result<(ClaimOutcome, Vec<Ticket>)> {
        validate::event_id(event_id)?;
        validate::owner(&owner)?;
        let seats = validate::seat_batch(seat_ids)?;

        metrics::counter!("seat_claims_total", "owner" => owner.kind()).increment(1);
        let start = Instant::now();

        let keys: Vec<TicketId> = seats
            .iter()
            .map(|(seat_id, _)| TicketId::for_seat(event_id, seat_id))
            .collect();
        let order_id = OrderId::generate();
        let plan = ClaimPlan {
            event_id: event_id.clone(),
            seats,
            owner,
            order_id: order_id.clone(),
            details,
            now: Utc::now(),
        };

        let decision = self
            .ledger
            .transact(&keys, move |current| plan.decide(current))
            .await?;
        metrics::histogram!("seat_claim_duration_seconds").record(start.elapsed().as_secs_f64());

        let (created, reused) = match decision {
            ClaimDecision::Conflict(seats) => {
                metrics::counter!("seat_conflicts_total").increment(1);
                tracing::info!(
                    %event_id,
                    conflicts = seats.len(),
                    "claim rejected, seats already taken"
                );
                return Err(ReservationError::SeatConflict { seats });
            }
            ClaimDecision::Commit { created, reused } => (created, reused),
        };

        metrics::counter!("seats_claimed_total").increment(created.len() as u64);

        let delta = self.seat_delta(created.iter().map(|t| (&t.section, &t.owner)), true);
        let inventory_synced = self.sync_inventory(event_id, &delta, "claim").await;

        tracing::info!(
            %event_id,
            %order_id,
            created = created.len(),
            reused = reused.len(),
            inventory_synced,
            "seats claimed"
        );

        let outcome = ClaimOutcome {
            order_id,
            created_seats: created.iter().map(|t| t.seat_id.clone()).collect(),
            reused_seats: reused,
            inventory_synced,
        };
        Ok((outcome, created))
    }
}
