//! Input checks run before any ledger I/O.

use std::collections::HashSet;

use common::{EventId, Owner, SeatId, SectionId, TICKET_KEY_SEPARATOR};
use seat_ledger::MAX_BATCH_WRITES;

use crate::{ReservationError, Result};

pub(crate) fn event_id(event_id: &EventId) -> Result<()> {
    if event_id.is_blank() {
        return Err(ReservationError::validation("event id must not be empty"));
    }
    if !event_id.is_key_safe() {
        return Err(ReservationError::validation(format!(
            "event id must not contain '{TICKET_KEY_SEPARATOR}'"
        )));
    }
    Ok(())
}

pub(crate) fn owner(owner: &Owner) -> Result<()> {
    if let Owner::RealUser(uid) = owner
        && uid.trim().is_empty()
    {
        return Err(ReservationError::validation("user id must not be empty"));
    }
    Ok(())
}

pub(crate) fn seat(seat_id: &SeatId) -> Result<SectionId> {
    seat_id
        .section()
        .map_err(|e| ReservationError::validation(e.to_string()))
}

/// Checks a claim's seat list.
///
/// Returns each distinct seat with its section, in first-occurrence order.
pub(crate) fn seat_batch(seat_ids: &[SeatId]) -> Result<Vec<(SeatId, SectionId)>> {
    if seat_ids.is_empty() {
        return Err(ReservationError::validation("at least one seat is required"));
    }

    let mut seen = HashSet::with_capacity(seat_ids.len());
    let mut seats = Vec::with_capacity(seat_ids.len());
    for seat_id in seat_ids {
        if !seen.insert(seat_id) {
            continue;
        }
        let section = seat(seat_id)?;
        seats.push((seat_id.clone(), section));
    }

    if seats.len() > MAX_BATCH_WRITES {
        return Err(ReservationError::validation(format!(
            "at most {MAX_BATCH_WRITES} seats can be claimed at once, got {}",
            seats.len()
        )));
    }

    Ok(seats)
}
