use std::collections::BTreeSet;
use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EventId, LedgerError, Owner, Result, SeatId, Ticket, TicketId, TicketQuery};

/// Maximum number of writes accepted in one atomic batch.
///
/// Callers with more work (e.g. cancelling a sold-out event) must chunk.
pub const MAX_BATCH_WRITES: usize = 500;

/// A single mutation committed by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketWrite {
    /// Insert or overwrite the ticket at its key.
    Put(Ticket),
    /// Remove the ticket at the key, if any.
    Delete(TicketId),
}

impl TicketWrite {
    /// Returns the key this write touches.
    pub fn key(&self) -> &TicketId {
        match self {
            TicketWrite::Put(ticket) => &ticket.ticket_id,
            TicketWrite::Delete(id) => id,
        }
    }
}

/// A stream of tickets.
pub type TicketStream = Pin<Box<dyn Stream<Item = Result<Ticket>> + Send>>;

/// Core trait for ticket ledger implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Retrieves the ticket stored at a key, whatever its status.
    async fn get_ticket(&self, ticket_id: &TicketId) -> Result<Option<Ticket>>;

    /// Retrieves tickets matching a query.
    async fn query_tickets(&self, query: TicketQuery) -> Result<Vec<Ticket>>;

    /// Streams every ticket of an event, in any status.
    async fn stream_tickets_for_event(&self, event_id: &EventId) -> Result<TicketStream>;

    /// Serializable read-then-write over a set of ticket keys.
    ///
    /// The keys are locked for the duration of the call. `decide` receives the
    /// current document at each key (in the order given, `None` when absent)
    /// and returns an outcome plus the writes to commit. An empty write list
    /// commits nothing. Writes may only target locked keys.
    async fn transact<T, F>(&self, keys: &[TicketId], decide: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Vec<Option<Ticket>>) -> (T, Vec<TicketWrite>) + Send + 'static;
}

/// Extension trait providing the ledger's read operations.
#[async_trait]
pub trait TicketStoreExt: TicketStore {
    /// Returns the ticket blocking a seat, if any. Only `Issued` counts.
    async fn get_active_ticket(
        &self,
        event_id: &EventId,
        seat_id: &SeatId,
    ) -> Result<Option<Ticket>> {
        let ticket = self
            .get_ticket(&TicketId::for_seat(event_id, seat_id))
            .await?;
        Ok(ticket.filter(|t| t.is_for(event_id, seat_id) && t.is_active()))
    }

    /// Lists every ticket of an event, in any status.
    async fn list_tickets_for_event(&self, event_id: &EventId) -> Result<Vec<Ticket>> {
        self.query_tickets(TicketQuery::for_event(event_id.clone()))
            .await
    }

    /// Lists every ticket owned by a user, in any status.
    async fn list_tickets_for_user(&self, uid: &str) -> Result<Vec<Ticket>> {
        self.query_tickets(TicketQuery::for_owner(Owner::user(uid)))
            .await
    }

    /// Returns the seats of an event that currently hold an issued ticket.
    async fn active_seats_for_event(&self, event_id: &EventId) -> Result<BTreeSet<SeatId>> {
        let tickets = self
            .query_tickets(TicketQuery::for_event(event_id.clone()).active())
            .await?;
        Ok(tickets.into_iter().map(|t| t.seat_id).collect())
    }
}

// Blanket implementation for all TicketStore implementations
impl<T: TicketStore + ?Sized> TicketStoreExt for T {}

/// Checks a write list against the size limit.
fn validate_batch(writes: &[TicketWrite]) -> Result<()> {
    if writes.len() > MAX_BATCH_WRITES {
        return Err(LedgerError::BatchTooLarge {
            size: writes.len(),
            limit: MAX_BATCH_WRITES,
        });
    }
    Ok(())
}

/// Checks that a transaction stays within the size limit and only writes
/// keys it locked.
pub fn validate_transaction_writes(keys: &[TicketId], writes: &[TicketWrite]) -> Result<()> {
    validate_batch(writes)?;
    for write in writes {
        if !keys.contains(write.key()) {
            return Err(LedgerError::UnlockedWrite(write.key().clone()));
        }
    }
    Ok(())
}
