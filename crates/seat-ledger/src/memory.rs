use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventId, Result, Ticket, TicketId, TicketQuery,
    store::{TicketStore, TicketStream, TicketWrite, validate_transaction_writes},
};

/// In-memory ticket ledger for tests and single-node deployments.
///
/// Transactions hold the write lock for their whole read-decide-write cycle,
/// so they are fully serialized against each other.
#[derive(Clone, Default)]
pub struct InMemoryTicketStore {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
}

impl InMemoryTicketStore {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tickets, in any status.
    pub async fn ticket_count(&self) -> usize {
        self.tickets.read().await.len()
    }

    /// Removes every ticket.
    pub async fn clear(&self) {
        self.tickets.write().await.clear();
    }

    fn apply(tickets: &mut HashMap<TicketId, Ticket>, writes: Vec<TicketWrite>) {
        for write in writes {
            match write {
                TicketWrite::Put(ticket) => {
                    tickets.insert(ticket.ticket_id.clone(), ticket);
                }
                TicketWrite::Delete(id) => {
                    tickets.remove(&id);
                }
            }
        }
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn get_ticket(&self, ticket_id: &TicketId) -> Result<Option<Ticket>> {
        Ok(self.tickets.read().await.get(ticket_id).cloned())
    }

    async fn query_tickets(&self, query: TicketQuery) -> Result<Vec<Ticket>> {
        let store = self.tickets.read().await;
        let mut tickets: Vec<_> = store
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();

        tickets.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.ticket_id.cmp(&b.ticket_id))
        });

        let offset = query.offset.unwrap_or(0);
        let tickets = tickets.into_iter().skip(offset);
        let tickets = match query.limit {
            Some(limit) => tickets.take(limit).collect(),
            None => tickets.collect(),
        };

        Ok(tickets)
    }

    async fn stream_tickets_for_event(&self, event_id: &EventId) -> Result<TicketStream> {
        use futures_util::stream;

        let tickets = self
            .query_tickets(TicketQuery::for_event(event_id.clone()))
            .await?;
        let stream = stream::iter(tickets.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn transact<T, F>(&self, keys: &[TicketId], decide: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Vec<Option<Ticket>>) -> (T, Vec<TicketWrite>) + Send + 'static,
    {
        let mut store = self.tickets.write().await;

        let current: Vec<Option<Ticket>> = keys.iter().map(|k| store.get(k).cloned()).collect();
        let (outcome, writes) = decide(current);

        validate_transaction_writes(keys, &writes)?;
        Self::apply(&mut store, writes);

        Ok(outcome)
    }
}
