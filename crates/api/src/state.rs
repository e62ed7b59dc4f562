//! Shared application state.

use inventory::{ArenaLayout, InventoryStore};
use reservation::{LogNotifier, ReservationService};
use seat_ledger::TicketStore;

/// Reservation service type served by the API.
pub type Service<L, I> = ReservationService<L, I, ArenaLayout, LogNotifier>;

/// Shared application state accessible from all handlers.
pub struct AppState<L, I> {
    pub service: Service<L, I>,
    /// Interval clients are told to poll seat maps at.
    pub poll_interval_secs: u64,
    /// Remaining seats at or below which a section is reported as low.
    pub low_inventory_threshold: u32,
}

impl<L, I> AppState<L, I>
where
    L: TicketStore,
    I: InventoryStore,
{
    /// Creates state around the standard arena layout.
    pub fn new(
        ledger: L,
        inventory: I,
        poll_interval_secs: u64,
        low_inventory_threshold: u32,
    ) -> Self {
        Self {
            service: ReservationService::new(
                ledger,
                inventory,
                ArenaLayout::standard(),
                LogNotifier,
            ),
            poll_interval_secs,
            low_inventory_threshold,
        }
    }
}
