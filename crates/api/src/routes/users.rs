//! Per-user ticket listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use inventory::InventoryStore;
use seat_ledger::{Ticket, TicketStore};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /users/:uid/tickets — every ticket the user has held, in any status.
#[tracing::instrument(skip(state))]
pub async fn tickets<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<Ticket>>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let tickets = state.service.tickets_for_user(&uid).await?;
    Ok(Json(tickets))
}
