//! Back-office endpoints: holds, revocation, cancellation and auditing.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{EventId, Owner, SeatId, SectionId};
use inventory::InventoryStore;
use reservation::{ClaimOutcome, InventoryDrift, SeatOwnership};
use seat_ledger::{TicketDetails, TicketStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::events::check_schedule;
use crate::state::AppState;

/// Which administrative owner a hold is placed under.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldKind {
    Reserved,
    Unavailable,
}

impl From<HoldKind> for Owner {
    fn from(kind: HoldKind) -> Self {
        match kind {
            HoldKind::Reserved => Owner::AdminReserved,
            HoldKind::Unavailable => Owner::AdminUnavailable,
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct HoldRequest {
    pub kind: HoldKind,
    pub seats: Vec<SeatId>,
    pub event_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

// -- Response types --

#[derive(Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub event_id: EventId,
    pub invalidated: usize,
}

#[derive(Serialize)]
pub struct DriftResponse {
    pub consistent: bool,
    #[serde(flatten)]
    pub drift: InventoryDrift,
}

impl From<InventoryDrift> for DriftResponse {
    fn from(drift: InventoryDrift) -> Self {
        Self {
            consistent: drift.is_consistent(),
            drift,
        }
    }
}

// -- Handlers --

/// POST /admin/events/:event_id/holds — take seats out of sale.
#[tracing::instrument(skip(state, req), fields(kind = ?req.kind, seats = req.seats.len()))]
pub async fn hold<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
    Json(req): Json<HoldRequest>,
) -> Result<(StatusCode, Json<ClaimOutcome>), ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    check_schedule(req.start_time, req.end_time)?;
    let mut details = TicketDetails::new(req.event_title, req.start_time);
    if let Some(end_time) = req.end_time {
        details = details.end_time(end_time);
    }

    let outcome = state
        .service
        .hold_seats(&EventId::new(event_id), &req.seats, req.kind.into(), details)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /admin/events/:event_id/seats/:seat_id/revoke — void a ticket.
#[tracing::instrument(skip(state))]
pub async fn revoke<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path((event_id, seat_id)): Path<(String, String)>,
) -> Result<Json<RevokeResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let revoked = state
        .service
        .revoke_ticket(&EventId::new(event_id), &SeatId::new(seat_id))
        .await?;

    Ok(Json(RevokeResponse { revoked }))
}

/// POST /admin/events/:event_id/cancel — invalidate every ticket of an event.
#[tracing::instrument(skip(state))]
pub async fn cancel<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let event_id = EventId::new(event_id);
    let invalidated = state.service.cancel_event(&event_id).await?;

    Ok(Json(CancelResponse {
        event_id,
        invalidated,
    }))
}

/// GET /admin/events/:event_id/audit — compare the inventory with the ledger.
#[tracing::instrument(skip(state))]
pub async fn audit<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
) -> Result<Json<DriftResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let drift = state
        .service
        .audit_inventory(&EventId::new(event_id))
        .await?;
    Ok(Json(drift.into()))
}

/// POST /admin/events/:event_id/reconcile — rebuild the inventory from the ledger.
#[tracing::instrument(skip(state))]
pub async fn reconcile<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
) -> Result<Json<DriftResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let drift = state
        .service
        .reconcile_inventory(&EventId::new(event_id))
        .await?;
    Ok(Json(drift.into()))
}

/// GET /admin/events/:event_id/sections/:section — who sits where.
#[tracing::instrument(skip(state))]
pub async fn section_owners<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path((event_id, section)): Path<(String, String)>,
) -> Result<Json<Vec<SeatOwnership>>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let rows = state
        .service
        .section_owners(&EventId::new(event_id), &SectionId::new(section))
        .await?;
    Ok(Json(rows))
}
