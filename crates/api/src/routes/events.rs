//! Purchaser-facing seat endpoints: claiming, availability and polling.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{EventId, Owner, SeatId, SectionId};
use inventory::{EventInventory, InventoryStore};
use reservation::ClaimOutcome;
use seat_ledger::{TicketDetails, TicketStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub uid: String,
    pub seats: Vec<SeatId>,
    pub event_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl ClaimRequest {
    fn details(&self) -> Result<TicketDetails, ApiError> {
        check_schedule(self.start_time, self.end_time)?;
        let details = TicketDetails::new(self.event_title.clone(), self.start_time)
            .owner_contact(self.email.clone(), self.name.clone());
        Ok(match self.end_time {
            Some(end_time) => details.end_time(end_time),
            None => details,
        })
    }
}

/// Rejects an event that ends before it starts.
pub(crate) fn check_schedule(
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
) -> Result<(), ApiError> {
    match end_time {
        Some(end_time) if end_time < start_time => Err(ApiError::BadRequest(
            "end_time must not precede start_time".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub seats: Vec<SeatId>,
}

#[derive(Deserialize)]
pub struct ReleaseParams {
    pub uid: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub unavailable: Vec<SeatId>,
}

#[derive(Serialize)]
pub struct TakenSeatsResponse {
    pub event_id: EventId,
    pub seats: Vec<SeatId>,
    pub poll_interval_secs: u64,
}

#[derive(Serialize)]
pub struct SectionInventoryResponse {
    pub section: SectionId,
    pub taken: u32,
    pub unavailable: u32,
    pub total: u32,
    pub remaining: u32,
    pub low: bool,
    pub sold_out: bool,
}

#[derive(Serialize)]
pub struct InventoryResponse {
    pub event_id: EventId,
    pub sections: Vec<SectionInventoryResponse>,
    pub total_seats_sold: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub poll_interval_secs: u64,
}

impl InventoryResponse {
    fn from_snapshot(
        event_id: EventId,
        snapshot: Option<EventInventory>,
        low_threshold: u32,
        poll_interval_secs: u64,
    ) -> Self {
        let Some(snapshot) = snapshot else {
            return Self {
                event_id,
                sections: vec![],
                total_seats_sold: 0,
                updated_at: None,
                poll_interval_secs,
            };
        };

        let sections = snapshot
            .sections
            .into_iter()
            .map(|(section, entry)| SectionInventoryResponse {
                section,
                taken: entry.taken,
                unavailable: entry.unavailable,
                total: entry.total,
                remaining: entry.remaining(),
                low: entry.is_low(low_threshold),
                sold_out: entry.is_sold_out(),
            })
            .collect();

        Self {
            event_id,
            sections,
            total_seats_sold: snapshot.total_seats_sold,
            updated_at: Some(snapshot.updated_at),
            poll_interval_secs,
        }
    }
}

#[derive(Serialize)]
pub struct ReleaseResponse {
    pub released: bool,
}

// -- Handlers --

/// POST /events/:event_id/claims — buy a batch of seats, all or nothing.
#[tracing::instrument(skip(state, req), fields(uid = %req.uid, seats = req.seats.len()))]
pub async fn claim<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
    Json(req): Json<ClaimRequest>,
) -> Result<(StatusCode, Json<ClaimOutcome>), ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let details = req.details()?;
    let outcome = state
        .service
        .checkout(&EventId::new(event_id), &req.seats, &req.uid, details)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /events/:event_id/availability — which of these seats are taken.
#[tracing::instrument(skip(state, req), fields(seats = req.seats.len()))]
pub async fn availability<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let unavailable = state
        .service
        .check_unavailable(&EventId::new(event_id), &req.seats)
        .await?;

    Ok(Json(AvailabilityResponse { unavailable }))
}

/// GET /events/:event_id/taken — every taken seat, for seat-map polling.
#[tracing::instrument(skip(state))]
pub async fn taken<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
) -> Result<Json<TakenSeatsResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let event_id = EventId::new(event_id);
    let seats = state.service.taken_seats(&event_id).await?;

    Ok(Json(TakenSeatsResponse {
        event_id,
        seats: seats.into_iter().collect(),
        poll_interval_secs: state.poll_interval_secs,
    }))
}

/// GET /events/:event_id/inventory — per-section counters, for polling.
///
/// An event nobody has bought into yet reports no sections rather than 404.
#[tracing::instrument(skip(state))]
pub async fn inventory<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path(event_id): Path<String>,
) -> Result<Json<InventoryResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let event_id = EventId::new(event_id);
    let snapshot = state.service.inventory_snapshot(&event_id).await?;

    Ok(Json(InventoryResponse::from_snapshot(
        event_id,
        snapshot,
        state.low_inventory_threshold,
        state.poll_interval_secs,
    )))
}

/// DELETE /events/:event_id/seats/:seat_id?uid= — give back a seat the user holds.
#[tracing::instrument(skip(state, params), fields(uid = %params.uid))]
pub async fn release<L, I>(
    State(state): State<Arc<AppState<L, I>>>,
    Path((event_id, seat_id)): Path<(String, String)>,
    Query(params): Query<ReleaseParams>,
) -> Result<Json<ReleaseResponse>, ApiError>
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let released = state
        .service
        .release_seat(
            &EventId::new(event_id),
            &SeatId::new(seat_id),
            &Owner::user(params.uid),
        )
        .await?;

    Ok(Json(ReleaseResponse { released }))
}
