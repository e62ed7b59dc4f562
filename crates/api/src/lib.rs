//! HTTP API for the seat reservation core.
//!
//! Exposes seat claiming, availability polling and the admin console
//! operations over JSON, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use inventory::{InMemoryInventoryStore, InventoryStore};
use metrics_exporter_prometheus::PrometheusHandle;
use seat_ledger::{InMemoryTicketStore, TicketStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L, I>(state: Arc<AppState<L, I>>, metrics_handle: PrometheusHandle) -> Router
where
    L: TicketStore + 'static,
    I: InventoryStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/events/{event_id}/claims", post(routes::events::claim::<L, I>))
        .route(
            "/events/{event_id}/availability",
            post(routes::events::availability::<L, I>),
        )
        .route("/events/{event_id}/taken", get(routes::events::taken::<L, I>))
        .route(
            "/events/{event_id}/inventory",
            get(routes::events::inventory::<L, I>),
        )
        .route(
            "/events/{event_id}/seats/{seat_id}",
            delete(routes::events::release::<L, I>),
        )
        .route(
            "/admin/events/{event_id}/holds",
            post(routes::admin::hold::<L, I>),
        )
        .route(
            "/admin/events/{event_id}/seats/{seat_id}/revoke",
            post(routes::admin::revoke::<L, I>),
        )
        .route(
            "/admin/events/{event_id}/cancel",
            post(routes::admin::cancel::<L, I>),
        )
        .route(
            "/admin/events/{event_id}/audit",
            get(routes::admin::audit::<L, I>),
        )
        .route(
            "/admin/events/{event_id}/reconcile",
            post(routes::admin::reconcile::<L, I>),
        )
        .route(
            "/admin/events/{event_id}/sections/{section}",
            get(routes::admin::section_owners::<L, I>),
        )
        .route("/users/{uid}/tickets", get(routes::users::tickets::<L, I>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given stores, tuned by `config`.
pub fn create_state<L, I>(ledger: L, inventory: I, config: &Config) -> Arc<AppState<L, I>>
where
    L: TicketStore,
    I: InventoryStore,
{
    Arc::new(AppState::new(
        ledger,
        inventory,
        config.poll_interval_secs,
        config.low_inventory_threshold,
    ))
}

/// Creates state backed by in-memory stores with default settings.
pub fn create_default_state() -> Arc<AppState<InMemoryTicketStore, InMemoryInventoryStore>> {
    create_state(
        InMemoryTicketStore::new(),
        InMemoryInventoryStore::new(),
        &Config::default(),
    )
}
