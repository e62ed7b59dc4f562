//! Aggregated seat inventory: denormalized per-section counters.
//!
//! This crate provides the read-optimized side of seat availability:
//! - [`EventInventory`] and [`SectionInventory`] documents
//! - [`InventoryDelta`] increments applied after a ledger write
//! - [`InventoryStore`] trait with in-memory and PostgreSQL backends
//! - [`SectionGeometry`] for the fixed seat count of each section
//!
//! The projection is advisory. The seat ledger is authoritative and the
//! counters here may drift until reconciled.

pub mod error;
pub mod geometry;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{InventoryError, Result};
pub use geometry::{ArenaLayout, SectionGeometry, SectionShape};
pub use memory::InMemoryInventoryStore;
pub use model::{EventInventory, InventoryDelta, SectionChange, SectionInventory};
pub use postgres::PostgresInventoryStore;
pub use store::InventoryStore;
