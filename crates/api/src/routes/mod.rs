//! HTTP route handlers.

pub mod admin;
pub mod events;
pub mod health;
pub mod metrics;
pub mod users;
