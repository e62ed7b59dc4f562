//! Ticket notification trait and implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use seat_ledger::Ticket;
use tokio::sync::Mutex;

use crate::error::NotifyError;

/// Newly issued tickets to announce to their purchaser.
#[derive(Debug, Clone)]
pub struct TicketNotice {
    pub uid: String,
    pub tickets: Vec<Ticket>,
    pub event_title: String,
    pub order_id: OrderId,
}

/// Trait for delivering purchase notifications (push, SMS).
///
/// Delivery is best-effort: failures are logged by the caller and never
/// affect the purchase.
#[async_trait]
pub trait TicketNotifier: Send + Sync + 'static {
    /// Dispatches one notification.
    async fn notify(&self, notice: TicketNotice) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl TicketNotifier for LogNotifier {
    async fn notify(&self, notice: TicketNotice) -> Result<(), NotifyError> {
        tracing::info!(
            uid = %notice.uid,
            order_id = %notice.order_id,
            tickets = notice.tickets.len(),
            event_title = %notice.event_title,
            "ticket notification dispatched"
        );
        Ok(())
    }
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketNotifier {
    sent: Arc<Mutex<Vec<TicketNotice>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryTicketNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every dispatch.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns the notifications dispatched so far.
    pub async fn sent(&self) -> Vec<TicketNotice> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl TicketNotifier for InMemoryTicketNotifier {
    async fn notify(&self, notice: TicketNotice) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError("messaging unavailable".to_string()));
        }
        self.sent.lock().await.push(notice);
        Ok(())
    }
}
