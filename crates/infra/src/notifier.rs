//! Customer notification seam.
//!
//! Notifications are single-attempt and best-effort: a delivery failure is
//! logged and dropped, it never blocks or rolls back the order transition
//! that triggered it.

use std::sync::Mutex;

use thiserror::Error;

use couture_orders::{OrderNumber, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    OrderPlaced,
    PaymentVerified,
    PaymentRejected { reason: String },
    StatusChanged { to: OrderStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNotification {
    pub order_number: OrderNumber,
    pub recipient: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

pub trait OrderNotifier: Send + Sync {
    fn send(&self, notification: &OrderNotification) -> Result<(), NotifyError>;
}

impl<N> OrderNotifier for std::sync::Arc<N>
where
    N: OrderNotifier + ?Sized,
{
    fn send(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
        (**self).send(notification)
    }
}

/// Single delivery attempt; a failure is logged and swallowed.
pub fn notify_best_effort(notifier: &dyn OrderNotifier, notification: &OrderNotification) {
    if let Err(e) = notifier.send(notification) {
        tracing::warn!(
            order_number = %notification.order_number,
            recipient = %notification.recipient,
            error = %e,
            "notification dropped"
        );
    }
}

/// Notifier that only logs. The default until a mail/SMS gateway is wired in.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn send(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
        tracing::info!(
            order_number = %notification.order_number,
            recipient = %notification.recipient,
            kind = ?notification.kind,
            "order notification"
        );
        Ok(())
    }
}

/// Test notifier that records every delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OrderNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OrderNotification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl OrderNotifier for RecordingNotifier {
    fn send(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }
}
