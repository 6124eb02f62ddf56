//! One-way presence notifications
use std::sync::{Arc, Mutex};

use tracing::info;
use waypresence_api::LocationNotification;

/// Capability to report a presence transition to the outside world
///
/// Sends are fire-and-forget: `notify` never blocks on, or reports, the
/// outcome, and two notifications are not guaranteed to arrive in order.
pub trait Notifier {
    fn notify(&self, notification: LocationNotification);
}

impl<T> Notifier for Arc<T>
where
    T: Notifier + ?Sized,
{
    fn notify(&self, notification: LocationNotification) {
        (**self).notify(notification)
    }
}

impl<T> Notifier for &T
where
    T: Notifier + ?Sized,
{
    fn notify(&self, notification: LocationNotification) {
        (**self).notify(notification)
    }
}

/// Notifier that only logs, for running without an endpoint
#[derive(Default, Debug, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: LocationNotification) {
        info!(
            esp32_id = %notification.esp32_id,
            name = %notification.name,
            status = %notification.status,
            "Presence notification (no endpoint configured)"
        );
    }
}

/// Notifier keeping everything it was asked to send
#[derive(Default, Debug)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<LocationNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<LocationNotification> {
        self.sent.lock().expect("locking failed").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: LocationNotification) {
        self.sent.lock().expect("locking failed").push(notification);
    }
}
