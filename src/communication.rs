use crossbeam_channel::{Receiver, Sender};

use crate::notification::DeliveredNotification;

/// host callbacks, turned into messages so one dispatcher can consume them in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// a trigger fired while the app is in the foreground
    WillPresent(DeliveredNotification),
    /// the user tapped a notification that was delivered while the app was in the background
    DidReceive(DeliveredNotification),
}

impl NotificationEvent {
    #[must_use]
    pub const fn notification(&self) -> &DeliveredNotification {
        match self {
            Self::WillPresent(notification) | Self::DidReceive(notification) => notification,
        }
    }
}

#[must_use]
pub fn channel() -> (Sender<NotificationEvent>, Receiver<NotificationEvent>) {
    crossbeam_channel::unbounded()
}
