//! Notification Accumulator and delivery sinks
//!
//! A run appends notifications in decision order; the runner hands the
//! finished list to every configured `NotificationSink`.

pub mod sink;

pub use sink::{LogSink, NotificationSink, SinkError, WebhookSink};

use crate::types::Notification;

/// Ordered, append-only list of notifications for one run
#[derive(Debug, Default)]
pub struct NotificationAccumulator {
    notifications: Vec<Notification>,
}

impl NotificationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn into_vec(self) -> Vec<Notification> {
        self.notifications
    }
}
