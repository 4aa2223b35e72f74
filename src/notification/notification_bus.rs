// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast bus for activation notifications.

use tokio::sync::broadcast;

use super::ActivationNotification;
use crate::activation::ActivationConfig;

/// Bus broadcasting [`ActivationNotification`]s to every subscriber.
///
/// Backed by a tokio broadcast channel. A subscriber that falls more than
/// the channel capacity behind loses the oldest notifications and receives
/// `RecvError::Lagged`.
///
/// Cloning the bus yields another handle on the same channel.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<ActivationNotification>,
}

impl NotificationBus {
    /// Creates a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(ActivationConfig::DEFAULT_NOTIFICATION_CAPACITY)
    }

    /// Creates a new bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ActivationNotification> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes a notification to all subscribers.
    ///
    /// Without subscribers the notification is discarded.
    pub fn publish(&self, notification: ActivationNotification) {
        tracing::debug!(
            name = notification.name(),
            error = ?notification.error(),
            "Publishing notification"
        );
        // No subscribers is not an error
        let _ = self.sender.send(notification);
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
