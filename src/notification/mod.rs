// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observable activation notifications.
//!
//! The state machine never returns control-plane failures to its caller.
//! Outcomes are published on a [`NotificationBus`] instead, as
//! [`ActivationNotification`]s the host application subscribes to. The same
//! bus carries the requests addressed to a custom registrar, whose answers
//! come back as [`RegistrarResult`]s.
//!
//! # Examples
//!
//! ```
//! use push_activation::notification::{ActivationNotification, NotificationBus};
//!
//! let bus = NotificationBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(ActivationNotification::activated());
//! assert_eq!(rx.try_recv().unwrap().name(), "PUSH_ACTIVATE");
//! ```

mod activation_notification;
mod notification_bus;

pub use activation_notification::{ActivationNotification, RegistrarResult};
pub use notification_bus::NotificationBus;
