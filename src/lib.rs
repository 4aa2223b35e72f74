// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push activation for realtime pub/sub clients.
//!
//! This library drives a device through push-notification activation:
//! obtaining a platform push token, registering the device with the push
//! control plane, keeping that registration current when the token changes,
//! and deregistering on request. Progress survives process restarts.
//!
//! # Components
//!
//! - [`activation`]: the persistent state machine and the
//!   [`ActivationContext`] the application talks to
//! - [`transport`]: the control-plane registration calls, over HTTP or a
//!   custom registrar
//! - [`notification`]: outcomes broadcast to the application
//! - [`identity`]: the local device record and its push token
//! - [`storage`]: durable key-value storage for all of the above
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use push_activation::activation::{ActivationConfig, ActivationContext};
//! use push_activation::identity::RegistrationToken;
//! use push_activation::notification::ActivationNotification;
//! use push_activation::storage::FileStorage;
//! use push_activation::transport::{HttpConfig, HttpRegistrationTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpRegistrationTransport::from_config(
//!         HttpConfig::new("rest.example.com")
//!             .with_https()
//!             .with_api_key("app.key:secret"),
//!     )?;
//!
//!     let context = ActivationContext::builder(transport)
//!         .with_storage(Arc::new(FileStorage::open("push-state.json")?))
//!         .with_config(ActivationConfig::new().with_client_id("alice"))
//!         .build()?;
//!
//!     let mut notifications = context.subscribe();
//!     context.activate();
//!
//!     // The platform delivers its token whenever it is ready
//!     context.on_new_registration_token(RegistrationToken::fcm("fcm-token"));
//!
//!     match notifications.recv().await? {
//!         ActivationNotification::Activate { error: None } => println!("activated"),
//!         other => println!("{}: {:?}", other.name(), other.error()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Custom registrar
//!
//! Applications that register devices through their own server enable
//! [`ActivationConfig::with_custom_registrar`](activation::ActivationConfig::with_custom_registrar).
//! The machine then publishes [`ActivationNotification::RegisterDevice`] and
//! [`ActivationNotification::DeregisterDevice`] instead of calling the
//! control plane, and the application answers with
//! [`ActivationContext::deliver_registrar_result`].

pub mod activation;
pub mod error;
pub mod identity;
pub mod notification;
#[cfg(feature = "http")]
mod push_channel;
pub mod storage;
pub mod transport;

pub use activation::{ActivationConfig, ActivationContext, ActivationStateMachine, Event, State};
pub use error::{Error, ErrorInfo, ProtocolError, Result, StorageError};
pub use identity::{LocalDevice, RegistrationToken};
pub use notification::{ActivationNotification, NotificationBus, RegistrarResult};
#[cfg(feature = "http")]
pub use push_channel::PushChannel;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use transport::{PushTokenProvider, RegistrationTransport, TokenReply, TransportRequest};
