// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registration transport.
//!
//! The state machine never performs network calls itself. It hands
//! [`TransportRequest`]s to a dispatcher task, which runs them against a
//! [`RegistrationTransport`] (or asks the [`PushTokenProvider`] for a token)
//! and feeds the outcome back into the machine as a fresh event.
//!
//! # Implementations
//!
//! - [`HttpRegistrationTransport`]: calls the control plane's
//!   `/push/deviceRegistrations` endpoints (feature `http`)
//! - custom registrar: not a transport at all; when configured, the machine
//!   publishes registrar requests on the notification bus instead

mod dispatcher;
#[cfg(feature = "http")]
mod http;

pub(crate) use dispatcher::Dispatcher;
#[cfg(feature = "http")]
pub(crate) use http::Auth;
#[cfg(feature = "http")]
pub use http::{ClientCredentials, ControlPlaneClient, HttpConfig, HttpRegistrationTransport};

use std::future::Future;

use tokio::sync::oneshot;

use crate::error::ErrorInfo;
use crate::identity::{DeviceRegistration, LocalDevice, RegistrationToken};

/// Operations against the push control plane's device registry.
///
/// Each call receives a snapshot of the local device taken when the
/// request was issued. Failures are reported as [`ErrorInfo`] and become
/// failure events in the state machine.
pub trait RegistrationTransport: Send + Sync + 'static {
    /// Registers the device and returns the issued identity token.
    fn create_registration(
        &self,
        device: &LocalDevice,
    ) -> impl Future<Output = Result<DeviceRegistration, ErrorInfo>> + Send;

    /// Sends the device's current push details for its existing registration.
    fn update_registration(
        &self,
        device: &LocalDevice,
    ) -> impl Future<Output = Result<(), ErrorInfo>> + Send;

    /// Removes the device's registration.
    fn remove_registration(
        &self,
        device: &LocalDevice,
    ) -> impl Future<Output = Result<(), ErrorInfo>> + Send;
}

/// A platform service able to produce the device's push token on demand.
///
/// The provider answers through the [`TokenReply`], from any thread and at
/// any later time. Dropping the reply without answering means the token
/// will arrive on its own through
/// [`ActivationContext::on_new_registration_token`](crate::activation::ActivationContext::on_new_registration_token).
pub trait PushTokenProvider: Send + Sync {
    /// Starts fetching the push token.
    fn request_token(&self, reply: TokenReply);
}

/// One-shot answer channel handed to a [`PushTokenProvider`].
#[derive(Debug)]
pub struct TokenReply {
    sender: oneshot::Sender<Result<RegistrationToken, ErrorInfo>>,
}

impl TokenReply {
    pub(crate) fn new(sender: oneshot::Sender<Result<RegistrationToken, ErrorInfo>>) -> Self {
        Self { sender }
    }

    /// Delivers the token, or the reason the platform could not supply one.
    pub fn resolve(self, result: Result<RegistrationToken, ErrorInfo>) {
        // The machine may already be gone
        let _ = self.sender.send(result);
    }
}

/// Work the state machine hands to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportRequest {
    /// Ask the platform for a push token.
    RequestPushDetails,
    /// Register the device.
    CreateRegistration(LocalDevice),
    /// Update the device's push details.
    UpdateRegistration(LocalDevice),
    /// Deregister the device.
    RemoveRegistration(LocalDevice),
}

impl TransportRequest {
    /// Returns the request name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestPushDetails => "RequestPushDetails",
            Self::CreateRegistration(_) => "CreateRegistration",
            Self::UpdateRegistration(_) => "UpdateRegistration",
            Self::RemoveRegistration(_) => "RemoveRegistration",
        }
    }
}
