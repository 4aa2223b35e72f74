// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel push subscriptions for the local device.

use reqwest::Method;
use serde::Serialize;

use crate::activation::ActivationContext;
use crate::error::{Error, Result};
use crate::identity::LocalDevice;
use crate::transport::{Auth, ControlPlaneClient};

const CHANNEL_SUBSCRIPTIONS_PATH: &str = "/push/channelSubscriptions";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSubscription<'a> {
    channel: &'a str,
    device_id: &'a str,
}

/// Push subscriptions of the local device on one channel.
///
/// Requests authenticate with the device identity token, so the device must
/// be activated first. Using a channel before that is a programming error
/// and fails with [`Error::DeviceNotRegistered`] without contacting the
/// control plane.
///
/// # Examples
///
/// ```no_run
/// use push_activation::PushChannel;
/// use push_activation::activation::ActivationContext;
/// use push_activation::transport::ControlPlaneClient;
///
/// # async fn example(context: &ActivationContext) -> push_activation::Result<()> {
/// let channel = PushChannel::new(ControlPlaneClient::new("rest.example.com")?, "news");
/// channel.subscribe_device(context).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PushChannel {
    client: ControlPlaneClient,
    name: String,
}

impl PushChannel {
    /// Creates a handle on the named channel.
    #[must_use]
    pub fn new(client: ControlPlaneClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// Returns the channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribes the context's device to push on this channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotRegistered`] if the device is not activated,
    /// or [`Error::Api`] if the control plane rejects the request.
    pub async fn subscribe_device(&self, context: &ActivationContext) -> Result<()> {
        let device = context.require_registered_device()?;
        self.subscribe(&device).await
    }

    /// Removes the context's device push subscription on this channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotRegistered`] if the device is not activated,
    /// or [`Error::Api`] if the control plane rejects the request.
    pub async fn unsubscribe_device(&self, context: &ActivationContext) -> Result<()> {
        let device = context.require_registered_device()?;
        self.unsubscribe(&device).await
    }

    /// Subscribes the given device to push on this channel.
    ///
    /// # Errors
    ///
    /// Same as [`subscribe_device`](Self::subscribe_device).
    pub async fn subscribe(&self, device: &LocalDevice) -> Result<()> {
        let token = device
            .device_identity_token()
            .ok_or(Error::DeviceNotRegistered)?;

        let body = ChannelSubscription {
            channel: &self.name,
            device_id: device.id(),
        };
        let request = self
            .client
            .request(Method::POST, CHANNEL_SUBSCRIPTIONS_PATH, Auth::Device(token))
            .json(&body);
        self.client.send(request).await.map_err(Error::Api)?;

        tracing::debug!(
            channel = %self.name,
            device_id = %device.id(),
            "Subscribed device to channel"
        );
        Ok(())
    }

    /// Removes the given device's push subscription on this channel.
    ///
    /// # Errors
    ///
    /// Same as [`unsubscribe_device`](Self::unsubscribe_device).
    pub async fn unsubscribe(&self, device: &LocalDevice) -> Result<()> {
        let token = device
            .device_identity_token()
            .ok_or(Error::DeviceNotRegistered)?;

        let path = format!(
            "{CHANNEL_SUBSCRIPTIONS_PATH}?channel={}&deviceId={}",
            urlencoding::encode(&self.name),
            urlencoding::encode(device.id())
        );
        let request = self
            .client
            .request(Method::DELETE, &path, Auth::Device(token));
        self.client.send(request).await.map_err(Error::Api)?;

        tracing::debug!(
            channel = %self.name,
            device_id = %device.id(),
            "Unsubscribed device from channel"
        );
        Ok(())
    }
}
