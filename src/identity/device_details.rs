// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire shapes exchanged with the push control plane.

use serde::{Deserialize, Serialize};

/// Operating system family reported in the registration body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android devices.
    #[default]
    Android,
    /// Apple iOS devices.
    Ios,
    /// Web browsers.
    Browser,
}

/// Device form factor reported in the registration body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFactor {
    /// Phone.
    #[default]
    Phone,
    /// Tablet.
    Tablet,
    /// Desktop computer.
    Desktop,
    /// Television.
    Tv,
    /// Smart watch.
    Watch,
    /// In-car system.
    Car,
    /// Embedded device.
    Embedded,
    /// Anything else.
    Other,
}

/// Push recipient descriptor for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transportType", rename_all = "lowercase")]
pub enum PushRecipient {
    /// Firebase Cloud Messaging recipient.
    Fcm {
        /// FCM registration token.
        #[serde(rename = "registrationToken")]
        registration_token: String,
    },
    /// Google Cloud Messaging recipient.
    Gcm {
        /// GCM registration token.
        #[serde(rename = "registrationToken")]
        registration_token: String,
    },
    /// Apple Push Notification service recipient.
    Apns {
        /// APNs device token.
        #[serde(rename = "deviceToken")]
        device_token: String,
    },
}

/// The `push` section of a device registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushDetails {
    /// Where pushes for this device are delivered.
    pub recipient: PushRecipient,
}

/// Device registration body sent to `POST /push/deviceRegistrations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetails {
    /// Device id.
    pub id: String,
    /// Operating system family.
    pub platform: Platform,
    /// Device form factor.
    pub form_factor: FormFactor,
    /// Client id the device acts for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Device secret proving ownership of the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_secret: Option<String>,
    /// Push delivery details.
    pub push: PushDetails,
}

/// Result of a successful device registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistration {
    /// Identity token issued by the control plane.
    pub device_identity_token: String,
    /// Device secret the registration was made with.
    pub device_secret: String,
}

impl DeviceRegistration {
    /// Creates a registration result.
    #[must_use]
    pub fn new(device_identity_token: impl Into<String>, device_secret: impl Into<String>) -> Self {
        Self {
            device_identity_token: device_identity_token.into(),
            device_secret: device_secret.into(),
        }
    }
}
