// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notification and registrar result types.

use crate::error::ErrorInfo;

/// Notifications published by the activation state machine.
///
/// `Activate`, `Deactivate` and `UpdateFailed` are addressed to the host
/// application. `RegisterDevice` and `DeregisterDevice` are requests for a
/// custom registrar, published only when one is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationNotification {
    /// An activation attempt concluded. `error` is `None` on success.
    Activate {
        /// Failure reason, if the attempt failed.
        error: Option<ErrorInfo>,
    },

    /// A deactivation attempt concluded. `error` is `None` on success.
    Deactivate {
        /// Failure reason, if the attempt failed.
        error: Option<ErrorInfo>,
    },

    /// Updating an existing registration failed.
    UpdateFailed {
        /// Failure reason.
        error: ErrorInfo,
    },

    /// The custom registrar should register (or re-register) the device.
    RegisterDevice {
        /// `true` for a first registration, `false` for an update.
        is_new: bool,
    },

    /// The custom registrar should deregister the device.
    DeregisterDevice,
}

impl ActivationNotification {
    /// Name of the activation result notification.
    pub const PUSH_ACTIVATE: &'static str = "PUSH_ACTIVATE";
    /// Name of the deactivation result notification.
    pub const PUSH_DEACTIVATE: &'static str = "PUSH_DEACTIVATE";
    /// Name of the update failure notification.
    pub const PUSH_UPDATE_FAILED: &'static str = "PUSH_UPDATE_FAILED";
    /// Name of the registrar registration request.
    pub const PUSH_REGISTER_DEVICE: &'static str = "PUSH_REGISTER_DEVICE";
    /// Name of the registrar deregistration request.
    pub const PUSH_DEREGISTER_DEVICE: &'static str = "PUSH_DEREGISTER_DEVICE";

    /// Creates a successful activation notification.
    #[must_use]
    pub fn activated() -> Self {
        Self::Activate { error: None }
    }

    /// Creates a failed activation notification.
    #[must_use]
    pub fn activation_failed(error: ErrorInfo) -> Self {
        Self::Activate { error: Some(error) }
    }

    /// Creates a successful deactivation notification.
    #[must_use]
    pub fn deactivated() -> Self {
        Self::Deactivate { error: None }
    }

    /// Creates a failed deactivation notification.
    #[must_use]
    pub fn deactivation_failed(error: ErrorInfo) -> Self {
        Self::Deactivate { error: Some(error) }
    }

    /// Creates an update failure notification.
    #[must_use]
    pub fn update_failed(error: ErrorInfo) -> Self {
        Self::UpdateFailed { error }
    }

    /// Returns the broadcast name of this notification.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Activate { .. } => Self::PUSH_ACTIVATE,
            Self::Deactivate { .. } => Self::PUSH_DEACTIVATE,
            Self::UpdateFailed { .. } => Self::PUSH_UPDATE_FAILED,
            Self::RegisterDevice { .. } => Self::PUSH_REGISTER_DEVICE,
            Self::DeregisterDevice => Self::PUSH_DEREGISTER_DEVICE,
        }
    }

    /// Returns the carried error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Activate { error } | Self::Deactivate { error } => error.as_ref(),
            Self::UpdateFailed { error } => Some(error),
            Self::RegisterDevice { .. } | Self::DeregisterDevice => None,
        }
    }

    /// Returns `true` if this is a request addressed to a custom registrar.
    #[must_use]
    pub fn is_registrar_request(&self) -> bool {
        matches!(self, Self::RegisterDevice { .. } | Self::DeregisterDevice)
    }
}

/// Answers from a custom registrar, fed back into the state machine.
///
/// Absence of an error signals success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarResult {
    /// Answer to `PUSH_REGISTER_DEVICE`.
    DeviceRegistered {
        /// Identity token issued for a new registration.
        device_identity_token: Option<String>,
        /// Failure reason, if the registrar failed.
        error: Option<ErrorInfo>,
    },

    /// Answer to `PUSH_DEREGISTER_DEVICE`.
    DeviceDeregistered {
        /// Failure reason, if the registrar failed.
        error: Option<ErrorInfo>,
    },
}

impl RegistrarResult {
    /// Name of the registration answer.
    pub const PUSH_DEVICE_REGISTERED: &'static str = "PUSH_DEVICE_REGISTERED";
    /// Name of the deregistration answer.
    pub const PUSH_DEVICE_DEREGISTERED: &'static str = "PUSH_DEVICE_DEREGISTERED";

    /// A successful first registration carrying the issued identity token.
    #[must_use]
    pub fn registered(device_identity_token: impl Into<String>) -> Self {
        Self::DeviceRegistered {
            device_identity_token: Some(device_identity_token.into()),
            error: None,
        }
    }

    /// A successful registration update.
    #[must_use]
    pub fn updated() -> Self {
        Self::DeviceRegistered {
            device_identity_token: None,
            error: None,
        }
    }

    /// A failed registration or update.
    #[must_use]
    pub fn registration_failed(error: ErrorInfo) -> Self {
        Self::DeviceRegistered {
            device_identity_token: None,
            error: Some(error),
        }
    }

    /// A successful deregistration.
    #[must_use]
    pub fn deregistered() -> Self {
        Self::DeviceDeregistered { error: None }
    }

    /// A failed deregistration.
    #[must_use]
    pub fn deregistration_failed(error: ErrorInfo) -> Self {
        Self::DeviceDeregistered { error: Some(error) }
    }

    /// Returns the broadcast name of this result.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceRegistered { .. } => Self::PUSH_DEVICE_REGISTERED,
            Self::DeviceDeregistered { .. } => Self::PUSH_DEVICE_DEREGISTERED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_names() {
        assert_eq!(ActivationNotification::activated().name(), "PUSH_ACTIVATE");
        assert_eq!(ActivationNotification::deactivated().name(), "PUSH_DEACTIVATE");
        assert_eq!(
            ActivationNotification::update_failed(ErrorInfo::new("x", 1)).name(),
            "PUSH_UPDATE_FAILED"
        );
        assert_eq!(
            ActivationNotification::RegisterDevice { is_new: true }.name(),
            "PUSH_REGISTER_DEVICE"
        );
        assert_eq!(
            ActivationNotification::DeregisterDevice.name(),
            "PUSH_DEREGISTER_DEVICE"
        );
    }

    #[test]
    fn success_carries_no_error() {
        assert!(ActivationNotification::activated().error().is_none());
        assert!(ActivationNotification::deactivated().error().is_none());
    }

    #[test]
    fn failure_carries_error() {
        let err = ErrorInfo::new("test", 123);
        let notification = ActivationNotification::activation_failed(err.clone());
        assert_eq!(notification.error(), Some(&err));
    }

    #[test]
    fn registrar_requests_are_flagged() {
        assert!(ActivationNotification::DeregisterDevice.is_registrar_request());
        assert!(!ActivationNotification::activated().is_registrar_request());
    }

    #[test]
    fn registrar_result_names() {
        assert_eq!(RegistrarResult::updated().name(), "PUSH_DEVICE_REGISTERED");
        assert_eq!(
            RegistrarResult::deregistered().name(),
            "PUSH_DEVICE_DEREGISTERED"
        );
    }
}
