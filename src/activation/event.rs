// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inputs of the activation state machine.

use crate::error::ErrorInfo;

/// An input to the activation state machine.
///
/// Parameterless events have a stable persisted name and may sit in the
/// durable pending queue across restarts. Events carrying a payload only
/// ever live in memory.
///
/// # Examples
///
/// ```
/// use push_activation::activation::Event;
///
/// assert_eq!(Event::CalledActivate.persisted_name(), Some("CalledActivate"));
/// assert_eq!(Event::from_persisted_name("Deregistered"), Some(Event::Deregistered));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The application asked to activate push.
    CalledActivate,
    /// The application asked to deactivate push.
    CalledDeactivate,
    /// The platform push token is available (first time or changed).
    GotPushDeviceDetails,
    /// The control plane registered the device.
    GotDeviceRegistration {
        /// Identity token issued for the device.
        device_identity_token: String,
        /// Secret the device was registered with.
        device_secret: String,
    },
    /// Registering the device failed.
    GettingDeviceRegistrationFailed(ErrorInfo),
    /// The registration was updated with new push details.
    RegistrationUpdated,
    /// Updating the registration failed.
    UpdatingRegistrationFailed(ErrorInfo),
    /// The device was deregistered.
    Deregistered,
    /// Deregistering the device failed.
    DeregistrationFailed(ErrorInfo),
    /// The platform could not supply a push token.
    GettingPushDeviceDetailsFailed(ErrorInfo),
    /// Synchronising the registration with the control plane failed.
    SyncRegistrationFailed(ErrorInfo),
    /// The registration was synchronised with the control plane.
    RegistrationSynced,
}

impl Event {
    /// Every event that has a persisted name.
    pub const PERSISTABLE: [Event; 6] = [
        Event::CalledActivate,
        Event::CalledDeactivate,
        Event::GotPushDeviceDetails,
        Event::RegistrationUpdated,
        Event::Deregistered,
        Event::RegistrationSynced,
    ];

    /// Returns the variant name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CalledActivate => "CalledActivate",
            Self::CalledDeactivate => "CalledDeactivate",
            Self::GotPushDeviceDetails => "GotPushDeviceDetails",
            Self::GotDeviceRegistration { .. } => "GotDeviceRegistration",
            Self::GettingDeviceRegistrationFailed(_) => "GettingDeviceRegistrationFailed",
            Self::RegistrationUpdated => "RegistrationUpdated",
            Self::UpdatingRegistrationFailed(_) => "UpdatingRegistrationFailed",
            Self::Deregistered => "Deregistered",
            Self::DeregistrationFailed(_) => "DeregistrationFailed",
            Self::GettingPushDeviceDetailsFailed(_) => "GettingPushDeviceDetailsFailed",
            Self::SyncRegistrationFailed(_) => "SyncRegistrationFailed",
            Self::RegistrationSynced => "RegistrationSynced",
        }
    }

    /// Returns the name under which this event is stored in the pending
    /// queue, or `None` if the event carries a payload.
    #[must_use]
    pub fn persisted_name(&self) -> Option<&'static str> {
        match self {
            Self::CalledActivate
            | Self::CalledDeactivate
            | Self::GotPushDeviceDetails
            | Self::RegistrationUpdated
            | Self::Deregistered
            | Self::RegistrationSynced => Some(self.name()),
            Self::GotDeviceRegistration { .. }
            | Self::GettingDeviceRegistrationFailed(_)
            | Self::UpdatingRegistrationFailed(_)
            | Self::DeregistrationFailed(_)
            | Self::GettingPushDeviceDetailsFailed(_)
            | Self::SyncRegistrationFailed(_) => None,
        }
    }

    /// Rebuilds a parameterless event from its persisted name.
    #[must_use]
    pub fn from_persisted_name(name: &str) -> Option<Self> {
        Self::PERSISTABLE
            .into_iter()
            .find(|event| event.persisted_name() == Some(name))
    }

    /// Returns the error carried by a failure event.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            Self::GettingDeviceRegistrationFailed(e)
            | Self::UpdatingRegistrationFailed(e)
            | Self::DeregistrationFailed(e)
            | Self::GettingPushDeviceDetailsFailed(e)
            | Self::SyncRegistrationFailed(e) => Some(e),
            _ => None,
        }
    }
}
