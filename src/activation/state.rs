// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! States of the activation lifecycle.

use std::fmt;

/// Separator between a deregistration state and the state it returns to.
const PREVIOUS_SEPARATOR: char = ':';

/// A stage of the activation lifecycle.
///
/// `NotActivated` is both the initial state and the rest state the machine
/// returns to; there is no terminal state.
///
/// # Examples
///
/// ```
/// use push_activation::activation::State;
///
/// let state = State::deregistering(State::AfterRegistrationUpdateFailed);
/// let name = state.persisted_name();
/// assert_eq!(name, "WaitingForDeregistration:AfterRegistrationUpdateFailed");
/// assert_eq!(State::from_persisted_name(&name), Some(state));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State {
    /// Push is not active for this device.
    #[default]
    NotActivated,
    /// Activation requested; waiting for the platform push token.
    WaitingForPushDeviceDetails,
    /// Waiting for the control plane to register the device.
    WaitingForDeviceRegistration,
    /// Registered; waiting for the push token to change.
    WaitingForNewPushDeviceDetails,
    /// Waiting for the control plane to accept new push details.
    WaitingForRegistrationUpdate,
    /// The last registration update failed.
    AfterRegistrationUpdateFailed,
    /// Waiting for the control plane to deregister the device.
    WaitingForDeregistration {
        /// State to return to if deregistration fails.
        previous: Box<State>,
    },
}

impl State {
    /// Creates a deregistration state returning to `previous` on failure.
    #[must_use]
    pub fn deregistering(previous: State) -> Self {
        Self::WaitingForDeregistration {
            previous: Box::new(previous),
        }
    }

    /// Returns the variant name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotActivated => "NotActivated",
            Self::WaitingForPushDeviceDetails => "WaitingForPushDeviceDetails",
            Self::WaitingForDeviceRegistration => "WaitingForDeviceRegistration",
            Self::WaitingForNewPushDeviceDetails => "WaitingForNewPushDeviceDetails",
            Self::WaitingForRegistrationUpdate => "WaitingForRegistrationUpdate",
            Self::AfterRegistrationUpdateFailed => "AfterRegistrationUpdateFailed",
            Self::WaitingForDeregistration { .. } => "WaitingForDeregistration",
        }
    }

    /// Returns the name this state is stored under, including captured data.
    #[must_use]
    pub fn persisted_name(&self) -> String {
        match self {
            Self::WaitingForDeregistration { previous } => {
                format!("{}{PREVIOUS_SEPARATOR}{}", self.name(), previous.name())
            }
            _ => self.name().to_string(),
        }
    }

    /// Parses a persisted name back into a state.
    ///
    /// Returns `None` for unknown names. A deregistration state must name a
    /// previous state that is not itself a deregistration state.
    #[must_use]
    pub fn from_persisted_name(name: &str) -> Option<Self> {
        if let Some((head, previous)) = name.split_once(PREVIOUS_SEPARATOR) {
            if head != "WaitingForDeregistration" {
                return None;
            }
            let previous = Self::simple_from_name(previous)?;
            return Some(Self::deregistering(previous));
        }
        Self::simple_from_name(name)
    }

    fn simple_from_name(name: &str) -> Option<Self> {
        match name {
            "NotActivated" => Some(Self::NotActivated),
            "WaitingForPushDeviceDetails" => Some(Self::WaitingForPushDeviceDetails),
            "WaitingForDeviceRegistration" => Some(Self::WaitingForDeviceRegistration),
            "WaitingForNewPushDeviceDetails" => Some(Self::WaitingForNewPushDeviceDetails),
            "WaitingForRegistrationUpdate" => Some(Self::WaitingForRegistrationUpdate),
            "AfterRegistrationUpdateFailed" => Some(Self::AfterRegistrationUpdateFailed),
            _ => None,
        }
    }

    /// Returns `true` if the state waits on an outstanding asynchronous call.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::WaitingForPushDeviceDetails
                | Self::WaitingForDeviceRegistration
                | Self::WaitingForRegistrationUpdate
                | Self::WaitingForDeregistration { .. }
        )
    }

    /// Returns `true` if the device is considered activated in this state.
    #[must_use]
    pub fn is_activated(&self) -> bool {
        matches!(
            self,
            Self::WaitingForNewPushDeviceDetails
                | Self::WaitingForRegistrationUpdate
                | Self::AfterRegistrationUpdateFailed
                | Self::WaitingForDeregistration { .. }
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.persisted_name())
    }
}
