// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The activation transition table.
//!
//! [`transition`] is a pure function of the current state, the incoming
//! event and the local device. It decides the next state and the side
//! effects to run, but runs none of them: the state machine executes the
//! returned [`Action`]s in order while holding its lock.
//!
//! A `None` result means the current state cannot consume the event yet and
//! the machine queues it.

use super::{Event, State};
use crate::error::ErrorInfo;
use crate::identity::LocalDevice;
use crate::notification::ActivationNotification;

/// Code reported when a registrar answers a new registration without a token.
pub(crate) const MISSING_IDENTITY_TOKEN: u32 = 40000;

/// A side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Publish a notification.
    Emit(ActivationNotification),
    /// Append an event to the pending queue.
    QueueEvent(Event),
    /// Record the registration on the local device.
    StoreRegistration {
        /// Identity token issued by the control plane.
        device_identity_token: String,
        /// Secret the device was registered with.
        device_secret: String,
    },
    /// Forget the device identity token.
    ClearRegistration,
    /// Ask the platform for its push token.
    RequestPushDetails,
    /// Register the device with the control plane.
    CreateRegistration,
    /// Send new push details for the existing registration.
    UpdateRegistration,
    /// Deregister the device.
    RemoveRegistration,
}

/// Outcome of a consumed event: the next state and its side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State the machine moves to.
    pub next: State,
    /// Side effects, in execution order.
    pub actions: Vec<Action>,
}

impl Transition {
    fn to(next: State) -> Self {
        Self {
            next,
            actions: Vec::new(),
        }
    }

    fn with(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// Looks up `(state, event)` in the transition table.
///
/// Returns `None` when `state` cannot consume `event`.
#[must_use]
pub fn transition(state: &State, event: &Event, device: &LocalDevice) -> Option<Transition> {
    use super::{Event as E, State as S};

    let next = match (state, event) {
        // NotActivated
        (S::NotActivated, E::CalledActivate) => {
            if device.is_registered() {
                Transition::to(S::WaitingForNewPushDeviceDetails)
                    .with(Action::Emit(ActivationNotification::activated()))
            } else if device.registration_token().is_some() {
                Transition::to(S::WaitingForPushDeviceDetails)
                    .with(Action::QueueEvent(E::GotPushDeviceDetails))
            } else {
                Transition::to(S::WaitingForPushDeviceDetails).with(Action::RequestPushDetails)
            }
        }
        (S::NotActivated, E::CalledDeactivate) => Transition::to(S::NotActivated)
            .with(Action::Emit(ActivationNotification::deactivated())),
        // Token refreshes while inactive, and late duplicate deregistrations, change nothing
        (S::NotActivated, E::GotPushDeviceDetails | E::Deregistered) => {
            Transition::to(S::NotActivated)
        }

        // WaitingForPushDeviceDetails
        (S::WaitingForPushDeviceDetails, E::CalledActivate) => {
            Transition::to(S::WaitingForPushDeviceDetails)
        }
        (S::WaitingForPushDeviceDetails, E::CalledDeactivate) => Transition::to(S::NotActivated)
            .with(Action::Emit(ActivationNotification::deactivated())),
        (S::WaitingForPushDeviceDetails, E::GotPushDeviceDetails) => {
            Transition::to(S::WaitingForDeviceRegistration).with(Action::CreateRegistration)
        }
        (S::WaitingForPushDeviceDetails, E::GettingPushDeviceDetailsFailed(reason)) => {
            Transition::to(S::NotActivated).with(Action::Emit(
                ActivationNotification::activation_failed(reason.clone()),
            ))
        }

        // WaitingForDeviceRegistration
        (S::WaitingForDeviceRegistration, E::CalledActivate) => {
            Transition::to(S::WaitingForDeviceRegistration)
        }
        (
            S::WaitingForDeviceRegistration,
            E::GotDeviceRegistration {
                device_identity_token,
                device_secret,
            },
        ) => Transition::to(S::WaitingForNewPushDeviceDetails)
            .with(Action::StoreRegistration {
                device_identity_token: device_identity_token.clone(),
                device_secret: device_secret.clone(),
            })
            .with(Action::Emit(ActivationNotification::activated())),
        (S::WaitingForDeviceRegistration, E::GettingDeviceRegistrationFailed(reason)) => {
            Transition::to(S::NotActivated).with(Action::Emit(
                ActivationNotification::activation_failed(reason.clone()),
            ))
        }

        // WaitingForNewPushDeviceDetails
        (S::WaitingForNewPushDeviceDetails, E::CalledActivate) => {
            Transition::to(S::WaitingForNewPushDeviceDetails)
                .with(Action::Emit(ActivationNotification::activated()))
        }
        (S::WaitingForNewPushDeviceDetails, E::CalledDeactivate) => {
            Transition::to(S::deregistering(S::WaitingForNewPushDeviceDetails))
                .with(Action::RemoveRegistration)
        }
        (S::WaitingForNewPushDeviceDetails, E::GotPushDeviceDetails) => {
            Transition::to(S::WaitingForRegistrationUpdate).with(Action::UpdateRegistration)
        }

        // WaitingForRegistrationUpdate
        (S::WaitingForRegistrationUpdate, E::CalledActivate) => {
            Transition::to(S::WaitingForRegistrationUpdate)
                .with(Action::Emit(ActivationNotification::activated()))
        }
        (S::WaitingForRegistrationUpdate, E::RegistrationUpdated | E::RegistrationSynced) => {
            Transition::to(S::WaitingForNewPushDeviceDetails)
        }
        (
            S::WaitingForRegistrationUpdate,
            E::UpdatingRegistrationFailed(reason) | E::SyncRegistrationFailed(reason),
        ) => Transition::to(S::AfterRegistrationUpdateFailed).with(Action::Emit(
            ActivationNotification::update_failed(reason.clone()),
        )),

        // AfterRegistrationUpdateFailed
        (S::AfterRegistrationUpdateFailed, E::CalledActivate | E::GotPushDeviceDetails) => {
            Transition::to(S::WaitingForRegistrationUpdate).with(Action::UpdateRegistration)
        }
        (S::AfterRegistrationUpdateFailed, E::CalledDeactivate) => {
            Transition::to(S::deregistering(S::AfterRegistrationUpdateFailed))
                .with(Action::RemoveRegistration)
        }

        // WaitingForDeregistration
        (S::WaitingForDeregistration { .. }, E::CalledDeactivate) => Transition::to(state.clone()),
        (S::WaitingForDeregistration { .. }, E::Deregistered) => Transition::to(S::NotActivated)
            .with(Action::ClearRegistration)
            .with(Action::Emit(ActivationNotification::deactivated())),
        (S::WaitingForDeregistration { previous }, E::DeregistrationFailed(reason)) => {
            Transition::to(previous.as_ref().clone()).with(Action::Emit(
                ActivationNotification::deactivation_failed(reason.clone()),
            ))
        }

        _ => return None,
    };

    Some(next)
}

/// Actions that restart the outstanding call of an in-flight state.
///
/// Used when a machine is restored from storage into a state whose
/// asynchronous call belonged to a previous process.
#[must_use]
pub fn resume_actions(state: &State, device: &LocalDevice) -> Vec<Action> {
    match state {
        State::WaitingForPushDeviceDetails if device.registration_token().is_some() => {
            vec![Action::QueueEvent(Event::GotPushDeviceDetails)]
        }
        State::WaitingForPushDeviceDetails => vec![Action::RequestPushDetails],
        State::WaitingForDeviceRegistration => vec![Action::CreateRegistration],
        State::WaitingForRegistrationUpdate => vec![Action::UpdateRegistration],
        State::WaitingForDeregistration { .. } => vec![Action::RemoveRegistration],
        State::NotActivated
        | State::WaitingForNewPushDeviceDetails
        | State::AfterRegistrationUpdateFailed => Vec::new(),
    }
}

/// Error used when a registrar confirms a new registration without a token.
pub(crate) fn missing_identity_token() -> ErrorInfo {
    ErrorInfo::new(
        "registrar did not supply a device identity token",
        MISSING_IDENTITY_TOKEN,
    )
    .with_status_code(400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::RegistrationToken;

    fn all_states() -> Vec<State> {
        vec![
            State::NotActivated,
            State::WaitingForPushDeviceDetails,
            State::WaitingForDeviceRegistration,
            State::WaitingForNewPushDeviceDetails,
            State::WaitingForRegistrationUpdate,
            State::AfterRegistrationUpdateFailed,
            State::deregistering(State::WaitingForNewPushDeviceDetails),
        ]
    }

    fn all_events() -> Vec<Event> {
        let err = ErrorInfo::new("test", 123);
        vec![
            Event::CalledActivate,
            Event::CalledDeactivate,
            Event::GotPushDeviceDetails,
            Event::GotDeviceRegistration {
                device_identity_token: "token".into(),
                device_secret: "secret".into(),
            },
            Event::GettingDeviceRegistrationFailed(err.clone()),
            Event::RegistrationUpdated,
            Event::UpdatingRegistrationFailed(err.clone()),
            Event::Deregistered,
            Event::DeregistrationFailed(err.clone()),
            Event::GettingPushDeviceDetailsFailed(err.clone()),
            Event::SyncRegistrationFailed(err),
            Event::RegistrationSynced,
        ]
    }

    /// The (state, event) pairs listed in the table, by name.
    fn is_listed(state: &State, event: &Event) -> bool {
        matches!(
            (state.name(), event.name()),
            (
                "NotActivated",
                "CalledActivate" | "CalledDeactivate" | "GotPushDeviceDetails" | "Deregistered"
            ) | (
                "WaitingForPushDeviceDetails",
                "CalledActivate"
                    | "CalledDeactivate"
                    | "GotPushDeviceDetails"
                    | "GettingPushDeviceDetailsFailed"
            ) | (
                "WaitingForDeviceRegistration",
                "CalledActivate" | "GotDeviceRegistration" | "GettingDeviceRegistrationFailed"
            ) | (
                "WaitingForNewPushDeviceDetails",
                "CalledActivate" | "CalledDeactivate" | "GotPushDeviceDetails"
            ) | (
                "WaitingForRegistrationUpdate",
                "CalledActivate"
                    | "RegistrationUpdated"
                    | "RegistrationSynced"
                    | "UpdatingRegistrationFailed"
                    | "SyncRegistrationFailed"
            ) | (
                "AfterRegistrationUpdateFailed",
                "CalledActivate" | "CalledDeactivate" | "GotPushDeviceDetails"
            ) | (
                "WaitingForDeregistration",
                "CalledDeactivate" | "Deregistered" | "DeregistrationFailed"
            )
        )
    }

    #[test]
    fn unlisted_pairs_are_not_consumed() {
        let device = LocalDevice::generate(None);
        for state in all_states() {
            for event in all_events() {
                let result = transition(&state, &event, &device);
                assert_eq!(
                    result.is_some(),
                    is_listed(&state, &event),
                    "{} + {}",
                    state.name(),
                    event.name()
                );
            }
        }
    }

    #[test]
    fn activate_without_token_requests_push_details() {
        let device = LocalDevice::generate(None);
        let t = transition(&State::NotActivated, &Event::CalledActivate, &device).unwrap();
        assert_eq!(t.next, State::WaitingForPushDeviceDetails);
        assert_eq!(t.actions, vec![Action::RequestPushDetails]);
    }

    #[test]
    fn activate_with_token_queues_synthesized_details() {
        let mut device = LocalDevice::generate(None);
        device.set_registration_token(RegistrationToken::fcm("tok"));
        let t = transition(&State::NotActivated, &Event::CalledActivate, &device).unwrap();
        assert_eq!(t.next, State::WaitingForPushDeviceDetails);
        assert_eq!(t.actions, vec![Action::QueueEvent(Event::GotPushDeviceDetails)]);
    }

    #[test]
    fn activate_when_already_registered_succeeds_immediately() {
        let mut device = LocalDevice::generate(None);
        device.set_registration("identity".into(), "secret".into());
        let t = transition(&State::NotActivated, &Event::CalledActivate, &device).unwrap();
        assert_eq!(t.next, State::WaitingForNewPushDeviceDetails);
        assert_eq!(
            t.actions,
            vec![Action::Emit(ActivationNotification::activated())]
        );
    }

    #[test]
    fn push_details_trigger_exactly_one_registration() {
        let device = LocalDevice::generate(None);
        let t = transition(
            &State::WaitingForPushDeviceDetails,
            &Event::GotPushDeviceDetails,
            &device,
        )
        .unwrap();
        assert_eq!(t.next, State::WaitingForDeviceRegistration);
        assert_eq!(t.actions, vec![Action::CreateRegistration]);
    }

    #[test]
    fn registration_stores_token_then_notifies() {
        let device = LocalDevice::generate(None);
        let event = Event::GotDeviceRegistration {
            device_identity_token: "testDeviceToken".into(),
            device_secret: "secret".into(),
        };
        let t = transition(&State::WaitingForDeviceRegistration, &event, &device).unwrap();
        assert_eq!(t.next, State::WaitingForNewPushDeviceDetails);
        assert_eq!(
            t.actions,
            vec![
                Action::StoreRegistration {
                    device_identity_token: "testDeviceToken".into(),
                    device_secret: "secret".into(),
                },
                Action::Emit(ActivationNotification::activated()),
            ]
        );
    }

    #[test]
    fn deregistration_failure_returns_to_captured_state() {
        let device = LocalDevice::generate(None);
        let err = ErrorInfo::new("nope", 40000);
        for previous in [
            State::WaitingForNewPushDeviceDetails,
            State::AfterRegistrationUpdateFailed,
        ] {
            let t = transition(
                &State::deregistering(previous.clone()),
                &Event::DeregistrationFailed(err.clone()),
                &device,
            )
            .unwrap();
            assert_eq!(t.next, previous);
            assert_eq!(
                t.actions,
                vec![Action::Emit(ActivationNotification::deactivation_failed(
                    err.clone()
                ))]
            );
        }
    }

    #[test]
    fn deregistered_clears_token_and_rests() {
        let device = LocalDevice::generate(None);
        let t = transition(
            &State::deregistering(State::AfterRegistrationUpdateFailed),
            &Event::Deregistered,
            &device,
        )
        .unwrap();
        assert_eq!(t.next, State::NotActivated);
        assert_eq!(t.actions[0], Action::ClearRegistration);
    }

    #[test]
    fn duplicate_deregistered_is_noop_when_inactive() {
        let device = LocalDevice::generate(None);
        let t = transition(&State::NotActivated, &Event::Deregistered, &device).unwrap();
        assert_eq!(t.next, State::NotActivated);
        assert!(t.actions.is_empty());
    }

    #[test]
    fn update_failure_carries_reason() {
        let device = LocalDevice::generate(None);
        let err = ErrorInfo::new("test", 123);
        let t = transition(
            &State::WaitingForRegistrationUpdate,
            &Event::UpdatingRegistrationFailed(err.clone()),
            &device,
        )
        .unwrap();
        assert_eq!(t.next, State::AfterRegistrationUpdateFailed);
        assert_eq!(
            t.actions,
            vec![Action::Emit(ActivationNotification::update_failed(err))]
        );
    }

    #[test]
    fn reentrant_deactivate_keeps_captured_state() {
        let device = LocalDevice::generate(None);
        let state = State::deregistering(State::AfterRegistrationUpdateFailed);
        let t = transition(&state, &Event::CalledDeactivate, &device).unwrap();
        assert_eq!(t.next, state);
        assert!(t.actions.is_empty());
    }

    #[test]
    fn resume_restarts_outstanding_calls() {
        let mut device = LocalDevice::generate(None);
        assert_eq!(
            resume_actions(&State::WaitingForPushDeviceDetails, &device),
            vec![Action::RequestPushDetails]
        );
        device.set_registration_token(RegistrationToken::fcm("tok"));
        assert_eq!(
            resume_actions(&State::WaitingForPushDeviceDetails, &device),
            vec![Action::QueueEvent(Event::GotPushDeviceDetails)]
        );
        assert_eq!(
            resume_actions(&State::WaitingForDeviceRegistration, &device),
            vec![Action::CreateRegistration]
        );
        assert!(resume_actions(&State::NotActivated, &device).is_empty());
    }
}
