// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The running activation state machine.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};

use super::transition::{Action, Transition, missing_identity_token, resume_actions, transition};
use super::{ActivationStore, Event, State};
use crate::error::StorageError;
use crate::identity::{LocalDevice, RegistrationToken};
use crate::notification::{ActivationNotification, NotificationBus, RegistrarResult};
use crate::transport::TransportRequest;

/// Mutable machine data, guarded as a whole.
struct Core {
    state: State,
    pending: VecDeque<Event>,
    device: LocalDevice,
    /// Registrar requests published while nobody was subscribed.
    undelivered: Vec<ActivationNotification>,
}

struct Shared {
    core: Mutex<Core>,
    store: ActivationStore,
    bus: NotificationBus,
    state_tx: watch::Sender<State>,
    device_tx: watch::Sender<LocalDevice>,
    requests: mpsc::UnboundedSender<TransportRequest>,
    use_custom_registrar: bool,
}

/// Handle on the activation state machine.
///
/// Cloning is cheap; all clones drive the same machine. Every entry point
/// takes one lock for the whole inspect, transition, persist and drain
/// sequence, so concurrent callers are serialized and no event is lost.
///
/// Network work is never done under the lock. Registration actions are
/// handed to the transport dispatcher as [`TransportRequest`]s (or published
/// for a custom registrar) and their outcome comes back later as a new
/// event.
#[derive(Clone)]
pub struct ActivationStateMachine {
    shared: Arc<Shared>,
}

/// Non-owning handle on an [`ActivationStateMachine`].
#[derive(Clone)]
pub struct WeakStateMachine {
    shared: Weak<Shared>,
}

impl WeakStateMachine {
    /// Returns the machine if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ActivationStateMachine> {
        self.shared
            .upgrade()
            .map(|shared| ActivationStateMachine { shared })
    }
}

impl std::fmt::Debug for ActivationStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationStateMachine")
            .field("state", &*self.shared.state_tx.borrow())
            .field("use_custom_registrar", &self.shared.use_custom_registrar)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for WeakStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakStateMachine").finish_non_exhaustive()
    }
}

impl ActivationStateMachine {
    /// Builds a machine from the persisted state and queue.
    ///
    /// If the restored state was waiting on an asynchronous call, that call
    /// is issued again. A custom registrar request issued this way is held
    /// until the first [`subscribe`](Self::subscribe).
    pub(crate) fn restore(
        store: ActivationStore,
        device: LocalDevice,
        bus: NotificationBus,
        requests: mpsc::UnboundedSender<TransportRequest>,
        use_custom_registrar: bool,
    ) -> Result<Self, StorageError> {
        let (state, pending) = store.load_state()?;
        tracing::debug!(
            state = %state,
            pending = pending.len(),
            "Restored activation state"
        );

        let (state_tx, _) = watch::channel(state.clone());
        let (device_tx, _) = watch::channel(device.clone());
        let machine = Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    state,
                    pending,
                    device,
                    undelivered: Vec::new(),
                }),
                store,
                bus,
                state_tx,
                device_tx,
                requests,
                use_custom_registrar,
            }),
        };

        {
            let mut core = machine.shared.core.lock();
            let resume = resume_actions(&core.state, &core.device);
            if !resume.is_empty() {
                tracing::info!(state = %core.state, "Resuming interrupted activation step");
                for action in resume {
                    machine.execute(&mut core, action);
                }
                machine.drain(&mut core);
                machine.persist(&core);
            }
        }

        Ok(machine)
    }

    /// Returns a weak handle that does not keep the machine alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakStateMachine {
        WeakStateMachine {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Feeds an event into the machine.
    ///
    /// Returns `true` if the current state consumed the event. Otherwise the
    /// event is appended to the pending queue, to be handled once a later
    /// state can consume it, and `false` is returned.
    pub fn handle_event(&self, event: Event) -> bool {
        let mut core = self.shared.core.lock();
        let consumed = self.process(&mut core, event);
        self.persist(&core);
        consumed
    }

    /// Records a platform push token and, if it changed, feeds
    /// [`Event::GotPushDeviceDetails`] into the machine.
    ///
    /// Returns `false` if the token equals the stored one.
    pub fn on_new_registration_token(&self, token: RegistrationToken) -> bool {
        let mut core = self.shared.core.lock();
        if !core.device.set_registration_token(token) {
            tracing::debug!("Push token unchanged, ignoring");
            return false;
        }
        self.save_device(&core);

        self.process(&mut core, Event::GotPushDeviceDetails);
        self.persist(&core);
        true
    }

    /// Feeds a custom registrar's answer into the machine.
    ///
    /// A registration answer is read against the current state: while
    /// waiting for a first registration it completes (or fails) that
    /// registration, otherwise it answers a registration update.
    ///
    /// Returns `true` if the resulting event was consumed.
    pub fn deliver_registrar_result(&self, result: RegistrarResult) -> bool {
        let mut core = self.shared.core.lock();
        tracing::debug!(result = result.name(), state = %core.state, "Registrar answered");

        let registering = core.state == State::WaitingForDeviceRegistration;
        let event = match result {
            RegistrarResult::DeviceRegistered {
                error: Some(reason),
                ..
            } => {
                if registering {
                    Event::GettingDeviceRegistrationFailed(reason)
                } else {
                    Event::UpdatingRegistrationFailed(reason)
                }
            }
            RegistrarResult::DeviceRegistered {
                device_identity_token,
                error: None,
            } => {
                if !registering {
                    Event::RegistrationUpdated
                } else if let Some(token) = device_identity_token {
                    Event::GotDeviceRegistration {
                        device_identity_token: token,
                        device_secret: core.device.device_secret().to_string(),
                    }
                } else {
                    Event::GettingDeviceRegistrationFailed(missing_identity_token())
                }
            }
            RegistrarResult::DeviceDeregistered { error: None } => Event::Deregistered,
            RegistrarResult::DeviceDeregistered {
                error: Some(reason),
            } => Event::DeregistrationFailed(reason),
        };

        let consumed = self.process(&mut core, event);
        self.persist(&core);
        consumed
    }

    /// Returns the current state.
    #[must_use]
    pub fn current_state(&self) -> State {
        self.shared.state_tx.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<State> {
        self.shared.state_tx.subscribe()
    }

    /// Returns a snapshot of the pending queue, head first.
    #[must_use]
    pub fn pending_events(&self) -> Vec<Event> {
        self.shared.core.lock().pending.iter().cloned().collect()
    }

    /// Returns a snapshot of the local device.
    #[must_use]
    pub fn local_device(&self) -> LocalDevice {
        self.shared.device_tx.borrow().clone()
    }

    /// Subscribes to activation notifications.
    ///
    /// Registrar requests raised while there were no subscribers are
    /// delivered to the new receiver first.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ActivationNotification> {
        let mut core = self.shared.core.lock();
        let receiver = self.shared.bus.subscribe();
        for notification in core.undelivered.drain(..) {
            self.shared.bus.publish(notification);
        }
        receiver
    }

    /// Discards the device identity and all activation progress.
    ///
    /// The machine returns to `NotActivated` with an empty queue and the
    /// device gets a fresh id and secret. No deregistration is attempted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the reset could not be persisted.
    pub fn reset(&self) -> Result<(), StorageError> {
        let mut core = self.shared.core.lock();
        core.state = State::NotActivated;
        core.pending.clear();
        core.undelivered.clear();
        core.device.reset();

        self.shared.store.clear()?;
        core.device.save(self.shared.store.storage().as_ref())?;

        self.shared.state_tx.send_replace(core.state.clone());
        self.shared.device_tx.send_replace(core.device.clone());
        tracing::info!(device_id = %core.device.id(), "Activation state reset");
        Ok(())
    }

    /// Handles one event and drains the queue behind it.
    fn process(&self, core: &mut Core, event: Event) -> bool {
        let Some(next) = transition(&core.state, &event, &core.device) else {
            tracing::warn!(state = %core.state, event = event.name(), "Queuing event");
            core.pending.push_back(event);
            return false;
        };

        self.apply(core, &event, next);
        self.drain(core);
        true
    }

    /// Handles queued events while the head of the queue is consumable.
    fn drain(&self, core: &mut Core) {
        loop {
            let Some(head) = core.pending.front() else {
                break;
            };
            let Some(next) = transition(&core.state, head, &core.device) else {
                break;
            };
            let Some(event) = core.pending.pop_front() else {
                break;
            };
            self.apply(core, &event, next);
        }
    }

    fn apply(&self, core: &mut Core, event: &Event, next: Transition) {
        tracing::debug!(
            from = %core.state,
            event = event.name(),
            to = %next.next,
            "Activation transition"
        );

        core.state = next.next;
        // Watchers see the new state before any notification it emits
        self.shared.state_tx.send_replace(core.state.clone());
        for action in next.actions {
            self.execute(core, action);
        }
    }

    fn execute(&self, core: &mut Core, action: Action) {
        match action {
            Action::Emit(notification) => self.shared.bus.publish(notification),
            Action::QueueEvent(event) => core.pending.push_back(event),
            Action::StoreRegistration {
                device_identity_token,
                device_secret,
            } => {
                core.device
                    .set_registration(device_identity_token, device_secret);
                self.save_device(core);
            }
            Action::ClearRegistration => {
                core.device.clear_registration();
                self.save_device(core);
            }
            Action::RequestPushDetails => self.send(TransportRequest::RequestPushDetails),
            Action::CreateRegistration => {
                if self.shared.use_custom_registrar {
                    self.request_registrar(
                        core,
                        ActivationNotification::RegisterDevice { is_new: true },
                    );
                } else {
                    self.send(TransportRequest::CreateRegistration(core.device.clone()));
                }
            }
            Action::UpdateRegistration => {
                if self.shared.use_custom_registrar {
                    self.request_registrar(
                        core,
                        ActivationNotification::RegisterDevice { is_new: false },
                    );
                } else {
                    self.send(TransportRequest::UpdateRegistration(core.device.clone()));
                }
            }
            Action::RemoveRegistration => {
                if self.shared.use_custom_registrar {
                    self.request_registrar(core, ActivationNotification::DeregisterDevice);
                } else {
                    self.send(TransportRequest::RemoveRegistration(core.device.clone()));
                }
            }
        }
    }

    /// Publishes a request for the custom registrar, holding it back while
    /// nobody could answer.
    fn request_registrar(&self, core: &mut Core, notification: ActivationNotification) {
        if self.shared.bus.subscriber_count() == 0 {
            tracing::debug!(
                name = notification.name(),
                "No subscribers, holding registrar request"
            );
            core.undelivered.push(notification);
        } else {
            self.shared.bus.publish(notification);
        }
    }

    fn send(&self, request: TransportRequest) {
        let name = request.name();
        if self.shared.requests.send(request).is_err() {
            tracing::warn!(request = name, "Transport dispatcher stopped, dropping request");
        }
    }

    fn save_device(&self, core: &Core) {
        if let Err(e) = core.device.save(self.shared.store.storage().as_ref()) {
            tracing::warn!(error = %e, "Failed to persist local device");
        }
        self.shared.device_tx.send_replace(core.device.clone());
    }

    fn persist(&self, core: &Core) {
        if let Err(e) = self.shared.store.save_state(&core.state, &core.pending) {
            tracing::warn!(error = %e, state = %core.state, "Failed to persist activation state");
        }
    }
}
