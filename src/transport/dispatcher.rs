// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background task running transport requests outside the machine lock.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{PushTokenProvider, RegistrationTransport, TokenReply, TransportRequest};
use crate::activation::{ActivationStateMachine, Event, WeakStateMachine};

/// Receives [`TransportRequest`]s from the state machine and runs each one on
/// its own task, so a slow call never holds up the machine or other calls.
///
/// Every completed call re-enters the machine through a fresh
/// `handle_event`. The dispatcher holds only a weak handle on the machine
/// and stops once the machine and its request channel are dropped.
pub(crate) struct Dispatcher<T> {
    transport: Arc<T>,
    token_provider: Option<Arc<dyn PushTokenProvider>>,
    machine: WeakStateMachine,
}

impl<T: RegistrationTransport> Dispatcher<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        token_provider: Option<Arc<dyn PushTokenProvider>>,
        machine: WeakStateMachine,
    ) -> Self {
        Self {
            transport,
            token_provider,
            machine,
        }
    }

    /// Spawns the dispatch loop on the given runtime.
    pub(crate) fn spawn(
        self,
        runtime: &tokio::runtime::Handle,
        mut requests: mpsc::UnboundedReceiver<TransportRequest>,
    ) -> JoinHandle<()> {
        runtime.spawn(async move {
            tracing::debug!("Starting transport dispatcher");

            while let Some(request) = requests.recv().await {
                tracing::debug!(request = request.name(), "Dispatching transport request");
                self.dispatch(request);
            }

            tracing::debug!("Transport dispatcher stopped");
        })
    }

    fn dispatch(&self, request: TransportRequest) {
        match request {
            TransportRequest::RequestPushDetails => self.request_push_details(),
            TransportRequest::CreateRegistration(device) => {
                let transport = Arc::clone(&self.transport);
                self.complete(async move {
                    match transport.create_registration(&device).await {
                        Ok(registration) => Event::GotDeviceRegistration {
                            device_identity_token: registration.device_identity_token,
                            device_secret: registration.device_secret,
                        },
                        Err(reason) => Event::GettingDeviceRegistrationFailed(reason),
                    }
                });
            }
            TransportRequest::UpdateRegistration(device) => {
                let transport = Arc::clone(&self.transport);
                self.complete(async move {
                    match transport.update_registration(&device).await {
                        Ok(()) => Event::RegistrationUpdated,
                        Err(reason) => Event::UpdatingRegistrationFailed(reason),
                    }
                });
            }
            TransportRequest::RemoveRegistration(device) => {
                let transport = Arc::clone(&self.transport);
                self.complete(async move {
                    match transport.remove_registration(&device).await {
                        Ok(()) => Event::Deregistered,
                        Err(reason) => Event::DeregistrationFailed(reason),
                    }
                });
            }
        }
    }

    /// Runs `call` on its own task and feeds the resulting event back.
    fn complete<F>(&self, call: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let machine = self.machine.clone();
        tokio::spawn(async move {
            let event = call.await;
            deliver(&machine, |m| {
                m.handle_event(event);
            });
        });
    }

    fn request_push_details(&self) {
        let Some(provider) = &self.token_provider else {
            tracing::debug!("No token provider, waiting for the platform to deliver a token");
            return;
        };

        let (tx, rx) = oneshot::channel();
        provider.request_token(TokenReply::new(tx));

        let machine = self.machine.clone();
        tokio::spawn(async move {
            match rx.await {
                Ok(Ok(token)) => deliver(&machine, |m| {
                    m.on_new_registration_token(token);
                }),
                Ok(Err(reason)) => deliver(&machine, |m| {
                    m.handle_event(Event::GettingPushDeviceDetailsFailed(reason));
                }),
                Err(_) => {
                    tracing::debug!("Token provider dropped its reply without answering");
                }
            }
        });
    }
}

fn deliver(machine: &WeakStateMachine, f: impl FnOnce(&ActivationStateMachine)) {
    match machine.upgrade() {
        Some(machine) => f(&machine),
        None => tracing::debug!("State machine dropped before transport result arrived"),
    }
}
