// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Application-facing entry point for push activation.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use super::{ActivationConfig, ActivationStateMachine, ActivationStore, Event, State};
use crate::error::{Error, ErrorInfo, Result};
use crate::identity::{LocalDevice, RegistrationToken};
use crate::notification::{ActivationNotification, NotificationBus, RegistrarResult};
use crate::storage::{MemoryStorage, Storage};
use crate::transport::{Dispatcher, PushTokenProvider, RegistrationTransport};

/// Owns the local device, the activation state machine and the transport
/// dispatcher for one application.
///
/// # Examples
///
/// ```no_run
/// use push_activation::activation::{ActivationConfig, ActivationContext};
/// use push_activation::storage::FileStorage;
/// use push_activation::transport::{HttpConfig, HttpRegistrationTransport};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpRegistrationTransport::from_config(
///     HttpConfig::new("rest.example.com")
///         .with_https()
///         .with_api_key("app.key:secret"),
/// )?;
///
/// let context = ActivationContext::builder(transport)
///     .with_storage(Arc::new(FileStorage::open("push.json")?))
///     .with_config(ActivationConfig::new().with_client_id("alice"))
///     .build()?;
///
/// let mut notifications = context.subscribe();
/// context.activate();
/// let outcome = notifications.recv().await?;
/// println!("{}: {:?}", outcome.name(), outcome.error());
/// # Ok(())
/// # }
/// ```
pub struct ActivationContext {
    machine: ActivationStateMachine,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for ActivationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationContext")
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

impl ActivationContext {
    /// Creates a context with the given configuration, storage and transport.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if no runtime is available or the persisted state cannot
    /// be read.
    pub fn new<T: RegistrationTransport>(
        config: ActivationConfig,
        storage: Arc<dyn Storage>,
        transport: T,
    ) -> Result<Self> {
        Self::builder(transport)
            .with_config(config)
            .with_storage(storage)
            .build()
    }

    /// Starts building a context around a registration transport.
    #[must_use]
    pub fn builder<T: RegistrationTransport>(transport: T) -> ActivationContextBuilder<T> {
        ActivationContextBuilder::new(transport)
    }

    /// Asks for push to be activated.
    ///
    /// The outcome is published as [`ActivationNotification::Activate`].
    pub fn activate(&self) {
        self.machine.handle_event(Event::CalledActivate);
    }

    /// Asks for push to be deactivated.
    ///
    /// The outcome is published as [`ActivationNotification::Deactivate`].
    pub fn deactivate(&self) {
        self.machine.handle_event(Event::CalledDeactivate);
    }

    /// Hands a platform push token to the machine.
    ///
    /// Returns `false` if the token equals the stored one and was ignored.
    pub fn on_new_registration_token(&self, token: RegistrationToken) -> bool {
        self.machine.on_new_registration_token(token)
    }

    /// Reports that the platform could not supply a push token.
    pub fn on_push_details_failed(&self, reason: ErrorInfo) {
        self.machine
            .handle_event(Event::GettingPushDeviceDetailsFailed(reason));
    }

    /// Hands a custom registrar's answer to the machine.
    ///
    /// Returns `true` if the machine consumed the answer immediately.
    pub fn deliver_registrar_result(&self, result: RegistrarResult) -> bool {
        self.machine.deliver_registrar_result(result)
    }

    /// Subscribes to activation notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ActivationNotification> {
        self.machine.subscribe()
    }

    /// Returns a snapshot of the local device.
    #[must_use]
    pub fn local_device(&self) -> LocalDevice {
        self.machine.local_device()
    }

    /// Returns the current activation state.
    #[must_use]
    pub fn current_state(&self) -> State {
        self.machine.current_state()
    }

    /// Returns the underlying state machine.
    #[must_use]
    pub fn state_machine(&self) -> &ActivationStateMachine {
        &self.machine
    }

    /// Returns the storage backing this context.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Discards the local device identity and activation progress.
    ///
    /// # Errors
    ///
    /// Returns error if the reset could not be persisted.
    pub fn reset(&self) -> Result<()> {
        self.machine.reset()?;
        Ok(())
    }

    /// Returns the local device if it holds a device identity token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotRegistered`] if the device has not been
    /// registered with the control plane.
    pub fn require_registered_device(&self) -> Result<LocalDevice> {
        let device = self.local_device();
        if device.is_registered() {
            Ok(device)
        } else {
            Err(Error::DeviceNotRegistered)
        }
    }
}

/// Builder for [`ActivationContext`].
pub struct ActivationContextBuilder<T> {
    transport: T,
    storage: Option<Arc<dyn Storage>>,
    config: ActivationConfig,
    token_provider: Option<Arc<dyn PushTokenProvider>>,
}

impl<T: RegistrationTransport> ActivationContextBuilder<T> {
    fn new(transport: T) -> Self {
        Self {
            transport,
            storage: None,
            config: ActivationConfig::default(),
            token_provider: None,
        }
    }

    /// Sets the storage. Defaults to a fresh [`MemoryStorage`].
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ActivationConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the provider asked for a push token when activation needs one.
    ///
    /// Without a provider the application must deliver the token through
    /// [`ActivationContext::on_new_registration_token`].
    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn PushTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Builds the context and starts its transport dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuntimeUnavailable`] outside a runtime, or a storage
    /// error if the persisted device or state cannot be read.
    pub fn build(self) -> Result<ActivationContext> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| Error::RuntimeUnavailable)?;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let config = self.config;

        let device = LocalDevice::load_or_create(
            storage.as_ref(),
            config.client_id().map(str::to_string),
        )?
        .with_descriptor(config.platform(), config.form_factor());

        let bus = NotificationBus::with_capacity(config.notification_capacity());
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        let machine = ActivationStateMachine::restore(
            ActivationStore::new(Arc::clone(&storage)),
            device,
            bus,
            requests_tx,
            config.use_custom_registrar(),
        )?;

        Dispatcher::new(
            Arc::new(self.transport),
            self.token_provider,
            machine.downgrade(),
        )
        .spawn(&runtime, requests_rx);

        tracing::info!(
            device_id = %machine.local_device().id(),
            state = %machine.current_state(),
            custom_registrar = config.use_custom_registrar(),
            "Push activation context ready"
        );

        Ok(ActivationContext { machine, storage })
    }
}
