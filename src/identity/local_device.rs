// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The local device record.

use uuid::Uuid;

use super::{DeviceDetails, FormFactor, Platform, PushDetails, RegistrationToken};
use crate::error::StorageError;
use crate::storage::{Storage, keys};

/// Identity of this device towards the push control plane.
///
/// The id and secret are generated once and never change until
/// [`reset`](Self::reset). The identity token is present only while the
/// device is registered.
///
/// The setters only change this in-memory record; nothing reaches storage
/// until [`save`](Self::save). The activation state machine saves the device
/// after each mutation it makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDevice {
    id: String,
    device_secret: String,
    client_id: Option<String>,
    device_identity_token: Option<String>,
    registration_token: Option<RegistrationToken>,
    platform: Platform,
    form_factor: FormFactor,
}

impl LocalDevice {
    /// Creates a fresh device with a newly generated id and secret.
    ///
    /// Nothing is persisted; call [`save`](Self::save) to store it.
    #[must_use]
    pub fn generate(client_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            device_secret: generate_secret(),
            client_id,
            device_identity_token: None,
            registration_token: None,
            platform: Platform::default(),
            form_factor: FormFactor::default(),
        }
    }

    /// Loads the persisted device, or generates and persists a new one.
    ///
    /// When a stored device exists, `client_id` only fills in a missing
    /// stored client id; it never overrides one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if storage cannot be read or written, or a
    /// stored token kind is unknown.
    pub fn load_or_create(
        storage: &dyn Storage,
        client_id: Option<String>,
    ) -> Result<Self, StorageError> {
        if let Some(mut device) = Self::load(storage)? {
            if device.client_id.is_none() && client_id.is_some() {
                device.client_id = client_id;
                device.save(storage)?;
            }
            tracing::debug!(device_id = %device.id, "Loaded local device");
            return Ok(device);
        }

        let device = Self::generate(client_id);
        device.save(storage)?;
        tracing::info!(device_id = %device.id, "Created local device");
        Ok(device)
    }

    /// Loads the persisted device, if one was stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if storage cannot be read or holds bad values.
    pub fn load(storage: &dyn Storage) -> Result<Option<Self>, StorageError> {
        let (Some(id), Some(device_secret)) = (
            storage.get(keys::DEVICE_ID)?,
            storage.get(keys::DEVICE_SECRET)?,
        ) else {
            return Ok(None);
        };

        let registration_token = match (
            storage.get(keys::REGISTRATION_TOKEN_KIND)?,
            storage.get(keys::REGISTRATION_TOKEN)?,
        ) {
            (Some(kind), Some(token)) => Some(RegistrationToken::new(kind.parse()?, token)),
            _ => None,
        };

        Ok(Some(Self {
            id,
            device_secret,
            client_id: storage.get(keys::DEVICE_CLIENT_ID)?,
            device_identity_token: storage.get(keys::DEVICE_IDENTITY_TOKEN)?,
            registration_token,
            platform: Platform::default(),
            form_factor: FormFactor::default(),
        }))
    }

    /// Writes every field of the device to storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if storage cannot be written.
    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        storage.put(keys::DEVICE_ID, &self.id)?;
        storage.put(keys::DEVICE_SECRET, &self.device_secret)?;
        storage.put_optional(keys::DEVICE_CLIENT_ID, self.client_id.as_deref())?;
        storage.put_optional(
            keys::DEVICE_IDENTITY_TOKEN,
            self.device_identity_token.as_deref(),
        )?;
        storage.put_optional(
            keys::REGISTRATION_TOKEN_KIND,
            self.registration_token.as_ref().map(|t| t.kind().as_str()),
        )?;
        storage.put_optional(
            keys::REGISTRATION_TOKEN,
            self.registration_token.as_ref().map(RegistrationToken::token),
        )?;
        Ok(())
    }

    /// Sets the platform and form factor reported on registration.
    #[must_use]
    pub fn with_descriptor(mut self, platform: Platform, form_factor: FormFactor) -> Self {
        self.platform = platform;
        self.form_factor = form_factor;
        self
    }

    /// Returns the device id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the device secret.
    #[must_use]
    pub fn device_secret(&self) -> &str {
        &self.device_secret
    }

    /// Returns the client id, if any.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Returns the identity token issued on registration.
    #[must_use]
    pub fn device_identity_token(&self) -> Option<&str> {
        self.device_identity_token.as_deref()
    }

    /// Returns the current platform push token.
    #[must_use]
    pub fn registration_token(&self) -> Option<&RegistrationToken> {
        self.registration_token.as_ref()
    }

    /// Returns the platform.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the form factor.
    #[must_use]
    pub fn form_factor(&self) -> FormFactor {
        self.form_factor
    }

    /// Returns `true` if the control plane has issued an identity token.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.device_identity_token.is_some()
    }

    /// Replaces the platform push token.
    ///
    /// Returns `true` if the token actually changed.
    pub fn set_registration_token(&mut self, token: RegistrationToken) -> bool {
        if self.registration_token.as_ref() == Some(&token) {
            return false;
        }
        self.registration_token = Some(token);
        true
    }

    /// Records a successful registration.
    pub fn set_registration(&mut self, device_identity_token: String, device_secret: String) {
        self.device_identity_token = Some(device_identity_token);
        self.device_secret = device_secret;
    }

    /// Forgets the identity token after deregistration.
    pub fn clear_registration(&mut self) {
        self.device_identity_token = None;
    }

    /// Discards all identity and generates a fresh id and secret.
    pub fn reset(&mut self) {
        let client_id = self.client_id.take();
        *self = Self::generate(client_id).with_descriptor(self.platform, self.form_factor);
    }

    /// Builds the registration body for this device.
    ///
    /// Returns `None` while no platform push token is known.
    #[must_use]
    pub fn details(&self) -> Option<DeviceDetails> {
        let token = self.registration_token.as_ref()?;
        Some(DeviceDetails {
            id: self.id.clone(),
            platform: self.platform,
            form_factor: self.form_factor,
            client_id: self.client_id.clone(),
            device_secret: Some(self.device_secret.clone()),
            push: PushDetails {
                recipient: token.recipient(),
            },
        })
    }
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
