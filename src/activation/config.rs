// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Activation configuration.

use crate::identity::{FormFactor, Platform};

/// Configuration for an [`ActivationContext`](super::ActivationContext).
///
/// # Examples
///
/// ```
/// use push_activation::activation::ActivationConfig;
/// use push_activation::identity::{FormFactor, Platform};
///
/// let config = ActivationConfig::new()
///     .with_client_id("alice")
///     .with_platform(Platform::Ios)
///     .with_form_factor(FormFactor::Tablet)
///     .with_custom_registrar();
///
/// assert!(config.use_custom_registrar());
/// assert_eq!(config.client_id(), Some("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct ActivationConfig {
    client_id: Option<String>,
    platform: Platform,
    form_factor: FormFactor,
    use_custom_registrar: bool,
    notification_capacity: usize,
}

impl ActivationConfig {
    /// Default capacity of the notification bus.
    pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

    /// Creates a configuration with defaults: no client id, Android phone,
    /// HTTP registration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client_id: None,
            platform: Platform::default(),
            form_factor: FormFactor::default(),
            use_custom_registrar: false,
            notification_capacity: Self::DEFAULT_NOTIFICATION_CAPACITY,
        }
    }

    /// Sets the client id the device registers for.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the reported platform.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Sets the reported form factor.
    #[must_use]
    pub fn with_form_factor(mut self, form_factor: FormFactor) -> Self {
        self.form_factor = form_factor;
        self
    }

    /// Delegates registration calls to a custom registrar notified on the
    /// notification bus, instead of calling the control plane directly.
    #[must_use]
    pub fn with_custom_registrar(mut self) -> Self {
        self.use_custom_registrar = true;
        self
    }

    /// Sets the notification bus capacity.
    #[must_use]
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }

    /// Returns the client id.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
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

    /// Returns whether a custom registrar handles registration.
    #[must_use]
    pub fn use_custom_registrar(&self) -> bool {
        self.use_custom_registrar
    }

    /// Returns the notification bus capacity.
    #[must_use]
    pub fn notification_capacity(&self) -> usize {
        self.notification_capacity
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self::new()
    }
}
