// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local device identity.
//!
//! The [`LocalDevice`] is this installation's identity towards the push
//! control plane: a locally generated id and secret, the platform push token
//! ([`RegistrationToken`]) and, once registered, the device identity token
//! issued by the control plane.
//!
//! # Examples
//!
//! ```
//! use push_activation::identity::{LocalDevice, RegistrationToken};
//! use push_activation::storage::MemoryStorage;
//!
//! let storage = MemoryStorage::new();
//! let mut device = LocalDevice::load_or_create(&storage, Some("alice".into())).unwrap();
//! assert!(!device.is_registered());
//!
//! device.set_registration_token(RegistrationToken::fcm("fcm-token"));
//! device.save(&storage).unwrap();
//!
//! let reloaded = LocalDevice::load_or_create(&storage, None).unwrap();
//! assert_eq!(reloaded.id(), device.id());
//! ```

mod device_details;
mod local_device;
mod registration_token;

pub use device_details::{
    DeviceDetails, DeviceRegistration, FormFactor, Platform, PushDetails, PushRecipient,
};
pub use local_device::LocalDevice;
pub use registration_token::{RegistrationToken, TokenKind};
