// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable key-value storage for activation state and device identity.
//!
//! The state machine and the local device only need a flat string map that
//! survives process restarts. [`Storage`] is that seam: platforms with their
//! own preference stores implement it directly, and two implementations ship
//! with the crate.
//!
//! - [`MemoryStorage`]: in-process map, for tests and ephemeral clients
//! - [`FileStorage`]: JSON object file, replaced atomically on every write
//!
//! # Examples
//!
//! ```
//! use push_activation::storage::{MemoryStorage, Storage, keys};
//!
//! let storage = MemoryStorage::new();
//! storage.put(keys::CURRENT_STATE, "NotActivated").unwrap();
//! assert_eq!(
//!     storage.get(keys::CURRENT_STATE).unwrap().as_deref(),
//!     Some("NotActivated")
//! );
//! ```

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// Storage keys used by this crate.
pub mod keys {
    /// Persisted name of the current activation state.
    pub const CURRENT_STATE: &str = "PUSH_CURRENT_STATE";
    /// JSON array of persisted pending event names, oldest first.
    pub const PENDING_EVENTS: &str = "PUSH_PENDING_EVENTS";

    /// Locally generated device id.
    pub const DEVICE_ID: &str = "DEVICE_ID";
    /// Locally generated device secret.
    pub const DEVICE_SECRET: &str = "DEVICE_SECRET";
    /// Client id the device was created for.
    pub const DEVICE_CLIENT_ID: &str = "DEVICE_CLIENT_ID";
    /// Identity token issued by the control plane.
    pub const DEVICE_IDENTITY_TOKEN: &str = "DEVICE_IDENTITY_TOKEN";
    /// Kind of the platform push token (`fcm`, `gcm`, `apns`).
    pub const REGISTRATION_TOKEN_KIND: &str = "DEVICE_REGISTRATION_TOKEN_KIND";
    /// Platform push token.
    pub const REGISTRATION_TOKEN: &str = "DEVICE_REGISTRATION_TOKEN";

    /// Every key written by the activation machinery.
    pub const ALL: &[&str] = &[
        CURRENT_STATE,
        PENDING_EVENTS,
        DEVICE_ID,
        DEVICE_SECRET,
        DEVICE_CLIENT_ID,
        DEVICE_IDENTITY_TOKEN,
        REGISTRATION_TOKEN_KIND,
        REGISTRATION_TOKEN,
    ];
}

/// A durable string key-value store.
///
/// Implementations must be safe to share between threads. Writes are
/// expected to be durable once the call returns.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Stores `value` under `key`, or removes the key when `value` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn put_optional(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        match value {
            Some(value) => self.put(key, value),
            None => self.remove(key),
        }
    }
}
