// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the push activation library.
//!
//! Two kinds of failure live here. [`Error`] and its sub-enums are returned
//! synchronously to the caller for local problems (storage, misuse, protocol
//! setup). [`ErrorInfo`] is the control-plane error payload: it never comes
//! back as an `Err` from the state machine, it travels inside machine events
//! and activation notifications.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while reading or writing local storage.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The control plane rejected a request.
    #[error("request rejected: {0}")]
    Api(ErrorInfo),

    /// The operation needs a device registered with the push control plane.
    #[error("device is not registered for push notifications")]
    DeviceNotRegistered,

    /// No tokio runtime was available to run background work.
    #[error("no tokio runtime available")]
    RuntimeUnavailable,
}

/// Errors related to protocol communication with the control plane.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to persisting activation state and device identity.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored content could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored value has an unexpected shape.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// The storage key holding the bad value.
        key: String,
        /// Description of the problem.
        message: String,
    },
}

/// Error payload reported by the push control plane or a custom registrar.
///
/// `code` follows the control plane's five-digit convention (the HTTP status
/// times 100 plus a detail digit pair).
///
/// # Examples
///
/// ```
/// use push_activation::ErrorInfo;
///
/// let err = ErrorInfo::new("token expired", 40142).with_status_code(401);
/// assert_eq!(err.code, 40142);
/// assert_eq!(err.status_code, Some(401));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// Human readable description.
    pub message: String,
    /// Control-plane error code.
    pub code: u32,
    /// HTTP status associated with the error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ErrorInfo {
    /// Code used for failures that never reached the control plane.
    pub const INTERNAL_ERROR: u32 = 50000;

    /// Creates an error with a message and code.
    #[must_use]
    pub fn new(message: impl Into<String>, code: u32) -> Self {
        Self {
            message: message.into(),
            code,
            status_code: None,
        }
    }

    /// Sets the HTTP status code.
    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Builds an error from an HTTP status when the body carried no detail.
    #[must_use]
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(message, u32::from(status_code) * 100).with_status_code(status_code)
    }

    /// Builds an error for a failure that happened on this side of the wire.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, Self::INTERNAL_ERROR).with_status_code(500)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "{} (code {}, status {status})", self.message, self.code),
            None => write!(f, "{} (code {})", self.message, self.code),
        }
    }
}

impl std::error::Error for ErrorInfo {}

impl From<StorageError> for ErrorInfo {
    fn from(err: StorageError) -> Self {
        Self::internal(err.to_string())
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
