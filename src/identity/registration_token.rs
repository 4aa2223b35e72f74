// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform push token types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PushRecipient;
use crate::error::StorageError;

/// The push service a registration token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Firebase Cloud Messaging.
    Fcm,
    /// Legacy Google Cloud Messaging.
    Gcm,
    /// Apple Push Notification service.
    Apns,
}

impl TokenKind {
    /// Returns the wire and storage name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fcm => "fcm",
            Self::Gcm => "gcm",
            Self::Apns => "apns",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fcm" => Ok(Self::Fcm),
            "gcm" => Ok(Self::Gcm),
            "apns" => Ok(Self::Apns),
            other => Err(StorageError::InvalidValue {
                key: crate::storage::keys::REGISTRATION_TOKEN_KIND.to_string(),
                message: format!("unknown token kind '{other}'"),
            }),
        }
    }
}

/// A platform push handle delivered by the OS push service.
///
/// # Examples
///
/// ```
/// use push_activation::identity::{RegistrationToken, TokenKind};
///
/// let token = RegistrationToken::apns("a1b2c3");
/// assert_eq!(token.kind(), TokenKind::Apns);
/// assert_eq!(token.token(), "a1b2c3");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationToken {
    kind: TokenKind,
    token: String,
}

impl RegistrationToken {
    /// Creates a token of the given kind.
    #[must_use]
    pub fn new(kind: TokenKind, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
        }
    }

    /// Creates an FCM token.
    #[must_use]
    pub fn fcm(token: impl Into<String>) -> Self {
        Self::new(TokenKind::Fcm, token)
    }

    /// Creates a GCM token.
    #[must_use]
    pub fn gcm(token: impl Into<String>) -> Self {
        Self::new(TokenKind::Gcm, token)
    }

    /// Creates an APNs token.
    #[must_use]
    pub fn apns(token: impl Into<String>) -> Self {
        Self::new(TokenKind::Apns, token)
    }

    /// Returns the push service of this token.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Builds the push recipient descriptor sent to the control plane.
    #[must_use]
    pub fn recipient(&self) -> PushRecipient {
        match self.kind {
            TokenKind::Fcm => PushRecipient::Fcm {
                registration_token: self.token.clone(),
            },
            TokenKind::Gcm => PushRecipient::Gcm {
                registration_token: self.token.clone(),
            },
            TokenKind::Apns => PushRecipient::Apns {
                device_token: self.token.clone(),
            },
        }
    }
}

impl fmt::Debug for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are credentials; only show a prefix
        let short: String = self.token.chars().take(8).collect();
        write!(f, "RegistrationToken({}, {short}...)", self.kind)
    }
}
