// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport against the push control plane.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::RegistrationTransport;
use crate::error::{ErrorInfo, ProtocolError};
use crate::identity::{DeviceRegistration, LocalDevice, PushDetails};

/// Path of the device registry.
const DEVICE_REGISTRATIONS_PATH: &str = "/push/deviceRegistrations";

/// Credentials the client authenticates with before the device has its own.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientCredentials {
    /// An API key in `name:secret` form, sent as HTTP basic auth.
    ApiKey(String),
    /// A bearer token obtained by the host application.
    Token(String),
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(key) => {
                let name = key.split_once(':').map_or(key.as_str(), |(name, _)| name);
                write!(f, "ApiKey({name}:***)")
            }
            Self::Token(_) => f.write_str("Token(***)"),
        }
    }
}

// ============================================================================
// HttpConfig - Connection parameters for the control plane
// ============================================================================

/// Configuration for reaching the push control plane over HTTP.
///
/// # Examples
///
/// ```
/// use push_activation::transport::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("rest.example.com")
///     .with_https()
///     .with_api_key("app.key:secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://rest.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    credentials: Option<ClientCredentials>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given host.
    ///
    /// A host given as a full `http://` or `https://` URL is used verbatim
    /// as the base URL.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Authenticates with an API key (`name:secret`).
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.credentials = Some(ClientCredentials::ApiKey(key.into()));
        self
    }

    /// Authenticates with a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(ClientCredentials::Token(token.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the client credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<&ClientCredentials> {
        self.credentials.as_ref()
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            return self.host.trim_end_matches('/').to_string();
        }

        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates a [`ControlPlaneClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be
    /// created.
    pub fn into_client(self) -> Result<ControlPlaneClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }

        let base_url = self.base_url();
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(ControlPlaneClient {
            base_url,
            client,
            credentials: self.credentials,
        })
    }
}

// ============================================================================
// ControlPlaneClient - Authenticated requests to the control plane
// ============================================================================

/// How a single request is authenticated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Auth<'a> {
    /// The device's own identity token.
    Device(&'a str),
    /// The client credentials from the configuration.
    Client,
}

impl<'a> Auth<'a> {
    /// Uses the device identity token once issued, else the client credentials.
    pub(crate) fn for_device(device: &'a LocalDevice) -> Self {
        device
            .device_identity_token()
            .map_or(Self::Client, Self::Device)
    }
}

/// Error body returned by the control plane.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// HTTP client for the push control plane.
///
/// Shared by the registration transport and channel push subscriptions.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    base_url: String,
    client: Client,
    credentials: Option<ClientCredentials>,
}

impl ControlPlaneClient {
    /// Creates a client for `host` with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(host: impl Into<String>) -> Result<Self, ProtocolError> {
        HttpConfig::new(host).into_client()
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a request to `path` (which may include a query string).
    pub(crate) fn request(&self, method: Method, path: &str, auth: Auth<'_>) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(method = %method, url = %url, "Sending control plane request");

        let builder = self.client.request(method, url);
        match (auth, &self.credentials) {
            (Auth::Device(token), _) => builder.bearer_auth(token),
            (Auth::Client, Some(ClientCredentials::Token(token))) => builder.bearer_auth(token),
            (Auth::Client, Some(ClientCredentials::ApiKey(key))) => match key.split_once(':') {
                Some((name, secret)) => builder.basic_auth(name, Some(secret)),
                None => builder.basic_auth(key, None::<&str>),
            },
            (Auth::Client, None) => builder,
        }
    }

    /// Sends a request and turns transport errors and non-success statuses
    /// into [`ErrorInfo`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ErrorInfo> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "Control plane request failed");
            ErrorInfo::internal(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Control plane returned error");
        Err(error_from_body(status, &body))
    }
}

fn error_from_body(status: StatusCode, body: &str) -> ErrorInfo {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { mut error }) => {
            if error.status_code.is_none() {
                error.status_code = Some(status.as_u16());
            }
            error
        }
        Err(_) => ErrorInfo::from_status(
            status.as_u16(),
            format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ),
        ),
    }
}

// ============================================================================
// HttpRegistrationTransport
// ============================================================================

/// Response of `POST /push/deviceRegistrations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationResponse {
    device_identity_token: Option<IdentityToken>,
}

#[derive(Debug, Deserialize)]
struct IdentityToken {
    token: String,
}

/// [`RegistrationTransport`] calling the control plane directly.
///
/// - create: `POST /push/deviceRegistrations` with the device details
/// - update: `PATCH /push/deviceRegistrations/{id}` with the push recipient
/// - remove: `DELETE /push/deviceRegistrations?deviceId={id}`
///
/// Update and remove authenticate with the device identity token.
#[derive(Debug, Clone)]
pub struct HttpRegistrationTransport {
    client: ControlPlaneClient,
}

impl HttpRegistrationTransport {
    /// Creates a transport using the given client.
    #[must_use]
    pub fn new(client: ControlPlaneClient) -> Self {
        Self { client }
    }

    /// Creates a transport from a configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(config: HttpConfig) -> Result<Self, ProtocolError> {
        Ok(Self::new(config.into_client()?))
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &ControlPlaneClient {
        &self.client
    }
}

impl RegistrationTransport for HttpRegistrationTransport {
    async fn create_registration(
        &self,
        device: &LocalDevice,
    ) -> Result<DeviceRegistration, ErrorInfo> {
        let details = device.details().ok_or_else(missing_push_token)?;

        let request = self
            .client
            .request(Method::POST, DEVICE_REGISTRATIONS_PATH, Auth::Client)
            .json(&details);
        let response = self.client.send(request).await?;

        let body: RegistrationResponse = response
            .json()
            .await
            .map_err(|e| ErrorInfo::internal(format!("invalid registration response: {e}")))?;

        let token = body.device_identity_token.ok_or_else(|| {
            ErrorInfo::internal("registration response carried no device identity token")
        })?;

        tracing::debug!(device_id = %device.id(), "Device registered");
        Ok(DeviceRegistration::new(
            token.token,
            device.device_secret().to_string(),
        ))
    }

    async fn update_registration(&self, device: &LocalDevice) -> Result<(), ErrorInfo> {
        let token = device.registration_token().ok_or_else(missing_push_token)?;
        let push = PushDetails {
            recipient: token.recipient(),
        };
        let body = serde_json::json!({ "push": push });

        let path = format!(
            "{DEVICE_REGISTRATIONS_PATH}/{}",
            urlencoding::encode(device.id())
        );
        let request = self
            .client
            .request(Method::PATCH, &path, Auth::for_device(device))
            .json(&body);
        self.client.send(request).await?;

        tracing::debug!(device_id = %device.id(), "Device registration updated");
        Ok(())
    }

    async fn remove_registration(&self, device: &LocalDevice) -> Result<(), ErrorInfo> {
        let path = format!(
            "{DEVICE_REGISTRATIONS_PATH}?deviceId={}",
            urlencoding::encode(device.id())
        );
        let request = self
            .client
            .request(Method::DELETE, &path, Auth::for_device(device));

        match self.client.send(request).await {
            Ok(_) => {}
            // Already gone is as good as removed
            Err(e) if e.status_code == Some(404) => {
                tracing::debug!(device_id = %device.id(), "Device registration already absent");
            }
            Err(e) => return Err(e),
        }

        tracing::debug!(device_id = %device.id(), "Device deregistered");
        Ok(())
    }
}

fn missing_push_token() -> ErrorInfo {
    ErrorInfo::new("no push registration token available", 40000).with_status_code(400)
}
