// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP control plane transport using wiremock.

use push_activation::identity::RegistrationToken;
use push_activation::transport::{HttpConfig, HttpRegistrationTransport};
use push_activation::{ErrorInfo, LocalDevice, RegistrationTransport};
use wiremock::matchers::{basic_auth, bearer_token, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpRegistrationTransport {
    HttpRegistrationTransport::from_config(
        HttpConfig::new(server.uri()).with_api_key("app.key:secret"),
    )
    .unwrap()
}

fn device_with_token() -> LocalDevice {
    let mut device = LocalDevice::generate(Some("alice".to_string()));
    device.set_registration_token(RegistrationToken::fcm("testDeviceToken"));
    device
}

fn registered_device() -> LocalDevice {
    let mut device = device_with_token();
    let secret = device.device_secret().to_string();
    device.set_registration("identity-token".to_string(), secret);
    device
}

// ============================================================================
// Create registration
// ============================================================================

mod create_registration {
    use super::*;

    #[tokio::test]
    async fn posts_device_details_and_returns_identity_token() {
        let server = MockServer::start().await;
        let device = device_with_token();

        Mock::given(method("POST"))
            .and(path("/push/deviceRegistrations"))
            .and(basic_auth("app.key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "id": device.id(),
                "platform": "android",
                "formFactor": "phone",
                "clientId": "alice",
                "deviceSecret": device.device_secret(),
                "push": {
                    "recipient": {
                        "transportType": "fcm",
                        "registrationToken": "testDeviceToken"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": device.id(),
                "deviceIdentityToken": { "token": "issued-token" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registration = transport(&server)
            .create_registration(&device)
            .await
            .unwrap();

        assert_eq!(registration.device_identity_token, "issued-token");
        assert_eq!(registration.device_secret, device.device_secret());
    }

    #[tokio::test]
    async fn error_body_becomes_error_info() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/push/deviceRegistrations"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid key", "code": 40101, "statusCode": 401 }
            })))
            .mount(&server)
            .await;

        let err = transport(&server)
            .create_registration(&device_with_token())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ErrorInfo::new("Invalid key", 40101).with_status_code(401)
        );
    }

    #[tokio::test]
    async fn response_without_token_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/push/deviceRegistrations"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = transport(&server)
            .create_registration(&device_with_token())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorInfo::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn missing_push_token_fails_without_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = transport(&server)
            .create_registration(&LocalDevice::generate(None))
            .await
            .unwrap_err();

        assert_eq!(err.status_code, Some(400));
    }
}

// ============================================================================
// Update registration
// ============================================================================

mod update_registration {
    use super::*;

    #[tokio::test]
    async fn patches_recipient_with_device_token() {
        let server = MockServer::start().await;
        let device = registered_device();

        Mock::given(method("PATCH"))
            .and(path(format!("/push/deviceRegistrations/{}", device.id())))
            .and(bearer_token("identity-token"))
            .and(body_partial_json(serde_json::json!({
                "push": {
                    "recipient": {
                        "transportType": "fcm",
                        "registrationToken": "testDeviceToken"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server)
            .update_registration(&device)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unparseable_error_uses_status_code() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .update_registration(&registered_device())
            .await
            .unwrap_err();

        assert_eq!(err.code, 50300);
        assert_eq!(err.status_code, Some(503));
    }
}

// ============================================================================
// Remove registration
// ============================================================================

mod remove_registration {
    use super::*;

    #[tokio::test]
    async fn deletes_by_device_id() {
        let server = MockServer::start().await;
        let device = registered_device();

        Mock::given(method("DELETE"))
            .and(path("/push/deviceRegistrations"))
            .and(query_param("deviceId", device.id()))
            .and(bearer_token("identity-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server)
            .remove_registration(&device)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn already_absent_counts_as_removed() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "message": "Not found", "code": 40400, "statusCode": 404 }
            })))
            .mount(&server)
            .await;

        transport(&server)
            .remove_registration(&registered_device())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = transport(&server)
            .remove_registration(&registered_device())
            .await
            .unwrap_err();

        assert_eq!(err.status_code, Some(500));
    }
}

// ============================================================================
// Network failures
// ============================================================================

#[tokio::test]
async fn unreachable_host_maps_to_internal_error() {
    // Port 9 (discard) is closed on test hosts
    let transport =
        HttpRegistrationTransport::from_config(HttpConfig::new("http://127.0.0.1:9")).unwrap();
    let err = transport
        .create_registration(&device_with_token())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorInfo::INTERNAL_ERROR);
    assert_eq!(err.status_code, Some(500));
}
