// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Once;
use std::time::Duration;

use cinderclient::auth::{AuthMethod, PasswordAuth, MAX_REDIRECTS};
use cinderclient::http::{HttpClient, TransportOptions};
use cinderclient::{ApiVersion, Client, ErrorKind, Session};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn set_up() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn http() -> HttpClient {
    HttpClient::new(TransportOptions::default()).expect("Cannot create an HTTP client")
}

fn legacy_auth(server: &MockServer) -> PasswordAuth {
    PasswordAuth::new(format!("{}/auth/v1.0", server.uri()), "admin", "pa$$w0rd")
        .expect("Invalid auth URL")
        .with_project_name("demo")
}

fn identity_auth(server: &MockServer) -> PasswordAuth {
    PasswordAuth::new(format!("{}/v2.0", server.uri()), "admin", "pa$$w0rd")
        .expect("Invalid auth URL")
        .with_project_name("demo")
}

fn legacy_success(server: &MockServer) -> ResponseTemplate {
    ResponseTemplate::new(204)
        .insert_header("x-server-management-url", format!("{}/v3/p1/", server.uri()).as_str())
        .insert_header("x-auth-token", "tok")
}

#[tokio::test]
async fn test_legacy_headers() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1.0"))
        .and(header("X-Auth-User", "admin"))
        .and(header("X-Auth-Key", "pa$$w0rd"))
        .and(header("X-Auth-Project-Id", "demo"))
        .respond_with(legacy_success(&server))
        .expect(1)
        .mount(&server)
        .await;

    let state = legacy_auth(&server)
        .authenticate(&http())
        .await
        .expect("Authentication failed");
    assert_eq!(state.management_url.as_str(), format!("{}/v3/p1", server.uri()));
    assert_eq!(state.token.as_deref(), Some("tok"));
    assert!(state
        .headers
        .contains(&(String::from("X-Auth-Project-Id"), String::from("demo"))));
}

#[tokio::test]
async fn test_legacy_missing_headers_falls_back() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1.0/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": {
                "token": {"id": "token2"},
                "serviceCatalog": [{
                    "type": "volumev3",
                    "name": "cinderv3",
                    "endpoints": [{"publicURL": format!("{}/v3/p2", server.uri())}]
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = legacy_auth(&server)
        .authenticate(&http())
        .await
        .expect("Authentication failed");
    assert_eq!(state.management_url.as_str(), format!("{}/v3/p2", server.uri()));
    assert_eq!(state.token.as_deref(), Some("token2"));
}

#[tokio::test]
async fn test_redirect_followed() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1.0"))
        .respond_with(
            ResponseTemplate::new(305)
                .insert_header("location", format!("{}/other/v1.0", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/other/v1.0"))
        .respond_with(legacy_success(&server))
        .expect(1)
        .mount(&server)
        .await;

    let state = legacy_auth(&server)
        .authenticate(&http())
        .await
        .expect("Authentication failed");
    assert_eq!(state.token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_too_many_redirects() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(
            ResponseTemplate::new(305)
                .insert_header("location", format!("{}/v2.0", server.uri()).as_str()),
        )
        .expect(MAX_REDIRECTS as u64 + 1)
        .mount(&server)
        .await;

    let err = identity_auth(&server)
        .authenticate(&http())
        .await
        .expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::AuthorizationFailure);
}

#[tokio::test]
async fn test_rejected_credentials_not_retried() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(identity_auth(&server), http())
        .with_retries(3)
        .with_backoff(Duration::from_millis(1));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
}

#[tokio::test]
async fn test_identity_outage_not_retried() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(identity_auth(&server), http())
        .with_retries(2)
        .with_backoff(Duration::from_millis(1));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::InternalServerError);
}
