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

use tokio::time::Instant;

use cinderclient::auth::{AuthMethod, EndpointFilters, NoAuth, PasswordAuth, TokenAuth};
use cinderclient::block_storage::VolumeCreate;
use cinderclient::common::ListOptions;
use cinderclient::http::{HttpClient, TransportOptions};
use cinderclient::{ApiVersion, Client, ErrorKind, Session};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
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

fn catalog_record(server: &MockServer, regions: &[&str]) -> Value {
    let endpoints: Vec<Value> = regions
        .iter()
        .map(|region| {
            json!({
                "region": region,
                "publicURL": format!("{}/{}/v2/p1/", server.uri(), region),
                "internalURL": format!("{}/{}/internal/v2/p1", server.uri(), region),
            })
        })
        .collect();
    json!({
        "access": {
            "token": {"id": "token1"},
            "serviceCatalog": [
                {"type": "volumev2", "name": "cinderv2", "endpoints": endpoints},
                {"type": "compute", "name": "nova", "endpoints": []}
            ]
        }
    })
}

async fn mount_tokens(server: &MockServer, regions: &[&str], times: u64) {
    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .and(body_json(json!({
            "auth": {
                "passwordCredentials": {"username": "admin", "password": "pa$$w0rd"},
                "tenantName": "demo"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_record(server, regions)))
        .expect(times)
        .mount(server)
        .await;
}

fn password_auth(server: &MockServer) -> PasswordAuth {
    PasswordAuth::new(format!("{}/v2.0", server.uri()), "admin", "pa$$w0rd")
        .expect("Invalid auth URL")
        .with_project_name("demo")
        .with_filters(EndpointFilters::new("volumev2"))
}

fn volume(id: &str) -> Value {
    json!({"id": id, "name": null, "status": "available", "size": 1})
}

#[tokio::test]
async fn test_catalog_region_selection() {
    set_up();
    let server = MockServer::start().await;
    mount_tokens(&server, &["RegionOne", "RegionTwo"], 1).await;

    let auth = password_auth(&server).with_region("RegionTwo");
    let state = auth.authenticate(&http()).await.expect("Authentication failed");
    assert_eq!(
        state.management_url.as_str(),
        format!("{}/RegionTwo/v2/p1", server.uri())
    );
    assert_eq!(state.token.as_deref(), Some("token1"));
}

#[tokio::test]
async fn test_catalog_ambiguous_endpoints() {
    set_up();
    let server = MockServer::start().await;
    mount_tokens(&server, &["RegionOne", "RegionTwo"], 1).await;

    let err = password_auth(&server)
        .authenticate(&http())
        .await
        .expect_err("Several endpoints must not be accepted");
    assert_eq!(err.kind(), ErrorKind::AmbiguousEndpoints);
}

#[tokio::test]
async fn test_retries_exhausted() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/1234"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "serviceUnavailable": {"message": "Try again", "code": 503}
        })))
        .expect(3)
        .mount(&server)
        .await;

    let auth = NoAuth::new(format!("{}/v3/p1", server.uri())).unwrap();
    let session = Session::new(auth, http())
        .with_retries(2)
        .with_backoff(Duration::from_millis(1));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::InternalServerError);
    assert_eq!(err.message(), Some("Try again"));
}

#[tokio::test]
async fn test_reauthentication_once() {
    set_up();
    let server = MockServer::start().await;
    mount_tokens(&server, &["RegionOne"], 2).await;
    Mock::given(method("GET"))
        .and(path("/RegionOne/v2/p1/volumes/1234"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/RegionOne/v2/p1/volumes/1234"))
        .and(header("X-Auth-Token", "token1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"volume": volume("1234")})))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(password_auth(&server), http());
    let client = Client::new(session, ApiVersion(2, 0)).unwrap();

    let found = client.volumes().get("1234").await.expect("Request failed");
    assert_eq!(found.id().as_deref(), Some("1234"));
}

#[tokio::test]
async fn test_two_unauthorized_fail() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/1234"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let auth = NoAuth::new(format!("{}/v3/p1", server.uri())).unwrap();
    let session = Session::new(auth, http())
        .with_retries(3)
        .with_backoff(Duration::from_millis(1));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
}

#[tokio::test]
async fn test_volume_create_then_get() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/p1/volumes"))
        .and(header("OpenStack-API-Version", "volume 3.0"))
        .and(body_json(json!({
            "volume": {
                "size": 1,
                "consistencygroup_id": null,
                "snapshot_id": null,
                "name": null,
                "description": null,
                "volume_type": null,
                "user_id": null,
                "project_id": null,
                "availability_zone": null,
                "status": "creating",
                "attach_status": "detached",
                "metadata": {},
                "imageRef": null,
                "source_volid": null,
                "source_replica": null,
                "backup_id": null,
                "multiattach": false
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"volume": volume("v1")})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"volume": volume("v1")})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = NoAuth::new(format!("{}/v3/p1", server.uri())).unwrap();
    let client = Client::new(Session::new(auth, http()), ApiVersion(3, 0)).unwrap();

    let created = client
        .volumes()
        .create(&VolumeCreate::new(Some(1)))
        .await
        .expect("Cannot create a volume");
    let id = created.id().expect("No ID");
    let fetched = client.volumes().get(&id).await.expect("Cannot get a volume");
    assert_eq!(fetched.id(), Some(id));
}

#[tokio::test]
async fn test_list_follows_next_links() {
    set_up();
    let server = MockServer::start().await;
    let next = format!("{}/v3/p1/volumes/detail?marker=2", server.uri());
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/detail"))
        .and(wiremock::matchers::query_param("marker", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "volumes": [volume("3")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "volumes": [volume("1"), volume("2")],
            "volumes_links": [{"rel": "next", "href": next}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = NoAuth::new(format!("{}/v3/p1", server.uri())).unwrap();
    let client = Client::new(Session::new(auth, http()), ApiVersion(3, 0)).unwrap();

    let volumes = client
        .volumes()
        .list(&ListOptions::new())
        .await
        .expect("Cannot list volumes");
    let ids: Vec<String> = volumes.iter().filter_map(|v| v.id()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_not_implemented_is_retried() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/1234"))
        .respond_with(ResponseTemplate::new(501))
        .expect(3)
        .mount(&server)
        .await;

    let auth = NoAuth::new(format!("{}/v3/p1", server.uri())).unwrap();
    let session = Session::new(auth, http())
        .with_retries(2)
        .with_backoff(Duration::from_millis(1));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/1234"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let auth = NoAuth::new(format!("{}/v3/p1", server.uri())).unwrap();
    let session = Session::new(auth, http())
        .with_retries(2)
        .with_backoff(Duration::from_millis(1));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delays_double() {
    set_up();
    // Nothing listens on port 1, every attempt is a connection error.
    let auth = NoAuth::new("http://127.0.0.1:1/v3/p1").unwrap();
    let session = Session::new(auth, http())
        .with_retries(3)
        .with_backoff(Duration::from_secs(1));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let start = Instant::now();
    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::ConnectionError);
    assert!(err.to_string().contains("Unable to establish connection"));
    assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 4));
}

#[tokio::test(start_paused = true)]
async fn test_local_errors_are_not_retried() {
    set_up();
    let auth = TokenAuth::new("bad\ntoken", "http://127.0.0.1:1/v3/p1").unwrap();
    let session = Session::new(auth, http())
        .with_retries(3)
        .with_backoff(Duration::from_secs(60));
    let client = Client::new(session, ApiVersion(3, 0)).unwrap();

    let start = Instant::now();
    let err = client.volumes().get("1234").await.expect_err("Must fail");
    assert_eq!(err.kind(), ErrorKind::ProtocolError);
    assert_eq!(start.elapsed(), Duration::ZERO);
}
