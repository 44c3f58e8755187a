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

use cinderclient::shell::main_with;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn set_up() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

struct Output {
    code: i32,
    stdout: String,
    stderr: String,
}

async fn cinder(server: &MockServer, command: &[&str]) -> Output {
    let endpoint = format!("{}/v3/p1", server.uri());
    let mut args = vec![
        "cinder",
        "--os-auth-token",
        "token1",
        "--bypass-url",
        endpoint.as_str(),
    ];
    args.extend_from_slice(command);

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = main_with(args, &|_| None, &mut stdout, &mut stderr).await;
    Output {
        code,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    }
}

#[tokio::test]
async fn test_list() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/detail"))
        .and(header("X-Auth-Token", "token1"))
        .and(header("OpenStack-API-Version", "volume 3.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "volumes": [{
                "id": "5678",
                "status": "in-use",
                "name": "data",
                "size": 10,
                "volume_type": "lvm",
                "bootable": "false",
                "attachments": [{"server_id": "srv1"}, {"server_id": "srv2"}]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = cinder(&server, &["list"]).await;
    assert_eq!(output.code, 0, "{}", output.stderr);
    let header_line = output
        .stdout
        .lines()
        .find(|line| line.contains("ID"))
        .expect("No header row");
    let titles: Vec<&str> = header_line
        .split('|')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .collect();
    assert_eq!(
        titles,
        vec!["ID", "Status", "Name", "Size", "Volume Type", "Bootable", "Attached to"]
    );
    assert!(output.stdout.contains("srv1,srv2"));
}

#[tokio::test]
async fn test_delete() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "volume": {"id": "1234", "status": "available", "name": null}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v3/p1/volumes/1234"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let output = cinder(&server, &["delete", "1234"]).await;
    assert_eq!(output.code, 0, "{}", output.stderr);
    assert!(output
        .stdout
        .contains("Request to delete volume 1234 has been accepted."));
}

#[tokio::test]
async fn test_show_not_found() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/p1/volumes/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"volumes": []})))
        .expect(1)
        .mount(&server)
        .await;

    let output = cinder(&server, &["show", "missing"]).await;
    assert_eq!(output.code, 1);
    assert!(output.stderr.starts_with("ERROR: "), "{}", output.stderr);
    assert!(output.stderr.contains("missing"));
}

#[tokio::test]
async fn test_malformed_flag() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let output = cinder(&server, &["list", "--no-such-flag"]).await;
    assert_eq!(output.code, 2);
    assert!(!output.stderr.is_empty());
}

#[tokio::test]
async fn test_command_too_new() {
    set_up();
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let output = cinder(&server, &["group-list"]).await;
    assert_eq!(output.code, 1);
    assert!(output.stderr.contains("3.13"), "{}", output.stderr);
}
