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

//! Low-level HTTP utilities.
//!
//! [HttpClient](struct.HttpClient.html) performs exactly one HTTP exchange:
//! it serializes the JSON body, sets the standard headers, parses the
//! response and converts error statuses into [Error](../struct.Error.html).
//! Requests and responses are logged with credentials redacted when HTTP
//! logging is enabled.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, trace};
use md5::{Digest, Md5};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{Error, ErrorKind, Result};

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("cinderclient-rust/", env!("CARGO_PKG_VERSION"));

const SENSITIVE_HEADERS: &[&str] = &["x-auth-token", "x-subject-token", "x-auth-key"];

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "adminPass",
    "admin_pass",
    "admin_password",
    "auth_key",
    "secret",
];

const MASK: &str = "***";

/// Options of the underlying HTTP client.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// Path to an additional CA certificate (PEM).
    pub cacert: Option<PathBuf>,
    /// Timeout for each request.
    pub timeout: Option<Duration>,
    /// Log requests and responses at debug level.
    pub http_log_debug: bool,
    /// Override the user agent.
    pub user_agent: Option<String>,
}

/// HTTP client performing single JSON exchanges.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    user_agent: String,
    http_log_debug: bool,
}

/// A single HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// Additional headers.
    pub headers: Vec<(String, String)>,
    /// JSON body (if any).
    pub body: Option<Value>,
    /// Whether to convert status >= 400 into an error.
    pub raise_errors: bool,
}

/// A normalized HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body text.
    pub text: String,
    /// Parsed JSON body, `None` if empty or not JSON.
    pub body: Option<Value>,
}

impl HttpClient {
    /// Create a new client with the given options.
    pub fn new(options: TransportOptions) -> Result<HttpClient> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        builder = configure_tls(builder, &options)?;

        Ok(HttpClient {
            inner: builder.build()?,
            user_agent: options
                .user_agent
                .unwrap_or_else(|| String::from(DEFAULT_USER_AGENT)),
            http_log_debug: options.http_log_debug,
        })
    }

    /// Whether requests and responses are logged.
    #[inline]
    pub fn http_log_debug(&self) -> bool {
        self.http_log_debug
    }

    /// Send a request and normalize the result.
    pub async fn send(&self, request: Request) -> Result<Response> {
        let mut headers = vec![
            (String::from("User-Agent"), self.user_agent.clone()),
            (String::from("Accept"), String::from("application/json")),
        ];
        let payload = match request.body {
            Some(ref body) => {
                headers.push((String::from("Content-Type"), String::from("application/json")));
                Some(serde_json::to_string(body)?)
            }
            None => None,
        };
        headers.extend(request.headers.iter().cloned());

        if self.http_log_debug {
            debug!(
                "{}",
                format_request(&request.method, &request.url, &headers, request.body.as_ref())
            );
        }

        let mut builder = self.inner.request(request.method.clone(), request.url.clone());
        for (name, value) in &headers {
            let hdr_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::new(ErrorKind::ProtocolError, format!("Invalid header name {}: {}", name, e))
            })?;
            let hdr_value = HeaderValue::from_str(value).map_err(|_| {
                Error::new(ErrorKind::ProtocolError, format!("Invalid value for header {}", name))
            })?;
            builder = builder.header(hdr_name, hdr_value);
        }
        if let Some(payload) = payload {
            builder = builder.body(payload);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let text = resp.text().await?;
        let body = parse_body(&text);

        if self.http_log_debug {
            debug!("{}", format_response(status, &resp_headers, &text));
        }

        if request.raise_errors && (status.is_client_error() || status.is_server_error()) {
            return Err(Error::from_response(status, &resp_headers, body.as_ref(), &text));
        }

        Ok(Response {
            status,
            headers: resp_headers,
            text,
            body,
        })
    }
}

#[cfg(any(feature = "native-tls", feature = "rustls"))]
fn configure_tls(mut builder: ClientBuilder, options: &TransportOptions) -> Result<ClientBuilder> {
    if options.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ref path) = options.cacert {
        let pem = std::fs::read(path).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot read CA certificate {}: {}", path.display(), e),
            )
        })?;
        builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
    }

    Ok(builder)
}

#[cfg(not(any(feature = "native-tls", feature = "rustls")))]
fn configure_tls(builder: ClientBuilder, options: &TransportOptions) -> Result<ClientBuilder> {
    if options.insecure || options.cacert.is_some() {
        log::warn!("TLS options are ignored: built without TLS support");
    }
    Ok(builder)
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Could not decode response body as JSON: {}", e);
            None
        }
    }
}

impl Request {
    /// Start a request.
    pub fn new(method: Method, url: Url) -> Request {
        Request {
            method,
            url,
            headers: Vec::new(),
            body: None,
            raise_errors: true,
        }
    }

    /// Add a JSON body.
    pub fn with_body(mut self, body: Value) -> Request {
        self.body = Some(body);
        self
    }

    /// Add a header.
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Request {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Return responses with status >= 400 instead of failing.
    pub fn without_raising_errors(mut self) -> Request {
        self.raise_errors = false;
        self
    }
}

impl Response {
    /// Get a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Request ID returned by the server.
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-openstack-request-id")
            .or_else(|| self.header("x-compute-request-id"))
    }

    /// Deserialize the JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self.body {
            Some(ref body) => {
                trace!("Deserializing {}", body);
                Ok(T::deserialize(body)?)
            }
            None => Err(Error::new(
                ErrorKind::InvalidResponse,
                format!("Expected a JSON body in response with status {}", self.status),
            )),
        }
    }
}

/// Redact a header value if it carries credentials.
pub fn safe_header(name: &str, value: &str) -> String {
    if SENSITIVE_HEADERS
        .iter()
        .any(|hdr| hdr.eq_ignore_ascii_case(name))
    {
        hashed(value)
    } else {
        value.to_string()
    }
}

fn hashed(value: &str) -> String {
    format!("{{MD5}}{}", hex::encode(Md5::digest(value.as_bytes())))
}

/// Mask passwords and hash tokens inside a JSON document.
pub fn mask_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    let masked = if SENSITIVE_KEYS.contains(&key.as_str()) && !item.is_null() {
                        Value::String(String::from(MASK))
                    } else if key == "token" {
                        mask_token(item)
                    } else {
                        mask_sensitive(item)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_sensitive).collect()),
        other => other.clone(),
    }
}

fn mask_token(value: &Value) -> Value {
    match value {
        Value::String(token) => Value::String(hashed(token)),
        Value::Object(map) => {
            let mut result = match mask_sensitive(value) {
                Value::Object(masked) => masked,
                _ => Map::new(),
            };
            if let Some(Value::String(id)) = map.get("id") {
                let _ = result.insert(String::from("id"), Value::String(hashed(id)));
            }
            Value::Object(result)
        }
        other => mask_sensitive(other),
    }
}

/// Render a request as a curl command line with credentials redacted.
pub fn format_request(
    method: &Method,
    url: &Url,
    headers: &[(String, String)],
    body: Option<&Value>,
) -> String {
    let mut parts = vec![
        String::from("curl -g -i"),
        format!("'{}'", url),
        format!("-X {}", method),
    ];
    for (name, value) in headers {
        parts.push(format!("-H \"{}: {}\"", name, safe_header(name, value)));
    }
    if let Some(body) = body {
        parts.push(format!("-d '{}'", mask_sensitive(body)));
    }
    format!("REQ: {}", parts.join(" "))
}

/// Render a response with credentials redacted.
pub fn format_response(status: StatusCode, headers: &HeaderMap, text: &str) -> String {
    let rendered: Vec<String> = headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            format!("{}: {}", name, safe_header(name.as_str(), value))
        })
        .collect();
    let body = match serde_json::from_str::<Value>(text) {
        Ok(value) => mask_sensitive(&value).to_string(),
        Err(_) => text.to_string(),
    };
    format!(
        "RESP: [{}] {{{}}}\nRESP BODY: {}",
        status.as_u16(),
        rendered.join(", "),
        body
    )
}

#[cfg(test)]
mod test {
    #![allow(unused_results)]

    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::{Method, StatusCode, Url};
    use serde_json::json;

    use super::{format_request, format_response, mask_sensitive, parse_body, safe_header};

    #[test]
    fn test_safe_header_hashes_tokens() {
        let value = safe_header("X-Auth-Token", "MY_SECRET_AUTH_TOKEN");
        assert!(value.starts_with("{MD5}"));
        assert_eq!(value.len(), 5 + 32);
        assert!(!value.contains("MY_SECRET_AUTH_TOKEN"));
        assert_eq!(value, safe_header("x-auth-token", "MY_SECRET_AUTH_TOKEN"));
        assert_eq!(safe_header("Accept", "application/json"), "application/json");
    }

    #[test]
    fn test_format_request_redacts() {
        let url = Url::parse("http://example.com/v2.0/tokens").unwrap();
        let headers = vec![
            (String::from("X-Auth-Token"), String::from("MY_SECRET_AUTH_TOKEN")),
            (String::from("X-Auth-Key"), String::from("fakePassword")),
        ];
        let body = json!({
            "auth": {
                "tenantName": "fakeService",
                "passwordCredentials": {"username": "fakeUser", "password": "fakePassword"}
            }
        });
        let line = format_request(&Method::POST, &url, &headers, Some(&body));
        assert!(line.starts_with("REQ: curl -g -i 'http://example.com/v2.0/tokens' -X POST"));
        assert!(line.contains("fakeUser"));
        assert!(!line.contains("fakePassword"));
        assert!(!line.contains("MY_SECRET_AUTH_TOKEN"));
        assert!(line.contains("\"password\":\"***\""));
    }

    #[test]
    fn test_format_response_redacts() {
        let mut headers = HeaderMap::new();
        headers.insert("x-subject-token", HeaderValue::from_static("SUBJECT_TOKEN"));
        let text = json!({"access": {"token": {"id": "RESP_TOKEN_ID", "expires": "2030-01-01"}}})
            .to_string();
        let line = format_response(StatusCode::OK, &headers, &text);
        assert!(line.starts_with("RESP: [200]"));
        assert!(!line.contains("SUBJECT_TOKEN"));
        assert!(!line.contains("RESP_TOKEN_ID"));
        assert!(line.contains("2030-01-01"));
    }

    #[test]
    fn test_mask_sensitive_nested() {
        let body = json!({"os-volume_upload_image": {"secret": "s3cr3t", "items": [{"auth_key": "k"}]}});
        let masked = mask_sensitive(&body);
        assert_eq!(
            masked,
            json!({"os-volume_upload_image": {"secret": "***", "items": [{"auth_key": "***"}]}})
        );
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), None);
        assert_eq!(parse_body("  \n"), None);
        assert_eq!(parse_body("<html>oops</html>"), None);
        assert_eq!(parse_body("{\"a\": 1}"), Some(json!({"a": 1})));
    }
}
