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

//! Password authentication against the Identity service.

use std::fmt;

use async_trait::async_trait;
use chrono::DateTime;
use log::{debug, info, warn};
use reqwest::{Method, Url};
use static_assertions::assert_impl_all;

use super::base::{AuthMethod, AuthState};
use super::catalog::{EndpointFilters, EndpointType, ServiceCatalog};
use super::{protocol, MAX_REDIRECTS};
use crate::http::{HttpClient, Request, Response};
use crate::{Error, ErrorKind, Result};

/// Password authentication using either the legacy header scheme or
/// Identity v2.
#[derive(Clone)]
pub struct PasswordAuth {
    auth_url: Url,
    username: String,
    password: String,
    project_name: Option<String>,
    project_id: Option<String>,
    filters: EndpointFilters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Legacy,
    Identity,
}

enum Step {
    Done(AuthState),
    Redirect(Url),
}

fn authorization_failure<S: Into<String>>(message: S) -> Error {
    Error::new(ErrorKind::AuthorizationFailure, message)
}

fn join_path(url: &Url, suffix: &str) -> Result<Url> {
    let joined = format!("{}/{}", url.as_str().trim_end_matches('/'), suffix);
    Url::parse(&joined)
        .map_err(|e| Error::new(ErrorKind::ProtocolError, format!("Invalid URL {}: {}", joined, e)))
}

fn redirect(url: &Url, resp: &Response) -> Result<Step> {
    let location = resp
        .header("location")
        .ok_or_else(|| authorization_failure("Redirect response without a Location header"))?;
    let target = url.join(location).map_err(|e| {
        authorization_failure(format!("Invalid redirect location {}: {}", location, e))
    })?;
    debug!("Authentication redirected from {} to {}", url, target);
    Ok(Step::Redirect(target))
}

impl PasswordAuth {
    /// Create password authentication.
    pub fn new<U, S1, S2>(auth_url: U, username: S1, password: S2) -> Result<PasswordAuth>
    where
        U: AsRef<str>,
        S1: Into<String>,
        S2: Into<String>,
    {
        let raw = auth_url.as_ref().trim_end_matches('/');
        let auth_url = Url::parse(raw)
            .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("Invalid auth_url: {}", e)))?;
        Ok(PasswordAuth {
            auth_url,
            username: username.into(),
            password: password.into(),
            project_name: None,
            project_id: None,
            filters: EndpointFilters::default(),
        })
    }

    /// Scope to a project by its name.
    pub fn with_project_name<S: Into<String>>(mut self, name: S) -> PasswordAuth {
        self.project_name = Some(name.into());
        self
    }

    /// Scope to a project by its ID.
    pub fn with_project_id<S: Into<String>>(mut self, id: S) -> PasswordAuth {
        self.project_id = Some(id.into());
        self
    }

    /// Set endpoint filters used with the service catalog.
    pub fn with_filters(mut self, filters: EndpointFilters) -> PasswordAuth {
        self.filters = filters;
        self
    }

    /// Filter the service catalog by region.
    pub fn with_region<S: Into<String>>(mut self, region: S) -> PasswordAuth {
        self.filters.region = Some(region.into());
        self
    }

    /// Use the given endpoint type from the service catalog.
    pub fn with_endpoint_type(mut self, endpoint_type: EndpointType) -> PasswordAuth {
        self.filters.endpoint_type = endpoint_type;
        self
    }

    /// Authentication URL.
    #[inline]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Endpoint filters.
    #[inline]
    pub fn filters(&self) -> &EndpointFilters {
        &self.filters
    }

    /// Identity version from the first path segment starting with `v`.
    pub fn identity_version(&self) -> Option<&str> {
        self.auth_url
            .path_segments()
            .and_then(|mut segments| segments.find(|part| part.starts_with('v')))
    }

    async fn follow(&self, client: &HttpClient, scheme: Scheme, start: Url) -> Result<AuthState> {
        let mut url = start;
        for _ in 0..=MAX_REDIRECTS {
            let step = match scheme {
                Scheme::Legacy => self.legacy_auth(client, url.clone()).await?,
                Scheme::Identity => self.identity_auth(client, url.clone()).await?,
            };
            match step {
                Step::Done(state) => return Ok(state),
                Step::Redirect(next) => url = next,
            }
        }

        Err(authorization_failure(format!(
            "Too many redirects (more than {}) while authenticating",
            MAX_REDIRECTS
        )))
    }

    async fn legacy_auth(&self, client: &HttpClient, url: Url) -> Result<Step> {
        let mut request = Request::new(Method::GET, url.clone())
            .with_header("X-Auth-User", self.username.clone())
            .with_header("X-Auth-Key", self.password.clone())
            .without_raising_errors();
        if let Some(project) = self.project_name.as_ref().or(self.project_id.as_ref()) {
            request = request.with_header("X-Auth-Project-Id", project.clone());
        }

        let resp = client.send(request).await?;
        match resp.status.as_u16() {
            200 | 204 => {
                let management_url = resp
                    .header("x-server-management-url")
                    .ok_or_else(|| authorization_failure("Missing X-Server-Management-Url header"))?;
                let token = resp
                    .header("x-auth-token")
                    .ok_or_else(|| authorization_failure("Missing X-Auth-Token header"))?;
                let management_url = Url::parse(management_url.trim_end_matches('/'))
                    .map_err(|e| {
                        authorization_failure(format!("Invalid management URL received: {}", e))
                    })?;
                Ok(Step::Done(self.project_headers(
                    AuthState::new(management_url).with_token(token),
                )))
            }
            305 => redirect(&url, &resp),
            _ => Err(Error::from_response(resp.status, &resp.headers, resp.body.as_ref(), &resp.text)),
        }
    }

    async fn identity_auth(&self, client: &HttpClient, url: Url) -> Result<Step> {
        let body = protocol::AuthRoot {
            auth: protocol::Auth {
                password_credentials: protocol::PasswordCredentials {
                    username: self.username.clone(),
                    password: self.password.clone(),
                },
                tenant_name: self.project_name.clone(),
                tenant_id: if self.project_name.is_none() {
                    self.project_id.clone()
                } else {
                    None
                },
            },
        };

        let request = Request::new(Method::POST, join_path(&url, "tokens")?)
            .with_body(serde_json::to_value(&body)?)
            .without_raising_errors();
        let resp = client.send(request).await?;
        match resp.status.as_u16() {
            200 => {
                let body = resp
                    .body
                    .clone()
                    .ok_or_else(|| authorization_failure("Identity service returned no body"))?;
                let root: protocol::AccessRoot = serde_json::from_value(body).map_err(|e| {
                    authorization_failure(format!("Malformed Identity response: {}", e))
                })?;
                let access = root.access;
                let expires_at = access.token.expires.as_ref().and_then(|value| {
                    DateTime::parse_from_rfc3339(value)
                        .map_err(|e| warn!("Cannot parse token expiration time {}: {}", value, e))
                        .ok()
                });

                let catalog = ServiceCatalog::new(access.service_catalog);
                let management_url = catalog.find_endpoint(&self.filters)?;
                Ok(Step::Done(self.project_headers(
                    AuthState::new(management_url)
                        .with_token(access.token.id)
                        .with_expiry(expires_at),
                )))
            }
            305 => redirect(&url, &resp),
            _ => Err(Error::from_response(resp.status, &resp.headers, resp.body.as_ref(), &resp.text)),
        }
    }

    fn project_headers(&self, state: AuthState) -> AuthState {
        match self.project_name.as_ref().or(self.project_id.as_ref()) {
            Some(project) => state.with_header("X-Auth-Project-Id", project.clone()),
            None => state,
        }
    }
}

#[async_trait]
impl AuthMethod for PasswordAuth {
    async fn authenticate(&self, client: &HttpClient) -> Result<AuthState> {
        let state = if self.identity_version() == Some("v2.0") {
            self.follow(client, Scheme::Identity, self.auth_url.clone()).await?
        } else {
            match self.follow(client, Scheme::Legacy, self.auth_url.clone()).await {
                Err(err) if err.kind() == ErrorKind::AuthorizationFailure => {
                    let fallback = if self.auth_url.as_str().contains("v2.0") {
                        self.auth_url.clone()
                    } else {
                        join_path(&self.auth_url, "v2.0")?
                    };
                    debug!("Legacy authentication failed ({}), trying {}", err, fallback);
                    self.follow(client, Scheme::Identity, fallback).await?
                }
                other => other?,
            }
        };

        info!(
            "Authenticated user {} against {}, management URL {}",
            self.username, self.auth_url, state.management_url
        );
        Ok(state)
    }
}

assert_impl_all!(PasswordAuth: Send, Sync);

impl fmt::Debug for PasswordAuth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PasswordAuth")
            .field("auth_url", &self.auth_url.as_str())
            .field("username", &self.username)
            .field("password", &"***")
            .field("project_name", &self.project_name)
            .field("project_id", &self.project_id)
            .field("filters", &self.filters)
            .finish()
    }
}

#[cfg(test)]
pub mod test {
    use super::{join_path, PasswordAuth};

    #[test]
    fn test_identity_version() {
        let auth = PasswordAuth::new("http://127.0.0.1:5000/v2.0/", "user", "pass").unwrap();
        assert_eq!(auth.identity_version(), Some("v2.0"));
        assert_eq!(auth.auth_url().as_str(), "http://127.0.0.1:5000/v2.0");

        let auth = PasswordAuth::new("http://127.0.0.1:8080/identity/v1.0", "user", "pass").unwrap();
        assert_eq!(auth.identity_version(), Some("v1.0"));

        let auth = PasswordAuth::new("http://127.0.0.1:5000", "user", "pass").unwrap();
        assert_eq!(auth.identity_version(), None);
    }

    #[test]
    fn test_new_invalid_url() {
        assert!(PasswordAuth::new("foo bar", "user", "pass").is_err());
    }

    #[test]
    fn test_join_path() {
        let url = url("http://127.0.0.1:5000/v2.0/");
        assert_eq!(join_path(&url, "tokens").unwrap().as_str(), "http://127.0.0.1:5000/v2.0/tokens");
    }

    #[test]
    fn test_debug_hides_password() {
        let auth = PasswordAuth::new("http://127.0.0.1:5000/v2.0", "user", "s3cr3t")
            .unwrap()
            .with_project_name("demo");
        let dbg = format!("{:?}", auth);
        assert!(!dbg.contains("s3cr3t"));
        assert!(dbg.contains("demo"));
    }

    fn url(value: &str) -> reqwest::Url {
        reqwest::Url::parse(value).unwrap()
    }
}
