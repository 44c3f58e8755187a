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

//! Session structure definition.
//!
//! The Session object serves as a wrapper around an HTTP(s) client, handling
//! authentication, token refresh and retries of transient failures.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use static_assertions::assert_impl_all;
use tokio::sync::RwLock;

use crate::auth::{AuthMethod, AuthState};
use crate::common::{ApiVersion, VolumeApi};
use crate::http::{HttpClient, Request, Response};
use crate::utils::Query;
use crate::{Error, ErrorKind, Result};

/// Callback modifying a request body before it is sent.
pub type BodyHook = Arc<dyn Fn(&mut Value) + Send + Sync>;

/// Point at which a body hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Creating a resource.
    Create,
    /// Updating a resource.
    Update,
    /// Calling a resource action.
    Action,
}

/// Default delay before the first retry.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// An authenticated API session.
///
/// Cloning is cheap, clones share the authentication state.
#[derive(Clone)]
pub struct Session {
    client: HttpClient,
    auth: Arc<dyn AuthMethod>,
    state: Arc<RwLock<Option<AuthState>>>,
    retries: u32,
    backoff: Duration,
    bypass_url: Option<Url>,
    version_header: Option<(String, String)>,
    hooks: Vec<(HookPoint, BodyHook)>,
}

/// Exponentially growing delays.
#[derive(Debug, Clone)]
struct Backoff {
    next: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current.saturating_mul(2);
        Some(current)
    }
}

/// Bad requests, server errors, connection failures and timeouts.
fn is_transient(err: &Error) -> bool {
    match err.status() {
        Some(status) => status == StatusCode::BAD_REQUEST || status.is_server_error(),
        None => matches!(
            err.kind(),
            ErrorKind::ConnectionError | ErrorKind::OperationTimedOut
        ),
    }
}

impl Session {
    /// Create a new session with a given authentication plugin.
    pub fn new<Auth: AuthMethod + 'static>(auth_method: Auth, client: HttpClient) -> Session {
        Session::from_arc(Arc::new(auth_method), client)
    }

    /// Create a new session from a boxed authentication plugin.
    pub fn from_boxed(auth_method: Box<dyn AuthMethod>, client: HttpClient) -> Session {
        Session::from_arc(Arc::from(auth_method), client)
    }

    fn from_arc(auth: Arc<dyn AuthMethod>, client: HttpClient) -> Session {
        Session {
            client,
            auth,
            state: Arc::new(RwLock::new(None)),
            retries: 0,
            backoff: DEFAULT_BACKOFF,
            bypass_url: None,
            version_header: None,
            hooks: Vec::new(),
        }
    }

    /// Set the number of retries of transient failures (0 by default).
    pub fn with_retries(mut self, retries: u32) -> Session {
        self.retries = retries;
        self
    }

    /// Set the delay before the first retry. It doubles on each attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Session {
        self.backoff = backoff;
        self
    }

    /// Use this URL instead of the one received from authentication.
    pub fn with_bypass_url(mut self, url: Url) -> Session {
        self.bypass_url = Some(url);
        self
    }

    /// Send the microversion header appropriate for the API.
    pub fn with_api_version(mut self, api: VolumeApi, version: ApiVersion) -> Session {
        self.version_header = api.version_header(version);
        self
    }

    /// Register a body hook.
    pub fn with_hook<F>(mut self, point: HookPoint, hook: F) -> Session
    where
        F: Fn(&mut Value) + Send + Sync + 'static,
    {
        self.hooks.push((point, Arc::new(hook)));
        self
    }

    /// Run all hooks registered for the point.
    pub fn run_hooks(&self, point: HookPoint, body: &mut Value) {
        for (hook_point, hook) in &self.hooks {
            if *hook_point == point {
                hook(body);
            }
        }
    }

    /// Number of retries of transient failures.
    #[inline]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Underlying HTTP client.
    #[inline]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Authentication method.
    #[inline]
    pub fn auth_method(&self) -> &dyn AuthMethod {
        self.auth.as_ref()
    }

    /// Drop the cached authentication state.
    pub async fn invalidate(&self) {
        let mut lock = self.state.write().await;
        *lock = None;
    }

    /// Authenticate unless a valid state is cached, returning the state.
    pub async fn authenticate(&self) -> Result<AuthState> {
        // This is executed every request at least once, start with a read lock.
        if let Some(state) = self.state.read().await.as_ref() {
            if state.is_alive() {
                return Ok(state.clone());
            }
        }

        let mut lock = self.state.write().await;
        // Another task may have refreshed the state while we were waiting.
        if let Some(state) = lock.as_ref() {
            if state.is_alive() {
                return Ok(state.clone());
            }
        }

        let state = self.auth.authenticate(&self.client).await?;
        debug!("Authenticated, management URL is {}", state.management_url);
        *lock = Some(state.clone());
        Ok(state)
    }

    /// Management URL, authenticating if needed.
    pub async fn management_url(&self) -> Result<Url> {
        match self.bypass_url {
            Some(ref url) => Ok(url.clone()),
            None => Ok(self.authenticate().await?.management_url),
        }
    }

    fn build_url(&self, base: &Url, path: &str, query: &Query) -> Result<Url> {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)
        } else {
            Url::parse(&format!("{}{}", base.as_str().trim_end_matches('/'), path))
        }
        .map_err(|e| Error::new(ErrorKind::ProtocolError, format!("Invalid URL {}: {}", path, e)))?;

        if !query.is_empty() {
            let _ = url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    async fn attempt(
        &self,
        state: &AuthState,
        method: &Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Response> {
        let base = self.bypass_url.as_ref().unwrap_or(&state.management_url);
        let url = self.build_url(base, path, query)?;

        let mut request = Request::new(method.clone(), url);
        if let Some(ref token) = state.token {
            request = request.with_header("X-Auth-Token", token.clone());
        }
        for (name, value) in &state.headers {
            request = request.with_header(name.clone(), value.clone());
        }
        if let Some((ref name, ref value)) = self.version_header {
            request = request.with_header(name.clone(), value.clone());
        }
        if let Some(body) = body {
            request = request.with_body(body.clone());
        }

        self.client.send(request).await
    }

    /// Issue a request relative to the management URL.
    ///
    /// Transient failures are retried up to the retry budget, an expired
    /// token causes exactly one re-authentication.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<Value>,
    ) -> Result<Response> {
        let mut attempts = 0;
        let mut auth_attempts = 0;
        let mut delays = Backoff { next: self.backoff };

        loop {
            attempts += 1;
            // Authentication failures are never retried.
            let state = self.authenticate().await?;
            let err = match self.attempt(&state, &method, path, query, body.as_ref()).await {
                Ok(resp) => return Ok(resp),
                Err(err) => err,
            };

            if err.kind() == ErrorKind::AuthenticationFailed {
                if auth_attempts > 0 {
                    return Err(err);
                }
                debug!("Unauthorized, re-authenticating");
                self.invalidate().await;
                attempts -= 1;
                auth_attempts += 1;
                continue;
            }

            if !is_transient(&err) {
                return Err(err);
            }

            if attempts > self.retries {
                return Err(match err.kind() {
                    ErrorKind::ConnectionError => Error::new(
                        ErrorKind::ConnectionError,
                        format!("Unable to establish connection: {}", err),
                    ),
                    _ => err,
                });
            }

            let delay = delays.next().unwrap_or(self.backoff);
            debug!(
                "Failed attempt ({} of {}): {}, retrying in {:?}",
                attempts, self.retries, err, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Issue a GET request.
    pub async fn get(&self, path: &str, query: &Query) -> Result<Response> {
        self.request(Method::GET, path, query, None).await
    }

    /// Issue a POST request.
    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Response> {
        self.request(Method::POST, path, &Query::new(), body).await
    }

    /// Issue a PUT request.
    pub async fn put(&self, path: &str, body: Option<Value>) -> Result<Response> {
        self.request(Method::PUT, path, &Query::new(), body).await
    }

    /// Issue a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.request(Method::DELETE, path, &Query::new(), None).await
    }
}

assert_impl_all!(Session: Send, Sync);

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth", &self.auth)
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .field("bypass_url", &self.bypass_url)
            .field("version_header", &self.version_header)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
pub mod test {
    #![allow(unused_results)]

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use reqwest::header::HeaderMap;
    use reqwest::{StatusCode, Url};
    use serde_json::{json, Value};

    use super::{is_transient, Backoff, HookPoint, Session};
    use crate::auth::NoAuth;
    use crate::common::{ApiVersion, VolumeApi};
    use crate::http::{HttpClient, TransportOptions};
    use crate::utils::Query;
    use crate::{Error, ErrorKind};

    pub fn new_session(url: &str) -> Session {
        let auth = NoAuth::new(url).unwrap();
        Session::new(auth, HttpClient::new(TransportOptions::default()).unwrap())
    }

    fn status_error(code: u16) -> Error {
        let status = StatusCode::from_u16(code).unwrap();
        Error::from_response(status, &HeaderMap::new(), None, "")
    }

    #[test]
    fn test_is_transient() {
        assert!(is_transient(&status_error(400)));
        assert!(is_transient(&status_error(501)));
        assert!(is_transient(&status_error(503)));
        assert!(!is_transient(&status_error(401)));
        assert!(!is_transient(&status_error(404)));
        assert!(is_transient(&Error::new(ErrorKind::ConnectionError, "refused")));
        assert!(!is_transient(&Error::new(ErrorKind::ProtocolError, "bad header")));
    }

    #[test]
    fn test_backoff_doubles() {
        let delays: Vec<Duration> = Backoff {
            next: Duration::from_secs(1),
        }
        .take(4)
        .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[test]
    fn test_hooks_are_instance_scoped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = counter.clone();
        let with_hook = new_session("http://127.0.0.1/v3").with_hook(HookPoint::Create, move |body| {
            counter2.fetch_add(1, Ordering::SeqCst);
            body["volume"]["extra"] = Value::Bool(true);
        });
        let without_hook = new_session("http://127.0.0.1/v3");

        let mut body = json!({"volume": {"size": 1}});
        without_hook.run_hooks(HookPoint::Create, &mut body);
        with_hook.run_hooks(HookPoint::Update, &mut body);
        assert_eq!(body, json!({"volume": {"size": 1}}));

        with_hook.run_hooks(HookPoint::Create, &mut body);
        assert_eq!(body, json!({"volume": {"size": 1, "extra": true}}));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_url() {
        let session = new_session("http://127.0.0.1/v3/p1");
        let base = Url::parse("http://127.0.0.1/v3/p1/").unwrap();
        let query = Query::new().with("all_tenants", 1);
        assert_eq!(
            session.build_url(&base, "/volumes/detail", &query).unwrap().as_str(),
            "http://127.0.0.1/v3/p1/volumes/detail?all_tenants=1"
        );
        assert_eq!(
            session
                .build_url(&base, "http://other/v3/p1/volumes?marker=x", &Query::new())
                .unwrap()
                .as_str(),
            "http://other/v3/p1/volumes?marker=x"
        );
    }

    #[tokio::test]
    async fn test_management_url() {
        let session = new_session("http://127.0.0.1/v3/p1");
        assert_eq!(
            session.management_url().await.unwrap().as_str(),
            "http://127.0.0.1/v3/p1"
        );
        let session = session.with_bypass_url(Url::parse("http://bypass/v3").unwrap());
        assert_eq!(session.management_url().await.unwrap().as_str(), "http://bypass/v3");
    }

    #[test]
    fn test_version_header() {
        let session = new_session("http://127.0.0.1/v3").with_api_version(VolumeApi::V3, ApiVersion(3, 27));
        assert_eq!(
            session.version_header,
            Some((String::from("OpenStack-API-Version"), String::from("volume 3.27")))
        );
        let session = new_session("http://127.0.0.1/v2").with_api_version(VolumeApi::V2, ApiVersion(2, 0));
        assert_eq!(session.version_header, None);
    }
}
