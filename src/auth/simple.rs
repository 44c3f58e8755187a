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

//! Simple authentication methods.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use reqwest::Url;

use super::base::{AuthMethod, AuthState};
use crate::http::HttpClient;
use crate::{Error, ErrorKind, Result};

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    Url::parse(endpoint.trim_end_matches('/')).map_err(|e| {
        Error::new(ErrorKind::InvalidInput, format!("Invalid endpoint {}: {}", endpoint, e))
    })
}

/// Authentication method that provides no authentication.
///
/// This method never sends a token and always returns a pre-defined
/// endpoint.
#[derive(Clone, Debug)]
pub struct NoAuth {
    endpoint: Url,
}

/// Authentication with a pre-acquired token and a fixed endpoint.
#[derive(Clone)]
pub struct TokenAuth {
    token: String,
    endpoint: Url,
}

/// Authentication for Cinder running with the `noauth` middleware.
///
/// The token is `<user>:<project>` and the management URL is
/// `<endpoint>/<project>`.
#[derive(Clone, Debug)]
pub struct CinderNoAuth {
    user_id: String,
    project_id: String,
    endpoint: Url,
}

impl NoAuth {
    /// Create a new fake authentication method using a fixed endpoint.
    pub fn new<U: AsRef<str>>(endpoint: U) -> Result<NoAuth> {
        Ok(NoAuth {
            endpoint: parse_endpoint(endpoint.as_ref())?,
        })
    }
}

#[async_trait]
impl AuthMethod for NoAuth {
    async fn authenticate(&self, _client: &HttpClient) -> Result<AuthState> {
        Ok(AuthState::new(self.endpoint.clone()))
    }
}

impl TokenAuth {
    /// Use an existing token with a fixed endpoint.
    pub fn new<S: Into<String>, U: AsRef<str>>(token: S, endpoint: U) -> Result<TokenAuth> {
        Ok(TokenAuth {
            token: token.into(),
            endpoint: parse_endpoint(endpoint.as_ref())?,
        })
    }
}

#[async_trait]
impl AuthMethod for TokenAuth {
    async fn authenticate(&self, _client: &HttpClient) -> Result<AuthState> {
        Ok(AuthState::new(self.endpoint.clone()).with_token(self.token.clone()))
    }
}

impl fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.token.hash(&mut hasher);
        write!(
            f,
            "TokenAuth {{ token: hash({}), endpoint: {} }}",
            hasher.finish(),
            self.endpoint
        )
    }
}

impl CinderNoAuth {
    /// Create the authentication, the project defaults to the user.
    pub fn new<S, U>(user_id: S, project_id: Option<String>, endpoint: U) -> Result<CinderNoAuth>
    where
        S: Into<String>,
        U: AsRef<str>,
    {
        let user_id = user_id.into();
        Ok(CinderNoAuth {
            project_id: project_id.unwrap_or_else(|| user_id.clone()),
            user_id,
            endpoint: parse_endpoint(endpoint.as_ref())?,
        })
    }

    /// Token in the form expected by the middleware.
    pub fn token(&self) -> String {
        format!("{}:{}", self.user_id, self.project_id)
    }
}

#[async_trait]
impl AuthMethod for CinderNoAuth {
    async fn authenticate(&self, _client: &HttpClient) -> Result<AuthState> {
        let management_url = parse_endpoint(&format!(
            "{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.project_id
        ))?;
        Ok(AuthState::new(management_url)
            .with_token(self.token())
            .with_header("x-user-id", self.user_id.clone())
            .with_header("x-project-id", self.project_id.clone()))
    }
}

#[cfg(test)]
pub mod test {
    #![allow(unused_results)]

    use super::super::AuthMethod;
    use super::{CinderNoAuth, NoAuth, TokenAuth};
    use crate::http::{HttpClient, TransportOptions};

    fn client() -> HttpClient {
        HttpClient::new(TransportOptions::default()).unwrap()
    }

    #[test]
    fn test_noauth_new() {
        let a = NoAuth::new("http://127.0.0.1:8080/v1").unwrap();
        let e = a.endpoint;
        assert_eq!(e.scheme(), "http");
        assert_eq!(e.host_str().unwrap(), "127.0.0.1");
        assert_eq!(e.port().unwrap(), 8080u16);
        assert_eq!(e.path(), "/v1");
    }

    #[test]
    fn test_noauth_new_fail() {
        NoAuth::new("foo bar").err().unwrap();
    }

    #[tokio::test]
    async fn test_noauth_authenticate() {
        let a = NoAuth::new("http://127.0.0.1:8080/v3/p1/").unwrap();
        let state = a.authenticate(&client()).await.unwrap();
        assert_eq!(state.management_url.as_str(), "http://127.0.0.1:8080/v3/p1");
        assert!(state.token.is_none());
    }

    #[tokio::test]
    async fn test_token_authenticate() {
        let a = TokenAuth::new("tok", "http://127.0.0.1:8080/v3/p1").unwrap();
        let state = a.authenticate(&client()).await.unwrap();
        assert_eq!(state.token.as_deref(), Some("tok"));
        assert!(!format!("{:?}", a).contains("tok,"));
    }

    #[tokio::test]
    async fn test_cinder_noauth() {
        let a = CinderNoAuth::new("admin", Some(String::from("demo")), "http://127.0.0.1:8776/v3")
            .unwrap();
        let state = a.authenticate(&client()).await.unwrap();
        assert_eq!(state.token.as_deref(), Some("admin:demo"));
        assert_eq!(state.management_url.as_str(), "http://127.0.0.1:8776/v3/demo");
        assert!(state
            .headers
            .contains(&(String::from("x-project-id"), String::from("demo"))));
    }

    #[test]
    fn test_cinder_noauth_default_project() {
        let a = CinderNoAuth::new("admin", None, "http://127.0.0.1:8776/v3").unwrap();
        assert_eq!(a.token(), "admin:admin");
    }
}
