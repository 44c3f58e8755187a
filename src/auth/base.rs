// Copyright 2016 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Base code for authentication.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Local};
use log::trace;
use reqwest::Url;

use super::TOKEN_MIN_VALIDITY;
use crate::http::HttpClient;
use crate::Result;

/// Outcome of a successful authentication.
///
/// The management URL and the token always travel together.
#[derive(Clone)]
pub struct AuthState {
    /// Base URL of the Block Storage API.
    pub management_url: Url,
    /// Token to send in `X-Auth-Token` (if any).
    pub token: Option<String>,
    /// When the token expires (if known).
    pub expires_at: Option<DateTime<FixedOffset>>,
    /// Additional headers to send with every request.
    pub headers: Vec<(String, String)>,
}

/// Trait for an authentication method.
///
/// Implementations either talk to an Identity service or produce a state
/// from static data.
#[async_trait]
pub trait AuthMethod: fmt::Debug + Send + Sync {
    /// Authenticate and resolve the management URL.
    async fn authenticate(&self, client: &HttpClient) -> Result<AuthState>;
}

impl AuthState {
    /// Create a state with the management URL only.
    pub fn new(management_url: Url) -> AuthState {
        AuthState {
            management_url,
            token: None,
            expires_at: None,
            headers: Vec::new(),
        }
    }

    /// Add a token.
    pub fn with_token<S: Into<String>>(mut self, token: S) -> AuthState {
        self.token = Some(token.into());
        self
    }

    /// Add token expiration time.
    pub fn with_expiry(mut self, expires_at: Option<DateTime<FixedOffset>>) -> AuthState {
        self.expires_at = expires_at;
        self
    }

    /// Add a header sent with every request.
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> AuthState {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the token can still be used.
    pub fn is_alive(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let validity_time_left = expires_at.signed_duration_since(Local::now());
                trace!("Token is valid for {:?}", validity_time_left);
                validity_time_left > Duration::minutes(TOKEN_MIN_VALIDITY)
            }
            None => true,
        }
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let token = self.token.as_ref().map(|value| {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        });
        write!(
            f,
            "AuthState {{ management_url: {}, token: hash({:?}), expires_at: {:?} }}",
            self.management_url, token, self.expires_at
        )
    }
}

#[cfg(test)]
pub mod test {
    use chrono::{DateTime, Duration, FixedOffset, Local};
    use reqwest::Url;

    use super::AuthState;

    fn state() -> AuthState {
        AuthState::new(Url::parse("http://127.0.0.1:8776/v3/p1").unwrap()).with_token("abcdef")
    }

    #[test]
    fn test_state_without_expiry_is_alive() {
        assert!(state().is_alive());
    }

    #[test]
    fn test_state_expiring_soon() {
        let soon: DateTime<FixedOffset> = (Local::now() + Duration::minutes(5)).into();
        assert!(!state().with_expiry(Some(soon)).is_alive());
        let later: DateTime<FixedOffset> = (Local::now() + Duration::hours(2)).into();
        assert!(state().with_expiry(Some(later)).is_alive());
    }

    #[test]
    fn test_debug_hides_token() {
        let dbg = format!("{:?}", state());
        assert!(!dbg.contains("abcdef"));
        assert!(dbg.contains("http://127.0.0.1:8776/v3/p1"));
    }
}
