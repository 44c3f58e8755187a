// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Registry of alternative authentication systems.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use super::base::AuthMethod;
use super::config::AuthConfig;
use super::simple::CinderNoAuth;
use crate::{Error, ErrorKind, Result};

/// Function creating an authentication method from configuration.
pub type PluginFactory = fn(&AuthConfig) -> Result<Box<dyn AuthMethod>>;

/// Named authentication systems available to a client.
///
/// Each registry is independent, `AuthPlugins::default()` contains the
/// `noauth` system.
#[derive(Clone)]
pub struct AuthPlugins {
    factories: HashMap<String, PluginFactory>,
}

fn noauth_factory(config: &AuthConfig) -> Result<Box<dyn AuthMethod>> {
    let user_id = config
        .user_id
        .as_ref()
        .or(config.username.as_ref())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidConfig,
                "You must provide a user ID via either --os-user-id or env[OS_USER_ID]",
            )
        })?;
    let endpoint = config.bypass_url.as_ref().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidConfig,
            "You must provide an endpoint via either --bypass-url or env[CINDERCLIENT_BYPASS_URL]",
        )
    })?;
    let project_id = config.project_id.clone().or_else(|| config.project_name.clone());
    Ok(Box::new(CinderNoAuth::new(user_id.clone(), project_id, endpoint)?))
}

impl AuthPlugins {
    /// Registry without any plugins.
    pub fn empty() -> AuthPlugins {
        AuthPlugins {
            factories: HashMap::new(),
        }
    }

    /// Register a plugin, returning the previous one with this name.
    pub fn register<S: Into<String>>(
        &mut self,
        name: S,
        factory: PluginFactory,
    ) -> Option<PluginFactory> {
        self.factories.insert(name.into(), factory)
    }

    /// Names of all registered plugins, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut result: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        result.sort_unstable();
        result
    }

    /// Create an authentication method from a plugin.
    pub fn create(&self, name: &str, config: &AuthConfig) -> Result<Box<dyn AuthMethod>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            Error::new(
                ErrorKind::AuthSystemNotFound,
                format!("AuthSystemNotFound: '{}'", name),
            )
        })?;
        debug!("Using authentication system {}", name);
        factory(config)
    }
}

impl Default for AuthPlugins {
    fn default() -> AuthPlugins {
        let mut result = AuthPlugins::empty();
        let _ = result.register("noauth", noauth_factory);
        result
    }
}

impl fmt::Debug for AuthPlugins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthPlugins")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
pub mod test {
    use super::super::{AuthConfig, AuthMethod, NoAuth};
    use super::AuthPlugins;
    use crate::{ErrorKind, Result};

    fn fixed(_config: &AuthConfig) -> Result<Box<dyn AuthMethod>> {
        Ok(Box::new(NoAuth::new("http://127.0.0.1:8776/v3/p1")?))
    }

    #[test]
    fn test_default_has_noauth() {
        let plugins = AuthPlugins::default();
        assert_eq!(plugins.names(), vec!["noauth"]);
    }

    #[test]
    fn test_unknown_plugin() {
        let plugins = AuthPlugins::default();
        let err = plugins.create("fake", &AuthConfig::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::AuthSystemNotFound);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = AuthPlugins::empty();
        assert!(first.register("fixed", fixed).is_none());
        let second = AuthPlugins::empty();
        assert!(first.create("fixed", &AuthConfig::default()).is_ok());
        assert!(second.create("fixed", &AuthConfig::default()).is_err());
    }

    #[test]
    fn test_noauth_requires_endpoint() {
        let plugins = AuthPlugins::default();
        let config = AuthConfig {
            user_id: Some(String::from("admin")),
            ..AuthConfig::default()
        };
        let err = plugins.create("noauth", &config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        let config = AuthConfig {
            bypass_url: Some(String::from("http://127.0.0.1:8776/v3")),
            ..config
        };
        assert!(plugins.create("noauth", &config).is_ok());
    }
}
