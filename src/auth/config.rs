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

//! Authentication configuration from the environment and clouds.yaml.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::warn;

use super::base::AuthMethod;
use super::catalog::{EndpointFilters, EndpointType};
use super::password::PasswordAuth;
use super::plugins::AuthPlugins;
use super::simple::TokenAuth;
use crate::{Error, ErrorKind, Result};

pub(crate) const AUTH_SYSTEM_VARS: &[&str] = &["OS_AUTH_SYSTEM"];
pub(crate) const AUTH_URL_VARS: &[&str] = &["OS_AUTH_URL", "CINDER_URL"];
pub(crate) const USERNAME_VARS: &[&str] = &["OS_USERNAME", "CINDER_USERNAME"];
pub(crate) const USER_ID_VARS: &[&str] = &["OS_USER_ID"];
pub(crate) const PASSWORD_VARS: &[&str] = &["OS_PASSWORD", "CINDER_PASSWORD"];
pub(crate) const PROJECT_NAME_VARS: &[&str] =
    &["OS_PROJECT_NAME", "OS_TENANT_NAME", "CINDER_PROJECT_ID"];
pub(crate) const PROJECT_ID_VARS: &[&str] = &["OS_PROJECT_ID", "OS_TENANT_ID"];
pub(crate) const TOKEN_VARS: &[&str] = &["OS_AUTH_TOKEN"];
pub(crate) const BYPASS_URL_VARS: &[&str] = &["CINDERCLIENT_BYPASS_URL", "OS_ENDPOINT"];
pub(crate) const REGION_VARS: &[&str] = &["OS_REGION_NAME", "CINDER_REGION_NAME"];
pub(crate) const ENDPOINT_TYPE_VARS: &[&str] = &["OS_ENDPOINT_TYPE", "CINDER_ENDPOINT_TYPE"];
pub(crate) const SERVICE_TYPE_VARS: &[&str] = &["OS_VOLUME_SERVICE_TYPE"];
pub(crate) const SERVICE_NAME_VARS: &[&str] = &["CINDER_SERVICE_NAME"];

/// Credentials and endpoint selection for a client.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Authentication system, `None` or `keystone` for the built-in one.
    pub auth_system: Option<String>,
    /// Identity service URL.
    pub auth_url: Option<String>,
    /// User name.
    pub username: Option<String>,
    /// User ID.
    pub user_id: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Project (tenant) name.
    pub project_name: Option<String>,
    /// Project (tenant) ID.
    pub project_id: Option<String>,
    /// Pre-acquired token.
    pub token: Option<String>,
    /// URL to use instead of the one from the service catalog.
    pub bypass_url: Option<String>,
    /// Region name.
    pub region_name: Option<String>,
    /// Endpoint type.
    pub endpoint_type: EndpointType,
    /// Service type override.
    pub service_type: Option<String>,
    /// Service name.
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CloudAuth {
    #[serde(default)]
    auth_url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, alias = "tenant_name")]
    project_name: Option<String>,
    #[serde(default, alias = "tenant_id")]
    project_id: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Cloud {
    #[serde(default)]
    auth: CloudAuth,
    #[serde(default)]
    auth_type: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    interface: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Root {
    clouds: HashMap<String, Cloud>,
}

/// First non-empty value among the given variables.
pub(crate) fn env_first<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String> + ?Sized,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
}

fn find_config() -> Option<PathBuf> {
    let current = Path::new("./clouds.yaml");
    if current.is_file() {
        match current.canonicalize() {
            Ok(val) => return Some(val),
            Err(e) => warn!("Cannot canonicalize {:?}: {}", current, e),
        }
    }

    if let Some(mut home) = dirs::home_dir() {
        home.push(".config/openstack/clouds.yaml");
        if home.is_file() {
            return Some(home);
        }
    } else {
        warn!("Cannot find home directory");
    }

    let abs = PathBuf::from("/etc/openstack/clouds.yaml");
    if abs.is_file() {
        Some(abs)
    } else {
        None
    }
}

fn missing(what: &str, flag: &str, var: &str) -> Error {
    Error::new(
        ErrorKind::InvalidConfig,
        format!("You must provide {} via either {} or env[{}]", what, flag, var),
    )
}

impl AuthConfig {
    /// Read configuration from environment variables.
    pub fn from_env() -> Result<AuthConfig> {
        AuthConfig::from_env_with(|name| std::env::var(name).ok())
    }

    /// Read configuration using a custom variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Result<AuthConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint_type = match env_first(&lookup, ENDPOINT_TYPE_VARS) {
            Some(value) => value.parse()?,
            None => EndpointType::default(),
        };

        Ok(AuthConfig {
            auth_system: env_first(&lookup, AUTH_SYSTEM_VARS),
            auth_url: env_first(&lookup, AUTH_URL_VARS),
            username: env_first(&lookup, USERNAME_VARS),
            user_id: env_first(&lookup, USER_ID_VARS),
            password: env_first(&lookup, PASSWORD_VARS),
            project_name: env_first(&lookup, PROJECT_NAME_VARS),
            project_id: env_first(&lookup, PROJECT_ID_VARS),
            token: env_first(&lookup, TOKEN_VARS),
            bypass_url: env_first(&lookup, BYPASS_URL_VARS),
            region_name: env_first(&lookup, REGION_VARS),
            endpoint_type,
            service_type: env_first(&lookup, SERVICE_TYPE_VARS),
            service_name: env_first(&lookup, SERVICE_NAME_VARS),
        })
    }

    /// Read configuration of a cloud from clouds.yaml.
    pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<AuthConfig> {
        let path = find_config().ok_or_else(|| {
            Error::new(ErrorKind::InvalidConfig, "clouds.yaml was not found in any location")
        })?;
        AuthConfig::from_config_file(path, cloud_name)
    }

    /// Read configuration of a cloud from the given file.
    pub fn from_config_file<P: AsRef<Path>, S: AsRef<str>>(
        path: P,
        cloud_name: S,
    ) -> Result<AuthConfig> {
        let file = File::open(path.as_ref()).map_err(|e| {
            Error::new(ErrorKind::InvalidConfig, format!("Cannot read clouds.yaml: {}", e))
        })?;
        let mut clouds: Root = serde_yaml::from_reader(file).map_err(|e| {
            Error::new(ErrorKind::InvalidConfig, format!("Cannot parse clouds.yaml: {}", e))
        })?;

        let name = cloud_name.as_ref();
        let cloud = clouds.clouds.remove(name).ok_or_else(|| {
            Error::new(ErrorKind::InvalidConfig, format!("No such cloud: {}", name))
        })?;

        let endpoint_type = match cloud.interface {
            Some(ref value) => value.parse()?,
            None => EndpointType::default(),
        };
        let auth_system = match cloud.auth_type.as_deref() {
            None | Some("password") | Some("v2password") | Some("v3password") => None,
            Some(other) => Some(other.to_string()),
        };

        let auth = cloud.auth;
        Ok(AuthConfig {
            auth_system,
            auth_url: auth.auth_url,
            username: auth.username,
            user_id: auth.user_id,
            password: auth.password,
            project_name: auth.project_name,
            project_id: auth.project_id,
            token: auth.token,
            bypass_url: auth.endpoint,
            region_name: cloud.region_name,
            endpoint_type,
            ..AuthConfig::default()
        })
    }

    /// Whether the built-in Identity authentication is used.
    pub fn is_keystone(&self) -> bool {
        matches!(self.auth_system.as_deref(), None | Some("") | Some("keystone"))
    }

    /// URL that replaces the catalog endpoint (built-in authentication only).
    pub fn session_bypass_url(&self) -> Option<&str> {
        if self.is_keystone() {
            self.bypass_url.as_deref()
        } else {
            None
        }
    }

    /// Endpoint filters for the given default service type.
    pub fn filters(&self, default_service_type: &str) -> EndpointFilters {
        let mut filters = EndpointFilters::new(
            self.service_type
                .clone()
                .unwrap_or_else(|| String::from(default_service_type)),
        )
        .with_endpoint_type(self.endpoint_type);
        filters.region = self.region_name.clone();
        filters.service_name = self.service_name.clone();
        filters
    }

    /// Create an authentication method.
    pub fn create(
        &self,
        plugins: &AuthPlugins,
        default_service_type: &str,
    ) -> Result<Box<dyn AuthMethod>> {
        if !self.is_keystone() {
            let name = self.auth_system.as_deref().unwrap_or_default();
            return plugins.create(name, self);
        }

        if let (Some(token), Some(endpoint)) = (&self.token, &self.bypass_url) {
            return Ok(Box::new(TokenAuth::new(token.clone(), endpoint)?));
        }

        let auth_url = self
            .auth_url
            .as_ref()
            .ok_or_else(|| missing("an auth url", "--os-auth-url", "OS_AUTH_URL"))?;
        let username = self
            .username
            .as_ref()
            .ok_or_else(|| missing("a username", "--os-username", "OS_USERNAME"))?;
        let password = self
            .password
            .as_ref()
            .ok_or_else(|| missing("a password", "--os-password", "OS_PASSWORD"))?;
        if self.project_name.is_none() && self.project_id.is_none() {
            return Err(missing(
                "a project name or ID",
                "--os-project-name or --os-project-id",
                "OS_PROJECT_NAME",
            ));
        }

        let mut auth = PasswordAuth::new(auth_url, username.clone(), password.clone())?
            .with_filters(self.filters(default_service_type));
        if let Some(ref name) = self.project_name {
            auth = auth.with_project_name(name.clone());
        }
        if let Some(ref id) = self.project_id {
            auth = auth.with_project_id(id.clone());
        }
        Ok(Box::new(auth))
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("auth_system", &self.auth_system)
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("project_name", &self.project_name)
            .field("project_id", &self.project_id)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("bypass_url", &self.bypass_url)
            .field("region_name", &self.region_name)
            .field("endpoint_type", &self.endpoint_type)
            .field("service_type", &self.service_type)
            .field("service_name", &self.service_name)
            .finish()
    }
}

#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::io::Write;

    use super::super::{AuthPlugins, EndpointType};
    use super::AuthConfig;
    use crate::ErrorKind;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_env_with_fallback_names() {
        let vars = env(&[
            ("CINDER_USERNAME", "user1"),
            ("OS_PASSWORD", "pass1"),
            ("OS_TENANT_NAME", "tenant1"),
            ("CINDER_URL", "http://127.0.0.1:5000/v2.0"),
            ("OS_ENDPOINT_TYPE", "internalURL"),
            ("OS_REGION_NAME", ""),
            ("CINDER_REGION_NAME", "RegionTwo"),
        ]);
        let config = AuthConfig::from_env_with(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(config.username.as_deref(), Some("user1"));
        assert_eq!(config.password.as_deref(), Some("pass1"));
        assert_eq!(config.project_name.as_deref(), Some("tenant1"));
        assert_eq!(config.auth_url.as_deref(), Some("http://127.0.0.1:5000/v2.0"));
        assert_eq!(config.endpoint_type, EndpointType::Internal);
        assert_eq!(config.region_name.as_deref(), Some("RegionTwo"));
        assert!(config.is_keystone());
        assert!(!format!("{:?}", config).contains("pass1"));
    }

    #[test]
    fn test_from_env_invalid_endpoint_type() {
        let vars = env(&[("OS_ENDPOINT_TYPE", "private")]);
        let err = AuthConfig::from_env_with(|name| vars.get(name).cloned())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_create_requires_username() {
        let config = AuthConfig {
            auth_url: Some(String::from("http://127.0.0.1:5000/v2.0")),
            password: Some(String::from("pass")),
            project_name: Some(String::from("demo")),
            ..AuthConfig::default()
        };
        let err = config.create(&AuthPlugins::default(), "volumev3").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(
            err.message(),
            Some("You must provide a username via either --os-username or env[OS_USERNAME]")
        );
    }

    #[test]
    fn test_create_token_with_bypass() {
        let config = AuthConfig {
            token: Some(String::from("tok")),
            bypass_url: Some(String::from("http://127.0.0.1:8776/v3/p1")),
            ..AuthConfig::default()
        };
        let auth = config.create(&AuthPlugins::default(), "volumev3").unwrap();
        assert!(format!("{:?}", auth).starts_with("TokenAuth"));
    }

    #[test]
    fn test_filters() {
        let config = AuthConfig {
            region_name: Some(String::from("RegionOne")),
            endpoint_type: EndpointType::Admin,
            ..AuthConfig::default()
        };
        let filters = config.filters("volumev2");
        assert_eq!(filters.service_type, "volumev2");
        assert_eq!(filters.region.as_deref(), Some("RegionOne"));
        assert_eq!(filters.endpoint_type, EndpointType::Admin);
    }

    #[test]
    fn test_from_config_file() {
        let path = std::env::temp_dir().join(format!("cinderclient-clouds-{}.yaml", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            write!(
                file,
                "clouds:\n  \
                   devstack:\n    \
                     auth:\n      \
                       auth_url: http://127.0.0.1:5000/v2.0\n      \
                       username: demo\n      \
                       password: secret\n      \
                       project_name: demo\n    \
                     region_name: RegionOne\n    \
                     interface: internal\n"
            )
            .unwrap();
        }

        let config = AuthConfig::from_config_file(&path, "devstack").unwrap();
        assert_eq!(config.username.as_deref(), Some("demo"));
        assert_eq!(config.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(config.endpoint_type, EndpointType::Internal);

        let err = AuthConfig::from_config_file(&path, "other").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        std::fs::remove_file(&path).unwrap();
    }
}
