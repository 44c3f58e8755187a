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

//! Block Storage client.

use reqwest::Url;
use static_assertions::assert_impl_all;

use super::auth::{AuthConfig, AuthMethod, AuthPlugins};
use super::block_storage::{
    Attachments, AvailabilityZones, Backups, Capabilities, Clusters, DefaultTypes,
    GroupSnapshots, Groups, Limits, Messages, QosSpecs, QuotaClasses, Quotas, Services,
    Snapshots, Transfers, VolumeTypes, Volumes,
};
use super::common::{manager, ApiVersion, Resource, VolumeApi};
use super::http::{HttpClient, TransportOptions};
use super::session::Session;
use super::utils::Query;
use super::{Error, ErrorKind, Result};

/// OpenStack Block Storage API client.
///
/// Binds a [Session](struct.Session.html) to a major API version and a
/// microversion, and provides access to resource managers.
#[derive(Debug, Clone)]
pub struct Client {
    session: Session,
    api: VolumeApi,
    version: ApiVersion,
}

assert_impl_all!(Client: Send, Sync);

impl Client {
    /// Create a client for the given API version.
    ///
    /// Fails with `UnsupportedVersion` if the version is not supported.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use cinderclient::auth::NoAuth;
    /// use cinderclient::http::{HttpClient, TransportOptions};
    /// use cinderclient::{ApiVersion, Client, Session};
    ///
    /// fn client() -> cinderclient::Result<Client> {
    ///     let auth = NoAuth::new("http://cinder.example.com:8776/v3/project1")?;
    ///     let http = HttpClient::new(TransportOptions::default())?;
    ///     Client::new(Session::new(auth, http), ApiVersion(3, 27))
    /// }
    /// # fn main() { client().unwrap(); }
    /// ```
    pub fn new(session: Session, version: ApiVersion) -> Result<Client> {
        let api = VolumeApi::from_version(version)?;
        Ok(Client {
            session: session.with_api_version(api, version),
            api,
            version,
        })
    }

    /// Create a client from an authentication method with default transport options.
    pub fn with_auth<Auth: AuthMethod + 'static>(auth: Auth, version: ApiVersion) -> Result<Client> {
        let http = HttpClient::new(TransportOptions::default())?;
        Client::new(Session::new(auth, http), version)
    }

    /// Create a client from environment variables.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # fn client_from_env() -> cinderclient::Result<()> {
    /// let client = cinderclient::Client::from_env(cinderclient::ApiVersion(3, 0))?;
    /// # Ok(()) }
    /// # fn main() { client_from_env().unwrap(); }
    /// ```
    pub fn from_env(version: ApiVersion) -> Result<Client> {
        Client::from_auth_config(&AuthConfig::from_env()?, version)
    }

    /// Create a client from a cloud in `clouds.yaml`.
    pub fn from_config<S: AsRef<str>>(cloud_name: S, version: ApiVersion) -> Result<Client> {
        Client::from_auth_config(&AuthConfig::from_config(cloud_name)?, version)
    }

    fn from_auth_config(config: &AuthConfig, version: ApiVersion) -> Result<Client> {
        let api = VolumeApi::from_version(version)?;
        let auth = config.create(&AuthPlugins::default(), api.service_type())?;
        let mut session =
            Session::from_boxed(auth, HttpClient::new(TransportOptions::default())?);
        if let Some(url) = config.session_bypass_url() {
            session = session.with_bypass_url(parse_url(url)?);
        }
        Client::new(session, version)
    }

    /// Session used by this client.
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Major API version.
    #[inline]
    pub fn api(&self) -> VolumeApi {
        self.api
    }

    /// Requested API version.
    #[inline]
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Whether the requested version is at least `min`.
    pub fn supports(&self, min: ApiVersion) -> bool {
        self.version >= min
    }

    /// Fail with `UnsupportedVersion` unless the version is at least `min`.
    pub fn require(&self, min: ApiVersion, feature: &str) -> Result<()> {
        if self.supports(min) {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::UnsupportedVersion,
                format!(
                    "{} requires API version {} or later, the current version is {}",
                    feature, min, self.version
                ),
            ))
        }
    }

    /// Volumes.
    pub fn volumes(&self) -> Volumes<'_> {
        Volumes::new(self)
    }

    /// Volume snapshots.
    pub fn snapshots(&self) -> Snapshots<'_> {
        Snapshots::new(self)
    }

    /// Volume backups.
    pub fn backups(&self) -> Backups<'_> {
        Backups::new(self)
    }

    /// Volume types.
    pub fn volume_types(&self) -> VolumeTypes<'_> {
        VolumeTypes::new(self)
    }

    /// Default volume types of projects.
    pub fn default_types(&self) -> DefaultTypes<'_> {
        DefaultTypes::new(self)
    }

    /// Quality of service specifications.
    pub fn qos_specs(&self) -> QosSpecs<'_> {
        QosSpecs::new(self)
    }

    /// Project quotas.
    pub fn quotas(&self) -> Quotas<'_> {
        Quotas::new(self)
    }

    /// Quota classes.
    pub fn quota_classes(&self) -> QuotaClasses<'_> {
        QuotaClasses::new(self)
    }

    /// Absolute and rate limits.
    pub fn limits(&self) -> Limits<'_> {
        Limits::new(self)
    }

    /// Block Storage services.
    pub fn services(&self) -> Services<'_> {
        Services::new(self)
    }

    /// Clusters of services.
    pub fn clusters(&self) -> Clusters<'_> {
        Clusters::new(self)
    }

    /// Availability zones.
    pub fn availability_zones(&self) -> AvailabilityZones<'_> {
        AvailabilityZones::new(self)
    }

    /// Back end capabilities.
    pub fn capabilities(&self) -> Capabilities<'_> {
        Capabilities::new(self)
    }

    /// Volume transfers.
    pub fn transfers(&self) -> Transfers<'_> {
        Transfers::new(self)
    }

    /// Generic volume groups.
    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    /// Snapshots of generic volume groups.
    pub fn group_snapshots(&self) -> GroupSnapshots<'_> {
        GroupSnapshots::new(self)
    }

    /// User messages.
    pub fn messages(&self) -> Messages<'_> {
        Messages::new(self)
    }

    /// Volume attachments.
    pub fn attachments(&self) -> Attachments<'_> {
        Attachments::new(self)
    }

    /// API versions supported by the server.
    ///
    /// Queries the root of the endpoint, i.e. the management URL without
    /// the version segment and everything after it.
    pub async fn server_versions(&self) -> Result<Vec<Resource>> {
        let mgmt_url = self.session.management_url().await?;
        let root = version_root(&mgmt_url, self.api);
        manager::list(&self.session, root.as_str(), "versions", &Query::new(), None).await
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url)
        .map_err(|e| Error::new(ErrorKind::InvalidConfig, format!("Invalid URL {}: {}", url, e)))
}

/// Strip the version segment and everything after it.
fn version_root(url: &Url, api: VolumeApi) -> Url {
    let mut root = url.clone();
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .take_while(|segment| *segment != api.path_segment())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    let mut path = segments.join("/");
    path.push('/');
    root.set_path(&path);
    root.set_query(None);
    root
}

#[cfg(test)]
pub mod test {
    use reqwest::Url;

    use super::{version_root, Client};
    use crate::common::{ApiVersion, VolumeApi};
    use crate::session::test::new_session;
    use crate::ErrorKind;

    #[test]
    fn test_version_root() {
        let url = Url::parse("http://127.0.0.1:8776/v3/p1").unwrap();
        assert_eq!(
            version_root(&url, VolumeApi::V3).as_str(),
            "http://127.0.0.1:8776/"
        );
        let url = Url::parse("https://cloud/volume/v2/p1").unwrap();
        assert_eq!(
            version_root(&url, VolumeApi::V2).as_str(),
            "https://cloud/volume/"
        );
    }

    #[test]
    fn test_client_version() {
        let client = Client::new(new_session("http://127.0.0.1/v3/p1"), ApiVersion(3, 13)).unwrap();
        assert_eq!(client.api(), VolumeApi::V3);
        assert!(client.supports(ApiVersion(3, 13)));
        assert!(client.require(ApiVersion(3, 13), "Groups").is_ok());
        let err = client.require(ApiVersion(3, 14), "Group snapshots").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);

        let err = Client::new(new_session("http://127.0.0.1/v3/p1"), ApiVersion(3, 100))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    }
}
